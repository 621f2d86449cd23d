use std::{fmt, fs, io, path::Path};

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    Indicator, Position,
    map::{Grid, GridError},
    perception::{Perception, WINDOW_RADIUS},
};

/// The built-in map used when no map file is given or the file fails to load.
pub const DEFAULT_MAP: &str = "\
name Very small Labyrinth of Doom
win 2
####################
#..................#
#......G.........E.#
#..................#
#..E...............#
#...........G......#
#..................#
#..................#
####################
";

/// Spawn attempts made at random before falling back to a full scan.
const SPAWN_ATTEMPTS: usize = 256;

/// Represents the contents of a single cell in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Floor,
    Gold,
    Exit,
    /// An agent standing on the cell hides whatever lies beneath it.
    Occupied(Indicator),
}

impl Tile {
    pub fn symbol(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Floor => '.',
            Tile::Gold => 'G',
            Tile::Exit => 'E',
            Tile::Occupied(indicator) => indicator.symbol(),
        }
    }

    pub fn is_wall(self) -> bool {
        self == Tile::Wall
    }
}

impl TryFrom<char> for Tile {
    type Error = char;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        match symbol {
            '#' => Ok(Tile::Wall),
            '.' => Ok(Tile::Floor),
            'G' => Ok(Tile::Gold),
            'E' => Ok(Tile::Exit),
            'P' => Ok(Tile::Occupied(Indicator::Player)),
            'B' => Ok(Tile::Occupied(Indicator::Bot)),
            other => Err(other),
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Reasons a map definition could not be turned into a [`World`].
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read map file: {0}")]
    Io(#[from] io::Error),
    #[error("Map has no 'name' line")]
    MissingName,
    #[error("Map has no 'win' line")]
    MissingGoldRequirement,
    #[error("Invalid gold requirement '{0}'")]
    InvalidGoldRequirement(String),
    #[error("Map has no grid rows")]
    NoRows,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map symbol '{symbol}' at position ({row}, {col})")]
    UnknownTile { symbol: char, row: usize, col: usize },
    #[error("Map needs at least two floor or exit tiles to spawn on, found {0}")]
    NotEnoughSpawnPoints(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("No floor or exit tile is free to spawn on")]
    NoSpawnPoint,
}

/// The dungeon: a named tile matrix plus the gold needed to win.
///
/// Holds no game rules. Agents overlay their indicator on the tile they stand
/// on through [`World::set_tile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    name: String,
    gold_required: u32,
    tiles: Grid<Tile>,
}

impl World {
    pub fn new(name: impl Into<String>, gold_required: u32, tiles: Grid<Tile>) -> Self {
        World {
            name: name.into(),
            gold_required,
            tiles,
        }
    }

    /// Returns the built-in "Very small Labyrinth of Doom".
    pub fn default_map() -> Self {
        World::parse(DEFAULT_MAP).expect("built-in map is valid")
    }

    /// Parses a map definition.
    ///
    /// Lines starting with `name ` and `win ` carry the map name and gold
    /// requirement. Lines starting with `#` are grid rows. Anything else,
    /// blank lines included, is ignored.
    pub fn parse(definition: &str) -> Result<Self, MapError> {
        let mut name = None;
        let mut gold_required = None;
        let mut rows: Vec<&str> = Vec::new();

        for line in definition.lines() {
            let line = line.trim_end();
            if line.starts_with('#') {
                rows.push(line);
            } else if let Some(rest) = line.strip_prefix("name") {
                name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("win") {
                let rest = rest.trim();
                let value = rest
                    .parse::<u32>()
                    .map_err(|_| MapError::InvalidGoldRequirement(rest.to_string()))?;
                gold_required = Some(value);
            }
        }

        let name = name.ok_or(MapError::MissingName)?;
        let gold_required = gold_required.ok_or(MapError::MissingGoldRequirement)?;
        let cols = rows.first().ok_or(MapError::NoRows)?.chars().count();

        let mut parsed: Vec<Vec<Tile>> = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(MapError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            let mut tiles = Vec::with_capacity(cols);
            for (col, symbol) in line.chars().enumerate() {
                match Tile::try_from(symbol) {
                    // Agents are placed at game start, never by the map.
                    Ok(Tile::Occupied(_)) | Err(_) => {
                        return Err(MapError::UnknownTile { symbol, row, col });
                    }
                    Ok(tile) => tiles.push(tile),
                }
            }
            parsed.push(tiles);
        }

        let tiles = Grid::from_generator(parsed.len(), cols, |p| parsed[p.row][p.col]);
        let world = World::new(name, gold_required, tiles);

        let spawn_points = world.spawn_points().count();
        if spawn_points < 2 {
            return Err(MapError::NotEnoughSpawnPoints(spawn_points));
        }
        Ok(world)
    }

    /// Reads and parses a map file.
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let definition = fs::read_to_string(path)?;
        World::parse(&definition)
    }

    /// Loads the map at `path`, substituting the built-in map on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No map file given, using the default map");
            return World::default_map();
        };
        match World::from_file(path) {
            Ok(world) => {
                info!("Loaded map '{}' from {}", world.name, path.display());
                world
            }
            Err(e) => {
                warn!(
                    "Map {} failed to load ({}), loading default map",
                    path.display(),
                    e
                );
                World::default_map()
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gold_required(&self) -> u32 {
        self.gold_required
    }

    /// Returns (rows, cols), border included.
    pub fn size(&self) -> (usize, usize) {
        (self.tiles.rows(), self.tiles.cols())
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    /// Returns the tile at `position`. Anything outside the map reads as wall.
    pub fn tile_at(&self, position: Position) -> Tile {
        self.tiles.get(position).copied().unwrap_or(Tile::Wall)
    }

    pub fn set_tile(&mut self, position: Position, tile: Tile) -> Result<(), GridError> {
        self.tiles.set(position, tile)
    }

    /// Whether an agent may be placed on `position` at game start.
    pub fn can_spawn(&self, position: Position) -> bool {
        matches!(self.tile_at(position), Tile::Floor | Tile::Exit)
    }

    fn spawn_points(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles
            .enumerate()
            .filter(|(_, tile)| matches!(tile, Tile::Floor | Tile::Exit))
            .map(|(position, _)| position)
    }

    /// Picks a uniformly random interior position satisfying [`World::can_spawn`].
    pub fn random_spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Position, SpawnError> {
        let (rows, cols) = self.size();
        if rows > 2 && cols > 2 {
            for _ in 0..SPAWN_ATTEMPTS {
                let position = Position {
                    row: rng.random_range(1..rows - 1),
                    col: rng.random_range(1..cols - 1),
                };
                if self.can_spawn(position) {
                    return Ok(position);
                }
            }
        }
        // Sparse maps: choose among every legal cell instead of sampling blindly.
        let candidates: Vec<Position> = self.spawn_points().collect();
        if candidates.is_empty() {
            return Err(SpawnError::NoSpawnPoint);
        }
        Ok(candidates[rng.random_range(0..candidates.len())])
    }

    /// Builds the 5x5 window centred on `centre`. Cells off the map read as wall.
    pub fn window_around(&self, centre: Position) -> Perception {
        Perception::from_generator(|offset| {
            let row = (centre.row + offset.row).checked_sub(WINDOW_RADIUS);
            let col = (centre.col + offset.col).checked_sub(WINDOW_RADIUS);
            match (row, col) {
                (Some(row), Some(col)) => self.tile_at(Position { row, col }),
                _ => Tile::Wall,
            }
        })
    }
}
