//! The 5x5 neighbourhood an agent sees when it issues `look`.
//!
//! Text form is five rows of five tile symbols, each row terminated by a
//! newline. The agent itself sits at [`CENTRE`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Position, map::Grid, world::Tile};

pub const WINDOW_SIZE: usize = 5;
pub const WINDOW_RADIUS: usize = WINDOW_SIZE / 2;
pub const CENTRE: Position = Position::new(WINDOW_RADIUS, WINDOW_RADIUS);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PerceptionError {
    #[error("Expected 5 rows, found {0}")]
    RowCount(usize),
    #[error("Row {row} has {found} symbols, expected 5")]
    RowWidth { row: usize, found: usize },
    #[error("Unknown symbol '{symbol}' at ({row}, {col})")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
}

/// A 5x5 window of tiles centred on the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perception {
    tiles: Grid<Tile>,
}

impl Perception {
    /// Builds a window from a function of the in-window position.
    pub fn from_generator<F>(f: F) -> Self
    where
        F: FnMut(Position) -> Tile,
    {
        Perception {
            tiles: Grid::from_generator(WINDOW_SIZE, WINDOW_SIZE, f),
        }
    }

    /// Tile at `position`, or `None` outside the window.
    pub fn tile(&self, position: Position) -> Option<Tile> {
        self.tiles.get(position).copied()
    }

    /// Whether an agent could stand on `position`.
    pub fn is_traversable(&self, position: Position) -> bool {
        self.tile(position).is_some_and(|tile| !tile.is_wall())
    }

    /// First position holding `tile`, scanning row by row.
    pub fn find(&self, tile: Tile) -> Option<Position> {
        self.tiles
            .enumerate()
            .find(|(_, t)| **t == tile)
            .map(|(position, _)| position)
    }
}

impl fmt::Display for Perception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..WINDOW_SIZE {
            for tile in self.tiles.row(row).unwrap_or_default() {
                write!(f, "{tile}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Perception {
    type Err = PerceptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().collect();
        if lines.len() != WINDOW_SIZE {
            return Err(PerceptionError::RowCount(lines.len()));
        }

        let mut tiles = Grid::filled(WINDOW_SIZE, WINDOW_SIZE, Tile::Wall);
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != WINDOW_SIZE {
                return Err(PerceptionError::RowWidth { row, found });
            }
            for (col, symbol) in line.chars().enumerate() {
                let tile = Tile::try_from(symbol)
                    .map_err(|symbol| PerceptionError::UnknownSymbol { symbol, row, col })?;
                tiles[Position { row, col }] = tile;
            }
        }
        Ok(Perception { tiles })
    }
}
