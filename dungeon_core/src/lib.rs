use serde::{Deserialize, Serialize};

use crate::command::Direction;

pub mod agent;
pub mod bot;
pub mod command;
pub mod game;
pub mod map;
pub mod pathfinding;
pub mod perception;
pub mod world;

/// Represents a 2D coordinate as (row, col), rows growing southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns the neighbouring position one step in `direction`.
    ///
    /// Returns `None` when the step would leave the top or left edge.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dr, dc) = direction.offset();
        Some(Position {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// The symbol an agent leaves on the tile it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Player,
    Bot,
}

impl Indicator {
    pub fn symbol(self) -> char {
        match self {
            Indicator::Player => 'P',
            Indicator::Bot => 'B',
        }
    }
}
