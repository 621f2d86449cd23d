use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four axis-aligned directions an agent can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Order in which neighbours are expanded during path search.
    pub const SEARCH_ORDER: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// (row, col) delta of a single step.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
        }
    }
}

/// A command issued by an agent on its turn.
///
/// Text is parsed once at the boundary with [`Command::parse`]; anything that
/// is not a recognised token becomes [`Command::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Hello,
    Gold,
    Look,
    Move(Direction),
    Pickup,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        let token = input.trim().to_lowercase();
        match token.as_str() {
            "hello" => Command::Hello,
            "gold" => Command::Gold,
            "look" => Command::Look,
            "n" => Command::Move(Direction::North),
            "s" => Command::Move(Direction::South),
            "e" => Command::Move(Direction::East),
            "w" => Command::Move(Direction::West),
            "pickup" => Command::Pickup,
            "quit" => Command::Quit,
            _ => Command::Invalid(token),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Hello => f.write_str("hello"),
            Command::Gold => f.write_str("gold"),
            Command::Look => f.write_str("look"),
            Command::Move(direction) => f.write_str(direction.token()),
            Command::Pickup => f.write_str("pickup"),
            Command::Quit => f.write_str("quit"),
            Command::Invalid(raw) => write!(f, "{raw}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Command::parse("  LOOK\n"), Command::Look);
        assert_eq!(Command::parse("PickUp"), Command::Pickup);
        assert_eq!(Command::parse("E"), Command::Move(Direction::East));
    }

    #[test]
    fn unknown_and_empty_input_is_invalid() {
        match Command::parse("dance") {
            Command::Invalid(raw) => assert_eq!(raw, "dance"),
            other => panic!("Expected Invalid, got {:?}", other),
        }
        assert_eq!(Command::parse(""), Command::Invalid(String::new()));
    }

    #[test]
    fn display_matches_protocol_tokens() {
        for token in ["hello", "gold", "look", "n", "s", "e", "w", "pickup", "quit"] {
            assert_eq!(Command::parse(token).to_string(), token);
        }
    }
}
