use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Indicator, Position, command::Command, game::Response, world::Tile};

/// Holds the state of an agent within the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub gold: u32,
    pub position: Position,
    /// What lies beneath the agent's indicator, restored when it moves away.
    pub current_tile: Tile,
    pub indicator: Indicator,
}

impl AgentState {
    pub fn new(position: Position, current_tile: Tile, indicator: Indicator) -> Self {
        AgentState {
            gold: 0,
            position,
            current_tile,
            indicator,
        }
    }
}

/// Trait defining how an agent chooses its commands.
///
/// Both agents share [`AgentState`]; only the source of their commands differs.
pub trait Controller {
    /// Determines the command the agent issues this turn.
    ///
    /// `None` means no command is available yet and the turn waits.
    fn decide_next_command(&mut self, agent: &AgentState) -> Option<Command>;

    /// Called with the result of the command this controller just issued.
    fn observe(&mut self, _agent: &AgentState, _command: &Command, _response: &Response) {}
}

/// Commands typed by a person, queued until the game asks for them.
#[derive(Debug, Default)]
pub struct HumanController {
    pending: VecDeque<Command>,
}

impl HumanController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a controller that replays `commands` in order.
    pub fn scripted<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        HumanController {
            pending: commands
                .into_iter()
                .map(|c| Command::parse(c.as_ref()))
                .collect(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Controller for HumanController {
    fn decide_next_command(&mut self, _agent: &AgentState) -> Option<Command> {
        self.pending.pop_front()
    }
}
