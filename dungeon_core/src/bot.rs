use std::collections::VecDeque;

use log::{debug, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Indicator, Position,
    agent::{AgentState, Controller},
    command::{Command, Direction},
    game::Response,
    pathfinding::{find_path, path_to_moves},
    perception::{CENTRE, Perception, WINDOW_SIZE},
    world::Tile,
};

/// Random window cells tried before scanning the whole window for somewhere to go.
pub const RANDOM_DESTINATION_ATTEMPTS: usize = 32;

/// The autonomous opponent.
///
/// It only ever sees the 5x5 window returned by its last `look`. From that it
/// picks a destination (exit once it holds the required gold, otherwise gold,
/// otherwise the player, otherwise anywhere reachable) and queues the moves to
/// get there, issuing one per turn.
#[derive(Debug)]
pub struct BotController {
    gold_needed: Option<u32>,
    moves: VecDeque<Direction>,
    round: u32,
    window: Option<Perception>,
    rng: StdRng,
}

impl BotController {
    pub fn new(seed: u64) -> Self {
        BotController {
            gold_needed: None,
            moves: VecDeque::new(),
            round: 1,
            window: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Gold the bot must hold to win, once it has said `hello`.
    pub fn gold_needed(&self) -> Option<u32> {
        self.gold_needed
    }

    pub fn set_gold_needed(&mut self, gold: u32) {
        self.gold_needed = Some(gold);
    }

    pub fn queued_moves(&self) -> Vec<Direction> {
        self.moves.iter().copied().collect()
    }

    pub fn window(&self) -> Option<&Perception> {
        self.window.as_ref()
    }

    /// Replaces the remembered window with a fresh one.
    pub fn perceive(&mut self, window: Perception) {
        self.window = Some(window);
    }

    fn has_required_gold(&self, gold: u32) -> bool {
        self.gold_needed == Some(gold)
    }

    /// Chooses the command for this round and advances the round counter.
    pub fn next_action(&mut self, agent: &AgentState) -> Command {
        let round = self.round;
        self.round += 1;

        match round {
            1 => Command::Hello,
            2 => Command::Look,
            _ => {
                if agent.current_tile == Tile::Exit && self.has_required_gold(agent.gold) {
                    return Command::Quit;
                }
                if let Some(direction) = self.moves.pop_front() {
                    return Command::Move(direction);
                }
                match agent.current_tile {
                    Tile::Gold => Command::Pickup,
                    // Floor, an exit without enough gold, or the player's cell.
                    _ => Command::Look,
                }
            }
        }
    }

    /// Picks a destination in the current window and queues the moves to reach it.
    pub fn next_destination(&mut self, gold: u32) {
        let Some(window) = &self.window else {
            return;
        };
        let exit = window.find(Tile::Exit);
        let gold_tile = window.find(Tile::Gold);
        let player = window.find(Tile::Occupied(Indicator::Player));

        if self.has_required_gold(gold) {
            match exit {
                Some(exit) => {
                    debug!("Bot heading for exit at {:?}", exit);
                    self.plan_route(exit);
                }
                None => self.random_destination(),
            }
        } else if let Some(target) = gold_tile {
            debug!("Bot heading for gold at {:?}", target);
            self.plan_route(target);
        } else if let Some(target) = player {
            debug!("Bot chasing player at {:?}", target);
            self.plan_route(target);
        } else {
            self.random_destination();
        }
    }

    /// Queues the moves from the centre of the window to `target`.
    ///
    /// Returns whether at least one move was queued.
    fn plan_route(&mut self, target: Position) -> bool {
        let Some(window) = self.window.as_ref() else {
            return false;
        };
        match find_path(window, CENTRE, target) {
            Some(path) => {
                let moves = path_to_moves(CENTRE, &path);
                let queued = !moves.is_empty();
                self.moves.extend(moves);
                queued
            }
            None => {
                debug!("Bot found no path to {:?}", target);
                false
            }
        }
    }

    fn random_destination(&mut self) {
        for _ in 0..RANDOM_DESTINATION_ATTEMPTS {
            let target = Position {
                row: self.rng.random_range(0..WINDOW_SIZE),
                col: self.rng.random_range(0..WINDOW_SIZE),
            };
            if self.plan_route(target) {
                debug!("Bot wandering to {:?}", target);
                return;
            }
        }

        for row in 0..WINDOW_SIZE {
            for col in 0..WINDOW_SIZE {
                if self.plan_route(Position { row, col }) {
                    debug!("Bot wandering to ({}, {}) after scanning", row, col);
                    return;
                }
            }
        }

        warn!("Bot has nowhere reachable to go, it will look again");
    }
}

impl Controller for BotController {
    fn decide_next_command(&mut self, agent: &AgentState) -> Option<Command> {
        Some(self.next_action(agent))
    }

    fn observe(&mut self, agent: &AgentState, _command: &Command, response: &Response) {
        match response {
            Response::Hello { gold_required } => self.set_gold_needed(*gold_required),
            Response::Look(window) => {
                self.perceive(window.clone());
                self.next_destination(agent.gold);
            }
            _ => {}
        }
    }
}
