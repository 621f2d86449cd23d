use std::fmt;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Indicator, Position,
    agent::{AgentState, Controller},
    bot::BotController,
    command::{Command, Direction},
    map::GridError,
    perception::Perception,
    world::{SpawnError, Tile, World},
};

/// Errors that can occur while setting up a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Which agent a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    Player,
    Bot,
}

impl Actor {
    pub fn other(self) -> Actor {
        match self {
            Actor::Player => Actor::Bot,
            Actor::Bot => Actor::Player,
        }
    }
}

/// Where the game is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    AwaitingPlayerCommand,
    AwaitingBotCommand,
    /// The bot reached the player. The player loses.
    Caught,
    /// The player left through an exit holding exactly the required gold.
    Won,
    /// Someone quit on an exit without the right gold, or the bot escaped.
    Lost,
}

impl Status {
    pub fn awaiting(actor: Actor) -> Status {
        match actor {
            Actor::Player => Status::AwaitingPlayerCommand,
            Actor::Bot => Status::AwaitingBotCommand,
        }
    }

    pub fn turn(self) -> Option<Actor> {
        match self {
            Status::AwaitingPlayerCommand => Some(Actor::Player),
            Status::AwaitingBotCommand => Some(Actor::Bot),
            Status::Caught | Status::Won | Status::Lost => None,
        }
    }

    pub fn is_over(self) -> bool {
        self.turn().is_none()
    }
}

/// Represents the outcome of processing one command.
///
/// The `Display` form is the text shown to whoever issued the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Hello { gold_required: u32 },
    Gold { owned: u32 },
    Look(Perception),
    Moved { success: bool },
    Pickup { success: bool, owned: u32 },
    Won { gold: u32, required: u32 },
    /// Quit on an exit without exactly the required gold.
    Lost,
    /// The bot quit on an exit with the required gold.
    BotEscaped,
    /// Quit while not standing on an exit.
    NotOnExit,
    Caught { gold: u32, required: u32 },
    /// Unrecognised command, or any command after the game ended.
    Ignored,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Hello { gold_required } => write!(f, "Gold to win: {gold_required}"),
            Response::Gold { owned } => write!(f, "Gold owned: {owned}"),
            Response::Look(window) => write!(f, "{window}"),
            Response::Moved { success: true } => f.write_str("Success"),
            Response::Moved { success: false } => f.write_str("Fail"),
            Response::Pickup { success, owned } => {
                let verdict = if *success { "Success" } else { "Fail" };
                write!(f, "{verdict}. Gold owned: {owned}")
            }
            Response::Won { gold, required } => {
                write!(f, "WIN\nGold collected: {gold}/{required}\n")
            }
            Response::Lost | Response::BotEscaped => f.write_str("LOSE"),
            Response::Caught { gold, required } => write!(
                f,
                "LOSE.\nYou have been caught by THE BOT!\nGold collected: {gold}/{required}\n"
            ),
            Response::NotOnExit | Response::Ignored => Ok(()),
        }
    }
}

/// A full snapshot of the game between turns.
///
/// [`GameState::apply`] never mutates the snapshot it is called on; it
/// returns the snapshot that follows the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    world: World,
    player: AgentState,
    bot: AgentState,
    status: Status,
}

impl GameState {
    /// Spawns the player and then the bot at random legal positions.
    pub fn new<R: Rng + ?Sized>(world: World, rng: &mut R) -> Result<Self, GameError> {
        let mut world = world;
        let player_at = world.random_spawn(rng)?;
        let player = spawn(&mut world, player_at, Indicator::Player)?;
        let bot_at = world.random_spawn(rng)?;
        let bot = spawn(&mut world, bot_at, Indicator::Bot)?;
        info!(
            "Player spawned at {:?}, bot spawned at {:?} on '{}'",
            player.position,
            bot.position,
            world.name()
        );
        Ok(GameState {
            world,
            player,
            bot,
            status: Status::AwaitingPlayerCommand,
        })
    }

    /// Places both agents at chosen positions. The player moves first.
    pub fn with_positions(
        world: World,
        player_at: Position,
        bot_at: Position,
    ) -> Result<Self, GameError> {
        let mut world = world;
        let player = spawn(&mut world, player_at, Indicator::Player)?;
        let bot = spawn(&mut world, bot_at, Indicator::Bot)?;
        Ok(GameState {
            world,
            player,
            bot,
            status: Status::AwaitingPlayerCommand,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn turn(&self) -> Option<Actor> {
        self.status.turn()
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn agent(&self, actor: Actor) -> &AgentState {
        match actor {
            Actor::Player => &self.player,
            Actor::Bot => &self.bot,
        }
    }

    fn agent_mut(&mut self, actor: Actor) -> &mut AgentState {
        match actor {
            Actor::Player => &mut self.player,
            Actor::Bot => &mut self.bot,
        }
    }

    pub fn player(&self) -> &AgentState {
        &self.player
    }

    pub fn bot(&self) -> &AgentState {
        &self.bot
    }

    /// Whether both agents stand on the same cell.
    pub fn is_caught(&self) -> bool {
        self.player.position == self.bot.position
    }

    /// Ends the game if the bot has reached the player.
    pub fn check_catch(&self) -> Option<(GameState, Response)> {
        if self.is_over() || !self.is_caught() {
            return None;
        }
        info!("Player caught by the bot at {:?}", self.player.position);
        let mut next = self.clone();
        next.status = Status::Caught;
        Some((
            next,
            Response::Caught {
                gold: self.player.gold,
                required: self.world.gold_required(),
            },
        ))
    }

    /// Processes `command` for whichever agent's turn it is.
    ///
    /// The turn passes to the other agent afterwards, even when the command
    /// failed or was not recognised, unless the game ended.
    pub fn apply(&self, command: &Command) -> (GameState, Response) {
        let Some(actor) = self.turn() else {
            return (self.clone(), Response::Ignored);
        };
        if let Some(caught) = self.check_catch() {
            return caught;
        }

        let mut next = self.clone();
        let response = match command {
            Command::Hello => Response::Hello {
                gold_required: self.world.gold_required(),
            },
            Command::Gold => Response::Gold {
                owned: self.agent(actor).gold,
            },
            Command::Look => Response::Look(self.world.window_around(self.agent(actor).position)),
            Command::Move(direction) => next.move_agent(actor, *direction),
            Command::Pickup => next.pickup(actor),
            Command::Quit => next.quit(actor),
            Command::Invalid(_) => Response::Ignored,
        };
        debug!("{:?} issued '{}' -> {:?}", actor, command, response);

        if !next.is_over() {
            next.status = Status::awaiting(actor.other());
        }
        (next, response)
    }

    fn move_agent(&mut self, actor: Actor, direction: Direction) -> Response {
        let agent = self.agent(actor);
        let from = agent.position;
        let Some(to) = from.step(direction) else {
            return Response::Moved { success: false };
        };
        let uncovered = self.world.tile_at(to);
        if uncovered.is_wall() {
            return Response::Moved { success: false };
        }

        let (indicator, left_behind) = (agent.indicator, agent.current_tile);
        let relocated = self
            .world
            .set_tile(from, left_behind)
            .and_then(|()| self.world.set_tile(to, Tile::Occupied(indicator)));
        if let Err(e) = relocated {
            warn!("{:?} could not move {:?}: {}", actor, direction, e);
            return Response::Moved { success: false };
        }

        let agent = self.agent_mut(actor);
        agent.current_tile = uncovered;
        agent.position = to;
        Response::Moved { success: true }
    }

    fn pickup(&mut self, actor: Actor) -> Response {
        let agent = self.agent_mut(actor);
        if agent.current_tile == Tile::Gold {
            agent.gold += 1;
            agent.current_tile = Tile::Floor;
            Response::Pickup {
                success: true,
                owned: agent.gold,
            }
        } else {
            Response::Pickup {
                success: false,
                owned: agent.gold,
            }
        }
    }

    fn quit(&mut self, actor: Actor) -> Response {
        let agent = self.agent(actor);
        if agent.current_tile != Tile::Exit {
            return Response::NotOnExit;
        }

        let (gold, required) = (agent.gold, self.world.gold_required());
        if gold != required {
            info!("{:?} quit with {}/{} gold", actor, gold, required);
            self.status = Status::Lost;
            return Response::Lost;
        }
        match actor {
            Actor::Player => {
                info!("Player escaped with {}/{} gold", gold, required);
                self.status = Status::Won;
                Response::Won { gold, required }
            }
            Actor::Bot => {
                info!("Bot escaped with {}/{} gold", gold, required);
                self.status = Status::Lost;
                Response::BotEscaped
            }
        }
    }
}

/// Overlays an agent's indicator at `position` and remembers the tile beneath.
fn spawn(world: &mut World, position: Position, indicator: Indicator) -> Result<AgentState, GridError> {
    let beneath = world.tile_at(position);
    world.set_tile(position, Tile::Occupied(indicator))?;
    Ok(AgentState::new(position, beneath, indicator))
}

/// One processed turn, for the front end to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub actor: Actor,
    /// `None` when the turn was ended by a catch before any command was read.
    pub command: Option<Command>,
    pub response: Response,
}

/// Drives a game: asks the controller whose turn it is for a command and
/// applies it.
#[derive(Debug)]
pub struct Game {
    state: GameState,
    bot: BotController,
}

impl Game {
    /// Starts a game on `world` with spawns and bot choices derived from `seed`.
    pub fn new(world: World, seed: u64) -> Result<Self, GameError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(world, &mut rng)?;
        let bot = BotController::new(rng.random());
        Ok(Game { state, bot })
    }

    pub fn from_parts(state: GameState, bot: BotController) -> Self {
        Game { state, bot }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bot(&self) -> &BotController {
        &self.bot
    }

    /// Plays one turn.
    ///
    /// Returns `None` when the game is over or the player has no command ready.
    pub fn play_turn(&mut self, human: &mut dyn Controller) -> Option<TurnReport> {
        let actor = self.state.turn()?;
        if let Some((caught, response)) = self.state.check_catch() {
            self.state = caught;
            return Some(TurnReport {
                actor,
                command: None,
                response,
            });
        }

        let controller: &mut dyn Controller = match actor {
            Actor::Player => human,
            Actor::Bot => &mut self.bot,
        };
        let command = controller.decide_next_command(self.state.agent(actor))?;
        let (next, response) = self.state.apply(&command);
        controller.observe(next.agent(actor), &command, &response);
        self.state = next;

        Some(TurnReport {
            actor,
            command: Some(command),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::DEFAULT_MAP;

    /// 7x7 room: gold at (1,1), exit at (1,5), everything else inside is floor.
    const ROOM: &str = "\
name Test room
win 1
#######
#G...E#
#.....#
#.....#
#.....#
#.....#
#######
";

    fn room(player_at: Position, bot_at: Position) -> GameState {
        GameState::with_positions(World::parse(ROOM).unwrap(), player_at, bot_at).unwrap()
    }

    fn run(state: GameState, commands: &[&str]) -> (GameState, Vec<Response>) {
        commands.iter().fold((state, Vec::new()), |(state, mut out), c| {
            let (next, response) = state.apply(&Command::parse(c));
            out.push(response);
            (next, out)
        })
    }

    #[test]
    fn spawning_overlays_indicators() {
        let state = room(Position::new(2, 2), Position::new(5, 5));
        assert_eq!(
            state.world().tile_at(Position::new(2, 2)),
            Tile::Occupied(Indicator::Player)
        );
        assert_eq!(
            state.world().tile_at(Position::new(5, 5)),
            Tile::Occupied(Indicator::Bot)
        );
        assert_eq!(state.player().current_tile, Tile::Floor);
        assert_eq!(state.status(), Status::AwaitingPlayerCommand);
    }

    #[test]
    fn random_spawns_are_distinct_and_legal() {
        let mut rng = StdRng::seed_from_u64(11);
        let world = World::parse(DEFAULT_MAP).unwrap();
        for _ in 0..20 {
            let state = GameState::new(world.clone(), &mut rng).unwrap();
            assert_ne!(state.player().position, state.bot().position);
            for agent in [state.player(), state.bot()] {
                assert!(matches!(agent.current_tile, Tile::Floor | Tile::Exit));
            }
        }
    }

    #[test]
    fn hello_gold_and_look() {
        let state = room(Position::new(2, 2), Position::new(5, 5));
        let (state, responses) = run(state, &["HELLO", "gold", "look"]);
        assert_eq!(responses[0].to_string(), "Gold to win: 1");
        assert_eq!(responses[1].to_string(), "Gold owned: 0");
        assert_eq!(responses[2].to_string(), "#####\n#G...\n#.P..\n#....\n#....\n");
        assert_eq!(state.status(), Status::AwaitingBotCommand);
    }

    #[test]
    fn moving_into_a_wall_changes_nothing() {
        let state = room(Position::new(1, 2), Position::new(5, 5));
        let (next, response) = state.apply(&Command::Move(Direction::North));
        assert_eq!(response, Response::Moved { success: false });
        assert_eq!(response.to_string(), "Fail");
        assert_eq!(next.world(), state.world());
        assert_eq!(next.player(), state.player());
        assert_eq!(next.status(), Status::AwaitingBotCommand);
    }

    #[test]
    fn moving_restores_the_tile_left_behind() {
        let state = room(Position::new(1, 2), Position::new(5, 5));
        // Player steps onto gold, bot passes, player steps off again.
        let (state, responses) = run(state, &["w", "look", "s"]);
        assert_eq!(responses[0].to_string(), "Success");
        assert_eq!(responses[2].to_string(), "Success");
        assert_eq!(state.world().tile_at(Position::new(1, 2)), Tile::Floor);
        assert_eq!(state.world().tile_at(Position::new(1, 1)), Tile::Gold);
        assert_eq!(
            state.world().tile_at(Position::new(2, 1)),
            Tile::Occupied(Indicator::Player)
        );
        assert_eq!(state.player().current_tile, Tile::Floor);
    }

    #[test]
    fn pickup_only_succeeds_once_per_gold() {
        let state = room(Position::new(1, 2), Position::new(5, 5));
        let (state, responses) = run(state, &["w", "look", "pickup", "look", "pickup", "look", "e"]);
        assert_eq!(responses[2].to_string(), "Success. Gold owned: 1");
        assert_eq!(responses[4].to_string(), "Fail. Gold owned: 1");
        assert_eq!(state.player().gold, 1);
        // The gold is gone once the player walks away.
        assert_eq!(state.world().tile_at(Position::new(1, 1)), Tile::Floor);
    }

    #[test]
    fn quit_off_an_exit_is_a_no_op() {
        let state = room(Position::new(2, 2), Position::new(5, 5));
        let (next, response) = state.apply(&Command::Quit);
        assert_eq!(response, Response::NotOnExit);
        assert_eq!(response.to_string(), "");
        assert_eq!(next.status(), Status::AwaitingBotCommand);
    }

    #[test]
    fn quit_on_exit_with_exact_gold_wins() {
        let state = room(Position::new(1, 2), Position::new(5, 1));
        let (state, responses) = run(
            state,
            &["w", "look", "pickup", "look", "e", "look", "e", "look", "e", "look", "e", "look", "quit"],
        );
        assert_eq!(responses.last().unwrap().to_string(), "WIN\nGold collected: 1/1\n");
        assert_eq!(state.status(), Status::Won);
    }

    #[test]
    fn quit_on_exit_without_enough_gold_loses() {
        let state = room(Position::new(1, 4), Position::new(5, 1));
        let (state, responses) = run(state, &["e", "look", "quit"]);
        assert_eq!(responses[2], Response::Lost);
        assert_eq!(state.status(), Status::Lost);
    }

    #[test]
    fn bot_escaping_with_gold_is_a_loss_for_the_player() {
        let state = room(Position::new(5, 1), Position::new(1, 2));
        let (state, responses) = run(
            state,
            &["look", "w", "look", "pickup", "look", "e", "look", "e", "look", "e", "look", "e", "look", "quit"],
        );
        assert_eq!(responses.last(), Some(&Response::BotEscaped));
        assert_eq!(state.status(), Status::Lost);
    }

    #[test]
    fn turns_alternate_even_on_invalid_commands() {
        let state = room(Position::new(2, 2), Position::new(5, 5));
        let mut state = state;
        let mut expected = Status::AwaitingPlayerCommand;
        for command in ["", "dance", "n", "pickup", "quit", "gold"] {
            assert_eq!(state.status(), expected);
            let (next, response) = state.apply(&Command::parse(command));
            if command.is_empty() || command == "dance" {
                assert_eq!(response, Response::Ignored);
                assert_eq!(response.to_string(), "");
            }
            state = next;
            expected = match expected {
                Status::AwaitingPlayerCommand => Status::AwaitingBotCommand,
                _ => Status::AwaitingPlayerCommand,
            };
        }
    }

    #[test]
    fn catch_ends_the_game_before_the_next_command() {
        let state = room(Position::new(2, 2), Position::new(2, 3));
        // Player passes, bot steps onto the player.
        let (state, responses) = run(state, &["gold", "w"]);
        assert_eq!(responses[1], Response::Moved { success: true });
        assert!(state.is_caught());
        assert_eq!(state.status(), Status::AwaitingPlayerCommand);

        let (state, response) = state.apply(&Command::Pickup);
        assert_eq!(
            response.to_string(),
            "LOSE.\nYou have been caught by THE BOT!\nGold collected: 0/1\n"
        );
        assert_eq!(state.status(), Status::Caught);
    }

    #[test]
    fn finished_games_ignore_commands() {
        let state = room(Position::new(1, 4), Position::new(5, 1));
        let (state, _) = run(state, &["e", "look", "quit"]);
        let (next, response) = state.apply(&Command::Move(Direction::West));
        assert_eq!(response, Response::Ignored);
        assert_eq!(next, state);
    }

    #[test]
    fn apply_leaves_the_original_state_untouched() {
        let state = room(Position::new(2, 2), Position::new(5, 5));
        let snapshot = state.clone();
        let (next, _) = state.apply(&Command::Move(Direction::East));
        assert_eq!(state, snapshot);
        assert_ne!(next, snapshot);
    }
}
