use std::{io::Write, path::Path};

use dungeon_core::{
    Indicator, Position,
    agent::HumanController,
    bot::BotController,
    command::{Command, Direction},
    game::{Actor, Game, GameState, Response, Status, TurnReport},
    world::{DEFAULT_MAP, Tile, World},
};

const STRONGROOM: &str = "\
name Strongroom
win 1
##########
#........#
#..G.E...#
##########
";

fn strongroom(player_at: Position, bot_at: Position) -> Game {
    let world = World::parse(STRONGROOM).unwrap();
    let state = GameState::with_positions(world, player_at, bot_at).unwrap();
    Game::from_parts(state, BotController::new(42))
}

fn play_out(game: &mut Game, human: &mut HumanController, max_turns: usize) -> Vec<TurnReport> {
    let mut reports = Vec::new();
    while reports.len() < max_turns {
        match game.play_turn(human) {
            Some(report) => reports.push(report),
            None => break,
        }
    }
    reports
}

fn bot_commands(reports: &[TurnReport]) -> Vec<String> {
    reports
        .iter()
        .filter(|r| r.actor == Actor::Bot)
        .filter_map(|r| r.command.as_ref().map(|c| c.to_string()))
        .collect()
}

#[test]
fn turn_waits_for_player_input() {
    let mut game = strongroom(Position::new(1, 8), Position::new(2, 1));
    let before = game.state().clone();
    let mut human = HumanController::new();

    assert_eq!(game.play_turn(&mut human), None);
    assert_eq!(game.state(), &before);

    human.push(Command::Gold);
    let report = game.play_turn(&mut human).unwrap();
    assert_eq!(report.actor, Actor::Player);
    assert_eq!(report.response.to_string(), "Gold owned: 0");
    assert_eq!(game.state().status(), Status::AwaitingBotCommand);
}

#[test]
fn bot_collects_gold_and_escapes() {
    let mut game = strongroom(Position::new(1, 8), Position::new(2, 1));
    let mut human = HumanController::scripted(std::iter::repeat_n("gold", 20));

    let reports = play_out(&mut game, &mut human, 100);

    assert_eq!(
        bot_commands(&reports),
        vec!["hello", "look", "e", "e", "pickup", "look", "e", "e", "quit"]
    );
    assert_eq!(game.bot().gold_needed(), Some(1));
    assert_eq!(reports.last().unwrap().response, Response::BotEscaped);
    assert_eq!(game.state().status(), Status::Lost);
    assert_eq!(game.state().bot().gold, 1);
    // The gold was lifted, so the bot left plain floor behind.
    assert_eq!(game.state().world().tile_at(Position::new(2, 3)), Tile::Floor);
}

#[test]
fn player_collects_gold_and_wins() {
    let mut game = strongroom(Position::new(2, 3), Position::new(1, 8));
    let mut human = HumanController::scripted(["pickup", "E", "e", "QUIT"]);

    let reports = play_out(&mut game, &mut human, 100);

    let last = reports.last().unwrap();
    assert_eq!(last.actor, Actor::Player);
    assert_eq!(last.response.to_string(), "WIN\nGold collected: 1/1\n");
    assert_eq!(game.state().status(), Status::Won);
    assert_eq!(bot_commands(&reports)[..2], ["hello", "look"]);
    assert_eq!(game.play_turn(&mut human), None);
}

#[test]
fn walking_into_the_bot_gets_the_player_caught() {
    let mut game = strongroom(Position::new(1, 1), Position::new(2, 1));
    let mut human = HumanController::scripted(["s", "look"]);

    let reports = play_out(&mut game, &mut human, 10);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].command, Some(Command::Move(Direction::South)));
    assert_eq!(reports[1].actor, Actor::Bot);
    assert_eq!(reports[1].command, None);
    assert_eq!(
        reports[1].response,
        Response::Caught {
            gold: 0,
            required: 1
        }
    );
    assert_eq!(game.state().status(), Status::Caught);
    assert!(human.has_pending());
}

#[test]
fn bot_only_ever_makes_legal_moves() {
    for seed in [1, 7, 23, 99, 1234] {
        let mut game = Game::new(World::default_map(), seed).unwrap();
        let mut human = HumanController::scripted(std::iter::repeat_n("look", 400));

        let reports = play_out(&mut game, &mut human, 800);

        for report in reports.iter().filter(|r| r.actor == Actor::Bot) {
            if let Some(Command::Move(_)) = report.command {
                assert_eq!(
                    report.response,
                    Response::Moved { success: true },
                    "seed {seed}: bot walked into a wall"
                );
            }
        }

        let state = game.state();
        let bots = state
            .world()
            .tiles()
            .iter()
            .filter(|t| **t == Tile::Occupied(Indicator::Bot))
            .count();
        assert!(bots <= 1, "seed {seed}: bot drawn {bots} times");
        if !state.is_caught() {
            assert_eq!(
                state.world().tile_at(state.bot().position),
                Tile::Occupied(Indicator::Bot)
            );
        }
    }
}

#[test]
fn same_seed_plays_the_same_game() {
    let play = |seed| {
        let mut game = Game::new(World::default_map(), seed).unwrap();
        let mut human = HumanController::scripted(std::iter::repeat_n("gold", 60));
        let reports = play_out(&mut game, &mut human, 120);
        (bot_commands(&reports), game.state().clone())
    };
    assert_eq!(play(5), play(5));
}

#[test]
fn map_file_loads_and_bad_files_fall_back() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STRONGROOM.as_bytes()).unwrap();
    let world = World::load_or_default(Some(file.path()));
    assert_eq!(world.name(), "Strongroom");
    assert_eq!(world.gold_required(), 1);

    let mut broken = tempfile::NamedTempFile::new().unwrap();
    broken.write_all(b"name Broken\nwin 1\n#####\n#..\n").unwrap();
    let world = World::load_or_default(Some(broken.path()));
    assert_eq!(world, World::parse(DEFAULT_MAP).unwrap());
}

#[test]
fn shipped_map_matches_the_built_in_one() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../maps/small_labyrinth.txt");
    assert_eq!(World::from_file(&path).unwrap(), World::default_map());
}
