use dungeon_core::{
    Indicator,
    agent::HumanController,
    command::Command,
    game::{Actor, Game, Response, Status, TurnReport},
    world::{Tile, World},
};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(version, about = "Dungeon of Doom: collect the gold and escape before THE BOT catches you", long_about = None)]
struct Args {
    /// Map file to load. The built-in map is used if absent or unreadable
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Seed for spawn points and the bot's wandering
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between bot turns
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Draw the whole map, bot included
    #[arg(long)]
    reveal: bool,

    /// Write logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct App {
    /// The running game.
    game: Game,
    /// Commands typed by the player, waiting for their turn.
    human: HumanController,
    /// Text typed since the last Enter.
    input: String,
    /// Everything shown to the player so far.
    transcript: Vec<String>,
    /// Draw the full map instead of just the transcript.
    reveal: bool,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(game: Game, reveal: bool) -> Self {
        let transcript = vec![
            "!! Dungeon of Doom !!".to_string(),
            format!("Map: {}", game.state().world().name()),
            "Commands: hello, gold, look, n, s, e, w, pickup, quit".to_string(),
        ];
        App {
            game,
            human: HumanController::new(),
            input: String::new(),
            transcript,
            reveal,
            should_quit: false,
        }
    }

    /// Queues the typed line as the player's next command.
    fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);
        if self.game.state().is_over() {
            return;
        }
        self.transcript.push(format!(":{line}"));
        self.human.push(Command::parse(&line));
    }

    /// Plays every turn that is ready: the player's queued command, then the bot.
    fn tick(&mut self) {
        while let Some(report) = self.game.play_turn(&mut self.human) {
            let bot_turn = report.actor == Actor::Bot;
            self.record(report);
            // Bot turns are paced by the tick rate.
            if bot_turn {
                break;
            }
        }
    }

    fn record(&mut self, report: TurnReport) {
        let TurnReport {
            actor, response, ..
        } = report;
        let text = match (actor, &response) {
            (Actor::Player, _) | (_, Response::Caught { .. }) => response.to_string(),
            (Actor::Bot, Response::BotEscaped) => "LOSE\nTHE BOT escaped with the gold.".to_string(),
            (Actor::Bot, _) => return,
        };
        self.transcript
            .extend(text.lines().map(str::to_string));
        if self.game.state().is_over() {
            info!("Game over: {:?}", self.game.state().status());
            self.transcript.push("Press Esc to leave.".to_string());
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(args.log_file.as_ref(), args.verbose)?;

    let world = World::load_or_default(args.map.as_deref());
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Starting game with seed {}", seed);
    let game = Game::new(world, seed).context("Failed to start the game")?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(game, args.reveal);

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Sends logs to `log_file`. Without one, logging stays off so the TUI is not disturbed.
fn init_logging(log_file: Option<&PathBuf>, verbosity: u8) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => app.quit(),
                        KeyCode::Enter => app.submit(),
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Char(c) => app.input.push(c),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Transcript and map
            Constraint::Length(3), // Status
            Constraint::Length(3), // Input line
        ])
        .split(frame.area());

    if app.reveal {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_layout[0]);
        render_transcript(frame, columns[0], &app.transcript);
        render_map(frame, columns[1], app.game.state().world());
    } else {
        render_transcript(frame, main_layout[0], &app.transcript);
    }

    render_status(frame, main_layout[1], app);

    let input = Paragraph::new(format!(":{}", app.input))
        .block(Block::default().borders(Borders::ALL).title("Command (Esc to quit)"));
    frame.render_widget(input, main_layout[2]);
}

/// Renders the most recent transcript lines that fit.
fn render_transcript(frame: &mut Frame, area: Rect, transcript: &[String]) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = transcript.len().saturating_sub(visible);
    let lines: Vec<Line> = transcript[start..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Dungeon of Doom"));
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.game.state();
    let status = match state.status() {
        Status::AwaitingPlayerCommand => Span::styled("Your turn", Style::default().fg(Color::Green)),
        Status::AwaitingBotCommand => Span::styled("THE BOT is thinking", Style::default().fg(Color::Yellow)),
        Status::Caught => Span::styled("CAUGHT", Style::default().fg(Color::Red).bold()),
        Status::Won => Span::styled("WON", Style::default().fg(Color::Green).bold()),
        Status::Lost => Span::styled("LOST", Style::default().fg(Color::Red).bold()),
    };
    let line = Line::from(vec![
        status,
        Span::raw(format!(
            "   Gold: {}/{}   Map: {}",
            state.player().gold,
            state.world().gold_required(),
            state.world().name()
        )),
    ]);
    let widget = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

/// Renders the whole map onto the frame.
fn render_map(frame: &mut Frame, area: Rect, world: &World) {
    let tiles = world.tiles();
    let mut lines: Vec<Line> = Vec::with_capacity(tiles.rows());

    for row in 0..tiles.rows() {
        let spans: Vec<Span> = tiles
            .row(row)
            .unwrap_or_default()
            .iter()
            .map(|tile| {
                let style = match tile {
                    Tile::Wall => Style::default().fg(Color::DarkGray),
                    Tile::Floor => Style::default(),
                    Tile::Gold => Style::default().fg(Color::Yellow),
                    Tile::Exit => Style::default().fg(Color::Green),
                    Tile::Occupied(Indicator::Player) => Style::default().fg(Color::Cyan).bold(),
                    Tile::Occupied(Indicator::Bot) => Style::default().fg(Color::Red).bold(),
                };
                Span::styled(tile.symbol().to_string(), style)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title(world.name().to_string()).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
