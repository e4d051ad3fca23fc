// Terminal front end for Gomoku.
//
// Runs one game at a time through a `SessionHandle` and shows it on stdout
// via the `Presenter`. Input comes from stdin on a dedicated thread so the
// main loop can interleave typed commands with session events.
//
// Usage:
//   gomoku [OPTIONS]
//     --config <PATH>     Config file (default: ~/.config/gomoku/config.toml)
//     --mode <MODE>       local | computer | host | join (default: computer)
//     --address <ADDR>    Server to join (default from config)
//     --port <PORT>       Port to host on (default from config)
//
// In a game, type a cell (`H8`, or `8 8` as row and column), `/say <text>`
// to chat, `/new` for a new game and `/quit` to leave. Logging goes to
// stderr; `RUST_LOG` overrides the configured filter.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crossterm::style::{Color as TermColor, Stylize};
use gomoku_board::{CellState, Coord, Settings};
use gomoku_relay::{ServerHandle, start_server};
use gomoku_session::{
    AppConfig, Audio, BoardSurface, Color, Cursor, GameMode, MessageDisplay, Outcome, Presenter,
    SessionEvent, SessionHandle, SettingsStore, SoundCue,
};
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

const INPUT_POLL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Local,
    Computer,
    Host,
    Join,
}

struct Args {
    config: Option<PathBuf>,
    mode: Mode,
    address: Option<String>,
    port: Option<u16>,
}

fn main() {
    let args = parse_args();
    let log_filter = init_logging();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.network.port = port;
    }
    if let Some(address) = args.address {
        config.network.server_address = address;
    }
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    if let Err(e) = log_filter.reload(configured_filter(&config, rust_log.as_deref())) {
        warn!(error = %e, "could not apply configured log filter");
    }
    info!(mode = ?args.mode, "gomoku starting");

    let lines = spawn_stdin_reader();
    let mut app = App::new(args.mode, config);
    print_commands();
    app.run(&lines);
}

/// Install the stderr subscriber before the config is read, with an `info`
/// filter (or `RUST_LOG`) until the configured one is known.
fn init_logging() -> reload::Handle<EnvFilter, Registry> {
    let bootstrap = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(bootstrap);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
    handle
}

/// `RUST_LOG` wins over the configured filter.
fn configured_filter(config: &AppConfig, rust_log: Option<&str>) -> EnvFilter {
    EnvFilter::new(rust_log.unwrap_or(&config.log_filter))
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, gomoku_session::ConfigError> {
    match path {
        Some(path) => AppConfig::load(path),
        None => match AppConfig::default_path() {
            Some(path) => AppConfig::load_or_default(&path),
            None => Ok(AppConfig::default()),
        },
    }
}

/// Forward stdin lines to the main loop. The channel disconnects at EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Application loop
// ---------------------------------------------------------------------------

type TerminalPresenter = Presenter<TerminalBoard, TerminalMessages, TerminalAudio, MemorySettings>;

enum Next {
    NewGame,
    Quit,
}

struct App {
    mode: Mode,
    config: AppConfig,
    /// Embedded server while hosting.
    server: Option<ServerHandle>,
    presenter: TerminalPresenter,
}

impl App {
    fn new(mode: Mode, config: AppConfig) -> Self {
        let presenter = Presenter::new(
            TerminalBoard::new(config.game.board_size),
            TerminalMessages::default(),
            TerminalAudio,
            MemorySettings(config.game),
            config.texts.clone(),
        );
        Self {
            mode,
            config,
            server: None,
            presenter,
        }
    }

    fn run(&mut self, lines: &Receiver<String>) {
        loop {
            let Some((mut session, events)) = self.start_game() else {
                break;
            };
            let next = self.play(&session, &events, lines);
            session.request_restart();
            match next {
                Next::NewGame => info!("starting a new game"),
                Next::Quit => break,
            }
        }
        if let Some(server) = self.server.take() {
            server.stop();
        }
    }

    fn start_game(&mut self) -> Option<(SessionHandle, Receiver<SessionEvent>)> {
        let settings = self.presenter.settings.read();
        let mode = match self.mode {
            Mode::Local => GameMode::LocalVsLocal,
            Mode::Computer => GameMode::LocalVsComputer,
            Mode::Join => GameMode::Networked {
                server_address: self.config.network.server_address.clone(),
            },
            Mode::Host => {
                // A relay serves exactly one game; each new game gets its own.
                if let Some(old) = self.server.take() {
                    old.stop();
                }
                let mut server_config = self.config.server_config();
                server_config.settings = settings;
                match start_server(server_config) {
                    Ok((handle, addr)) => {
                        println!("Hosting on {addr}. Waiting for the other player to join.");
                        self.server = Some(handle);
                        GameMode::Networked {
                            server_address: format!("127.0.0.1:{}", addr.port()),
                        }
                    }
                    Err(e) => {
                        eprintln!("Failed to start server: {e}");
                        return None;
                    }
                }
            }
        };
        Some(SessionHandle::start(
            mode,
            settings,
            self.config.session_options(),
        ))
    }

    fn play(
        &mut self,
        session: &SessionHandle,
        events: &Receiver<SessionEvent>,
        lines: &Receiver<String>,
    ) -> Next {
        loop {
            while let Ok(event) = events.try_recv() {
                self.show(&event);
            }
            match lines.recv_timeout(INPUT_POLL) {
                Ok(line) => {
                    if let Some(next) = self.handle_line(session, line.trim()) {
                        return next;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Next::Quit,
            }
        }
    }

    fn show(&mut self, event: &SessionEvent) {
        if let SessionEvent::Started { settings, .. } = event {
            self.presenter.board = TerminalBoard::new(settings.board_size);
        }
        self.presenter.dispatch(event);
        match event {
            SessionEvent::Started { .. }
            | SessionEvent::StonePlaced { .. }
            | SessionEvent::Finished(Outcome::Won { .. }) => self.presenter.board.print(),
            _ => {}
        }
    }

    fn handle_line(&mut self, session: &SessionHandle, line: &str) -> Option<Next> {
        match line {
            "" => return None,
            "/quit" => return Some(Next::Quit),
            "/new" => return Some(Next::NewGame),
            "/help" => {
                print_commands();
                return None;
            }
            _ => {}
        }
        if let Some(text) = line.strip_prefix("/say") {
            let text = text.trim();
            if !self.presenter.messages.network_enabled {
                println!("Chat is only available in a networked game.");
            } else if !text.is_empty() {
                if let Err(e) = session.send_chat(text) {
                    warn!(error = %e, "chat not sent");
                    println!("Message not sent: {e}");
                }
            }
            return None;
        }
        match parse_cell(line) {
            Some((row, col)) if self.presenter.board.cursor == Cursor::Pointer => {
                debug!(row, col, "click");
                session.click(row, col);
            }
            Some(_) => println!("Please wait for your turn."),
            None => println!("Unknown input '{line}'. Type /help for the commands."),
        }
        None
    }
}

fn print_commands() {
    println!("Commands: a cell such as H8 (or '8 8' as row and column), /say <text>, /new, /quit");
}

/// Parse `C5` (column letter, 1-based row) or `5 3` (1-based row, column)
/// into 0-based `(row, col)`.
fn parse_cell(input: &str) -> Option<(usize, usize)> {
    let input = input.trim();
    let mut parts = input.split_whitespace();
    if let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) {
        let row: usize = row.parse().ok()?;
        let col: usize = col.parse().ok()?;
        return Some((row.checked_sub(1)?, col.checked_sub(1)?));
    }

    let mut chars = input.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() {
        return None;
    }
    let row: usize = chars.as_str().parse().ok()?;
    Some((row.checked_sub(1)?, (letter as u8 - b'A') as usize))
}

// ---------------------------------------------------------------------------
// Terminal collaborators
// ---------------------------------------------------------------------------

struct TerminalBoard {
    size: usize,
    cells: Vec<CellState>,
    highlighted: Vec<Coord>,
    cursor: Cursor,
}

impl TerminalBoard {
    fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellState::Empty; size * size],
            highlighted: Vec::new(),
            cursor: Cursor::Default,
        }
    }

    fn print(&self) {
        print!("{}", self.render());
        let _ = io::stdout().flush();
    }

    fn render(&self) -> String {
        let mut out = String::from("   ");
        for col in 0..self.size {
            out.push(' ');
            out.push((b'A' + col as u8) as char);
        }
        out.push('\n');
        for row in 0..self.size {
            out.push_str(&format!("{:>3}", row + 1));
            for col in 0..self.size {
                let symbol = match self.cells[row * self.size + col] {
                    CellState::Empty => ".",
                    CellState::Black => "X",
                    CellState::White => "O",
                };
                out.push(' ');
                if self.highlighted.contains(&Coord::new(row, col)) {
                    out.push_str(&symbol.with(TermColor::Red).to_string());
                } else {
                    out.push_str(symbol);
                }
            }
            out.push('\n');
        }
        out
    }
}

impl BoardSurface for TerminalBoard {
    fn render_stone(&mut self, row: usize, col: usize, state: CellState) {
        if row < self.size && col < self.size {
            self.cells[row * self.size + col] = state;
        }
    }

    fn highlight_winning_line(&mut self, cells: &[Coord], _color: CellState) {
        self.highlighted = cells.to_vec();
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}

#[derive(Default)]
struct TerminalMessages {
    network_enabled: bool,
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::White => TermColor::White,
        Color::Red => TermColor::Red,
        Color::Blue => TermColor::Blue,
        Color::Gray => TermColor::Grey,
        Color::Green => TermColor::Green,
    }
}

impl MessageDisplay for TerminalMessages {
    fn append_line(&mut self, text: &str, color: Color) {
        println!("{}", text.with(term_color(color)));
    }

    fn append_segment(&mut self, text: &str, foreground: Color, background: Color) {
        print!(
            "{}",
            text.with(term_color(foreground)).on(term_color(background))
        );
        let _ = io::stdout().flush();
    }

    fn enable_network_controls(&mut self, enabled: bool) {
        self.network_enabled = enabled;
    }
}

struct TerminalAudio;

impl Audio for TerminalAudio {
    fn play(&mut self, cue: SoundCue) {
        debug!(?cue, "sound");
        if cue == SoundCue::Success {
            // Terminal bell.
            print!("\x07");
            let _ = io::stdout().flush();
        }
    }
}

/// Settings kept for the lifetime of the process. Networked games write the
/// server's settings back here, so the next local game uses them too.
struct MemorySettings(Settings);

impl SettingsStore for MemorySettings {
    fn read(&self) -> Settings {
        self.0
    }

    fn write(&mut self, settings: Settings) {
        self.0 = settings;
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        mode: Mode::Computer,
        address: None,
        port: None,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                parsed.config = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--mode" => {
                i += 1;
                parsed.mode = args.get(i).and_then(|s| parse_mode(s)).unwrap_or_else(|| {
                    eprintln!("--mode requires one of: local, computer, host, join");
                    std::process::exit(1);
                });
            }
            "--address" => {
                i += 1;
                parsed.address = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--address requires a host:port");
                    std::process::exit(1);
                }));
            }
            "--port" => {
                i += 1;
                parsed.port = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

fn parse_mode(s: &str) -> Option<Mode> {
    match s {
        "local" => Some(Mode::Local),
        "computer" => Some(Mode::Computer),
        "host" => Some(Mode::Host),
        "join" => Some(Mode::Join),
        _ => None,
    }
}

fn print_usage() {
    println!("Usage: gomoku [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>    Config file (default: ~/.config/gomoku/config.toml)");
    println!("  --mode <MODE>      local, computer, host or join (default: computer)");
    println!("  --address <ADDR>   Server to join, host:port");
    println!("  --port <PORT>      Port to host on");
    println!("  --help, -h         Show this help");
}
