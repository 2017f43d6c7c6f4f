//! linechat - terminal chat client for line-framed, numerically-coded text
//! protocols.
//!
//! This is the main entry point. It loads configuration, starts file
//! logging, wires the UI bridge to the session thread, sets up the terminal,
//! and runs the renderer loop.

mod app;
mod ui;

use std::fs::{self, File};
use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linechat::bridge::UiBridge;
use linechat::config::Config;
use linechat::session::Session;

use app::App;

/// Global flag to track if terminal is in raw mode (for panic cleanup)
static TERMINAL_RAW: AtomicBool = AtomicBool::new(false);

/// RAII guard for terminal state management.
/// Ensures terminal is restored to normal state when dropped, even on panic or early return.
struct TerminalGuard;

impl TerminalGuard {
    /// Initialize terminal for TUI mode (raw mode, alternate screen).
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        TERMINAL_RAW.store(true, Ordering::SeqCst);

        // If execute! fails, we must restore terminal state before returning error
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            TERMINAL_RAW.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        TERMINAL_RAW.store(false, Ordering::SeqCst);
    }
}

/// Install a panic hook that restores terminal state before printing panic info.
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Only cleanup if terminal was put in raw mode
        if TERMINAL_RAW.load(Ordering::SeqCst) {
            // Best effort cleanup - ignore errors
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = io::stdout().flush();
        }
        default_hook(panic_info);
    }));
}

/// Send tracing output to a file; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "linechat=info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .init();
    Ok(())
}

/// Target frame rate for UI rendering (60fps = ~16ms per frame)
const FRAME_DURATION: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    // Install panic hook FIRST for terminal safety
    install_panic_hook();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config)?;

    info!("Starting linechat v{} as {}", env!("CARGO_PKG_VERSION"), config.name);

    let autoconnect = config.autoconnect_target()?;
    let local_name = config.name.clone();
    let (bridge, port) = UiBridge::spawn().context("Failed to start UI bridge")?;
    let UiBridge { ui, outbound, .. } = bridge;
    let session = Session::spawn(config, ui, outbound).context("Failed to start session")?;

    if let Some((host, port_number)) = autoconnect {
        if port.outbound.send(format!("/connect {} {}", host, port_number)).is_err() {
            warn!("Session ended before autoconnect");
        }
    }

    // Setup terminal with RAII guard - ensures cleanup on any exit path
    let terminal_guard = TerminalGuard::new()?;

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(port, &local_name);

    let result = run_app(&mut terminal, &mut app);

    terminal.show_cursor()?;

    // Dropping the app closes the outbound channel, which ends the session
    drop(app);
    drop(terminal_guard);

    if session.join().is_err() {
        warn!("Session thread panicked");
    }

    if let Err(e) = result {
        tracing::error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    info!("linechat exited cleanly");
    Ok(())
}

/// Main application loop.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Drain forwarded log/chat lines (non-blocking)
        app.poll_ui_events();

        // Only redraw if state has changed (dirty-flag optimization)
        if app.take_needs_redraw() {
            terminal.draw(|f| ui::render(f, app))?;
        }

        // Poll for events with frame-rate limiting
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match (key.code, key.modifiers) {
                    // Quit: Ctrl+Q or Ctrl+C
                    (KeyCode::Char('q'), KeyModifiers::CONTROL)
                    | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    (KeyCode::Enter, _) => app.commit_input(),
                    (KeyCode::Esc, _) => app.clear_input(),
                    (KeyCode::PageUp, _) => app.scroll_chat_page_up(),
                    (KeyCode::PageDown, _) => app.scroll_chat_page_down(),
                    _ => app.edit_input(key),
                },
                Event::Resize(_, _) => {
                    // Terminal resized - trigger redraw
                    app.mark_dirty();
                }
                _ => {}
            }
        }

        // Check for quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
