use std::io;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use synapse::config::AppConfig;
use synapse::tui::app::AppState;
use synapse::tui::services::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // File-only logging — the TUI owns the terminal
    let _log_guard = synapse::core::logging::init_tui();
    log::info!("Synapse v{} starting", synapse::VERSION);

    let config = AppConfig::load();
    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::new(config, event_tx);
    let mut app = AppState::new(event_rx, services);
    let result = app.run(&mut terminal, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
