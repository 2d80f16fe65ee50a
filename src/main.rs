use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use anyhow::Result;
use crossterm::{
    execute,
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use lkb_core::logger;
use lkb_core::platform::hotkey;
use lkb_core::settings::Settings;

fn main() -> Result<()> {
    let force_stub = std::env::args().any(|a| a == "--stub");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Err(e) = logger::init(&cwd.join("logs")) {
        eprintln!("log file unavailable: {}", e);
    }
    logger::register_engine_prefixes();

    let settings_path = cwd.join("settings.json");
    let settings = Settings::load(&settings_path);

    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::set_tui_sender(log_tx);
    logger::info(&format!("lkb-auto started{}", if force_stub { " (stub platform)" } else { "" }));

    let stop_hotkey = Arc::new(AtomicBool::new(false));
    hotkey::start_hotkey_listener(Arc::clone(&stop_hotkey));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = lkb_tui::App::new(settings, settings_path, log_rx, force_stub);
    let result = lkb_tui::event::run(&mut terminal, &mut app, stop_hotkey);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
