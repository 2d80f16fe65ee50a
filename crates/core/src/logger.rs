use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{mpsc, Mutex, OnceLock};

use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

struct Logger {
    file: File,
    tui_tx: Option<mpsc::Sender<String>>,
    prefixes: HashMap<String, u8>, // prefix -> color index
}

// Color indices for TUI rendering (mapped in ui.rs)
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;
pub const COLOR_GREEN: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// File only, never forwarded to the TUI.
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Initialize the global logger. Truncates `lkb-auto.log` in `log_dir`.
/// Until this is called every log function is a no-op.
pub fn init(log_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_dir.join("lkb-auto.log"))?;

    LOGGER
        .set(Mutex::new(Logger { file, tui_tx: None, prefixes: HashMap::new() }))
        .ok();
    Ok(())
}

/// Wire the TUI log channel.
pub fn set_tui_sender(tx: mpsc::Sender<String>) {
    if let Some(mut l) = LOGGER.get().and_then(|l| l.lock().ok()) {
        l.tui_tx = Some(tx);
    }
}

/// Register a prefix with a color. Later `*_p` calls with that prefix
/// render in that color.
pub fn register_prefix(prefix: &str, color: u8) {
    if let Some(mut l) = LOGGER.get().and_then(|l| l.lock().ok()) {
        l.prefixes.insert(prefix.to_string(), color);
    }
}

/// Register the prefixes used by the engine.
pub fn register_engine_prefixes() {
    register_prefix("run", COLOR_GREEN);
    register_prefix("target", COLOR_BLUE);
    register_prefix("probe", COLOR_GRAY);
    register_prefix("keys", COLOR_GRAY);
}

/// TUI lines use \x1f as field separator:
/// level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage
pub fn log(level: Level, prefix: &str, msg: &str) {
    let Some(mut l) = LOGGER.get().and_then(|l| l.lock().ok()) else {
        return;
    };

    let ts = Local::now().format("%H:%M:%S").to_string();
    let color = l.prefixes.get(prefix).copied().unwrap_or(0);

    let file_line = if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level.tag(), msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level.tag(), prefix, msg)
    };
    writeln!(l.file, "{}", file_line).ok();

    if level == Level::Debug {
        return;
    }
    if let Some(tx) = &l.tui_tx {
        tx.send(format!("{}\x1f{}\x1f{}\x1f{}\x1f{}", level.tag(), prefix, color, ts, msg)).ok();
    }
}

pub fn info(msg: &str) {
    log(Level::Info, "", msg);
}

pub fn warn(msg: &str) {
    log(Level::Warn, "", msg);
}

pub fn error(msg: &str) {
    log(Level::Error, "", msg);
}

pub fn debug_p(prefix: &str, msg: &str) {
    log(Level::Debug, prefix, msg);
}

pub fn info_p(prefix: &str, msg: &str) {
    log(Level::Info, prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    log(Level::Warn, prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    log(Level::Error, prefix, msg);
}
