pub mod stub;
pub mod hotkey;

#[cfg(target_os = "windows")]
pub mod windows;

use anyhow::Result;

use crate::types::*;
use crate::logger;

/// OS capabilities the engine drives. Every call reports whether the
/// attempt went through, never whether the target application reacted.
pub trait Platform: Send {
    /// Look up a top-level window by its exact title.
    fn find_window(&self, title: &str) -> Result<Option<WindowId>>;
    /// Live enumeration of top-level windows.
    fn list_windows(&self) -> Result<Vec<WindowInfo>>;
    /// Un-minimize `id` and bring it to the foreground.
    fn restore_and_focus(&self, id: WindowId) -> Result<()>;
    /// Whether the pointer currently shows a wait / app-starting cursor.
    fn cursor_busy(&self) -> Result<bool>;
    /// False when `cursor_busy` has no real implementation here.
    fn supports_busy_probe(&self) -> bool;
    fn set_clipboard(&self, text: &str) -> Result<()>;
    /// Inject a sequence in the `keyseq` grammar.
    fn send_keys(&self, seq: &str) -> Result<()>;
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Box<dyn Platform> {
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return Box::new(stub::StubPlatform::new());
    }
    #[cfg(target_os = "windows")]
    {
        logger::register_prefix("win", logger::COLOR_GRAY);
        return Box::new(windows::WindowsPlatform::new());
    }
    #[cfg(not(target_os = "windows"))]
    {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        logger::warn("no input backend for this OS, using the stub platform");
        Box::new(stub::StubPlatform::new())
    }
}
