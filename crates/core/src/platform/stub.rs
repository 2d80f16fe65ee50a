use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::types::*;
use crate::logger;
use super::Platform;

/// One call the stub received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubEvent {
    FindWindow(String),
    ListWindows,
    Focus(WindowId),
    CursorQuery,
    Clipboard(String),
    Keys(String),
}

/// Shared record of stub calls, readable after the platform has moved
/// into a worker thread.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<StubEvent>>>);

impl Journal {
    fn push(&self, ev: StubEvent) {
        if let Ok(mut events) = self.0.lock() {
            events.push(ev);
        }
    }

    pub fn events(&self) -> Vec<StubEvent> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Sequences passed to `send_keys`, in order.
    pub fn keys(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StubEvent::Keys(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    pub fn clipboard(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StubEvent::Clipboard(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&StubEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

/// Logging platform with scripted windows and failures. Used when no real
/// backend exists, with `--stub`, and by tests.
#[derive(Default)]
pub struct StubPlatform {
    journal: Journal,
    windows: Vec<WindowInfo>,
    busy_polls: AtomicUsize,
    failing_keys: Vec<String>,
    failing_clipboard: bool,
    failing_cursor: bool,
    no_busy_probe: bool,
}

impl StubPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, id: WindowId, title: &str) -> Self {
        self.windows.push(WindowInfo { id, title: title.into(), visible: true });
        self
    }

    pub fn with_hidden_window(mut self, id: WindowId, title: &str) -> Self {
        self.windows.push(WindowInfo { id, title: title.into(), visible: false });
        self
    }

    /// Report a busy cursor for the next `polls` queries.
    pub fn busy_for(self, polls: usize) -> Self {
        self.busy_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// Make `send_keys(seq)` fail.
    pub fn failing_keys(mut self, seq: &str) -> Self {
        self.failing_keys.push(seq.into());
        self
    }

    pub fn failing_clipboard(mut self) -> Self {
        self.failing_clipboard = true;
        self
    }

    /// Make every cursor query fail.
    pub fn failing_cursor(mut self) -> Self {
        self.failing_cursor = true;
        self
    }

    pub fn without_busy_probe(mut self) -> Self {
        self.no_busy_probe = true;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl Platform for StubPlatform {
    fn find_window(&self, title: &str) -> Result<Option<WindowId>> {
        logger::info_p("stub", &format!("find_window(\"{}\")", title));
        self.journal.push(StubEvent::FindWindow(title.into()));
        Ok(self.windows.iter().find(|w| w.title == title).map(|w| w.id))
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        logger::info_p("stub", "list_windows()");
        self.journal.push(StubEvent::ListWindows);
        Ok(self.windows.clone())
    }

    fn restore_and_focus(&self, id: WindowId) -> Result<()> {
        logger::info_p("stub", &format!("win({}).restore_and_focus()", id));
        self.journal.push(StubEvent::Focus(id));
        if !self.windows.iter().any(|w| w.id == id) {
            bail!("no window {}", id);
        }
        Ok(())
    }

    fn cursor_busy(&self) -> Result<bool> {
        self.journal.push(StubEvent::CursorQuery);
        if self.failing_cursor {
            bail!("GetCursorInfo failed");
        }
        let busy = self
            .busy_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(busy)
    }

    fn supports_busy_probe(&self) -> bool {
        !self.no_busy_probe
    }

    fn set_clipboard(&self, text: &str) -> Result<()> {
        logger::info_p("stub", &format!("set_clipboard({:?})", text));
        self.journal.push(StubEvent::Clipboard(text.into()));
        if self.failing_clipboard {
            bail!("clipboard unavailable");
        }
        Ok(())
    }

    fn send_keys(&self, seq: &str) -> Result<()> {
        logger::info_p("stub", &format!("send_keys({:?})", seq));
        self.journal.push(StubEvent::Keys(seq.into()));
        crate::keyseq::parse(seq)?;
        if self.failing_keys.iter().any(|f| f == seq) {
            bail!("injection of {:?} rejected", seq);
        }
        Ok(())
    }
}
