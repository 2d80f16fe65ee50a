//! Fixtures shared by the scenario harness.

use std::io::Write;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use lkb_core::platform::stub::StubPlatform;
use lkb_core::platform::Platform;
use lkb_core::status::RunEvent;
use lkb_core::types::*;

/// Write `body` to a temp file with the given extension.
pub fn source_file(ext: &str, body: &str) -> Result<tempfile::NamedTempFile> {
    let mut f = tempfile::Builder::new().suffix(&format!(".{}", ext)).tempfile()?;
    f.write_all(body.as_bytes())?;
    Ok(f)
}

/// A run config with every pause zeroed.
pub fn fast_config(source: &Path, start: usize, end: usize) -> RunConfig {
    RunConfig {
        source: source.to_path_buf(),
        start_row: start,
        end_row: end,
        key_delay: Duration::ZERO,
        row_delay: Duration::ZERO,
        start_delay: Duration::ZERO,
        wait_for_ready: false,
        target: TargetSpec::default(),
    }
}

/// Stub with the default target window open.
pub fn desktop() -> StubPlatform {
    StubPlatform::new().with_window(0x10, &TargetSpec::default().title)
}

/// Status lines and phases seen on a run's feed.
#[derive(Debug, Default)]
pub struct Feed {
    pub statuses: Vec<String>,
    pub phases: Vec<RunPhase>,
}

impl Feed {
    pub fn drain(rx: &mpsc::Receiver<RunEvent>) -> Self {
        let mut feed = Feed::default();
        for event in rx.try_iter() {
            match event {
                RunEvent::Status(s) => feed.statuses.push(s),
                RunEvent::Phase(p) => feed.phases.push(p),
            }
        }
        feed
    }

    pub fn has(&self, msg: &str) -> bool {
        self.statuses.iter().any(|s| s == msg)
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.statuses.iter().filter(|s| s.starts_with(prefix)).count()
    }
}

/// Delegates to a stub but panics when asked to send `seq`.
pub struct Exploding {
    pub inner: StubPlatform,
    pub seq: &'static str,
}

impl Platform for Exploding {
    fn find_window(&self, title: &str) -> Result<Option<WindowId>> {
        self.inner.find_window(title)
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        self.inner.list_windows()
    }

    fn restore_and_focus(&self, id: WindowId) -> Result<()> {
        self.inner.restore_and_focus(id)
    }

    fn cursor_busy(&self) -> Result<bool> {
        self.inner.cursor_busy()
    }

    fn supports_busy_probe(&self) -> bool {
        self.inner.supports_busy_probe()
    }

    fn set_clipboard(&self, text: &str) -> Result<()> {
        self.inner.set_clipboard(text)
    }

    fn send_keys(&self, seq: &str) -> Result<()> {
        if seq == self.seq {
            panic!("input backend crashed on {}", seq);
        }
        self.inner.send_keys(seq)
    }
}
