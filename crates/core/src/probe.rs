use std::time::{Duration, Instant};

use crate::logger;
use crate::platform::Platform;
use crate::sleep::{self, StopFlag};
use crate::status::StatusSink;

/// Poll interval while the target shows a busy cursor.
pub const POLL: Duration = Duration::from_millis(100);
/// How often a long wait reports that it is still waiting.
pub const REPORT_EVERY: Duration = Duration::from_secs(5);

/// Coarse busy/ready signal of the target application.
pub struct ReadinessProbe<'a> {
    platform: &'a dyn Platform,
    enabled: bool,
}

impl<'a> ReadinessProbe<'a> {
    /// Disabled when not requested or when the platform cannot probe.
    pub fn new(platform: &'a dyn Platform, requested: bool) -> Self {
        Self { platform, enabled: requested && platform.supports_busy_probe() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Fail-open: a failed query counts as not busy.
    pub fn is_busy(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.platform.cursor_busy() {
            Ok(busy) => busy,
            Err(e) => {
                logger::warn_p("probe", &format!("cursor query failed, assuming ready: {}", e));
                false
            }
        }
    }

    /// Block (cancellably) while the target is busy.
    pub fn wait_until_ready(&self, stop: &StopFlag, sink: &dyn StatusSink) {
        if !self.enabled {
            return;
        }
        let started = Instant::now();
        let mut next_report = REPORT_EVERY;
        let mut waited = false;

        while !stop.is_set() && self.is_busy() {
            if !waited {
                sink.status("Waiting for the target application to respond...");
                waited = true;
            }
            sleep::sleep(POLL, stop);
            let elapsed = started.elapsed();
            if elapsed >= next_report {
                sink.status(&format!("Still waiting for the target application... {}s", elapsed.as_secs()));
                next_report += REPORT_EVERY;
            }
        }

        if waited && !stop.is_set() {
            sink.status("Target application ready, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::platform::stub::{StubEvent, StubPlatform};
    use crate::status::{NullSink, RunEvent};

    fn statuses(rx: &mpsc::Receiver<RunEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|e| match e {
                RunEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn disabled_probe_never_queries() {
        let stub = StubPlatform::new().busy_for(usize::MAX);
        let probe = ReadinessProbe::new(&stub, false);
        let started = Instant::now();
        assert!(!probe.is_busy());
        probe.wait_until_ready(&StopFlag::new(), &NullSink);
        assert!(started.elapsed() < Duration::from_millis(20));
        assert_eq!(stub.journal().count(|e| *e == StubEvent::CursorQuery), 0);
    }

    #[test]
    fn unsupported_platform_disables_probe() {
        let stub = StubPlatform::new().busy_for(usize::MAX).without_busy_probe();
        let probe = ReadinessProbe::new(&stub, true);
        assert!(!probe.enabled());
        assert!(!probe.is_busy());
    }

    #[test]
    fn query_failure_is_not_busy() {
        let stub = StubPlatform::new().failing_cursor();
        let probe = ReadinessProbe::new(&stub, true);
        assert!(!probe.is_busy());
    }

    #[test]
    fn waits_out_busy_polls_and_reports() {
        let stub = StubPlatform::new().busy_for(3);
        let probe = ReadinessProbe::new(&stub, true);
        let (tx, rx) = mpsc::channel();

        probe.wait_until_ready(&StopFlag::new(), &tx);

        assert_eq!(stub.journal().count(|e| *e == StubEvent::CursorQuery), 4);
        let msgs = statuses(&rx);
        assert_eq!(msgs.first().map(String::as_str), Some("Waiting for the target application to respond..."));
        assert_eq!(msgs.last().map(String::as_str), Some("Target application ready, continuing"));
    }

    #[test]
    fn stop_ends_wait_silently() {
        let stub = StubPlatform::new().busy_for(usize::MAX);
        let probe = ReadinessProbe::new(&stub, true);
        let stop = StopFlag::new();
        let remote = stop.clone();
        let (tx, rx) = mpsc::channel();

        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            remote.request();
        });
        let started = Instant::now();
        probe.wait_until_ready(&stop, &tx);
        waker.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!statuses(&rx).iter().any(|m| m.contains("ready")));
    }
}
