use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{ConfigError, RunError};
use crate::keys::Injector;
use crate::logger;
use crate::platform::Platform;
use crate::script::{self, RowResult};
use crate::sleep::{self, StopFlag};
use crate::source;
use crate::status::StatusSink;
use crate::target;
use crate::types::*;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Done { processed: usize, skipped: usize },
    Stopped { processed: usize },
    Failed(RunError),
}

impl RunOutcome {
    pub fn phase(&self) -> RunPhase {
        match self {
            RunOutcome::Done { .. } => RunPhase::Done,
            RunOutcome::Stopped { .. } => RunPhase::Stopped,
            RunOutcome::Failed(_) => RunPhase::Failed,
        }
    }
}

/// Owns everything one run needs. Built on the driving thread, consumed
/// by the worker.
pub struct RunController {
    config: RunConfig,
    platform: Box<dyn Platform>,
    stop: StopFlag,
}

impl RunController {
    pub fn new(config: RunConfig, platform: Box<dyn Platform>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, platform, stop: StopFlag::new() })
    }

    /// Handle for requesting a stop from another thread.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn run(self, sink: &dyn StatusSink) -> RunOutcome {
        logger::info_p(
            "run",
            &format!(
                "run started: {} rows {}..={}",
                self.config.source.display(),
                self.config.start_row,
                self.config.end_row
            ),
        );
        let outcome = self.execute(sink);
        match &outcome {
            RunOutcome::Done { processed, skipped } => {
                logger::info_p("run", &format!("done: {} processed, {} skipped", processed, skipped))
            }
            RunOutcome::Stopped { processed } => logger::info_p("run", &format!("stopped after {} rows", processed)),
            RunOutcome::Failed(e) => logger::error_p("run", &format!("failed: {}", e)),
        }
        sink.phase(outcome.phase());
        outcome
    }

    fn execute(&self, sink: &dyn StatusSink) -> RunOutcome {
        let stop = &self.stop;
        let cfg = &self.config;

        sink.phase(RunPhase::Loading);
        let rows = match source::load_rows(&cfg.source) {
            Ok(rows) => rows,
            Err(e) => {
                sink.status(&format!("Error: {}", e));
                return RunOutcome::Failed(e.into());
            }
        };
        report(sink, &format!("Loaded {} rows", rows.len()));
        if stop.is_set() {
            return stopped(sink, "Stopped before start.", 0);
        }

        sink.phase(RunPhase::Acquiring);
        if target::focus(self.platform.as_ref(), &cfg.target, stop, sink).is_none() {
            if stop.is_set() {
                return stopped(sink, "Stopped before start.", 0);
            }
            sink.status("Could not find the target window, continuing with the current foreground window");
            logger::warn_p("run", "target window not found");
        }
        if cfg.wait_for_ready && !self.platform.supports_busy_probe() {
            sink.status("Readiness waiting is not available here, keys are paced by delays only");
            logger::warn_p("run", "busy-cursor probe unsupported on this platform");
        }

        sink.phase(RunPhase::CountingDown);
        let seconds = cfg.start_delay.as_secs();
        for n in (1..=seconds).rev() {
            if stop.is_set() {
                break;
            }
            sink.status(&format!("Starting in {}...", n));
            sleep::sleep(Duration::from_secs(1), stop);
        }
        if stop.is_set() {
            return stopped(sink, "Stopped before start.", 0);
        }

        let injector = Injector::new(self.platform.as_ref(), stop, sink, cfg.key_delay, cfg.wait_for_ready);
        let mut processed = 0;
        let mut skipped = 0;

        for i in cfg.start_row..=cfg.end_row {
            if stop.is_set() {
                return stopped(sink, "Stopped by user.", processed);
            }
            sink.phase(RunPhase::Running(i));
            let Some(row) = rows.get(i - 1) else {
                report(sink, &format!("Skipping row {}: not in source", i));
                skipped += 1;
                continue;
            };

            report(sink, &format!("Processing row {}...", i));
            match panic::catch_unwind(AssertUnwindSafe(|| script::run_row(&injector, row, stop))) {
                Ok(RowResult::Completed { dropped }) => {
                    processed += 1;
                    if dropped == 0 {
                        report(sink, &format!("Finished row {}", i));
                    } else {
                        report(sink, &format!("Finished row {} ({} inputs dropped)", i, dropped));
                    }
                    sleep::sleep(cfg.row_delay, stop);
                }
                Ok(RowResult::Stopped) => return stopped(sink, "Stopped by user.", processed),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    sink.status(&format!("Error on row {}: {}", i, message));
                    return RunOutcome::Failed(RunError::Row { row: i, message });
                }
            }
        }

        if stop.is_set() {
            return stopped(sink, "Stopped by user.", processed);
        }
        report(sink, "All done.");
        RunOutcome::Done { processed, skipped }
    }
}

fn report(sink: &dyn StatusSink, msg: &str) {
    logger::info_p("run", msg);
    sink.status(msg);
}

fn stopped(sink: &dyn StatusSink, msg: &str, processed: usize) -> RunOutcome {
    report(sink, msg);
    RunOutcome::Stopped { processed }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A run on its own worker thread.
pub struct RunHandle {
    stop: StopFlag,
    thread: Option<JoinHandle<RunOutcome>>,
}

pub fn spawn(controller: RunController, sink: Arc<dyn StatusSink>) -> RunHandle {
    let stop = controller.stop_flag();
    let thread = thread::spawn(move || controller.run(sink.as_ref()));
    RunHandle { stop, thread: Some(thread) }
}

impl RunHandle {
    /// Request a stop. Safe to call any number of times, also after the
    /// run has finished.
    pub fn stop(&self) {
        if self.stop.request() {
            logger::info_p("run", "stop requested");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    pub fn join(mut self) -> RunOutcome {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(outcome)) => outcome,
            Some(Err(payload)) => RunOutcome::Failed(RunError::Worker(panic_message(payload.as_ref()))),
            None => RunOutcome::Failed(RunError::Worker("already joined".to_string())),
        }
    }
}
