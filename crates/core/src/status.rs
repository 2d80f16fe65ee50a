use std::sync::mpsc;

use crate::types::RunPhase;

/// One item on the worker -> driver progress feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Status(String),
    Phase(RunPhase),
}

/// Receives progress from the worker. Purely observational.
pub trait StatusSink: Send + Sync {
    fn status(&self, msg: &str);

    fn phase(&self, _phase: RunPhase) {}
}

impl StatusSink for mpsc::Sender<RunEvent> {
    fn status(&self, msg: &str) {
        self.send(RunEvent::Status(msg.to_string())).ok();
    }

    fn phase(&self, phase: RunPhase) {
        self.send(RunEvent::Phase(phase)).ok();
    }
}

/// Drops everything.
pub struct NullSink;

impl StatusSink for NullSink {
    fn status(&self, _msg: &str) {}
}
