//! End-to-end runs against the stub platform.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use libtest_mimic::{Arguments, Failed, Trial};

use lkb_core::error::RunError;
use lkb_core::platform::stub::{StubEvent, StubPlatform};
use lkb_core::runner::{self, RunController, RunOutcome};
use lkb_core::status::{NullSink, RunEvent};
use lkb_core::types::RunPhase;
use lkb_test::*;

fn check(cond: bool, what: &str) -> Result<(), Failed> {
    if cond {
        Ok(())
    } else {
        Err(what.into())
    }
}

fn single_data_row() -> Result<(), Failed> {
    let src = source_file("csv", "code,date,amount\n4101,01/02/2024,1500000\n")?;
    let platform = desktop();
    let journal = platform.journal();
    let (tx, rx) = mpsc::channel();

    let outcome = RunController::new(fast_config(src.path(), 2, 2), Box::new(platform))?.run(&tx);
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Done { processed: 1, skipped: 0 }), "one row processed")?;
    check(journal.clipboard().len() == 18, "18 pastes")?;
    check(journal.clipboard()[..3] == ["4101", "01/02/2024", "1500000"], "cells pasted in column order")?;
    check(journal.keys().len() == 18 + 37 + 6, "full script injected once")?;
    check(feed.count_prefix("All done.") == 1, "completion reported once")?;
    check(feed.phases.last() == Some(&RunPhase::Done), "ends Done")
}

fn range_past_the_end() -> Result<(), Failed> {
    let src = source_file("csv", "header\n4101\n")?;
    let (tx, rx) = mpsc::channel();

    let outcome = RunController::new(fast_config(src.path(), 2, 5), Box::new(desktop()))?.run(&tx);
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Done { processed: 1, skipped: 3 }), "row 2 processed, 3 skipped")?;
    for row in 3..=5 {
        check(feed.has(&format!("Skipping row {}: not in source", row)), "skip notice per missing row")?;
    }
    check(!feed.has("Processing row 3..."), "missing rows never reach the script")
}

fn stop_during_countdown() -> Result<(), Failed> {
    let src = source_file("csv", "a\nb\n")?;
    let platform = desktop();
    let journal = platform.journal();
    let mut cfg = fast_config(src.path(), 1, 2);
    cfg.start_delay = Duration::from_secs(10);

    let (tx, rx) = mpsc::channel();
    let handle = runner::spawn(RunController::new(cfg, Box::new(platform))?, Arc::new(tx));
    loop {
        match rx.recv_timeout(Duration::from_secs(5))? {
            RunEvent::Phase(RunPhase::CountingDown) => break,
            _ => continue,
        }
    }
    handle.stop();
    let outcome = handle.join();

    check(matches!(outcome, RunOutcome::Stopped { processed: 0 }), "stopped with zero rows")?;
    check(journal.keys().is_empty(), "no keys injected")?;
    check(journal.clipboard().is_empty(), "clipboard untouched")
}

fn unsupported_source() -> Result<(), Failed> {
    let src = source_file("txt", "4101\n")?;
    let platform = desktop();
    let journal = platform.journal();
    let (tx, rx) = mpsc::channel();

    let outcome = RunController::new(fast_config(src.path(), 1, 1), Box::new(platform))?.run(&tx);
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Failed(RunError::Source(_))), "fails at loading")?;
    check(journal.count(|e| matches!(e, StubEvent::FindWindow(_))) == 0, "no acquisition attempt")?;
    check(feed.count_prefix("Starting in") == 0, "no countdown")?;
    check(feed.phases == [RunPhase::Loading, RunPhase::Failed], "loading then failed")
}

fn row_failure_aborts_the_run() -> Result<(), Failed> {
    let src = source_file("csv", "a\nb\nc\n")?;
    let (tx, rx) = mpsc::channel();
    let platform = Exploding { inner: desktop(), seq: "{F4}" };

    let outcome = RunController::new(fast_config(src.path(), 1, 3), Box::new(platform))?.run(&tx);
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Failed(RunError::Row { row: 1, .. })), "fails at row 1")?;
    check(feed.count_prefix("Error on row 1:") == 1, "error reported")?;
    check(!feed.has("Processing row 2..."), "remaining rows abandoned")?;
    check(feed.count_prefix("All done.") == 0, "no completion message")
}

fn waits_while_busy() -> Result<(), Failed> {
    let src = source_file("csv", "a\n")?;
    let mut cfg = fast_config(src.path(), 1, 1);
    cfg.wait_for_ready = true;
    let (tx, rx) = mpsc::channel();

    let outcome = RunController::new(cfg, Box::new(desktop().busy_for(3)))?.run(&tx);
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Done { processed: 1, .. }), "row processed")?;
    check(feed.has("Waiting for the target application to respond..."), "wait reported")?;
    check(feed.has("Target application ready, continuing"), "resume reported")
}

fn stop_mid_row() -> Result<(), Failed> {
    let src = source_file("csv", "a\nb\n")?;
    let platform = desktop();
    let journal = platform.journal();
    let mut cfg = fast_config(src.path(), 1, 2);
    cfg.key_delay = Duration::from_millis(40);

    let (tx, rx) = mpsc::channel();
    let handle = runner::spawn(RunController::new(cfg, Box::new(platform))?, Arc::new(tx));
    loop {
        if let RunEvent::Status(s) = rx.recv_timeout(Duration::from_secs(5))? {
            if s == "Processing row 1..." {
                break;
            }
        }
    }
    std::thread::sleep(Duration::from_millis(200));
    handle.stop();
    let outcome = handle.join();
    let sent = journal.keys().len();
    std::thread::sleep(Duration::from_millis(100));

    check(matches!(outcome, RunOutcome::Stopped { processed: 0 }), "partial row is not counted")?;
    check(sent > 0 && sent < 61, "row cut short")?;
    check(journal.keys().len() == sent, "nothing fires after stop")
}

fn stop_in_final_row_delay() -> Result<(), Failed> {
    let src = source_file("csv", "a\n")?;
    let mut cfg = fast_config(src.path(), 1, 1);
    cfg.row_delay = Duration::from_secs(5);

    let (tx, rx) = mpsc::channel();
    let handle = runner::spawn(RunController::new(cfg, Box::new(desktop()))?, Arc::new(tx));
    loop {
        if let RunEvent::Status(s) = rx.recv_timeout(Duration::from_secs(5))? {
            if s == "Finished row 1" {
                break;
            }
        }
    }
    handle.stop();
    let outcome = handle.join();
    let feed = Feed::drain(&rx);

    check(matches!(outcome, RunOutcome::Stopped { processed: 1 }), "stopped, not done")?;
    check(feed.has("Stopped by user."), "stop reported")?;
    check(!feed.has("All done."), "no completion message")
}

fn stop_is_idempotent() -> Result<(), Failed> {
    let src = source_file("csv", "a\n")?;
    let handle = runner::spawn(
        RunController::new(fast_config(src.path(), 1, 1), Box::new(StubPlatform::new()))?,
        Arc::new(NullSink),
    );
    while !handle.is_finished() {
        std::thread::sleep(Duration::from_millis(20));
    }
    handle.stop();
    handle.stop();
    check(matches!(handle.join(), RunOutcome::Done { processed: 1, .. }), "finished run unaffected")
}

fn main() {
    let args = Arguments::from_args();
    let tests = vec![
        Trial::test("single_data_row", single_data_row),
        Trial::test("range_past_the_end", range_past_the_end),
        Trial::test("stop_during_countdown", stop_during_countdown),
        Trial::test("unsupported_source", unsupported_source),
        Trial::test("row_failure_aborts_the_run", row_failure_aborts_the_run),
        Trial::test("waits_while_busy", waits_while_busy),
        Trial::test("stop_mid_row", stop_mid_row),
        Trial::test("stop_in_final_row_delay", stop_in_final_row_delay),
        Trial::test("stop_is_idempotent", stop_is_idempotent),
    ];
    libtest_mimic::run(&args, tests).exit();
}
