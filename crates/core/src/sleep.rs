use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep. A stop request is noticed within one slice.
pub const SLICE: Duration = Duration::from_millis(20);

/// Cooperative cancellation shared by the driver and the worker.
/// Monotonic: once requested it stays set for the lifetime of the run.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns true only for the call that flipped the flag.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sleep for `dur`, returning early once `stop` is set.
pub fn sleep(dur: Duration, stop: &StopFlag) {
    let deadline = Instant::now() + dur;
    loop {
        if stop.is_set() {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(SLICE));
    }
}

/// Sleep for `secs` seconds; negative or non-finite values do not sleep.
pub fn sleep_secs(secs: f64, stop: &StopFlag) {
    if secs.is_finite() && secs > 0.0 {
        sleep(Duration::from_secs_f64(secs), stop);
    }
}

/// Sleep for exact milliseconds, cancellable.
pub fn sleep_ms(ms: u64, stop: &StopFlag) {
    sleep(Duration::from_millis(ms), stop);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_monotonic_and_idempotent() {
        let stop = StopFlag::new();
        assert!(!stop.is_set());
        assert!(stop.request());
        assert!(!stop.request());
        assert!(stop.clone().is_set());
    }

    #[test]
    fn sleep_runs_full_duration_without_stop() {
        let stop = StopFlag::new();
        let started = Instant::now();
        sleep(Duration::from_millis(60), &stop);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn sleep_exits_within_a_slice_of_stop() {
        let stop = StopFlag::new();
        let remote = stop.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.request();
            Instant::now()
        });

        let started = Instant::now();
        sleep(Duration::from_secs(10), &stop);
        let returned = Instant::now();
        let requested = waker.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(returned.saturating_duration_since(requested) <= SLICE * 5);
    }

    #[test]
    fn already_stopped_returns_immediately() {
        let stop = StopFlag::new();
        stop.request();
        let started = Instant::now();
        sleep_secs(5.0, &stop);
        assert!(started.elapsed() < SLICE);
    }

    #[test]
    fn nonsense_durations_do_not_sleep() {
        let stop = StopFlag::new();
        let started = Instant::now();
        sleep_secs(-1.0, &stop);
        sleep_secs(f64::NAN, &stop);
        assert!(started.elapsed() < SLICE);
    }
}
