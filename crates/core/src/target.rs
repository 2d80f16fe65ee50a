use std::time::{Duration, Instant};

use anyhow::Result;

use crate::logger;
use crate::platform::Platform;
use crate::sleep::{self, StopFlag};
use crate::status::StatusSink;
use crate::types::*;

/// How long the exact-title connect keeps retrying.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRY: Duration = Duration::from_millis(100);
/// Pause after a successful focus so the window settles.
pub const SETTLE: Duration = Duration::from_millis(500);

/// Ways of locating the target window, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExactConnect,
    ExactEnumeration,
    Fuzzy,
}

pub const STRATEGIES: [Strategy; 3] = [Strategy::ExactConnect, Strategy::ExactEnumeration, Strategy::Fuzzy];

impl Strategy {
    fn locate(&self, platform: &dyn Platform, target: &TargetSpec, stop: &StopFlag) -> Result<Option<WindowId>> {
        match self {
            Strategy::ExactConnect => {
                let deadline = Instant::now() + CONNECT_TIMEOUT;
                loop {
                    if let Some(id) = platform.find_window(&target.title)? {
                        return Ok(Some(id));
                    }
                    if stop.is_set() || Instant::now() >= deadline {
                        return Ok(None);
                    }
                    sleep::sleep(CONNECT_RETRY, stop);
                }
            }
            Strategy::ExactEnumeration => Ok(platform
                .list_windows()?
                .into_iter()
                .find(|w| w.visible && w.title.contains(&target.title))
                .map(|w| w.id)),
            Strategy::Fuzzy => Ok(platform
                .list_windows()?
                .into_iter()
                .find(|w| w.visible && fuzzy_match(target, &w.title))
                .map(|w| w.id)),
        }
    }
}

/// All `required` tokens, plus one of `any_of` when that list is non-empty.
pub fn fuzzy_match(target: &TargetSpec, title: &str) -> bool {
    if target.required.is_empty() && target.any_of.is_empty() {
        return false;
    }
    target.required.iter().all(|t| title.contains(t.as_str()))
        && (target.any_of.is_empty() || target.any_of.iter().any(|t| title.contains(t.as_str())))
}

/// Find the target window and bring it to the foreground.
/// Returns the strategy that worked, or None when every one failed.
pub fn focus(platform: &dyn Platform, target: &TargetSpec, stop: &StopFlag, sink: &dyn StatusSink) -> Option<Strategy> {
    for strategy in STRATEGIES {
        if stop.is_set() {
            return None;
        }
        let attempt = strategy
            .locate(platform, target, stop)
            .and_then(|found| match found {
                Some(id) => platform.restore_and_focus(id).map(|_| Some(id)),
                None => Ok(None),
            });
        match attempt {
            Ok(Some(id)) => {
                logger::info_p("target", &format!("{:?} matched window {:#x}", strategy, id));
                if strategy == Strategy::Fuzzy {
                    sink.status("Focused the target window (fuzzy match)");
                } else {
                    sink.status("Focused the target window");
                }
                sleep::sleep(SETTLE, stop);
                return Some(strategy);
            }
            Ok(None) => logger::info_p("target", &format!("{:?}: no match", strategy)),
            Err(e) => logger::warn_p("target", &format!("{:?} failed: {}", strategy, e)),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::stub::{StubEvent, StubPlatform};
    use crate::status::NullSink;

    fn spec() -> TargetSpec {
        TargetSpec {
            title: "Oracle Applications - TABMIS".into(),
            required: vec!["TABMIS".into()],
            any_of: vec!["Oracle".into(), "Môi trường".into()],
        }
    }

    #[test]
    fn exact_title_connects_first() {
        let stub = StubPlatform::new().with_window(7, "Oracle Applications - TABMIS");
        let got = focus(&stub, &spec(), &StopFlag::new(), &NullSink);
        assert_eq!(got, Some(Strategy::ExactConnect));
        assert_eq!(stub.journal().count(|e| *e == StubEvent::ListWindows), 0);
        assert_eq!(stub.journal().count(|e| *e == StubEvent::Focus(7)), 1);
    }

    #[test]
    fn enumeration_matches_containing_title() {
        let stub = StubPlatform::new()
            .with_hidden_window(1, "Oracle Applications - TABMIS [hidden]")
            .with_window(2, "Oracle Applications - TABMIS [Form]");
        let stop = StopFlag::new();
        let started = Instant::now();
        let got = focus(&stub, &spec(), &stop, &NullSink);
        assert_eq!(got, Some(Strategy::ExactEnumeration));
        assert!(started.elapsed() >= CONNECT_TIMEOUT);
        assert_eq!(stub.journal().count(|e| *e == StubEvent::Focus(2)), 1);
    }

    #[test]
    fn fuzzy_tokens_are_the_last_resort() {
        let stub = StubPlatform::new().with_window(3, "TABMIS 2018 - Môi trường sản xuất");
        let got = focus(&stub, &spec(), &StopFlag::new(), &NullSink);
        assert_eq!(got, Some(Strategy::Fuzzy));
    }

    #[test]
    fn no_window_is_a_soft_failure() {
        let stub = StubPlatform::new().with_window(4, "Notepad");
        assert_eq!(focus(&stub, &spec(), &StopFlag::new(), &NullSink), None);
    }

    #[test]
    fn stop_skips_remaining_strategies() {
        let stub = StubPlatform::new();
        let stop = StopFlag::new();
        stop.request();
        assert_eq!(focus(&stub, &spec(), &stop, &NullSink), None);
        assert!(stub.journal().events().is_empty());
    }

    #[test]
    fn fuzzy_rules() {
        let t = spec();
        assert!(fuzzy_match(&t, "TABMIS Oracle"));
        assert!(!fuzzy_match(&t, "TABMIS"));
        assert!(!fuzzy_match(&t, "Oracle only"));
        let loose = TargetSpec { any_of: vec![], ..spec() };
        assert!(fuzzy_match(&loose, "TABMIS"));
        let empty = TargetSpec { required: vec![], any_of: vec![], ..spec() };
        assert!(!fuzzy_match(&empty, "anything"));
    }
}
