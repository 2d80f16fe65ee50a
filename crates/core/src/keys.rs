use std::time::Duration;

use crate::keyseq;
use crate::logger;
use crate::platform::Platform;
use crate::probe::ReadinessProbe;
use crate::sleep::{self, StopFlag};
use crate::status::StatusSink;
use crate::types::*;

/// Paste combination.
pub const PASTE_SEQ: &str = "^v";
/// Longest wait for the clipboard to settle before pasting.
const CLIPBOARD_SETTLE: Duration = Duration::from_millis(100);
const CHAR_PAUSE_MS: u64 = 5;
const COMBO_PAUSE_MS: u64 = 20;

/// Outcome of one injection attempt. Says nothing about whether the
/// target application reacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    FellBack,
    Dropped,
    Skipped,
}

impl Delivery {
    /// Combine outcomes of the parts of one action; the worst wins.
    fn and(self, other: Delivery) -> Delivery {
        use Delivery::*;
        match (self, other) {
            (Skipped, _) | (_, Skipped) => Skipped,
            (Dropped, _) | (_, Dropped) => Dropped,
            (FellBack, _) | (_, FellBack) => FellBack,
            _ => Sent,
        }
    }
}

/// Executes actions against the platform, gated by the readiness probe
/// and paced by the key delay. Never fails outward.
pub struct Injector<'a> {
    platform: &'a dyn Platform,
    probe: ReadinessProbe<'a>,
    stop: &'a StopFlag,
    sink: &'a dyn StatusSink,
    key_delay: Duration,
}

impl<'a> Injector<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        stop: &'a StopFlag,
        sink: &'a dyn StatusSink,
        key_delay: Duration,
        wait_for_ready: bool,
    ) -> Self {
        Self {
            platform,
            probe: ReadinessProbe::new(platform, wait_for_ready),
            stop,
            sink,
            key_delay,
        }
    }

    pub fn execute(&self, action: &Action) -> Delivery {
        match action {
            Action::Paste(text) => self.paste(text),
            Action::Press { key, count } => self.press(*key, *count),
            Action::Hotkey(keys) => self.hotkey(keys),
        }
    }

    /// Stage `text` on the clipboard and paste it; types it out when
    /// the clipboard or the paste combination fails.
    pub fn paste(&self, text: &str) -> Delivery {
        if self.stop.is_set() {
            return Delivery::Skipped;
        }
        self.probe.wait_until_ready(self.stop, self.sink);

        let staged = match self.platform.set_clipboard(text) {
            Ok(()) => true,
            Err(e) => {
                logger::warn_p("keys", &format!("clipboard failed, typing instead: {}", e));
                false
            }
        };

        let mut delivery = Delivery::Sent;
        if staged {
            sleep::sleep(CLIPBOARD_SETTLE.min(self.key_delay / 4), self.stop);
            if self.stop.is_set() {
                return Delivery::Skipped;
            }
            if let Err(e) = self.platform.send_keys(PASTE_SEQ) {
                logger::warn_p("keys", &format!("paste failed, typing instead: {}", e));
                delivery = self.type_text(text);
            }
        } else {
            delivery = self.type_text(text);
        }

        sleep::sleep(self.key_delay, self.stop);
        delivery
    }

    /// Character-by-character fallback for `paste`.
    fn type_text(&self, text: &str) -> Delivery {
        for ch in text.chars() {
            if self.stop.is_set() {
                return Delivery::Skipped;
            }
            if let Err(e) = self.platform.send_keys(&keyseq::escape_char(ch)) {
                logger::warn_p("keys", &format!("typing {:?} failed, dropping the rest: {}", ch, e));
                return Delivery::Dropped;
            }
            sleep::sleep_ms(CHAR_PAUSE_MS, self.stop);
        }
        Delivery::FellBack
    }

    /// Press `key` `count` times, each followed by the key delay.
    pub fn press(&self, key: LogicalKey, count: u32) -> Delivery {
        let token = key.token();
        let mut delivery = Delivery::Sent;
        for _ in 0..count {
            if self.stop.is_set() {
                return Delivery::Skipped;
            }
            self.probe.wait_until_ready(self.stop, self.sink);
            delivery = delivery.and(self.inject(&token, &key.name()));
            sleep::sleep(self.key_delay, self.stop);
        }
        delivery
    }

    /// Modifiers are folded into one prefix per main key, e.g.
    /// `[ctrl, s]` -> `^s`, `[shift, pagedown]` -> `+{PGDN}`.
    pub fn hotkey(&self, keys: &[KeyName]) -> Delivery {
        if self.stop.is_set() {
            return Delivery::Skipped;
        }
        self.probe.wait_until_ready(self.stop, self.sink);

        let mut prefix = String::new();
        let mut mains: Vec<LogicalKey> = Vec::new();
        for k in keys {
            match k {
                KeyName::Modifier(m) => match m.prefix() {
                    Some(p) if !prefix.contains(p) => prefix.push(p),
                    Some(_) => {}
                    None => logger::warn_p("keys", &format!("{:?} cannot be injected as a modifier, ignored", m)),
                },
                KeyName::Key(key) => mains.push(*key),
            }
        }

        if mains.is_empty() {
            let delivery = match self.platform.send_keys(&prefix) {
                Ok(()) => Delivery::Sent,
                Err(e) => {
                    logger::warn_p("keys", &format!("modifier-only hotkey {:?} dropped: {}", prefix, e));
                    Delivery::Dropped
                }
            };
            sleep::sleep(self.key_delay, self.stop);
            return delivery;
        }

        let mut delivery = Delivery::Sent;
        for key in mains {
            if self.stop.is_set() {
                return Delivery::Skipped;
            }
            let seq = format!("{}{}", prefix, key.token());
            let raw = format!("{}{}", prefix, key.name());
            delivery = delivery.and(self.inject(&seq, &raw));
            sleep::sleep_ms(COMBO_PAUSE_MS, self.stop);
        }
        sleep::sleep(self.key_delay, self.stop);
        delivery
    }

    /// Send `seq`; on failure try `raw` once, then give up.
    fn inject(&self, seq: &str, raw: &str) -> Delivery {
        let Err(first) = self.platform.send_keys(seq) else {
            return Delivery::Sent;
        };
        logger::warn_p("keys", &format!("{:?} failed ({}), retrying as {:?}", seq, first, raw));
        match self.platform.send_keys(raw) {
            Ok(()) => Delivery::FellBack,
            Err(e) => {
                logger::warn_p("keys", &format!("{:?} dropped: {}", raw, e));
                Delivery::Dropped
            }
        }
    }
}
