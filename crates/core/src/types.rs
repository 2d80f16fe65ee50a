use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Window identifier (HWND on Windows, synthetic in the stub)
pub type WindowId = u64;

/// One top-level window as seen by a live enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub visible: bool,
}

/// One record of the row source. Columns are addressed 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at 1-based column `col`; anything out of range reads as empty.
    pub fn cell(&self, col: usize) -> &str {
        col.checked_sub(1)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Canonical, platform-independent key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    Tab,
    Enter,
    Esc,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Space,
    F(FunctionKey),
    Char(char),
}

/// F1 through F12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionKey {
    F1 = 1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl FunctionKey {
    pub const ALL: [FunctionKey; 12] = [
        FunctionKey::F1, FunctionKey::F2, FunctionKey::F3, FunctionKey::F4,
        FunctionKey::F5, FunctionKey::F6, FunctionKey::F7, FunctionKey::F8,
        FunctionKey::F9, FunctionKey::F10, FunctionKey::F11, FunctionKey::F12,
    ];

    /// 1..=12
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<FunctionKey> {
        Self::ALL.iter().copied().find(|f| f.number() == n)
    }
}

impl LogicalKey {
    /// Token in the injection grammar (see `keyseq`).
    pub fn token(&self) -> String {
        match self {
            LogicalKey::Tab => "{TAB}".into(),
            LogicalKey::Enter => "{ENTER}".into(),
            LogicalKey::Esc => "{ESC}".into(),
            LogicalKey::Up => "{UP}".into(),
            LogicalKey::Down => "{DOWN}".into(),
            LogicalKey::Left => "{LEFT}".into(),
            LogicalKey::Right => "{RIGHT}".into(),
            LogicalKey::PageUp => "{PGUP}".into(),
            LogicalKey::PageDown => "{PGDN}".into(),
            LogicalKey::Space => " ".into(),
            LogicalKey::F(f) => format!("{{F{}}}", f.number()),
            LogicalKey::Char(c) => crate::keyseq::escape_char(*c),
        }
    }

    /// Canonical lower-case name, also used as the unbracketed raw fallback.
    pub fn name(&self) -> String {
        match self {
            LogicalKey::Tab => "tab".into(),
            LogicalKey::Enter => "enter".into(),
            LogicalKey::Esc => "esc".into(),
            LogicalKey::Up => "up".into(),
            LogicalKey::Down => "down".into(),
            LogicalKey::Left => "left".into(),
            LogicalKey::Right => "right".into(),
            LogicalKey::PageUp => "pageup".into(),
            LogicalKey::PageDown => "pagedown".into(),
            LogicalKey::Space => "space".into(),
            LogicalKey::F(f) => format!("f{}", f.number()),
            LogicalKey::Char(c) => c.to_string(),
        }
    }

    /// Name inside `{...}` in the injection grammar.
    pub(crate) fn from_brace_name(name: &str) -> Option<LogicalKey> {
        let key = match name.to_ascii_uppercase().as_str() {
            "TAB" => LogicalKey::Tab,
            "ENTER" => LogicalKey::Enter,
            "ESC" => LogicalKey::Esc,
            "UP" => LogicalKey::Up,
            "DOWN" => LogicalKey::Down,
            "LEFT" => LogicalKey::Left,
            "RIGHT" => LogicalKey::Right,
            "PGUP" => LogicalKey::PageUp,
            "PGDN" => LogicalKey::PageDown,
            "SPACE" => LogicalKey::Space,
            other => return parse_function_key(other).map(LogicalKey::F),
        };
        Some(key)
    }
}

fn parse_function_key(name: &str) -> Option<FunctionKey> {
    let digits = name.strip_prefix('F').or_else(|| name.strip_prefix('f'))?;
    digits.parse::<u8>().ok().and_then(FunctionKey::from_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Win,
}

impl Modifier {
    /// Prefix in the injection grammar. `Win` has none.
    pub fn prefix(&self) -> Option<char> {
        match self {
            Modifier::Ctrl => Some('^'),
            Modifier::Shift => Some('+'),
            Modifier::Alt => Some('%'),
            Modifier::Win => None,
        }
    }
}

/// A normalized key name: either a modifier or a key that can be pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Modifier(Modifier),
    Key(LogicalKey),
}

impl From<LogicalKey> for KeyName {
    fn from(key: LogicalKey) -> Self {
        KeyName::Key(key)
    }
}

impl From<Modifier> for KeyName {
    fn from(m: Modifier) -> Self {
        KeyName::Modifier(m)
    }
}

/// One step of input sent to the target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Paste(String),
    Press { key: LogicalKey, count: u32 },
    Hotkey(Vec<KeyName>),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Paste(text) => write!(f, "paste({:?})", text),
            Action::Press { key, count } if *count == 1 => write!(f, "press({})", key.name()),
            Action::Press { key, count } => write!(f, "press({} x{})", key.name(), count),
            Action::Hotkey(keys) => {
                let names: Vec<String> = keys
                    .iter()
                    .map(|k| match k {
                        KeyName::Modifier(m) => format!("{:?}", m).to_lowercase(),
                        KeyName::Key(k) => k.name(),
                    })
                    .collect();
                write!(f, "hotkey({})", names.join("+"))
            }
        }
    }
}

/// How the target window is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Exact window title.
    pub title: String,
    /// Fuzzy fallback: all of these must appear in the title...
    pub required: Vec<String>,
    /// ...plus at least one of these (ignored when empty).
    pub any_of: Vec<String>,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            title: "Các ứng dụng Oracle - Môi trường sản xuất TABMIS 2018".into(),
            required: vec!["TABMIS".into()],
            any_of: vec!["Oracle".into(), "Môi trường".into()],
        }
    }
}

/// Validated, immutable parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source: PathBuf,
    /// First row to process, 1-based.
    pub start_row: usize,
    /// Last row to process, inclusive.
    pub end_row: usize,
    pub key_delay: Duration,
    pub row_delay: Duration,
    pub start_delay: Duration,
    pub wait_for_ready: bool,
    pub target: TargetSpec,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;

        if self.source.as_os_str().is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if self.start_row < 1 {
            return Err(ConfigError::RowOutOfRange { field: "start row", value: self.start_row });
        }
        if self.end_row < 1 {
            return Err(ConfigError::RowOutOfRange { field: "end row", value: self.end_row });
        }
        if self.end_row < self.start_row {
            return Err(ConfigError::InvertedRange { start: self.start_row, end: self.end_row });
        }
        Ok(())
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Loading,
    Acquiring,
    CountingDown,
    Running(usize),
    Done,
    Stopped,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Stopped | RunPhase::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_is_one_based_and_total() {
        let row: Row = ["a", "b"].into_iter().collect();
        assert_eq!(row.cell(1), "a");
        assert_eq!(row.cell(2), "b");
        assert_eq!(row.cell(3), "");
        assert_eq!(row.cell(0), "");
    }

    #[test]
    fn function_keys_are_bounded() {
        assert_eq!(FunctionKey::from_number(4), Some(FunctionKey::F4));
        assert_eq!(FunctionKey::from_number(0), None);
        assert_eq!(FunctionKey::from_number(13), None);
        for (i, f) in FunctionKey::ALL.iter().enumerate() {
            assert_eq!(usize::from(f.number()), i + 1);
        }
        assert_eq!(LogicalKey::from_brace_name("F13"), None);
        assert_eq!(LogicalKey::from_brace_name("F0"), None);
    }

    #[test]
    fn tokens_bracket_named_keys() {
        assert_eq!(LogicalKey::Tab.token(), "{TAB}");
        assert_eq!(LogicalKey::PageDown.token(), "{PGDN}");
        assert_eq!(LogicalKey::F(FunctionKey::F4).token(), "{F4}");
        assert_eq!(LogicalKey::Space.token(), " ");
        assert_eq!(LogicalKey::Char('s').token(), "s");
        assert_eq!(LogicalKey::Char('+').token(), "{+}");
    }

    #[test]
    fn every_named_token_reads_back() {
        let keys = [
            LogicalKey::Tab, LogicalKey::Enter, LogicalKey::Esc, LogicalKey::Up,
            LogicalKey::Down, LogicalKey::Left, LogicalKey::Right, LogicalKey::PageUp,
            LogicalKey::PageDown,
        ];
        for key in keys.into_iter().chain(FunctionKey::ALL.map(LogicalKey::F)) {
            let token = key.token();
            let inner = token.trim_start_matches('{').trim_end_matches('}');
            assert_eq!(LogicalKey::from_brace_name(inner), Some(key), "{}", token);
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let cfg = RunConfig {
            source: "rows.csv".into(),
            start_row: 5,
            end_row: 2,
            key_delay: Duration::ZERO,
            row_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            wait_for_ready: false,
            target: TargetSpec::default(),
        };
        assert!(matches!(
            cfg.validate(),
            Err(crate::error::ConfigError::InvertedRange { start: 5, end: 2 })
        ));
    }
}
