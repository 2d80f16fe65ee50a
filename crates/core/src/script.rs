//! The data-entry script: one row of the source becomes one fixed pass
//! through the target form.

use crate::keys::{Delivery, Injector};
use crate::logger;
use crate::sleep::StopFlag;
use crate::types::*;

use crate::types::LogicalKey::{Down, Enter, PageDown, PageUp, Tab, F};
use crate::types::Modifier::{Alt, Ctrl, Shift};

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Paste the 1-based column.
    Paste(usize),
    Press(LogicalKey, u32),
    Hotkey(&'static [Modifier], LogicalKey),
}

use self::Step::{Hotkey, Paste, Press};

const LAYOUT: &[Step] = &[
    Paste(1), Press(Down, 1),
    Paste(2), Press(Tab, 2),
    Paste(3), Press(Tab, 5),
    Paste(4), Press(Tab, 1),
    Paste(5), Press(Enter, 1), Press(Tab, 2),
    Paste(6), Press(Tab, 1),
    Paste(7), Press(Tab, 1),
    Paste(8), Press(Down, 1),
    Paste(9), Press(Tab, 2),
    // header saved, switch to the line items
    Paste(10),
    Hotkey(&[Ctrl], LogicalKey::Char('s')),
    Press(Enter, 1),
    Hotkey(&[Alt], LogicalKey::Char('c')),
    Press(Down, 4), Press(Enter, 1),
    Paste(11), Press(Tab, 3),
    Paste(12), Press(Tab, 2),
    Paste(13), Press(Tab, 2),
    Paste(14), Paste(15), Press(Tab, 1),
    Paste(16),
    Hotkey(&[Shift], PageDown),
    Hotkey(&[Shift], PageDown),
    Press(Tab, 1),
    Paste(17), Press(Tab, 3),
    // save, close the record, back to the first block
    Paste(18),
    Hotkey(&[Ctrl], LogicalKey::Char('s')),
    Press(F(FunctionKey::F4), 1),
    Hotkey(&[Shift], PageUp),
    Press(Down, 1),
];

/// Highest column the layout reads.
pub const COLUMNS: usize = 18;

/// The actions for one row. Pure: no branching on cell content, missing
/// cells paste as empty strings.
pub fn actions_for(row: &Row) -> Vec<Action> {
    LAYOUT
        .iter()
        .map(|step| match *step {
            Step::Paste(col) => Action::Paste(row.cell(col).to_string()),
            Step::Press(key, count) => Action::Press { key, count },
            Step::Hotkey(mods, key) => {
                let mut keys: Vec<KeyName> = mods.iter().copied().map(KeyName::from).collect();
                keys.push(KeyName::Key(key));
                Action::Hotkey(keys)
            }
        })
        .collect()
}

/// How one pass of the script ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowResult {
    /// Every action was attempted; `dropped` of them never reached the platform.
    Completed { dropped: usize },
    Stopped,
}

/// Replay the script for `row`.
pub fn run_row(injector: &Injector<'_>, row: &Row, stop: &StopFlag) -> RowResult {
    let mut dropped = 0;
    for action in actions_for(row) {
        if stop.is_set() {
            return RowResult::Stopped;
        }
        match injector.execute(&action) {
            Delivery::Skipped => return RowResult::Stopped,
            Delivery::Dropped => {
                dropped += 1;
                logger::warn_p("keys", &format!("{} dropped", action));
            }
            delivery => logger::debug_p("keys", &format!("{} {:?}", action, delivery)),
        }
    }
    if stop.is_set() {
        RowResult::Stopped
    } else {
        RowResult::Completed { dropped }
    }
}
