//! Injection sequence grammar shared by every platform backend.
//!
//! `^` ctrl, `+` shift and `%` alt apply to the next item (or to a whole
//! `( ... )` group). `{NAME}` is a named key, `{NAME n}` repeats it, a single
//! character in braces is that literal character (`{+}`, `{{}`, `{}}`).
//! `~` is Enter. Modifiers with nothing after them form a modifiers-only
//! stroke.

use crate::error::KeySeqError;
use crate::types::LogicalKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mods {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Mods {
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.shift || self.alt)
    }

    fn union(self, other: Mods) -> Mods {
        Mods {
            ctrl: self.ctrl || other.ctrl,
            shift: self.shift || other.shift,
            alt: self.alt || other.alt,
        }
    }
}

/// One key press with its held modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub mods: Mods,
    pub key: Option<LogicalKey>,
}

const SPECIALS: &[char] = &['^', '+', '%', '~', '{', '}', '(', ')'];

/// Token that types `c` literally.
pub fn escape_char(c: char) -> String {
    if SPECIALS.contains(&c) {
        format!("{{{}}}", c)
    } else {
        c.to_string()
    }
}

pub fn parse(seq: &str) -> Result<Vec<Stroke>, KeySeqError> {
    let chars: Vec<(usize, char)> = seq.char_indices().collect();
    let mut out = Vec::new();
    let mut pending = Mods::default();
    let mut groups: Vec<(Mods, usize)> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (off, c) = chars[i];
        let outer = groups.last().map(|g| g.0).unwrap_or_default();
        let key = match c {
            '^' => {
                pending.ctrl = true;
                None
            }
            '+' => {
                pending.shift = true;
                None
            }
            '%' => {
                pending.alt = true;
                None
            }
            '(' => {
                groups.push((outer.union(pending), off));
                pending = Mods::default();
                None
            }
            ')' => {
                if groups.pop().is_none() {
                    return Err(KeySeqError::Unmatched(')', off));
                }
                pending = Mods::default();
                None
            }
            '}' => return Err(KeySeqError::Unmatched('}', off)),
            '{' => {
                let (key, repeat, next) = parse_brace(&chars, i)?;
                let mods = outer.union(pending);
                out.extend((0..repeat).map(|_| Stroke { mods, key: Some(key) }));
                pending = Mods::default();
                i = next;
                continue;
            }
            '~' => Some(LogicalKey::Enter),
            ' ' => Some(LogicalKey::Space),
            other => Some(LogicalKey::Char(other)),
        };
        if let Some(key) = key {
            out.push(Stroke { mods: outer.union(pending), key: Some(key) });
            pending = Mods::default();
        }
        i += 1;
    }

    if let Some((_, off)) = groups.last() {
        return Err(KeySeqError::Unmatched('(', *off));
    }
    if !pending.is_empty() {
        out.push(Stroke { mods: pending, key: None });
    }
    Ok(out)
}

/// Parse the `{...}` item starting at `chars[start]`.
/// Returns the key, its repeat count and the index after the closing brace.
fn parse_brace(chars: &[(usize, char)], start: usize) -> Result<(LogicalKey, usize, usize), KeySeqError> {
    let open = chars[start].0;
    let at = |j: usize| chars.get(j).map(|c| c.1);

    // "{}}" is a literal closing brace
    if at(start + 1) == Some('}') {
        return match at(start + 2) {
            Some('}') => Ok((LogicalKey::Char('}'), 1, start + 3)),
            _ => Err(KeySeqError::UnknownKey(String::new())),
        };
    }

    let close = (start + 1..chars.len())
        .find(|&j| chars[j].1 == '}')
        .ok_or(KeySeqError::Unclosed(open))?;
    let body: String = chars[start + 1..close].iter().map(|c| c.1).collect();

    let (name, repeat) = match body.rsplit_once(' ') {
        Some((name, count)) if !name.is_empty() => {
            let n = count
                .parse::<usize>()
                .map_err(|_| KeySeqError::BadRepeat(body.clone()))?;
            (name, n)
        }
        _ => (body.as_str(), 1),
    };

    let mut it = name.chars();
    let key = match (it.next(), it.next()) {
        (Some(' '), None) => LogicalKey::Space,
        (Some(c), None) => LogicalKey::Char(c),
        _ => LogicalKey::from_brace_name(name)
            .ok_or_else(|| KeySeqError::UnknownKey(name.to_string()))?,
    };
    Ok((key, repeat, close + 1))
}
