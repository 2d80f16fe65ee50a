use std::ffi::c_void;
use std::mem;

use anyhow::{bail, Result};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{BOOL, HINSTANCE, HWND, LPARAM, TRUE};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_CONTROL, VK_DOWN,
    VK_ESCAPE, VK_F1, VK_LEFT, VK_MENU, VK_NEXT, VK_PRIOR, VK_RETURN, VK_RIGHT, VK_SHIFT,
    VK_SPACE, VK_TAB, VK_UP,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BringWindowToTop, EnumWindows, FindWindowW, GetCursorInfo, GetWindowTextLengthW,
    GetWindowTextW, IsIconic, IsWindowVisible, LoadCursorW, SetForegroundWindow, ShowWindow,
    CURSORINFO, IDC_APPSTARTING, IDC_WAIT, SW_RESTORE,
};

use crate::keyseq::{self, Stroke};
use crate::types::*;
use super::Platform;

pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        WindowsPlatform
    }
}

fn to_hwnd(id: WindowId) -> HWND {
    HWND(id as usize as *mut c_void)
}

fn to_id(hwnd: HWND) -> WindowId {
    hwnd.0 as usize as WindowId
}

unsafe extern "system" fn collect_hwnd(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let out = &mut *(lparam.0 as *mut Vec<HWND>);
    out.push(hwnd);
    TRUE
}

unsafe fn window_text(hwnd: HWND) -> String {
    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; len as usize + 1];
    let n = GetWindowTextW(hwnd, &mut buf).max(0) as usize;
    String::from_utf16_lossy(&buf[..n.min(buf.len())])
}

impl Platform for WindowsPlatform {
    fn find_window(&self, title: &str) -> Result<Option<WindowId>> {
        let wide = HSTRING::from(title);
        let found = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) };
        Ok(match found {
            Ok(hwnd) if !hwnd.0.is_null() => Some(to_id(hwnd)),
            _ => None,
        })
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        let mut hwnds: Vec<HWND> = Vec::new();
        unsafe {
            EnumWindows(Some(collect_hwnd), LPARAM(&mut hwnds as *mut Vec<HWND> as isize))?;
            Ok(hwnds
                .into_iter()
                .map(|hwnd| WindowInfo {
                    id: to_id(hwnd),
                    title: window_text(hwnd),
                    visible: IsWindowVisible(hwnd).as_bool(),
                })
                .collect())
        }
    }

    fn restore_and_focus(&self, id: WindowId) -> Result<()> {
        let hwnd = to_hwnd(id);
        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            let _ = BringWindowToTop(hwnd);
            if !SetForegroundWindow(hwnd).as_bool() {
                bail!("SetForegroundWindow refused for {:#x}", id);
            }
        }
        Ok(())
    }

    fn cursor_busy(&self) -> Result<bool> {
        unsafe {
            let mut info = CURSORINFO {
                cbSize: mem::size_of::<CURSORINFO>() as u32,
                ..Default::default()
            };
            GetCursorInfo(&mut info)?;
            if info.hCursor.0.is_null() {
                return Ok(false);
            }
            let wait = LoadCursorW(HINSTANCE::default(), IDC_WAIT)?;
            let starting = LoadCursorW(HINSTANCE::default(), IDC_APPSTARTING)?;
            Ok(info.hCursor == wait || info.hCursor == starting)
        }
    }

    fn supports_busy_probe(&self) -> bool {
        true
    }

    fn set_clipboard(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)?;
        Ok(())
    }

    fn send_keys(&self, seq: &str) -> Result<()> {
        let inputs: Vec<INPUT> = keyseq::parse(seq)?.iter().flat_map(stroke_inputs).collect();
        if inputs.is_empty() {
            return Ok(());
        }
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            bail!("SendInput accepted {} of {} events", sent, inputs.len());
        }
        Ok(())
    }
}

fn key_input(vk: VIRTUAL_KEY, up: bool, extended: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if extended {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if up {
        flags |= KEYEVENTF_KEYUP;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT { wVk: vk, wScan: 0, dwFlags: flags, time: 0, dwExtraInfo: 0 },
        },
    }
}

fn unicode_input(unit: u16, up: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if up {
        flags |= KEYEVENTF_KEYUP;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT { wVk: VIRTUAL_KEY(0), wScan: unit, dwFlags: flags, time: 0, dwExtraInfo: 0 },
        },
    }
}

fn named_vk(key: LogicalKey) -> Option<(VIRTUAL_KEY, bool)> {
    let vk = match key {
        LogicalKey::Tab => (VK_TAB, false),
        LogicalKey::Enter => (VK_RETURN, false),
        LogicalKey::Esc => (VK_ESCAPE, false),
        LogicalKey::Up => (VK_UP, true),
        LogicalKey::Down => (VK_DOWN, true),
        LogicalKey::Left => (VK_LEFT, true),
        LogicalKey::Right => (VK_RIGHT, true),
        LogicalKey::PageUp => (VK_PRIOR, true),
        LogicalKey::PageDown => (VK_NEXT, true),
        LogicalKey::Space => (VK_SPACE, false),
        LogicalKey::F(f) => (VIRTUAL_KEY(VK_F1.0 + u16::from(f.number() - 1)), false),
        LogicalKey::Char(_) => return None,
    };
    Some(vk)
}

/// Layout virtual key for `c` and whether it needs shift. None when the
/// character needs ctrl/alt (AltGr) or is not on the keyboard.
fn char_vk(c: char) -> Option<(VIRTUAL_KEY, bool)> {
    let unit = u16::try_from(u32::from(c)).ok()?;
    let scan = unsafe { VkKeyScanW(unit) };
    if scan == -1 {
        return None;
    }
    let state = (scan >> 8) & 0xff;
    if state & !1 != 0 {
        return None;
    }
    Some((VIRTUAL_KEY((scan & 0xff) as u16), state & 1 != 0))
}

fn stroke_inputs(stroke: &Stroke) -> Vec<INPUT> {
    let mut held: Vec<VIRTUAL_KEY> = Vec::new();
    if stroke.mods.ctrl {
        held.push(VK_CONTROL);
    }
    if stroke.mods.shift {
        held.push(VK_SHIFT);
    }
    if stroke.mods.alt {
        held.push(VK_MENU);
    }

    let mut body: Vec<INPUT> = Vec::new();
    match stroke.key {
        None => {}
        Some(LogicalKey::Char(c)) => match char_vk(c) {
            // plain text goes through KEYEVENTF_UNICODE, independent of layout
            Some((vk, needs_shift)) if !stroke.mods.is_empty() => {
                if needs_shift && !stroke.mods.shift {
                    held.push(VK_SHIFT);
                }
                body.push(key_input(vk, false, false));
                body.push(key_input(vk, true, false));
            }
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    body.push(unicode_input(*unit, false));
                    body.push(unicode_input(*unit, true));
                }
            }
        },
        Some(key) => {
            if let Some((vk, extended)) = named_vk(key) {
                body.push(key_input(vk, false, extended));
                body.push(key_input(vk, true, extended));
            }
        }
    }

    let mut out: Vec<INPUT> = held.iter().map(|vk| key_input(*vk, false, false)).collect();
    out.extend(body);
    out.extend(held.iter().rev().map(|vk| key_input(*vk, true, false)));
    out
}
