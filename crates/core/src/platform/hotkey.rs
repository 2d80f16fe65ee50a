use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Human-readable name of the global stop hotkey.
pub const STOP_HOTKEY: &str = "Ctrl+Shift+Q";

/// Start a background thread that listens for the global stop hotkey
/// (Ctrl+Shift+Q) even while the target application has focus.
/// Sets `flag` to `true` on every press; the driver clears it.
#[cfg(target_os = "windows")]
pub fn start_hotkey_listener(flag: Arc<AtomicBool>) {
    use std::sync::atomic::Ordering;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, VK_Q,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetMessageW, MSG, WM_HOTKEY};

    const HOTKEY_ID: i32 = 0x4c4b;

    std::thread::spawn(move || unsafe {
        let registered = RegisterHotKey(
            HWND::default(),
            HOTKEY_ID,
            MOD_CONTROL | MOD_SHIFT | MOD_NOREPEAT,
            u32::from(VK_Q.0),
        );
        if let Err(e) = registered {
            crate::logger::error(&format!(
                "failed to register global hotkey {}: {} (another application may own it)",
                STOP_HOTKEY, e
            ));
            return;
        }
        crate::logger::info(&format!("global stop hotkey {} registered", STOP_HOTKEY));

        let mut msg = MSG::default();
        // blocks until a message arrives; 0 on WM_QUIT, -1 on error
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            if msg.message == WM_HOTKEY && msg.wParam.0 == HOTKEY_ID as usize {
                flag.store(true, Ordering::Release);
            }
        }
    });
}

/// Bring the console window that owns our process back to the foreground.
#[cfg(target_os = "windows")]
pub fn activate_terminal() {
    use windows::Win32::System::Console::GetConsoleWindow;
    use windows::Win32::UI::WindowsAndMessaging::{SetForegroundWindow, ShowWindow, SW_RESTORE};

    unsafe {
        let hwnd = GetConsoleWindow();
        if !hwnd.0.is_null() {
            let _ = ShowWindow(hwnd, SW_RESTORE);
            let _ = SetForegroundWindow(hwnd);
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub fn start_hotkey_listener(_flag: Arc<AtomicBool>) {
    crate::logger::warn(&format!(
        "global stop hotkey {} is not supported on this OS, use Esc in this window",
        STOP_HOTKEY
    ));
}

#[cfg(not(target_os = "windows"))]
pub fn activate_terminal() {
    // Not supported on this platform
}
