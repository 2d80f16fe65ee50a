use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use lkb_core::logger;

use crate::App;
use crate::ui;

/// Drive the TUI until the user quits. `stop_hotkey` is raised by the
/// global hotkey listener and cleared here.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    stop_hotkey: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        if stop_hotkey.swap(false, Ordering::AcqRel) && app.is_running() {
            logger::info("stop hotkey pressed");
            app.stop();
        }

        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if let Some((dialog, _)) = app.confirm.as_mut() {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => dialog.toggle(),
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer(false),
            KeyCode::Enter => {
                let yes = dialog.yes;
                app.answer(yes);
            }
            _ => {}
        }
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.quit();
        }
        return;
    }

    match key.code {
        KeyCode::F(10) => app.quit(),
        KeyCode::F(2) => app.toggle_log(),
        KeyCode::Up => app.move_up(),
        KeyCode::Down | KeyCode::Tab => app.move_down(),
        KeyCode::PageUp => app.scroll_log_up(10),
        KeyCode::PageDown => app.scroll_log_down(10),
        KeyCode::Enter => app.start(),
        KeyCode::Esc => app.stop(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) => app.input(c),
        _ => {}
    }
}
