use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use lkb_core::logger;
use lkb_core::platform::{create_platform, hotkey, Platform};
use lkb_core::runner::{self, RunController, RunHandle, RunOutcome};
use lkb_core::settings::Settings;
use lkb_core::status::{RunEvent, StatusSink};
use lkb_core::types::{RunConfig, RunPhase};

use crate::confirm::ConfirmDialog;

/// Editable rows of the form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Source,
    StartRow,
    EndRow,
    KeyDelay,
    RowDelay,
    StartDelay,
    WaitForReady,
    TargetTitle,
}

pub const FIELDS: [Field; 8] = [
    Field::Source,
    Field::StartRow,
    Field::EndRow,
    Field::KeyDelay,
    Field::RowDelay,
    Field::StartDelay,
    Field::WaitForReady,
    Field::TargetTitle,
];

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Source => "Source file",
            Field::StartRow => "Start row",
            Field::EndRow => "End row",
            Field::KeyDelay => "Key delay (s)",
            Field::RowDelay => "Row delay (s)",
            Field::StartDelay => "Countdown (s)",
            Field::WaitForReady => "Wait while busy",
            Field::TargetTitle => "Window title",
        }
    }
}

/// What a yes on the open dialog does.
pub enum Pending {
    StartWithoutProbe(RunConfig, Box<dyn Platform>),
    QuitWhileRunning,
}

pub struct App {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub selected: usize,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub phase: RunPhase,
    pub status: String,
    pub form_error: Option<String>,
    pub confirm: Option<(ConfirmDialog, Pending)>,
    pub should_quit: bool,
    force_stub: bool,
    run: Option<RunHandle>,
    event_tx: mpsc::Sender<RunEvent>,
    event_rx: mpsc::Receiver<RunEvent>,
}

impl App {
    pub fn new(settings: Settings, settings_path: PathBuf, log_rx: mpsc::Receiver<String>, force_stub: bool) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            settings,
            settings_path,
            selected: 0,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            phase: RunPhase::Idle,
            status: String::new(),
            form_error: None,
            confirm: None,
            should_quit: false,
            force_stub,
            run: None,
            event_tx,
            event_rx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn selected_field(&self) -> Field {
        FIELDS[self.selected]
    }

    /// Drain the log feed and the run's progress feed, reap a finished worker.
    pub fn tick(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                RunEvent::Status(s) => self.status = s,
                RunEvent::Phase(p) => self.phase = p,
            }
        }
        if self.run.as_ref().is_some_and(RunHandle::is_finished) {
            if let Some(handle) = self.run.take() {
                self.finish(handle.join());
            }
            hotkey::activate_terminal();
        }
    }

    /// A worker that died outside a row never reports its last phase.
    fn finish(&mut self, outcome: RunOutcome) {
        if self.phase.is_terminal() {
            return;
        }
        if let RunOutcome::Failed(e) = &outcome {
            self.status = format!("Error: {}", e);
        }
        self.phase = outcome.phase();
    }

    // -- form --

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < FIELDS.len() {
            self.selected += 1;
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let s = &mut self.settings;
        match field {
            Field::Source => Some(&mut s.source),
            Field::StartRow => Some(&mut s.start_row),
            Field::EndRow => Some(&mut s.end_row),
            Field::KeyDelay => Some(&mut s.key_delay),
            Field::RowDelay => Some(&mut s.row_delay),
            Field::StartDelay => Some(&mut s.start_delay),
            Field::TargetTitle => Some(&mut s.target.title),
            Field::WaitForReady => None,
        }
    }

    pub fn value(&self, field: Field) -> String {
        let s = &self.settings;
        match field {
            Field::Source => s.source.clone(),
            Field::StartRow => s.start_row.clone(),
            Field::EndRow => s.end_row.clone(),
            Field::KeyDelay => s.key_delay.clone(),
            Field::RowDelay => s.row_delay.clone(),
            Field::StartDelay => s.start_delay.clone(),
            Field::TargetTitle => s.target.title.clone(),
            Field::WaitForReady => if s.wait_for_ready { "[x]" } else { "[ ]" }.to_string(),
        }
    }

    pub fn input(&mut self, c: char) {
        if self.is_running() {
            return;
        }
        if self.selected_field() == Field::WaitForReady {
            if c == ' ' {
                self.settings.wait_for_ready = !self.settings.wait_for_ready;
            }
            return;
        }
        let field = self.selected_field();
        if let Some(text) = self.text_mut(field) {
            text.push(c);
        }
        self.form_error = None;
    }

    pub fn backspace(&mut self) {
        if self.is_running() {
            return;
        }
        let field = self.selected_field();
        if let Some(text) = self.text_mut(field) {
            text.pop();
        }
        self.form_error = None;
    }

    // -- run control --

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.settings.save(&self.settings_path);
        let config = match self.settings.to_run_config() {
            Ok(c) => c,
            Err(e) => {
                logger::warn(&format!("invalid form: {}", e));
                self.form_error = Some(e.to_string());
                return;
            }
        };
        self.form_error = None;

        let platform = create_platform(self.force_stub);
        if config.wait_for_ready && !platform.supports_busy_probe() {
            self.confirm = Some((
                ConfirmDialog::new("Busy-cursor check unavailable. Continue without it?"),
                Pending::StartWithoutProbe(config, platform),
            ));
            return;
        }
        self.launch(config, platform);
    }

    fn launch(&mut self, config: RunConfig, platform: Box<dyn Platform>) {
        let controller = match RunController::new(config, platform) {
            Ok(c) => c,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };
        self.status.clear();
        self.phase = RunPhase::Loading;
        let sink: Arc<dyn StatusSink> = Arc::new(self.event_tx.clone());
        self.run = Some(runner::spawn(controller, sink));
    }

    pub fn stop(&mut self) {
        if let Some(run) = &self.run {
            run.stop();
        }
    }

    pub fn quit(&mut self) {
        if self.is_running() {
            self.confirm = Some((ConfirmDialog::new("A run is in progress. Stop it and quit?"), Pending::QuitWhileRunning));
            return;
        }
        self.settings.save(&self.settings_path);
        self.should_quit = true;
    }

    /// Close the dialog, acting on it when `yes`.
    pub fn answer(&mut self, yes: bool) {
        let Some((_, pending)) = self.confirm.take() else { return };
        if !yes {
            return;
        }
        match pending {
            Pending::StartWithoutProbe(mut config, platform) => {
                config.wait_for_ready = false;
                self.launch(config, platform);
            }
            Pending::QuitWhileRunning => {
                if let Some(run) = self.run.take() {
                    run.stop();
                    run.join();
                }
                self.settings.save(&self.settings_path);
                self.should_quit = true;
            }
        }
    }

    // -- log pane --

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }
}
