use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use lkb_core::platform::hotkey::STOP_HOTKEY;
use lkb_core::types::RunPhase;

use crate::app::{Field, FIELDS};
use crate::App;

fn banner(app: &App) -> (String, Color) {
    match app.phase {
        RunPhase::Idle => ("READY (Enter to start)".into(), Color::Blue),
        RunPhase::Loading => ("LOADING...".into(), Color::Yellow),
        RunPhase::Acquiring => ("FINDING WINDOW...".into(), Color::Yellow),
        RunPhase::CountingDown => (format!("STARTING (Esc or {} to stop)", STOP_HOTKEY), Color::Yellow),
        RunPhase::Running(row) => (format!("ROW {} (Esc or {} to stop)", row, STOP_HOTKEY), Color::Green),
        RunPhase::Done => ("DONE (Enter to run again)".into(), Color::Cyan),
        RunPhase::Stopped => ("STOPPED (Enter to start)".into(), Color::Red),
        RunPhase::Failed => ("FAILED (Enter to retry)".into(), Color::Red),
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Yellow))
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    let (label, banner_bg) = banner(app);

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            key(" ↑/↓"),
            Span::raw(" select, type to edit, "),
            key("space"),
            Span::raw(" toggle, "),
            key("F2"),
            Span::raw(" log, "),
            key("F10"),
            Span::raw(" quit"),
        ]),
        Line::from(""),
    ];

    let locked = app.is_running();
    for (i, field) in FIELDS.iter().enumerate() {
        let selected = i == app.selected;
        let value_style = if locked {
            Style::default().fg(Color::DarkGray)
        } else if *field == Field::WaitForReady {
            Style::default().fg(banner_bg)
        } else {
            Style::default().fg(Color::White)
        };
        let mut spans = vec![
            Span::raw(if selected { "> " } else { "  " }),
            Span::styled(format!("{:<16}", field.label()), Style::default().fg(Color::Cyan)),
            Span::styled(app.value(*field), value_style.add_modifier(Modifier::BOLD)),
        ];
        if selected && !locked && *field != Field::WaitForReady {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if let Some(err) = &app.form_error {
        lines.push(Line::from(Span::styled(format!(" {}", err), Style::default().fg(Color::Red))));
    }
    if !app.status.is_empty() {
        lines.push(Line::from(Span::styled(format!(" {}", app.status), Style::default().fg(Color::Green))));
    }

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    let width = left[0].width as usize;
    let pad_total = width.saturating_sub(label.chars().count());
    let pad_left = pad_total / 2;
    let centered = format!("{}{}{}", " ".repeat(pad_left), label, " ".repeat(pad_total - pad_left));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, left[0]);

    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(form, left[1]);

    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end].iter().map(|m| parse_log_line(m)).collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Log ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    if let Some((dialog, _)) = &app.confirm {
        dialog.render(f);
    }
}

/// Render a logger line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage).
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    let &[level, prefix, color, timestamp, message] = parts.as_slice() else {
        return Line::from(raw);
    };

    let color = match color.parse::<u8>().unwrap_or(0) {
        1 => Color::DarkGray,
        2 => Color::LightBlue,
        3 => Color::LightGreen,
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        _ => {}
    }
    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(message, Style::default().fg(color)));
    Line::from(spans)
}
