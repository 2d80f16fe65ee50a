use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Yes/No question drawn over the form. Defaults to No.
pub struct ConfirmDialog {
    pub message: String,
    pub yes: bool,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), yes: false }
    }

    pub fn toggle(&mut self) {
        self.yes = !self.yes;
    }

    pub fn render(&self, f: &mut Frame) {
        let width = (self.message.chars().count() as u16 + 6).max(40);
        let area = centered_rect(width, 7, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Confirm ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1), // message
                Constraint::Length(1),
                Constraint::Length(1), // buttons
            ])
            .split(inner);

        let msg = Paragraph::new(Line::from(Span::styled(&self.message, Style::default().fg(Color::White))))
            .alignment(Alignment::Center);
        f.render_widget(msg, rows[1]);

        let active = |bg: Color| Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD);
        let idle = Style::default().fg(Color::DarkGray);
        let buttons = Line::from(vec![
            Span::styled("  [Yes]  ", if self.yes { active(Color::Green) } else { idle }),
            Span::raw("   "),
            Span::styled("  [No]  ", if self.yes { idle } else { active(Color::Red) }),
        ]);
        f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), rows[3]);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_clamped_to_area() {
        let r = centered_rect(80, 7, Rect::new(0, 0, 50, 5));
        assert_eq!((r.x, r.y, r.width, r.height), (0, 0, 50, 5));
        let r = centered_rect(40, 7, Rect::new(0, 0, 100, 27));
        assert_eq!((r.x, r.y), (30, 10));
    }
}
