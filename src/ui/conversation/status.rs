//! Status strip between the history pane and the composer

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

const IN_FLIGHT_FRAMES: [&str; 4] = ["", ".", "..", "..."];

/// One-line status: in-flight indicator, error banner, or notice.
pub struct StatusView<'a> {
    pub request_in_flight: bool,
    pub last_error: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub tick: usize,
}

impl Widget for StatusView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = if self.request_in_flight {
            let dots = IN_FLIGHT_FRAMES[self.tick % IN_FLIGHT_FRAMES.len()];
            Line::from(vec![Span::styled(
                format!("🤖 contacting agent{dots}"),
                Style::default().fg(Color::Yellow),
            )])
        } else if let Some(error) = self.last_error {
            Line::from(vec![
                Span::styled("❌ ", Style::default().fg(Color::Red)),
                Span::styled(error.to_string(), Style::default().fg(Color::Red)),
            ])
        } else if let Some(notice) = self.notice {
            Line::from(vec![Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Yellow),
            )])
        } else {
            Line::from(vec![Span::styled(
                "Enter to send · /help for commands",
                Style::default().fg(Color::DarkGray),
            )])
        };

        buf.set_line(area.x, area.y, &line, area.width);
    }
}
