//! Conversation history display component

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::conversation::{Message, Role};

/// Bottom-anchored view over the conversation thread.
pub struct HistoryView<'a> {
    pub messages: &'a [Message],
    pub show_timestamps: bool,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 SuperAgent");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Welcome to SuperChat! 🚀",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Ask the SuperAgent about your portfolio, a token, or a trade idea.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Press Enter to send. Type /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        // Collect every message into wrapped lines, then show the tail.
        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(render_message(message, self.show_timestamps, inner_area.width));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Render a single message into lines
fn render_message(message: &Message, show_timestamps: bool, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let role_icon = match message.role {
        Role::User => "👤",
        Role::Agent => "🤖",
    };

    let header = if show_timestamps {
        let timestamp = message.timestamp.format("%H:%M:%S").to_string();
        format!("{} {} {}", role_icon, timestamp, "─".repeat(20))
    } else {
        format!("{} {}", role_icon, "─".repeat(20))
    };

    lines.push(Line::from(vec![Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )]));

    let content_style = match message.role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Agent => Style::default().fg(Color::Green),
    };

    for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, content_style),
        ]));
    }

    lines
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_splits_long_text_on_word_boundaries() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_handles_zero_width_and_empty_text() {
        assert_eq!(wrap_text("anything", 0), vec!["anything"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }
}
