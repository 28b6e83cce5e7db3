use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use super::commands::{SlashCommand, parse_slash_command};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerResult {
    /// The input field holds a prompt ready for submission.
    Submitted,
    /// A slash command was entered.
    Command(SlashCommand),
    None,
}

/// Cursor and lock state for the input line. The text itself is the
/// conversation state's pending prompt and is edited through the
/// controller.
#[derive(Debug, Default)]
pub struct Composer {
    cursor: usize,
    locked: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore editing keys while a request is outstanding.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle key input against the shared input buffer.
    pub fn handle_key(&mut self, key: KeyEvent, input: &mut String) -> ComposerResult {
        if key.kind != KeyEventKind::Press || self.locked {
            return ComposerResult::None;
        }

        self.cursor = self.cursor.min(input.len());

        match key.code {
            KeyCode::Enter => {
                if input.trim().is_empty() {
                    return ComposerResult::None;
                }
                if let Some(command) = parse_slash_command(input.trim()) {
                    input.clear();
                    self.cursor = 0;
                    return ComposerResult::Command(command);
                }
                // Clearing the prompt itself is the controller's job.
                self.cursor = 0;
                ComposerResult::Submitted
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerResult::None;
                }
                input.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                ComposerResult::None
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let previous = prev_boundary(input, self.cursor);
                    input.remove(previous);
                    self.cursor = previous;
                }
                ComposerResult::None
            }
            KeyCode::Delete => {
                if self.cursor < input.len() {
                    input.remove(self.cursor);
                }
                ComposerResult::None
            }
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor = prev_boundary(input, self.cursor);
                }
                ComposerResult::None
            }
            KeyCode::Right => {
                if self.cursor < input.len() {
                    self.cursor = next_boundary(input, self.cursor);
                }
                ComposerResult::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                ComposerResult::None
            }
            KeyCode::End => {
                self.cursor = input.len();
                ComposerResult::None
            }
            _ => ComposerResult::None,
        }
    }
}

fn prev_boundary(text: &str, index: usize) -> usize {
    text[..index].char_indices().next_back().map_or(0, |(i, _)| i)
}

fn next_boundary(text: &str, index: usize) -> usize {
    text[index..].chars().next().map_or(index, |c| index + c.len_utf8())
}

/// Renders the input line with a cursor marker and placeholder.
pub struct ComposerView<'a> {
    pub input: &'a str,
    pub cursor: usize,
    pub locked: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, style) = if self.locked {
            (" Prompt (waiting) ", Style::default().fg(Color::DarkGray))
        } else {
            (" Prompt ", Style::default().fg(Color::Green))
        };

        let block = Block::default().borders(Borders::ALL).title(title).style(style);
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.input.is_empty() && !self.locked {
            let placeholder = Line::from(vec![Span::styled(
                "Ask the SuperAgent... (Enter to send, /help for commands)",
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
            return;
        }

        let mut content = self.input.to_string();
        if !self.locked {
            content.insert(self.cursor.min(content.len()), '▌');
        }
        let line = Line::from(vec![Span::raw(content)]);
        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}
