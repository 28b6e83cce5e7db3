use anyhow::anyhow;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::backend::{AgentApi, AgentBackend, HealthStatus, SubmissionOutcome};
use crate::config::Config;
use crate::conversation::{ConversationController, PendingSubmission};
use crate::ui::conversation::composer::{ComposerResult, ComposerView};
use crate::ui::conversation::{Composer, HistoryView, SlashCommand, StatusView, help_text};

/// Actions the chat screen asks the event loop to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the conversation flow and its UI components.
pub struct ConversationManager {
    controller: ConversationController,
    backend: AgentBackend,
    composer: Composer,
    show_timestamps: bool,
    notice: Option<String>,
    tick: usize,
    in_flight: Option<(PendingSubmission, oneshot::Receiver<SubmissionOutcome>)>,
    health_check: Option<oneshot::Receiver<anyhow::Result<HealthStatus>>>,
}

impl ConversationManager {
    pub fn new(backend: AgentBackend, config: &Config) -> Self {
        Self {
            controller: ConversationController::new(),
            backend,
            composer: Composer::new(),
            show_timestamps: config.ui.show_timestamps,
            notice: None,
            tick: 0,
            in_flight: None,
            health_check: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return ConversationAction::Exit;
        }

        match self.composer.handle_key(key, self.controller.input_mut()) {
            ComposerResult::Submitted => {
                self.start_submission();
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Spawn the outbound request for whatever is in the input field.
    fn start_submission(&mut self) {
        let Some(pending) = self.controller.begin_from_input() else {
            return;
        };

        self.notice = None;
        self.composer.set_locked(true);

        let backend = self.backend.clone();
        let prompt = pending.prompt.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(backend.query(&prompt).await);
        });

        self.in_flight = Some((pending, rx));
    }

    /// Apply settled outcomes, if any have arrived. Called once per loop
    /// iteration.
    pub fn poll(&mut self) {
        if let Some((pending, mut rx)) = self.in_flight.take() {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.controller.settle(pending, outcome);
                    self.composer.set_locked(false);
                }
                Err(TryRecvError::Empty) => {
                    self.in_flight = Some((pending, rx));
                }
                Err(TryRecvError::Closed) => {
                    // The request task died. Settle as a failure so the
                    // in-flight flag cannot stay stuck.
                    self.controller
                        .settle(pending, Err(anyhow!("agent request task dropped")));
                    self.composer.set_locked(false);
                }
            }
        }

        if let Some(mut rx) = self.health_check.take() {
            match rx.try_recv() {
                Ok(Ok(health)) => {
                    self.notice = Some(format!("backend is {}", health.status));
                }
                Ok(Err(_)) | Err(TryRecvError::Closed) => {
                    self.notice = Some("backend is unreachable".to_string());
                }
                Err(TryRecvError::Empty) => {
                    self.health_check = Some(rx);
                }
            }
        }
    }

    /// Advance the in-flight animation.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        match command {
            SlashCommand::Quit => ConversationAction::Exit,
            SlashCommand::Help => {
                self.notice = Some(help_text());
                ConversationAction::None
            }
            SlashCommand::Health => {
                self.start_health_check();
                ConversationAction::None
            }
        }
    }

    fn start_health_check(&mut self) {
        let backend = self.backend.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(backend.health().await);
        });

        self.notice = Some("checking backend...".to_string());
        self.health_check = Some(rx);
    }

    /// Render the chat screen: history on top, status strip, composer at
    /// the bottom.
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History
                Constraint::Length(1), // Status strip
                Constraint::Length(3), // Composer
            ])
            .split(frame.size());

        frame.render_widget(
            HistoryView {
                messages: &self.controller.state().messages,
                show_timestamps: self.show_timestamps,
            },
            chunks[0],
        );

        frame.render_widget(
            StatusView {
                request_in_flight: self.controller.state().request_in_flight,
                last_error: self.controller.state().last_error.as_deref(),
                notice: self.notice.as_deref(),
                tick: self.tick,
            },
            chunks[1],
        );

        frame.render_widget(
            ComposerView {
                input: self.controller.input(),
                cursor: self.composer.cursor(),
                locked: self.composer.is_locked(),
            },
            chunks[2],
        );
    }
}
