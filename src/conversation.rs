//! Conversation state and the submission cycle.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{AgentApi, SubmissionOutcome};

/// Shown when the agent request fails, whatever the underlying cause.
pub const AGENT_UNAVAILABLE: &str = "Unable to contact the SuperAgent backend. Please try again.";

/// Who authored a message in the conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// A single entry in the conversation thread. Immutable once created.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// State for one chat session. Created empty, mutated only through the
/// submission cycle, discarded when the session ends.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub pending_prompt: String,
    pub request_in_flight: bool,
    pub last_error: Option<String>,
}

/// Handle for a submission accepted by [`ConversationController::begin`].
///
/// Carries what [`ConversationController::settle`] needs to finish the
/// cycle: the trimmed prompt for the outbound call, the message count to
/// truncate back to on failure, and the optimistic entry's id.
#[derive(Debug)]
pub struct PendingSubmission {
    pub prompt: String,
    snapshot_len: usize,
    message_id: Uuid,
}

/// Owns [`ConversationState`] and applies the submission cycle to it.
///
/// All mutation goes through `begin`/`settle`, or through `submit` which
/// composes them around one backend call. Rendering reads `state()`.
pub struct ConversationController {
    state: ConversationState,
}

impl ConversationController {
    pub fn new() -> Self {
        Self {
            state: ConversationState::default(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Current contents of the input field.
    pub fn input(&self) -> &str {
        &self.state.pending_prompt
    }

    /// Mutable access for the composer's editing keys.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.state.pending_prompt
    }

    /// Accept a submission: append the optimistic user entry, clear the
    /// input field and the last error, and raise the in-flight flag.
    ///
    /// Returns `None` without touching any state when the trimmed prompt
    /// is empty or another request is already in flight.
    pub fn begin(&mut self, raw: &str) -> Option<PendingSubmission> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.state.request_in_flight {
            return None;
        }

        let snapshot_len = self.state.messages.len();
        let message = Message::new(Role::User, trimmed.to_string());
        let message_id = message.id;

        self.state.messages.push(message);
        self.state.pending_prompt.clear();
        self.state.last_error = None;
        self.state.request_in_flight = true;

        Some(PendingSubmission {
            prompt: trimmed.to_string(),
            snapshot_len,
            message_id,
        })
    }

    /// [`Self::begin`] with the prompt taken from the input field. A
    /// rejected submission leaves the field untouched.
    pub fn begin_from_input(&mut self) -> Option<PendingSubmission> {
        let raw = std::mem::take(&mut self.state.pending_prompt);
        let pending = self.begin(&raw);
        if pending.is_none() {
            self.state.pending_prompt = raw;
        }
        pending
    }

    /// Finish the cycle: append the agent reply on success, or record the
    /// fixed error and roll the optimistic entry back on failure. The
    /// in-flight flag drops on both paths.
    pub fn settle(&mut self, pending: PendingSubmission, outcome: SubmissionOutcome) {
        match outcome {
            Ok(reply) => {
                self.state
                    .messages
                    .push(Message::new(Role::Agent, reply.text().to_string()));
            }
            Err(_) => {
                // The entry at the snapshot point must be the one `begin`
                // appended; only the single-in-flight rule makes the
                // truncate safe.
                debug_assert_eq!(
                    self.state.messages.get(pending.snapshot_len).map(|m| m.id),
                    Some(pending.message_id),
                );
                self.state.messages.truncate(pending.snapshot_len);
                self.state.last_error = Some(AGENT_UNAVAILABLE.to_string());
            }
        }
        self.state.request_in_flight = false;
    }

    /// Run one full submission cycle against `backend`.
    pub async fn submit<A: AgentApi>(&mut self, backend: &A, raw: &str) {
        let Some(pending) = self.begin(raw) else {
            return;
        };
        let outcome = backend.query(&pending.prompt).await;
        self.settle(pending, outcome);
    }
}

impl Default for ConversationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AgentReply, NO_RESPONSE_FALLBACK};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Scripted {
        Reply(Option<&'static str>),
        Failure,
    }

    struct ScriptedAgent {
        outcomes: Mutex<VecDeque<Scripted>>,
        calls: AtomicUsize,
    }

    impl ScriptedAgent {
        fn new(outcomes: Vec<Scripted>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentApi for ScriptedAgent {
        async fn query(&self, _prompt: &str) -> SubmissionOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Scripted::Reply(text)) => Ok(AgentReply {
                    response: text.map(str::to_string),
                }),
                Some(Scripted::Failure) => Err(anyhow!("connection refused")),
                None => panic!("unexpected query"),
            }
        }
    }

    fn thread(controller: &ConversationController) -> Vec<(Role, String)> {
        controller
            .state()
            .messages
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn whitespace_only_prompt_is_a_no_op() {
        let agent = ScriptedAgent::new(vec![]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "   \n\t").await;

        assert!(controller.state().messages.is_empty());
        assert!(!controller.state().request_in_flight);
        assert!(controller.state().last_error.is_none());
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn successful_submission_appends_user_and_agent_pair() {
        let agent = ScriptedAgent::new(vec![Scripted::Reply(Some("10 shares at market."))]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "  What should I buy?  ").await;

        assert_eq!(
            thread(&controller),
            vec![
                (Role::User, "What should I buy?".to_string()),
                (Role::Agent, "10 shares at market.".to_string()),
            ],
        );
        assert!(!controller.state().request_in_flight);
        assert!(controller.state().last_error.is_none());
    }

    #[tokio::test]
    async fn missing_response_field_uses_the_fallback() {
        let agent = ScriptedAgent::new(vec![Scripted::Reply(None)]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "hello").await;

        assert_eq!(
            thread(&controller),
            vec![
                (Role::User, "hello".to_string()),
                (Role::Agent, NO_RESPONSE_FALLBACK.to_string()),
            ],
        );
    }

    #[tokio::test]
    async fn failure_rolls_back_the_optimistic_entry() {
        let agent = ScriptedAgent::new(vec![
            Scripted::Reply(Some("Looks fine.")),
            Scripted::Failure,
        ]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "first").await;
        let before = thread(&controller);

        controller.submit(&agent, "second").await;

        assert_eq!(thread(&controller), before);
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some(AGENT_UNAVAILABLE)
        );
        assert!(!controller.state().request_in_flight);
    }

    #[tokio::test]
    async fn consecutive_failures_are_each_a_net_no_op() {
        let agent = ScriptedAgent::new(vec![Scripted::Failure, Scripted::Failure]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "one").await;
        assert!(controller.state().messages.is_empty());

        controller.submit(&agent, "two").await;
        assert!(controller.state().messages.is_empty());
        assert_eq!(agent.calls(), 2);
    }

    #[tokio::test]
    async fn failed_then_successful_resubmission() {
        let agent = ScriptedAgent::new(vec![
            Scripted::Failure,
            Scripted::Reply(Some("Yes, 10 shares.")),
        ]);
        let mut controller = ConversationController::new();

        controller.submit(&agent, "Buy AAPL?").await;
        assert!(controller.state().messages.is_empty());
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some(AGENT_UNAVAILABLE)
        );

        controller.submit(&agent, "Buy AAPL?").await;
        assert_eq!(
            thread(&controller),
            vec![
                (Role::User, "Buy AAPL?".to_string()),
                (Role::Agent, "Yes, 10 shares.".to_string()),
            ],
        );
        assert!(controller.state().last_error.is_none());
        assert_eq!(agent.calls(), 2);
    }

    #[test]
    fn in_flight_spans_begin_to_settlement_only() {
        let mut controller = ConversationController::new();
        assert!(!controller.state().request_in_flight);

        let pending = controller.begin("ping").expect("submission accepted");
        assert!(controller.state().request_in_flight);

        // A second submission is rejected while the first is outstanding.
        assert!(controller.begin("pong").is_none());
        assert_eq!(controller.state().messages.len(), 1);

        controller.settle(
            pending,
            Ok(AgentReply {
                response: Some("pong".to_string()),
            }),
        );
        assert!(!controller.state().request_in_flight);

        let pending = controller.begin("again").expect("submission accepted");
        assert!(controller.state().request_in_flight);
        controller.settle(pending, Err(anyhow!("boom")));
        assert!(!controller.state().request_in_flight);
    }

    #[test]
    fn begin_clears_the_error_from_the_previous_cycle() {
        let mut controller = ConversationController::new();

        let pending = controller.begin("first").expect("submission accepted");
        controller.settle(pending, Err(anyhow!("boom")));
        assert!(controller.state().last_error.is_some());

        controller.begin("second").expect("submission accepted");
        assert!(controller.state().last_error.is_none());
    }

    #[test]
    fn begin_from_input_clears_the_field_only_when_accepted() {
        let mut controller = ConversationController::new();

        controller.input_mut().push_str("   ");
        assert!(controller.begin_from_input().is_none());
        assert_eq!(controller.input(), "   ");

        controller.input_mut().clear();
        controller.input_mut().push_str("  sell half  ");
        let pending = controller.begin_from_input().expect("submission accepted");
        assert_eq!(controller.input(), "");
        assert_eq!(pending.prompt, "sell half");
    }
}
