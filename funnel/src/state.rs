//! The funnel state machine.
//!
//! States are the ordered collection steps 1..=3 plus `Idle` (closed) and
//! the terminal `Redirecting` screen. All transitions run on discrete
//! events owned by a single session; the `submitting` flag guards against a
//! duplicate submission while a delivery cycle is suspended at an await
//! point.

use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::analytics::AnalyticsSink;
use crate::config::{FunnelConfig, OTHER_OPTION};
use crate::delivery::{DeliveryOutcome, WebhookClient};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelState {
    /// Closed; no answers held.
    Idle,
    /// Collecting answers on the given step (1..=3).
    Step(u8),
    /// Submission finished; waiting out the display delay before the
    /// external scheduler opens.
    Redirecting,
}

#[derive(Debug, Error, PartialEq)]
pub enum FunnelError {
    #[error("'{0}' is not in the permitted option set")]
    UnknownOption(String),
    #[error("required fields for this step are incomplete")]
    Incomplete,
    #[error("action is not valid in the current state")]
    InvalidState,
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

/// Finalized funnel answers as posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub intent: String,
    #[serde(rename = "otherText", skip_serializing_if = "Option::is_none")]
    pub other_text: Option<String>,
    pub company_size: String,
    pub timeline: String,
    /// ISO 8601 timestamp generated at submit time.
    pub ts: String,
}

/// Opens the external scheduling destination in a new browsing context.
pub trait Redirector: Send + Sync {
    fn open(&self, url: &str);
}

/// Redirector that records opened URLs; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct RecordingRedirector {
    urls: Arc<Mutex<Vec<String>>>,
}

impl RecordingRedirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl Redirector for RecordingRedirector {
    fn open(&self, url: &str) {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
    }
}

pub struct Funnel {
    config: FunnelConfig,
    sink: Arc<dyn AnalyticsSink>,
    state: FunnelState,
    intent: Option<String>,
    other_text: String,
    company_size: Option<String>,
    timeline: Option<String>,
    submitting: bool,
}

impl Funnel {
    pub fn new(config: FunnelConfig, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            config,
            sink,
            state: FunnelState::Idle,
            intent: None,
            other_text: String::new(),
            company_size: None,
            timeline: None,
            submitting: false,
        }
    }

    pub fn with_defaults(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self::new(FunnelConfig::default(), sink)
    }

    pub fn state(&self) -> FunnelState {
        self.state
    }

    pub fn intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn other_text(&self) -> &str {
        &self.other_text
    }

    pub fn company_size(&self) -> Option<&str> {
        self.company_size.as_deref()
    }

    pub fn timeline(&self) -> Option<&str> {
        self.timeline.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Activation signal: opens the funnel at step 1.
    pub fn open(&mut self) -> Result<(), FunnelError> {
        if self.state != FunnelState::Idle {
            return Err(FunnelError::InvalidState);
        }
        self.state = FunnelState::Step(FIRST_STEP);
        self.sink.push("modal_open", json!({}));
        Ok(())
    }

    /// Explicit cancel or the global Escape signal. Clears every collected
    /// answer; no delivery attempt is made.
    pub fn cancel(&mut self) -> Result<(), FunnelError> {
        if self.state == FunnelState::Idle {
            return Err(FunnelError::InvalidState);
        }
        self.sink.push("modal_close", json!({}));
        self.reset();
        Ok(())
    }

    pub fn select_intent(&mut self, value: &str) -> Result<(), FunnelError> {
        self.require_step(1)?;
        if !self.config.intent_options.iter().any(|o| o == value) {
            return Err(FunnelError::UnknownOption(value.to_string()));
        }
        self.intent = Some(value.to_string());
        Ok(())
    }

    /// Stores the "Other" elaboration, silently capped at the configured
    /// character limit; over-long input is truncated, never rejected.
    pub fn set_other_text(&mut self, text: &str) -> Result<(), FunnelError> {
        self.require_step(1)?;
        self.other_text = text.chars().take(self.config.other_max_chars).collect();
        Ok(())
    }

    pub fn select_company_size(&mut self, value: &str) -> Result<(), FunnelError> {
        self.require_step(LAST_STEP)?;
        if !self.config.company_size_options.iter().any(|o| o == value) {
            return Err(FunnelError::UnknownOption(value.to_string()));
        }
        self.company_size = Some(value.to_string());
        Ok(())
    }

    pub fn select_timeline(&mut self, value: &str) -> Result<(), FunnelError> {
        self.require_step(LAST_STEP)?;
        if !self.config.timeline_options.iter().any(|o| o == value) {
            return Err(FunnelError::UnknownOption(value.to_string()));
        }
        self.timeline = Some(value.to_string());
        Ok(())
    }

    /// Whether the current step's required-field predicate holds.
    pub fn can_continue(&self) -> bool {
        match self.state {
            FunnelState::Step(1) => match self.intent.as_deref() {
                None => false,
                Some(OTHER_OPTION) => {
                    let trimmed = self.other_text.trim();
                    !trimmed.is_empty() && trimmed.chars().count() <= self.config.other_max_chars
                }
                Some(_) => true,
            },
            // Step 2 is informational only.
            FunnelState::Step(2) => true,
            FunnelState::Step(3) => self.company_size.is_some() && self.timeline.is_some(),
            _ => false,
        }
    }

    /// Forward transition `step k -> k+1`; emits the step-completion event
    /// carrying that step's answers.
    pub fn advance(&mut self) -> Result<(), FunnelError> {
        let FunnelState::Step(step) = self.state else {
            return Err(FunnelError::InvalidState);
        };
        if step >= LAST_STEP {
            // The final step leaves via submit(), not advance().
            return Err(FunnelError::InvalidState);
        }
        if !self.can_continue() {
            return Err(FunnelError::Incomplete);
        }

        let data = match step {
            1 => json!({ "intent": self.intent, "otherText": self.other_text }),
            _ => json!({}),
        };
        self.sink.push(&format!("funnel_step{step}_completed"), data);
        self.state = FunnelState::Step(step + 1);
        Ok(())
    }

    /// Backward transition; previously entered answers are preserved.
    pub fn back(&mut self) -> Result<(), FunnelError> {
        match self.state {
            FunnelState::Step(step) if step > FIRST_STEP => {
                self.state = FunnelState::Step(step - 1);
                Ok(())
            }
            _ => Err(FunnelError::InvalidState),
        }
    }

    /// Assembles the payload with a fresh submission timestamp.
    fn build_payload(&self) -> SubmissionPayload {
        let intent = self.intent.clone().unwrap_or_default();
        let other_text = if intent == OTHER_OPTION {
            Some(self.other_text.trim().to_string())
        } else {
            None
        };
        SubmissionPayload {
            intent,
            other_text,
            company_size: self.company_size.clone().unwrap_or_default(),
            timeline: self.timeline.clone().unwrap_or_default(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Final-step submission: assembles the payload, attempts delivery with
    /// the client's retry budget, and enters `Redirecting` regardless of the
    /// delivery outcome.
    pub async fn submit(&mut self, client: &WebhookClient) -> Result<DeliveryOutcome, FunnelError> {
        if self.state != FunnelState::Step(LAST_STEP) {
            return Err(FunnelError::InvalidState);
        }
        if self.submitting {
            return Err(FunnelError::AlreadySubmitting);
        }
        if !self.can_continue() {
            return Err(FunnelError::Incomplete);
        }

        self.submitting = true;
        let payload = self.build_payload();
        self.sink
            .push("funnel_step3_completed", json!({ "payload": payload }));

        let body = match serde_json::to_vec(&payload) {
            Ok(body) => body,
            Err(e) => {
                self.submitting = false;
                return Err(FunnelError::Serialize(e.to_string()));
            }
        };
        let outcome = client.deliver(&body).await;

        self.sink.push(
            "funnel_step4_started",
            json!({ "success": outcome.success, "attempts": outcome.attempts }),
        );
        self.submitting = false;
        self.state = FunnelState::Redirecting;
        self.sink.push("redirect_to_scheduler", json!({}));
        Ok(outcome)
    }

    /// Terminal-state timer: waits out the display delay, opens the external
    /// scheduler, and resets the funnel to `Idle` with all fields cleared.
    pub async fn complete_redirect(
        &mut self,
        redirector: &dyn Redirector,
    ) -> Result<(), FunnelError> {
        if self.state != FunnelState::Redirecting {
            return Err(FunnelError::InvalidState);
        }
        tokio::time::sleep(self.config.redirect_delay).await;
        redirector.open(&self.config.scheduler_url);
        self.reset();
        Ok(())
    }

    fn require_step(&self, step: u8) -> Result<(), FunnelError> {
        if self.state == FunnelState::Step(step) {
            Ok(())
        } else {
            Err(FunnelError::InvalidState)
        }
    }

    fn reset(&mut self) {
        self.state = FunnelState::Idle;
        self.intent = None;
        self.other_text.clear();
        self.company_size = None;
        self.timeline = None;
        self.submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use crate::analytics::MemorySink;

    use super::*;

    fn open_funnel() -> (Funnel, MemorySink) {
        let sink = MemorySink::new();
        let mut funnel = Funnel::with_defaults(Arc::new(sink.clone()));
        funnel.open().unwrap();
        (funnel, sink)
    }

    #[test]
    fn open_emits_modal_open() {
        let (funnel, sink) = open_funnel();
        assert_eq!(funnel.state(), FunnelState::Step(1));
        assert_eq!(sink.names(), vec!["modal_open"]);
    }

    #[test]
    fn open_twice_is_rejected() {
        let (mut funnel, _) = open_funnel();
        assert_eq!(funnel.open(), Err(FunnelError::InvalidState));
    }

    #[test]
    fn step1_requires_an_intent() {
        let (mut funnel, _) = open_funnel();
        assert!(!funnel.can_continue());
        assert_eq!(funnel.advance(), Err(FunnelError::Incomplete));

        funnel.select_intent("Build an app").unwrap();
        assert!(funnel.can_continue());
        funnel.advance().unwrap();
        assert_eq!(funnel.state(), FunnelState::Step(2));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let (mut funnel, _) = open_funnel();
        assert_eq!(
            funnel.select_intent("World domination"),
            Err(FunnelError::UnknownOption("World domination".to_string()))
        );
    }

    #[test]
    fn other_without_elaboration_blocks_continuation() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent(OTHER_OPTION).unwrap();
        assert!(!funnel.can_continue());

        funnel.set_other_text("   ").unwrap();
        assert!(!funnel.can_continue());

        funnel.set_other_text("Custom integration").unwrap();
        assert!(funnel.can_continue());
    }

    #[test]
    fn elaboration_is_truncated_to_the_cap() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent(OTHER_OPTION).unwrap();
        funnel.set_other_text(&"a".repeat(35)).unwrap();

        assert_eq!(funnel.other_text(), "a".repeat(30));
        assert!(funnel.can_continue());
    }

    #[test]
    fn step1_completion_event_carries_answers() {
        let (mut funnel, sink) = open_funnel();
        funnel.select_intent("AI solution").unwrap();
        funnel.advance().unwrap();

        let events = sink.events();
        let completed = &events[1];
        assert_eq!(completed.event, "funnel_step1_completed");
        assert_eq!(completed.data["intent"], "AI solution");
    }

    #[test]
    fn step2_is_always_continuable() {
        let (mut funnel, sink) = open_funnel();
        funnel.select_intent("Automate operations").unwrap();
        funnel.advance().unwrap();
        assert!(funnel.can_continue());
        funnel.advance().unwrap();

        assert_eq!(funnel.state(), FunnelState::Step(3));
        assert!(sink.names().contains(&"funnel_step2_completed".to_string()));
    }

    #[test]
    fn step3_requires_both_selections() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent("Build an app").unwrap();
        funnel.advance().unwrap();
        funnel.advance().unwrap();

        assert!(!funnel.can_continue());
        funnel.select_company_size("11-50").unwrap();
        assert!(!funnel.can_continue());
        funnel.select_timeline("ASAP").unwrap();
        assert!(funnel.can_continue());
    }

    #[test]
    fn back_preserves_answers() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent("Build an app").unwrap();
        funnel.advance().unwrap();
        funnel.advance().unwrap();
        funnel.select_company_size("50+").unwrap();

        funnel.back().unwrap();
        assert_eq!(funnel.state(), FunnelState::Step(2));
        funnel.advance().unwrap();
        assert_eq!(funnel.company_size(), Some("50+"));
        assert_eq!(funnel.intent(), Some("Build an app"));
    }

    #[test]
    fn back_from_step1_is_rejected() {
        let (mut funnel, _) = open_funnel();
        assert_eq!(funnel.back(), Err(FunnelError::InvalidState));
    }

    #[test]
    fn cancel_clears_everything_and_emits_modal_close() {
        let (mut funnel, sink) = open_funnel();
        funnel.select_intent(OTHER_OPTION).unwrap();
        funnel.set_other_text("Custom integration").unwrap();
        funnel.cancel().unwrap();

        assert_eq!(funnel.state(), FunnelState::Idle);
        assert_eq!(sink.names(), vec!["modal_open", "modal_close"]);

        // Reopening shows step 1 in its initial empty state.
        funnel.open().unwrap();
        assert_eq!(funnel.intent(), None);
        assert_eq!(funnel.other_text(), "");
        assert!(!funnel.can_continue());
    }

    #[test]
    fn selections_outside_their_step_are_rejected() {
        let (mut funnel, _) = open_funnel();
        assert_eq!(
            funnel.select_company_size("1-10"),
            Err(FunnelError::InvalidState)
        );
        funnel.select_intent("AI solution").unwrap();
        funnel.advance().unwrap();
        assert_eq!(
            funnel.select_intent("Build an app"),
            Err(FunnelError::InvalidState)
        );
    }

    #[test]
    fn payload_omits_other_text_for_regular_intents() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent("Build an app").unwrap();
        funnel.advance().unwrap();
        funnel.advance().unwrap();
        funnel.select_company_size("1-10").unwrap();
        funnel.select_timeline("3+ months").unwrap();

        let payload = funnel.build_payload();
        assert_eq!(payload.other_text, None);
        let encoded = serde_json::to_string(&payload).unwrap();
        assert!(!encoded.contains("otherText"));
    }

    #[test]
    fn payload_carries_trimmed_other_text() {
        let (mut funnel, _) = open_funnel();
        funnel.select_intent(OTHER_OPTION).unwrap();
        funnel.set_other_text("  Custom integration  ").unwrap();
        funnel.advance().unwrap();
        funnel.advance().unwrap();
        funnel.select_company_size("1-10").unwrap();
        funnel.select_timeline("ASAP").unwrap();

        let payload = funnel.build_payload();
        assert_eq!(payload.other_text.as_deref(), Some("Custom integration"));
        assert!(!payload.ts.is_empty());
    }
}
