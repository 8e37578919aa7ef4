//! Lead-capture booking funnel: a sequential multi-step collection flow
//! that delivers its result to a webhook endpoint with bounded retries and
//! then redirects the lead to an external scheduling page.
//!
//! The flow is deliberately forgiving: delivery failure is retried a fixed
//! number of times and then dropped with a log line, never surfaced to the
//! lead. The redirect to the scheduler happens in every outcome so the
//! booking intent is never lost to an unreachable webhook.

pub mod analytics;
pub mod config;
pub mod delivery;
pub mod state;

pub use analytics::{AnalyticsSink, EventRecord, MemorySink, TracingSink};
pub use config::{FunnelConfig, OTHER_OPTION};
pub use delivery::{DeliveryConfig, DeliveryOutcome, WebhookClient};
pub use state::{Funnel, FunnelError, FunnelState, RecordingRedirector, Redirector, SubmissionPayload};
