use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::form::payload::Payload;
use crate::submit::error::SubmitError;

/// What happened to a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    Rejected,
    Configuration,
    NativeFallback,
    Sending,
    Succeeded,
    Transport,
    Timeout,
    Aborted,
}

impl TraceEvent {
    /// The event ending an attempt that failed with `error`.
    pub fn from_error(error: &SubmitError) -> Self {
        match error {
            SubmitError::Validation(_) => TraceEvent::Rejected,
            SubmitError::Configuration { .. } => TraceEvent::Configuration,
            SubmitError::Transport { .. } => TraceEvent::Transport,
            SubmitError::Timeout { .. } => TraceEvent::Timeout,
            SubmitError::Aborted => TraceEvent::Aborted,
            SubmitError::LegacyFallback => TraceEvent::NativeFallback,
        }
    }

    /// Everything but `Sending` closes an attempt.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TraceEvent::Sending)
    }
}

/// One line of the submission trace log.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionTrace {
    pub timestamp_ms: u128,
    pub form: String,

    pub event: TraceEvent,

    pub encoding: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,

    pub payload_fingerprint: Option<String>,
    pub elapsed_ms: Option<u128>,
}

impl SubmissionTrace {
    pub fn now(form: &str, event: TraceEvent) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            form: form.to_string(),
            event,
            encoding: None,
            status: None,
            detail: None,
            payload_fingerprint: None,
            elapsed_ms: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl ToString) -> Self {
        self.encoding = Some(encoding.to_string());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_payload(mut self, payload: &Payload) -> Self {
        self.payload_fingerprint = Some(payload_fingerprint(payload));
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis());
        self
    }
}

/// SHA-1 of the payload's JSON text; equal payloads share a fingerprint.
pub fn payload_fingerprint(payload: &Payload) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(payload.to_json().to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
