use std::fmt;
use std::time::Duration;

use crate::form::payload::Payload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required controls left blank, labels in required-list order.
    MissingFields { labels: Vec<String>, focus: Option<String> },

    InvalidEmail { key: String, focus: Option<String> },

    InvalidPhone { key: String, focus: Option<String> },
}

impl ValidationError {
    /// Control to focus so the user can fix the problem.
    pub fn focus(&self) -> Option<&str> {
        match self {
            ValidationError::MissingFields { focus, .. }
            | ValidationError::InvalidEmail { focus, .. }
            | ValidationError::InvalidPhone { focus, .. } => focus.as_deref(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields { labels, .. } => {
                write!(f, "Please fill in the required fields: {}.", labels.join(", "))
            }
            ValidationError::InvalidEmail { .. } => {
                write!(f, "Please enter a valid email address.")
            }
            ValidationError::InvalidPhone { .. } => {
                write!(f, "Please enter a valid phone number.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum SubmitError {
    /// Missing required field or malformed email/phone. Never reaches the network.
    Validation(ValidationError),

    /// No endpoint configured; the payload is kept for diagnosis.
    Configuration { payload: Payload },

    /// Network failure (`status` is None) or non-success response.
    Transport { status: Option<u16>, detail: String },

    /// The timeout fired before a response arrived.
    Timeout { after: Duration },

    /// The request was cancelled through the controller.
    Aborted,

    /// No network capability; the form was handed to native submission.
    LegacyFallback,
}

pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";
pub const CONFIGURATION_MESSAGE: &str = "This form has no submission endpoint configured.";

impl SubmitError {
    /// Text shown to the user in toasts and the inline status.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.to_string(),
            SubmitError::Configuration { .. } => CONFIGURATION_MESSAGE.to_string(),
            SubmitError::Transport { detail, .. } => format!("Submission failed: {}", detail),
            SubmitError::Timeout { .. } | SubmitError::Aborted => TIMEOUT_MESSAGE.to_string(),
            SubmitError::LegacyFallback => "Submitting the form directly.".to_string(),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Validation(e) => write!(f, "Validation failed: {}", e),
            SubmitError::Configuration { payload } => {
                write!(f, "No endpoint configured ({} fields held back)", payload.len())
            }
            SubmitError::Transport { status: Some(status), detail } => {
                write!(f, "Request failed with status {}: {}", status, detail)
            }
            SubmitError::Transport { status: None, detail } => {
                write!(f, "Request failed: {}", detail)
            }
            SubmitError::Timeout { after } => {
                write!(f, "Request timed out after {} ms", after.as_millis())
            }
            SubmitError::Aborted => write!(f, "Request aborted"),
            SubmitError::LegacyFallback => {
                write!(f, "Network unavailable, fell back to native submission")
            }
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        SubmitError::Validation(e)
    }
}
