//! Intercepts HTML form submissions and sends them over HTTP.
//!
//! A [`Page`] finds the forms it should manage, then one
//! [`SubmissionController`](submit::controller::SubmissionController) per form
//! runs extract → validate → encode → send → notify on every submit event.

pub mod cli;
pub mod dom;
pub mod form;
pub mod notify;
pub mod page;
pub mod submit;
pub mod trace;

pub use page::Page;
pub use submit::controller::{SubmissionController, SubmissionPhase, SubmitOutcome};
pub use submit::error::{SubmitError, ValidationError};
