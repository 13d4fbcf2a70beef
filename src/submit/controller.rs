use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::dom::document::Document;
use crate::dom::dom_model::Severity;
use crate::form::descriptor::FormDescriptor;
use crate::form::payload::{Payload, extract_payload};
use crate::form::validator::validate;
use crate::notify::notifier::Notifier;
use crate::submit::error::{SubmitError, ValidationError};
use crate::submit::transport::{Transport, TransportResponse, build_request};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{SubmissionTrace, TraceEvent};

pub const SENDING_MESSAGE: &str = "Sending…";

/// Idle → Sending → {Succeeded, Failed, TimedOut, Aborted}.
/// Terminal phases stay visible until the next request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Sending,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
}

#[derive(Debug)]
struct SubmissionState {
    in_flight: bool,
    cancel: Option<CancellationToken>,
    phase: SubmissionPhase,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// A request was already outstanding; nothing happened.
    AlreadyInFlight,
    Succeeded { message: String },
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            SubmitOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Drives one managed form: extract → validate → encode → send → notify.
pub struct SubmissionController {
    descriptor: FormDescriptor,
    document: Arc<dyn Document>,
    transport: Arc<dyn Transport>,
    notifier: Notifier,
    tracer: Arc<TraceLogger>,
    state: Mutex<SubmissionState>,
}

impl SubmissionController {
    pub fn new(
        descriptor: FormDescriptor,
        document: Arc<dyn Document>,
        transport: Arc<dyn Transport>,
        notifier: Notifier,
        tracer: Arc<TraceLogger>,
    ) -> Self {
        Self {
            descriptor,
            document,
            transport,
            notifier,
            tracer,
            state: Mutex::new(SubmissionState {
                in_flight: false,
                cancel: None,
                phase: SubmissionPhase::Idle,
            }),
        }
    }

    pub fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.lock().phase
    }

    /// Cancel the outstanding request, if any.
    pub fn abort(&self) -> bool {
        match &self.lock().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Handle one submit event.
    pub async fn handle_submit(&self) -> SubmitOutcome {
        let form = self.descriptor.handle;

        if self.is_in_flight() {
            tracing::debug!(form = %self.descriptor.name, "submit ignored, request in flight");
            return SubmitOutcome::AlreadyInFlight;
        }

        // ---- Extract + validate ----
        let controls = self.document.controls(form);
        let payload = extract_payload(&controls);

        if let Err(e) = validate(&payload, &controls, &self.descriptor.required) {
            return self.reject(e, &payload);
        }

        let Some(endpoint) = self.descriptor.endpoint.clone() else {
            return self.misconfigured(payload);
        };

        if !self.transport.is_available() {
            tracing::info!(form = %self.descriptor.name, "no network transport, submitting natively");
            self.document.submit_natively(form);
            self.trace(
                SubmissionTrace::now(&self.descriptor.name, TraceEvent::NativeFallback).with_payload(&payload),
            );
            return SubmitOutcome::Failed(SubmitError::LegacyFallback);
        }

        // ---- Send ----
        let request = build_request(&self.descriptor, &endpoint, &payload, &controls);
        let encoding = request.encoding();

        let Some(mut guard) = InFlightGuard::acquire(self) else {
            return SubmitOutcome::AlreadyInFlight;
        };
        let token = guard.token.clone();

        self.notifier.inline(form, SENDING_MESSAGE, Severity::Info);
        self.trace(
            SubmissionTrace::now(&self.descriptor.name, TraceEvent::Sending)
                .with_encoding(encoding.as_str())
                .with_payload(&payload),
        );
        tracing::debug!(
            form = %self.descriptor.name,
            method = %request.method,
            url = %request.url,
            encoding = encoding.as_str(),
            "sending submission"
        );

        let started = Instant::now();
        let timeout = self.descriptor.timeout;

        let result = tokio::select! {
            _ = token.cancelled() => Err(SubmitError::Aborted),
            _ = tokio::time::sleep(timeout) => Err(SubmitError::Timeout { after: timeout }),
            response = self.transport.send(request) => response,
        };

        // ---- Settle ----
        let outcome = match result {
            Ok(response) if response.is_success() => {
                guard.phase = SubmissionPhase::Succeeded;
                self.succeed(&response, started)
            }
            Ok(response) => {
                guard.phase = SubmissionPhase::Failed;
                self.fail(
                    SubmitError::Transport {
                        status: Some(response.status),
                        detail: response.error_detail(),
                    },
                    started,
                )
            }
            Err(e) => {
                guard.phase = match e {
                    SubmitError::Timeout { .. } => SubmissionPhase::TimedOut,
                    SubmitError::Aborted => SubmissionPhase::Aborted,
                    _ => SubmissionPhase::Failed,
                };
                self.fail(e, started)
            }
        };

        drop(guard);
        outcome
    }

    fn succeed(&self, response: &TransportResponse, started: Instant) -> SubmitOutcome {
        if response.redirected && response.body.contains("\"error\"") {
            // Redirects win over error-shaped bodies.
            tracing::debug!(form = %self.descriptor.name, "redirect carried an error body, treating as success");
        }

        let message = response.success_message();
        self.notifier.both(self.descriptor.handle, &message, Severity::Success);
        self.document.reset(self.descriptor.handle);

        self.trace(
            SubmissionTrace::now(&self.descriptor.name, TraceEvent::Succeeded)
                .with_status(response.status)
                .with_elapsed(started.elapsed()),
        );

        SubmitOutcome::Succeeded { message }
    }

    fn fail(&self, error: SubmitError, started: Instant) -> SubmitOutcome {
        tracing::debug!(form = %self.descriptor.name, error = %error, "submission failed");
        self.notifier
            .both(self.descriptor.handle, &error.user_message(), Severity::Error);

        let mut event = SubmissionTrace::now(&self.descriptor.name, TraceEvent::from_error(&error))
            .with_detail(&error)
            .with_elapsed(started.elapsed());
        if let SubmitError::Transport { status: Some(status), .. } = &error {
            event = event.with_status(*status);
        }
        self.trace(event);

        SubmitOutcome::Failed(error)
    }

    fn reject(&self, error: ValidationError, payload: &Payload) -> SubmitOutcome {
        let form = self.descriptor.handle;
        self.notifier.both(form, &error.to_string(), Severity::Error);
        if let Some(target) = error.focus() {
            self.document.focus(form, target);
        }

        self.trace(
            SubmissionTrace::now(&self.descriptor.name, TraceEvent::Rejected)
                .with_detail(&error)
                .with_payload(payload),
        );

        SubmitOutcome::Failed(SubmitError::Validation(error))
    }

    fn misconfigured(&self, payload: Payload) -> SubmitOutcome {
        tracing::warn!(
            form = %self.descriptor.name,
            payload = %payload.to_json(),
            "no endpoint configured, submission held back"
        );

        let event = SubmissionTrace::now(&self.descriptor.name, TraceEvent::Configuration).with_payload(&payload);
        let error = SubmitError::Configuration { payload };
        self.notifier
            .both(self.descriptor.handle, &error.user_message(), Severity::Error);
        self.trace(event.with_detail(&error));

        SubmitOutcome::Failed(error)
    }

    fn trace(&self, event: SubmissionTrace) {
        self.tracer.log(&event);
    }
}

/// Holds the single-flight slot for one request.
///
/// Dropping it releases the slot, re-enables the submit control and hides
/// the busy indicator, whichever way the request ended.
struct InFlightGuard<'a> {
    controller: &'a SubmissionController,
    token: CancellationToken,
    phase: SubmissionPhase,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(controller: &'a SubmissionController) -> Option<Self> {
        let token = CancellationToken::new();
        {
            let mut state = controller.lock();
            if state.in_flight {
                return None;
            }
            state.in_flight = true;
            state.cancel = Some(token.clone());
            state.phase = SubmissionPhase::Sending;
        }

        let form = controller.descriptor.handle;
        controller.document.set_submit_enabled(form, false);
        controller.document.set_busy(form, true);

        Some(Self {
            controller,
            token,
            // Dropped before settling means the caller went away.
            phase: SubmissionPhase::Aborted,
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.controller.lock();
            state.in_flight = false;
            state.cancel = None;
            state.phase = self.phase;
        }

        let form = self.controller.descriptor.handle;
        self.controller.document.set_submit_enabled(form, true);
        self.controller.document.set_busy(form, false);
    }
}
