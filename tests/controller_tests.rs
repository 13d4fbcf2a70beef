mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    Behavior, FakeTransport, HOSTED_ENDPOINT, booking_form, document_with, fill_booking, page_for,
    single_form,
};
use formpost::dom::dom_model::{Control, FileEntry, FormHandle, Severity};
use formpost::dom::memory::FormFixture;
use formpost::form::payload::FieldValue;
use formpost::submit::controller::{SENDING_MESSAGE, SubmissionPhase, SubmitOutcome};
use formpost::submit::error::{CONFIGURATION_MESSAGE, SubmitError, TIMEOUT_MESSAGE, ValidationError};
use formpost::submit::transport::{GENERIC_SUCCESS_MESSAGE, RequestBody, TransportResponse};
use serde_json::json;
use tokio::sync::Notify;

const FORM: FormHandle = FormHandle(0);

// =========================================================================
// Success path
// =========================================================================

#[tokio::test]
async fn successful_submit_notifies_and_resets_form() {
    let transport = FakeTransport::respond(TransportResponse::json(200, &json!({ "message": "Booked!" })));
    let (doc, page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;

    assert!(matches!(outcome, SubmitOutcome::Succeeded { ref message } if message == "Booked!"));
    assert_eq!(transport.request_count(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.url, HOSTED_ENDPOINT);
    assert_eq!(
        request.body,
        RequestBody::Json(json!({
            "name": "Amy",
            "email": "amy@example.com",
            "phone": "+1 555 0100",
            "description": "Website refresh",
        }))
    );

    let snap = doc.snapshot(FORM).unwrap();
    assert_eq!(snap.control("name").unwrap().value, "");
    assert_eq!(snap.control("email").unwrap().value, "");
    assert_eq!(snap.resets, 1);
    assert!(snap.submit_enabled);
    assert!(!snap.busy);

    let status = snap.inline_status.unwrap();
    assert_eq!(status.severity, Severity::Success);
    assert_eq!(status.message, "Booked!");
    assert_eq!(status.class_name(), "status-success");

    let toasts = page.toasts().expect("toast area created on first toast").snapshot();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].severity, Severity::Success);

    assert_eq!(controller.phase(), SubmissionPhase::Succeeded);
    assert!(!controller.is_in_flight());
}

#[tokio::test]
async fn empty_success_body_uses_generic_message() {
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), FakeTransport::ok());
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;
    assert!(matches!(outcome, SubmitOutcome::Succeeded { ref message } if message == GENERIC_SUCCESS_MESSAGE));
}

#[tokio::test]
async fn redirect_with_error_body_counts_as_success() {
    let mut response = TransportResponse::json(422, &json!({ "error": "Form disabled" }));
    response.redirected = true;

    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), FakeTransport::respond(response));
    fill_booking(&doc, FORM);

    assert!(controller.handle_submit().await.is_success());
    assert_eq!(doc.snapshot(FORM).unwrap().resets, 1);
}

#[tokio::test]
async fn sending_state_is_visible_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let transport = FakeTransport::new(Behavior::Gated(gate.clone(), TransportResponse::new(200, "")));
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport);
    fill_booking(&doc, FORM);

    let observe = async {
        tokio::task::yield_now().await;
        let snap = doc.snapshot(FORM).unwrap();
        let seen = (
            snap.submit_enabled,
            snap.busy,
            snap.inline_status.map(|s| s.message),
            controller.phase(),
        );
        gate.notify_one();
        seen
    };

    let (outcome, seen) = tokio::join!(controller.handle_submit(), observe);

    assert!(outcome.is_success());
    assert_eq!(seen, (false, true, Some(SENDING_MESSAGE.to_string()), SubmissionPhase::Sending));

    let after = doc.snapshot(FORM).unwrap();
    assert!(after.submit_enabled);
    assert!(!after.busy);
}

// =========================================================================
// Single flight
// =========================================================================

#[tokio::test]
async fn second_submit_while_in_flight_is_a_no_op() {
    let gate = Arc::new(Notify::new());
    let transport = FakeTransport::new(Behavior::Gated(
        gate.clone(),
        TransportResponse::json(200, &json!({ "message": "Booked!" })),
    ));
    let (doc, page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());
    fill_booking(&doc, FORM);

    let second = async {
        tokio::task::yield_now().await;
        let outcome = controller.handle_submit().await;
        gate.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(controller.handle_submit(), second);

    assert!(first.is_success());
    assert!(matches!(second, SubmitOutcome::AlreadyInFlight));
    assert_eq!(transport.request_count(), 1, "no second network call");
    assert_eq!(page.toasts().unwrap().len(), 1, "no double toast");
}

#[tokio::test]
async fn form_accepts_new_submit_after_settling() {
    let transport = FakeTransport::ok();
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());

    fill_booking(&doc, FORM);
    assert!(controller.handle_submit().await.is_success());

    fill_booking(&doc, FORM);
    assert!(controller.handle_submit().await.is_success());

    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn forms_on_one_page_submit_independently_and_share_toasts() {
    let doc = document_with(vec![
        booking_form(Some(HOSTED_ENDPOINT)),
        FormFixture::new(Some("newsletter"))
            .attr("data-ajax", "")
            .attr("action", "https://example.com/subscribe")
            .control(Control::input("email").with_name("email").with_value("amy@example.com")),
    ]);
    fill_booking(&doc, FORM);

    let transport = FakeTransport::ok();
    let page = page_for(&doc);
    let controllers = page.attach(transport.clone());
    assert_eq!(controllers.len(), 2);

    let (a, b) = tokio::join!(controllers[0].handle_submit(), controllers[1].handle_submit());

    assert!(a.is_success());
    assert!(b.is_success());
    assert_eq!(transport.request_count(), 2);
    assert_eq!(page.toasts().unwrap().len(), 2);
}

// =========================================================================
// Validation and configuration errors
// =========================================================================

#[tokio::test]
async fn empty_required_fields_stop_before_network() {
    let transport = FakeTransport::ok();
    let (doc, page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());

    let outcome = controller.handle_submit().await;

    let Some(SubmitError::Validation(ValidationError::MissingFields { labels, focus })) = outcome.error() else {
        panic!("expected missing fields, got {:?}", outcome);
    };
    assert_eq!(labels, &["Name", "Email", "Phone", "Description"]);
    assert_eq!(focus.as_deref(), Some("name"));
    assert_eq!(transport.request_count(), 0);

    let snap = doc.snapshot(FORM).unwrap();
    assert_eq!(snap.focused.as_deref(), Some("name"));
    assert!(snap.submit_enabled);
    let status = snap.inline_status.unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.message.contains("Name, Email, Phone, Description"));

    let toasts = page.toasts().unwrap().snapshot();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].severity, Severity::Error);
    assert_eq!(controller.phase(), SubmissionPhase::Idle);
}

#[tokio::test]
async fn bad_email_is_rejected_with_email_message() {
    let transport = FakeTransport::ok();
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());
    fill_booking(&doc, FORM);
    doc.set_value(FORM, "email", "amy.example.com");

    let outcome = controller.handle_submit().await;

    assert!(matches!(
        outcome.error(),
        Some(SubmitError::Validation(ValidationError::InvalidEmail { .. }))
    ));
    assert_eq!(transport.request_count(), 0);
    let snap = doc.snapshot(FORM).unwrap();
    assert_eq!(snap.inline_status.unwrap().message, "Please enter a valid email address.");
    assert_eq!(snap.focused.as_deref(), Some("email"));
}

#[tokio::test]
async fn missing_endpoint_is_a_configuration_error() {
    let transport = FakeTransport::ok();
    let (doc, page, controller) = single_form(booking_form(None), transport.clone());
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;

    let Some(SubmitError::Configuration { payload }) = outcome.error() else {
        panic!("expected configuration error, got {:?}", outcome);
    };
    assert_eq!(payload.get("name"), Some(&FieldValue::Single("Amy".into())), "payload kept for diagnosis");
    assert_eq!(transport.request_count(), 0);

    let snap = doc.snapshot(FORM).unwrap();
    assert!(snap.submit_enabled);
    assert_eq!(snap.resets, 0);
    assert_eq!(snap.inline_status.unwrap().message, CONFIGURATION_MESSAGE);
    assert_eq!(page.toasts().unwrap().snapshot()[0].severity, Severity::Error);
}

#[tokio::test]
async fn unavailable_network_falls_back_to_native_submit() {
    let transport = FakeTransport::unavailable();
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport.clone());
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;

    assert!(matches!(outcome.error(), Some(SubmitError::LegacyFallback)));
    assert_eq!(transport.request_count(), 0);
    assert_eq!(doc.snapshot(FORM).unwrap().native_submissions, 1);
}

// =========================================================================
// Transport errors, timeout, abort
// =========================================================================

#[tokio::test]
async fn server_error_surfaces_body_and_keeps_fields() {
    let transport = FakeTransport::respond(TransportResponse::new(500, "\"Server overloaded\""));
    let (doc, page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport);
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;

    assert!(matches!(
        outcome.error(),
        Some(SubmitError::Transport { status: Some(500), detail }) if detail == "Server overloaded"
    ));

    let snap = doc.snapshot(FORM).unwrap();
    let status = snap.inline_status.clone().unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.message.contains("Server overloaded"));
    assert_eq!(snap.control("name").unwrap().value, "Amy", "fields not reset");
    assert_eq!(snap.resets, 0);
    assert!(snap.submit_enabled);
    assert!(!snap.busy);

    let toasts = page.toasts().unwrap().snapshot();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].severity, Severity::Error);
    assert_eq!(controller.phase(), SubmissionPhase::Failed);
}

#[tokio::test]
async fn network_failure_is_a_transport_error() {
    let transport = FakeTransport::new(Behavior::Fail("connection refused".into()));
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport);
    fill_booking(&doc, FORM);

    let outcome = controller.handle_submit().await;

    assert!(matches!(outcome.error(), Some(SubmitError::Transport { status: None, .. })));
    let snap = doc.snapshot(FORM).unwrap();
    assert!(snap.inline_status.unwrap().message.contains("connection refused"));
    assert!(snap.submit_enabled);
    assert!(!controller.is_in_flight());
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out() {
    let transport = FakeTransport::new(Behavior::Hang);
    let form = booking_form(Some(HOSTED_ENDPOINT)).attr("data-timeout", "50");
    let (doc, _page, controller) = single_form(form, transport.clone());
    fill_booking(&doc, FORM);

    let started = tokio::time::Instant::now();
    let outcome = controller.handle_submit().await;

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(matches!(
        outcome.error(),
        Some(SubmitError::Timeout { after }) if *after == Duration::from_millis(50)
    ));
    assert_eq!(transport.request_count(), 1);

    let snap = doc.snapshot(FORM).unwrap();
    assert_eq!(snap.inline_status.unwrap().message, TIMEOUT_MESSAGE);
    assert!(snap.submit_enabled);
    assert!(!snap.busy);
    assert_eq!(snap.resets, 0);
    assert_eq!(controller.phase(), SubmissionPhase::TimedOut);
    assert!(!controller.is_in_flight());
}

#[tokio::test]
async fn abort_cancels_request_and_reports_like_timeout() {
    let transport = FakeTransport::new(Behavior::Hang);
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport);
    fill_booking(&doc, FORM);

    assert!(!controller.abort(), "nothing to abort yet");

    let abort = async {
        tokio::task::yield_now().await;
        controller.abort()
    };
    let (outcome, aborted) = tokio::join!(controller.handle_submit(), abort);

    assert!(aborted);
    assert!(matches!(outcome.error(), Some(SubmitError::Aborted)));
    assert_eq!(controller.phase(), SubmissionPhase::Aborted);

    let snap = doc.snapshot(FORM).unwrap();
    assert_eq!(snap.inline_status.unwrap().message, TIMEOUT_MESSAGE);
    assert!(snap.submit_enabled);
    assert!(!snap.busy);
}

#[tokio::test]
async fn dropped_submit_future_releases_the_form() {
    let transport = FakeTransport::new(Behavior::Hang);
    let (doc, _page, controller) = single_form(booking_form(Some(HOSTED_ENDPOINT)), transport);
    fill_booking(&doc, FORM);

    let cut_short = tokio::time::timeout(Duration::from_millis(20), controller.handle_submit()).await;
    assert!(cut_short.is_err());

    assert!(!controller.is_in_flight());
    let snap = doc.snapshot(FORM).unwrap();
    assert!(snap.submit_enabled);
    assert!(!snap.busy);
}

// =========================================================================
// Multi-part selection end to end
// =========================================================================

#[tokio::test]
async fn populated_file_input_sends_multipart_despite_json_preference() {
    let form = booking_form(Some(HOSTED_ENDPOINT))
        .attr("data-encoding", "json")
        .control(Control::input("file").with_name("brief").with_id("brief"));
    let transport = FakeTransport::ok();
    let (doc, _page, controller) = single_form(form, transport.clone());
    fill_booking(&doc, FORM);
    doc.attach_file(
        FORM,
        "brief",
        FileEntry {
            name: "brief.pdf".into(),
            content_type: Some("application/pdf".into()),
            content: "%PDF-1.7".into(),
        },
    );

    assert!(controller.handle_submit().await.is_success());

    let request = &transport.requests()[0];
    assert!(matches!(request.body, RequestBody::Multipart(ref parts) if parts.len() == 5));
    assert_eq!(request.header("content-type"), None);
}

// =========================================================================
// Page wiring
// =========================================================================

#[tokio::test]
async fn unmanaged_page_attaches_nothing() {
    let doc = document_with(vec![FormFixture::new(Some("search")).attr("action", "/search")]);
    let page = page_for(&doc);

    assert!(page.managed_forms().is_empty());
    assert!(page.attach(FakeTransport::ok()).is_empty());
    assert!(page.toasts().is_none());
}
