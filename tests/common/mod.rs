#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use formpost::Page;
use formpost::dom::document::Document;
use formpost::dom::dom_model::{Control, ControlTag, FormHandle};
use formpost::dom::memory::{FormFixture, InMemoryDocument, PageFixture};
use formpost::submit::controller::SubmissionController;
use formpost::submit::error::SubmitError;
use formpost::submit::transport::{SubmitRequest, Transport, TransportResponse};

// =========================================================================
// Page fixtures
// =========================================================================

pub const HOSTED_ENDPOINT: &str = "https://formspree.io/f/xyzzy";

/// The booking form: name, email, phone, description and a submit button.
pub fn booking_form(action: Option<&str>) -> FormFixture {
    let mut form = FormFixture::new(Some("bookingForm"))
        .control(Control::input("text").with_name("name").with_id("name"))
        .control(Control::input("email").with_name("email").with_id("email"))
        .control(Control::input("tel").with_name("phone").with_id("phone"))
        .control(
            Control::new(ControlTag::Textarea)
                .with_name("description")
                .with_id("description"),
        )
        .control(Control::input("submit").with_value("Book now"));

    if let Some(action) = action {
        form = form.attr("action", action);
    }
    form
}

pub fn fill_booking(document: &InMemoryDocument, form: FormHandle) {
    assert!(document.set_value(form, "name", "Amy"));
    assert!(document.set_value(form, "email", "amy@example.com"));
    assert!(document.set_value(form, "phone", "+1 555 0100"));
    assert!(document.set_value(form, "description", "Website refresh"));
}

pub fn document_with(forms: Vec<FormFixture>) -> Arc<InMemoryDocument> {
    Arc::new(InMemoryDocument::new(PageFixture { url: None, forms }))
}

pub fn page_for(document: &Arc<InMemoryDocument>) -> Page {
    let shared: Arc<dyn Document> = document.clone();
    Page::new(shared)
}

/// Page with a single managed form and its controller.
pub fn single_form(
    form: FormFixture,
    transport: Arc<FakeTransport>,
) -> (Arc<InMemoryDocument>, Page, SubmissionController) {
    let document = document_with(vec![form]);
    let page = page_for(&document);
    let controller = page
        .attach(transport)
        .into_iter()
        .next()
        .expect("form should be managed");
    (document, page, controller)
}

// =========================================================================
// Scripted transport
// =========================================================================

#[derive(Clone)]
pub enum Behavior {
    Respond(TransportResponse),
    Fail(String),
    /// Never answers.
    Hang,
    /// Answers once the gate is notified.
    Gated(Arc<Notify>, TransportResponse),
}

pub struct FakeTransport {
    behavior: Behavior,
    available: bool,
    requests: Mutex<Vec<SubmitRequest>>,
}

impl FakeTransport {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            available: true,
            requests: Mutex::new(vec![]),
        })
    }

    pub fn respond(response: TransportResponse) -> Arc<Self> {
        Self::new(Behavior::Respond(response))
    }

    pub fn ok() -> Arc<Self> {
        Self::respond(TransportResponse::new(200, ""))
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Hang,
            available: false,
            requests: Mutex::new(vec![]),
        })
    }

    pub fn requests(&self) -> Vec<SubmitRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: SubmitRequest) -> Result<TransportResponse, SubmitError> {
        self.requests.lock().unwrap().push(request);

        match self.behavior.clone() {
            Behavior::Respond(response) => Ok(response),
            Behavior::Fail(detail) => Err(SubmitError::Transport { status: None, detail }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Gated(gate, response) => {
                gate.notified().await;
                Ok(response)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

// =========================================================================
// Temp files
// =========================================================================

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("formpost-{}-{}", std::process::id(), name))
}
