use std::time::Duration;

use reqwest::{Method, Url};

use crate::dom::dom_model::{FormElement, FormHandle};
use crate::form::selector::{FormClassification, classify_form};

pub const REQUIRED_ATTR: &str = "data-required";
pub const ENCODING_ATTR: &str = "data-encoding";
pub const TIMEOUT_ATTR: &str = "data-timeout";

pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "email",
    "phone",
    "business",
    "description",
    "category",
    "deadline",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPreference {
    Auto,
    Json,
    Multipart,
}

impl EncodingPreference {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => EncodingPreference::Json,
            Some("multipart") => EncodingPreference::Multipart,
            _ => EncodingPreference::Auto,
        }
    }
}

/// Everything the controller needs to know about one managed form.
/// Derived once at setup from the form's attributes.
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub handle: FormHandle,
    pub name: String,
    pub classification: FormClassification,
    pub required: Vec<String>,
    pub timeout: Duration,
    pub encoding: EncodingPreference,
    pub endpoint: Option<String>,
    pub method: Method,
}

impl FormDescriptor {
    pub fn from_element(form: &FormElement) -> Self {
        Self::with_default_timeout(form, DEFAULT_TIMEOUT_MS)
    }

    /// Like [`FormDescriptor::from_element`], with a page-wide fallback timeout.
    pub fn with_default_timeout(form: &FormElement, default_timeout_ms: u64) -> Self {
        let required = match form.attr(REQUIRED_ATTR) {
            Some(list) => parse_field_list(list),
            None => DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        };

        let timeout_ms = form
            .attr(TIMEOUT_ATTR)
            .and_then(|t| t.trim().parse::<u64>().ok())
            .filter(|t| *t > 0)
            .unwrap_or(default_timeout_ms);

        let endpoint = form
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Self {
            handle: form.handle,
            name: form.display_name(),
            classification: classify_form(form),
            required,
            timeout: Duration::from_millis(timeout_ms),
            encoding: EncodingPreference::parse(form.attr(ENCODING_ATTR)),
            endpoint,
            method: parse_method(form.attr("method")),
        }
    }

    /// Resolve a relative endpoint against the page address, the way a
    /// browser resolves a form's `action`. Absolute endpoints are unchanged.
    pub fn resolve_against(mut self, base: Option<&str>) -> Self {
        let (Some(endpoint), Some(base)) = (self.endpoint.clone(), base) else {
            return self;
        };
        if Url::parse(&endpoint).is_ok() {
            return self;
        }

        match Url::parse(base).and_then(|b| b.join(&endpoint)) {
            Ok(url) => self.endpoint = Some(url.to_string()),
            Err(e) => {
                tracing::warn!(form = %self.name, base, %endpoint, "could not resolve form action: {}", e);
            }
        }
        self
    }
}

pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_method(raw: Option<&str>) -> Method {
    match raw.map(|m| m.trim().to_ascii_uppercase()).as_deref() {
        Some("GET") => Method::GET,
        Some("PUT") => Method::PUT,
        Some("PATCH") => Method::PATCH,
        Some("DELETE") => Method::DELETE,
        _ => Method::POST,
    }
}
