use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::dom::dom_model::{Control, ControlKind, FileEntry};
use crate::form::descriptor::{EncodingPreference, FormDescriptor};
use crate::form::payload::Payload;
use crate::form::selector::is_hosted_backend;
use crate::submit::error::SubmitError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const GENERIC_SUCCESS_MESSAGE: &str = "Thank you! Your submission has been received.";

// ============================================================================
// Encoding choice
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Multipart,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Multipart => "multipart",
        }
    }
}

/// File controls force multi-part, then the declared preference wins,
/// then the endpoint decides (hosted backend → JSON).
pub fn choose_encoding(descriptor: &FormDescriptor, controls: &[Control]) -> Encoding {
    if controls.iter().any(|c| c.kind() == ControlKind::File) {
        return Encoding::Multipart;
    }

    match descriptor.encoding {
        EncodingPreference::Json => Encoding::Json,
        EncodingPreference::Multipart => Encoding::Multipart,
        EncodingPreference::Auto => {
            if descriptor.endpoint.as_deref().is_some_and(is_hosted_backend) {
                Encoding::Json
            } else {
                Encoding::Multipart
            }
        }
    }
}

// ============================================================================
// Request model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(FileEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<MultipartPart>),
}

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl SubmitRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn encoding(&self) -> Encoding {
        match self.body {
            RequestBody::Json(_) => Encoding::Json,
            RequestBody::Multipart(_) => Encoding::Multipart,
        }
    }
}

/// Build the request body for `endpoint`.
///
/// JSON serializes the payload as-is. Multi-part re-walks the controls
/// and leaves the content type to the transport so it can add the boundary.
pub fn build_request(
    descriptor: &FormDescriptor,
    endpoint: &str,
    payload: &Payload,
    controls: &[Control],
) -> SubmitRequest {
    let mut headers = vec![(ACCEPT.as_str().to_string(), JSON_CONTENT_TYPE.to_string())];

    let body = match choose_encoding(descriptor, controls) {
        Encoding::Json => {
            headers.push((CONTENT_TYPE.as_str().to_string(), JSON_CONTENT_TYPE.to_string()));
            RequestBody::Json(payload.to_json())
        }
        Encoding::Multipart => RequestBody::Multipart(multipart_parts(controls)),
    };

    SubmitRequest {
        method: descriptor.method.clone(),
        url: endpoint.to_string(),
        headers,
        body,
    }
}

/// Control values in document order, the way a browser builds form data.
pub fn multipart_parts(controls: &[Control]) -> Vec<MultipartPart> {
    let mut parts = Vec::new();

    for control in controls {
        let Some(key) = control.key() else {
            continue;
        };
        let text = |value: &str| MultipartPart {
            name: key.to_string(),
            value: PartValue::Text(value.to_string()),
        };

        match control.kind() {
            ControlKind::Button => {}
            ControlKind::Checkbox | ControlKind::Radio => {
                if control.checked {
                    parts.push(text(control.checked_value()));
                }
            }
            ControlKind::Select { multiple: true } => {
                parts.extend(control.selected.iter().map(|v| text(v.as_str())));
            }
            ControlKind::File => {
                parts.extend(control.files.iter().map(|f| MultipartPart {
                    name: key.to_string(),
                    value: PartValue::File(f.clone()),
                }));
            }
            ControlKind::Text | ControlKind::Hidden | ControlKind::Select { multiple: false } => {
                parts.push(text(control.value.as_str()));
            }
        }
    }

    parts
}

// ============================================================================
// Response model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub redirected: bool,
    pub content_type: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            redirected: false,
            content_type: None,
            body: body.to_string(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            redirected: false,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            body: body.to_string(),
        }
    }

    /// 2xx/3xx or a followed redirect. A redirect counts as success even if
    /// the body looks like an error.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status) || self.redirected
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// The body as JSON. A declared non-JSON content type is taken at its
    /// word; without one the body is sniffed.
    fn parsed_body(&self) -> Option<Value> {
        if self
            .content_type
            .as_deref()
            .is_some_and(|ct| !ct.to_ascii_lowercase().contains("json"))
        {
            return None;
        }

        let trimmed = self.body.trim();
        if trimmed.is_empty() {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    pub fn success_message(&self) -> String {
        self.parsed_body()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_SUCCESS_MESSAGE.to_string())
    }

    pub fn error_detail(&self) -> String {
        if let Some(detail) = self.parsed_body().as_ref().and_then(json_error_detail) {
            return detail;
        }

        let raw = self.body.trim();
        if !raw.is_empty() {
            return raw.to_string();
        }

        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status");
        format!("{} {}", self.status, reason)
    }
}

fn json_error_detail(value: &Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }

    ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| {
            value
                .get("errors")?
                .as_array()?
                .iter()
                .find_map(|e| e.get("message").and_then(Value::as_str))
                .map(str::to_string)
        })
}

// ============================================================================
// Transport
// ============================================================================

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: SubmitRequest) -> Result<TransportResponse, SubmitError>;

    /// False when the environment has no network capability.
    fn is_available(&self) -> bool {
        true
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua.to_string());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn network_error(e: impl std::fmt::Display) -> SubmitError {
    SubmitError::Transport {
        status: None,
        detail: e.to_string(),
    }
}

fn to_multipart_form(parts: Vec<MultipartPart>) -> Result<Form, SubmitError> {
    let mut form = Form::new();

    for part in parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File(file) => {
                let mut file_part = Part::bytes(file.content.into_bytes()).file_name(file.name);
                if let Some(ct) = &file.content_type {
                    file_part = file_part.mime_str(ct).map_err(network_error)?;
                }
                form.part(part.name, file_part)
            }
        };
    }

    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: SubmitRequest) -> Result<TransportResponse, SubmitError> {
        let requested = reqwest::Url::parse(&request.url).map_err(network_error)?;

        let mut builder = self.client.request(request.method, requested.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Json(value) => {
                builder.body(serde_json::to_vec(&value).map_err(network_error)?)
            }
            RequestBody::Multipart(parts) => builder.multipart(to_multipart_form(parts)?),
        };

        let response = builder.send().await.map_err(network_error)?;

        let status = response.status().as_u16();
        let redirected = response.url() != &requested;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(network_error)?;

        Ok(TransportResponse {
            status,
            redirected,
            content_type,
            body,
        })
    }
}
