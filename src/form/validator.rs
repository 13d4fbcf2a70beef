use std::sync::LazyLock;

use regex::Regex;

use crate::dom::dom_model::Control;
use crate::form::payload::Payload;
use crate::submit::error::ValidationError;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-().\s]{6,20}$").expect("phone pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub field: String,
    pub label: String,
    pub focus: Option<String>,
}

/// Required fields whose control exists but holds nothing.
///
/// Required names with no matching control are not applicable and never
/// reported. Order follows the required list.
pub fn find_missing(payload: &Payload, controls: &[Control], required: &[String]) -> Vec<MissingField> {
    required
        .iter()
        .filter_map(|field| {
            let control = controls.iter().find(|c| c.answers_to(field))?;
            let blank = control
                .key()
                .and_then(|key| payload.get(key))
                .is_none_or(|value| value.is_blank());

            blank.then(|| MissingField {
                field: field.clone(),
                label: capitalize(field),
                focus: control.focus_target().map(str::to_string),
            })
        })
        .collect()
}

/// Required-field check followed by email/phone format checks.
pub fn validate(payload: &Payload, controls: &[Control], required: &[String]) -> Result<(), ValidationError> {
    let missing = find_missing(payload, controls, required);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            focus: missing.iter().find_map(|m| m.focus.clone()),
            labels: missing.into_iter().map(|m| m.label).collect(),
        });
    }

    for (key, value) in payload.iter() {
        let is_email = key.eq_ignore_ascii_case("email");
        let is_phone = key.eq_ignore_ascii_case("phone");
        if !is_email && !is_phone {
            continue;
        }

        let malformed = value
            .values()
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .any(|v| if is_email { !is_valid_email(v) } else { !is_valid_phone(v) });

        if malformed {
            let focus = controls
                .iter()
                .find(|c| c.key() == Some(key.as_str()))
                .and_then(|c| c.focus_target())
                .map(str::to_string);

            return Err(if is_email {
                ValidationError::InvalidEmail { key: key.clone(), focus }
            } else {
                ValidationError::InvalidPhone { key: key.clone(), focus }
            });
        }
    }

    Ok(())
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_PATTERN.is_match(value)
}

pub fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
