use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::{Control, ControlKind};

/// A single trimmed value, or the ordered values of a multi-valued group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Empty list, or a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Single(s) => s.trim().is_empty(),
            FieldValue::Multiple(v) => v.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(s) => vec![s.as_str()],
            FieldValue::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Key → value(s) map extracted from a form's live controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, FieldValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Append to a checkbox-style group, promoting a lone value to a list.
    fn push_to_group(&mut self, key: &str, value: Option<&str>) {
        let entry = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| FieldValue::Multiple(vec![]));

        if let FieldValue::Single(existing) = entry {
            *entry = FieldValue::Multiple(vec![std::mem::take(existing)]);
        }

        if let (FieldValue::Multiple(list), Some(v)) = (entry, value) {
            list.push(v.trim().to_string());
        }
    }
}

/// Build a fresh payload from the form's current controls.
///
/// Buttons and controls with neither name nor identifier are skipped.
/// Checkboxes sharing a key collect every checked value into one list
/// (an unchecked group still yields an empty list); a radio group yields
/// the checked option or nothing.
pub fn extract_payload(controls: &[Control]) -> Payload {
    let mut payload = Payload::new();

    for control in controls {
        let Some(key) = control.key() else {
            continue;
        };

        match control.kind() {
            ControlKind::Button => {}
            ControlKind::Checkbox => {
                let value = control.checked.then(|| control.checked_value());
                payload.push_to_group(key, value);
            }
            ControlKind::Radio => {
                if control.checked {
                    payload.insert(key, FieldValue::Single(control.checked_value().trim().to_string()));
                }
            }
            ControlKind::Select { multiple: true } => {
                let values = control.selected.iter().map(|v| v.trim().to_string()).collect();
                payload.insert(key, FieldValue::Multiple(values));
            }
            ControlKind::File => {
                let names = control.files.iter().map(|f| f.name.clone()).collect();
                payload.insert(key, FieldValue::Multiple(names));
            }
            ControlKind::Text | ControlKind::Hidden | ControlKind::Select { multiple: false } => {
                payload.insert(key, FieldValue::Single(control.value.trim().to_string()));
            }
        }
    }

    payload
}
