use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque reference to one form element on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormHandle(pub usize);

/// A form element as seen at setup time: its identifier plus raw attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FormElement {
    pub handle: FormHandle,
    pub id: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl FormElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Human readable name used in logs and traces.
    pub fn display_name(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("form#{}", self.handle.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlTag {
    Input,
    Textarea,
    Select,
    Button,
}

/// Behavioural category of a control, derived from tag + type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Hidden,
    Checkbox,
    Radio,
    File,
    Select { multiple: bool },
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Live state of one form control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub tag: ControlTag,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Control {
    pub fn new(tag: ControlTag) -> Self {
        Self {
            tag,
            r#type: None,
            name: None,
            id: None,
            value: String::new(),
            checked: false,
            multiple: false,
            selected: vec![],
            files: vec![],
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new(ControlTag::Input).with_type(input_type)
    }

    pub fn with_type(mut self, input_type: &str) -> Self {
        self.r#type = Some(input_type.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_selected(mut self, options: &[&str]) -> Self {
        self.multiple = true;
        self.selected = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_file(mut self, file: FileEntry) -> Self {
        self.files.push(file);
        self
    }

    pub fn kind(&self) -> ControlKind {
        match self.tag {
            ControlTag::Button => ControlKind::Button,
            ControlTag::Textarea => ControlKind::Text,
            ControlTag::Select => ControlKind::Select {
                multiple: self.multiple,
            },
            ControlTag::Input => {
                let t = self.r#type.as_deref().unwrap_or("text").to_ascii_lowercase();
                match t.as_str() {
                    "submit" | "button" | "reset" | "image" => ControlKind::Button,
                    "checkbox" => ControlKind::Checkbox,
                    "radio" => ControlKind::Radio,
                    "file" => ControlKind::File,
                    "hidden" => ControlKind::Hidden,
                    _ => ControlKind::Text,
                }
            }
        }
    }

    /// Payload key: the name, else the identifier. Blank strings don't count.
    pub fn key(&self) -> Option<&str> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.id.as_deref()))
    }

    /// Whether this control answers to `field` by name or identifier.
    pub fn answers_to(&self, field: &str) -> bool {
        non_blank(self.name.as_deref()) == Some(field) || non_blank(self.id.as_deref()) == Some(field)
    }

    /// Identifier to focus when this control is at fault.
    pub fn focus_target(&self) -> Option<&str> {
        non_blank(self.id.as_deref()).or_else(|| non_blank(self.name.as_deref()))
    }

    /// Value a checked checkbox/radio contributes.
    pub fn checked_value(&self) -> &str {
        if self.value.is_empty() { "on" } else { &self.value }
    }

    /// Blank the control the way a form reset does.
    pub fn reset(&mut self) {
        match self.kind() {
            ControlKind::Button | ControlKind::Hidden => {}
            ControlKind::Checkbox | ControlKind::Radio => self.checked = false,
            ControlKind::File => self.files.clear(),
            ControlKind::Select { .. } => {
                self.value.clear();
                self.selected.clear();
            }
            ControlKind::Text => self.value.clear(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Info => "status-info",
            Severity::Success => "status-success",
            Severity::Error => "status-error",
        }
    }
}

/// The persistent per-form status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineStatus {
    pub severity: Severity,
    pub message: String,
}

impl InlineStatus {
    pub fn class_name(&self) -> &'static str {
        self.severity.css_class()
    }
}
