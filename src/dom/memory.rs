use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;

use crate::dom::document::Document;
use crate::dom::dom_model::{Control, ControlKind, FileEntry, FormElement, FormHandle, InlineStatus};

// ============================================================================
// YAML page fixtures
// ============================================================================

/// A page description: the forms and their controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFixture {
    /// Address the page was loaded from; relative form actions resolve against it.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub forms: Vec<FormFixture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormFixture {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl FormFixture {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }
}

impl PageFixture {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

// ============================================================================
// In-memory document
// ============================================================================

/// Observable state of one form in an [`InMemoryDocument`].
#[derive(Debug, Clone)]
pub struct FormSnapshot {
    pub element: FormElement,
    pub controls: Vec<Control>,
    pub submit_enabled: bool,
    pub busy: bool,
    pub inline_status: Option<InlineStatus>,
    pub focused: Option<String>,
    pub native_submissions: usize,
    pub resets: usize,
}

impl FormSnapshot {
    pub fn control(&self, key: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.answers_to(key))
    }
}

pub struct InMemoryDocument {
    url: Option<String>,
    forms: Mutex<Vec<FormSnapshot>>,
}

impl InMemoryDocument {
    pub fn new(fixture: PageFixture) -> Self {
        let forms = fixture
            .forms
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                let mut attributes = f.attributes;
                if let Some(id) = &f.id {
                    attributes.entry("id".to_string()).or_insert_with(|| id.clone());
                }
                FormSnapshot {
                    element: FormElement {
                        handle: FormHandle(i),
                        id: f.id,
                        attributes,
                    },
                    controls: f.controls,
                    submit_enabled: true,
                    busy: false,
                    inline_status: None,
                    focused: None,
                    native_submissions: 0,
                    resets: 0,
                }
            })
            .collect();

        Self {
            url: fixture.url,
            forms: Mutex::new(forms),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self::new(PageFixture::from_yaml(yaml)?))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FormSnapshot>> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.forms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_form<R>(&self, form: FormHandle, f: impl FnOnce(&mut FormSnapshot) -> R) -> Option<R> {
        let mut forms = self.lock();
        forms.get_mut(form.0).map(f)
    }

    pub fn snapshot(&self, form: FormHandle) -> Option<FormSnapshot> {
        self.lock().get(form.0).cloned()
    }

    /// Find a form by its identifier.
    pub fn handle_of(&self, id: &str) -> Option<FormHandle> {
        self.lock()
            .iter()
            .find(|f| f.element.id.as_deref() == Some(id))
            .map(|f| f.element.handle)
    }

    /// Set the value of the first text-like or select control answering to
    /// `key`. Checkboxes, radios, file inputs and buttons are skipped.
    /// Returns false when no such control exists.
    pub fn set_value(&self, form: FormHandle, key: &str, value: &str) -> bool {
        self.with_form(form, |f| {
            let target = f.controls.iter_mut().find(|c| {
                c.answers_to(key)
                    && matches!(
                        c.kind(),
                        ControlKind::Text | ControlKind::Hidden | ControlKind::Select { .. }
                    )
            });
            match target {
                Some(c) => {
                    if let ControlKind::Select { multiple: true } = c.kind() {
                        if !c.selected.iter().any(|s| s == value) {
                            c.selected.push(value.to_string());
                        }
                    } else {
                        c.value = value.to_string();
                    }
                    true
                }
                None => false,
            }
        })
        .unwrap_or(false)
    }

    /// Check the checkbox/radio under `key` whose value is `value`.
    /// Radios sharing the key are unchecked first.
    pub fn set_checked(&self, form: FormHandle, key: &str, value: &str, checked: bool) -> bool {
        self.with_form(form, |f| {
            let mut found = false;
            let choices = f.controls.iter_mut().filter(|c| {
                c.answers_to(key) && matches!(c.kind(), ControlKind::Checkbox | ControlKind::Radio)
            });
            for c in choices {
                if c.checked_value() == value {
                    c.checked = checked;
                    found = true;
                } else if checked && c.kind() == ControlKind::Radio {
                    c.checked = false;
                }
            }
            found
        })
        .unwrap_or(false)
    }

    pub fn attach_file(&self, form: FormHandle, key: &str, file: FileEntry) -> bool {
        self.with_form(form, |f| match f.controls.iter_mut().find(|c| c.answers_to(key)) {
            Some(c) => {
                c.files.push(file);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }
}

impl Document for InMemoryDocument {
    fn base_url(&self) -> Option<String> {
        self.url.clone()
    }

    fn forms(&self) -> Vec<FormElement> {
        self.lock().iter().map(|f| f.element.clone()).collect()
    }

    fn controls(&self, form: FormHandle) -> Vec<Control> {
        self.with_form(form, |f| f.controls.clone()).unwrap_or_default()
    }

    fn set_submit_enabled(&self, form: FormHandle, enabled: bool) {
        self.with_form(form, |f| f.submit_enabled = enabled);
    }

    fn set_busy(&self, form: FormHandle, busy: bool) {
        self.with_form(form, |f| f.busy = busy);
    }

    fn set_inline_status(&self, form: FormHandle, status: InlineStatus) {
        self.with_form(form, |f| f.inline_status = Some(status));
    }

    fn focus(&self, form: FormHandle, target: &str) {
        self.with_form(form, |f| f.focused = Some(target.to_string()));
    }

    fn reset(&self, form: FormHandle) {
        self.with_form(form, |f| {
            f.controls.iter_mut().for_each(Control::reset);
            f.resets += 1;
        });
    }

    fn submit_natively(&self, form: FormHandle) {
        self.with_form(form, |f| f.native_submissions += 1);
    }
}
