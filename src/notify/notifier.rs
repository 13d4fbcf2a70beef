use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::dom::document::Document;
use crate::dom::dom_model::{FormHandle, InlineStatus, Severity};
use crate::notify::toast::{ToastArea, ToastId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastDurations {
    pub default: Duration,
    pub error: Duration,
}

impl Default for ToastDurations {
    fn default() -> Self {
        Self {
            default: Duration::from_millis(3000),
            error: Duration::from_millis(5000),
        }
    }
}

impl ToastDurations {
    pub fn for_severity(&self, severity: Severity) -> Duration {
        match severity {
            Severity::Error => self.error,
            _ => self.default,
        }
    }
}

/// Two channels: the shared toast area and each form's inline status line.
#[derive(Clone)]
pub struct Notifier {
    document: Arc<dyn Document>,
    toast_area: Arc<OnceLock<ToastArea>>,
    durations: ToastDurations,
}

impl Notifier {
    pub fn new(
        document: Arc<dyn Document>,
        toast_area: Arc<OnceLock<ToastArea>>,
        durations: ToastDurations,
    ) -> Self {
        Self {
            document,
            toast_area,
            durations,
        }
    }

    /// The toast area, created on first use.
    fn area(&self) -> &ToastArea {
        self.toast_area.get_or_init(ToastArea::new)
    }

    pub fn toast(&self, message: &str, severity: Severity) -> ToastId {
        self.toast_for(message, severity, self.durations.for_severity(severity))
    }

    pub fn toast_for(&self, message: &str, severity: Severity, duration: Duration) -> ToastId {
        self.area().append(message, severity, duration)
    }

    pub fn inline(&self, form: FormHandle, message: &str, severity: Severity) {
        self.document.set_inline_status(
            form,
            InlineStatus {
                severity,
                message: message.to_string(),
            },
        );
    }

    /// Same message on both channels.
    pub fn both(&self, form: FormHandle, message: &str, severity: Severity) {
        self.toast(message, severity);
        self.inline(form, message, severity);
    }
}
