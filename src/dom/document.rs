use crate::dom::dom_model::{Control, FormElement, FormHandle, InlineStatus};

/// Query/mutation surface over a live page.
///
/// Every pipeline stage talks to the page through this trait so the whole
/// controller can run against [`InMemoryDocument`](crate::dom::memory::InMemoryDocument)
/// in tests and in the CLI.
pub trait Document: Send + Sync {
    /// Address of the page, used to resolve relative form actions.
    fn base_url(&self) -> Option<String> {
        None
    }

    /// All form elements on the page, in document order.
    fn forms(&self) -> Vec<FormElement>;

    /// Current state of the form's input/textarea/select/button controls.
    fn controls(&self, form: FormHandle) -> Vec<Control>;

    fn set_submit_enabled(&self, form: FormHandle, enabled: bool);

    fn set_busy(&self, form: FormHandle, busy: bool);

    /// Overwrite the form's inline status line.
    fn set_inline_status(&self, form: FormHandle, status: InlineStatus);

    fn focus(&self, form: FormHandle, target: &str);

    fn reset(&self, form: FormHandle);

    /// Hand the form back to the browser's own submission.
    fn submit_natively(&self, form: FormHandle);
}
