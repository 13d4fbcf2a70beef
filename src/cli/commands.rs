use std::sync::Arc;

use crate::cli::config::AppConfig;
use crate::dom::document::Document;
use crate::dom::dom_model::FormHandle;
use crate::dom::memory::InMemoryDocument;
use crate::form::selector::classify_form;
use crate::page::Page;
use crate::submit::controller::SubmitOutcome;
use crate::submit::transport::ReqwestTransport;

// ============================================================================
// classify subcommand
// ============================================================================

/// One line per form: name and classification.
pub fn cmd_classify(page_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let document = load_page(page_path)?;

    let lines = document
        .forms()
        .iter()
        .map(|form| format!("{}: {:?}", form.display_name(), classify_form(form)))
        .collect();

    Ok(lines)
}

// ============================================================================
// submit subcommand
// ============================================================================

/// Submit one form and return whether it succeeded.
pub async fn cmd_submit(
    page_path: &str,
    form_id: &str,
    assignments: &[String],
    config: AppConfig,
    verbose: u8,
) -> Result<bool, Box<dyn std::error::Error>> {
    let document = Arc::new(load_page(page_path)?);
    let handle = document
        .handle_of(form_id)
        .ok_or_else(|| format!("no form with id '{}' in {}", form_id, page_path))?;

    apply_assignments(&document, handle, assignments)?;

    let transport = Arc::new(ReqwestTransport::new(config.request.user_agent.as_deref())?);
    let shared: Arc<dyn Document> = document.clone();
    let page = Page::new(shared).with_config(config);

    let controller = page
        .attach(transport)
        .into_iter()
        .find(|c| c.descriptor().handle == handle)
        .ok_or_else(|| format!("form '{}' is not managed", form_id))?;

    if verbose > 0 {
        eprintln!(
            "Submitting {} to {} ({})...",
            form_id,
            controller.descriptor().endpoint.as_deref().unwrap_or("<unset>"),
            controller.descriptor().method
        );
    }

    let outcome = controller.handle_submit().await;

    match &outcome {
        SubmitOutcome::Succeeded { message } => println!("Succeeded: {}", message),
        SubmitOutcome::Failed(e) => println!("Failed: {}", e),
        SubmitOutcome::AlreadyInFlight => println!("Ignored: request already in flight"),
    }

    if let Some(status) = document.snapshot(handle).and_then(|s| s.inline_status) {
        println!("  [{}] {}", status.class_name(), status.message);
    }
    if let Some(toasts) = page.toasts() {
        for toast in toasts.snapshot() {
            println!("  toast({:?}): {}", toast.severity, toast.message);
        }
    }

    if verbose > 0 {
        let tally = page.tracer().tally(&controller.descriptor().name);
        eprintln!("Trace events: {:?}", tally);
    }

    Ok(outcome.is_success())
}

// ============================================================================
// Helpers
// ============================================================================

pub fn load_page(path: &str) -> Result<InMemoryDocument, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(InMemoryDocument::from_yaml(&content)?)
}

/// Fill the form from `key=value` pairs. Text-like and select controls take
/// the value; checkbox and radio groups check the option carrying it.
pub fn apply_assignments(
    document: &InMemoryDocument,
    form: FormHandle,
    assignments: &[String],
) -> Result<(), String> {
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        let applied = document.set_value(form, &key, &value)
            || document.set_checked(form, &key, &value, true);
        if !applied {
            return Err(format!("no control '{}' accepts '{}'", key, value));
        }
    }
    Ok(())
}

/// Split `key=value`; the value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
