use std::sync::{Arc, OnceLock};

use crate::cli::config::AppConfig;
use crate::dom::document::Document;
use crate::dom::dom_model::FormElement;
use crate::form::descriptor::FormDescriptor;
use crate::form::selector::{FormClassification, select_managed};
use crate::notify::notifier::Notifier;
use crate::notify::toast::ToastArea;
use crate::submit::controller::SubmissionController;
use crate::submit::transport::Transport;
use crate::trace::logger::TraceLogger;

/// One loaded page: the document plus the resources its forms share.
pub struct Page {
    document: Arc<dyn Document>,
    toast_area: Arc<OnceLock<ToastArea>>,
    tracer: Arc<TraceLogger>,
    config: AppConfig,
}

impl Page {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            toast_area: Arc::new(OnceLock::new()),
            tracer: Arc::new(TraceLogger::disabled()),
            config: AppConfig::default(),
        }
    }

    /// Apply runtime config; opens the trace file if one is configured.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        if let Some(path) = &config.trace.path {
            self.tracer = Arc::new(TraceLogger::new(path));
        }
        self.config = config;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = Arc::new(tracer);
        self
    }

    pub fn tracer(&self) -> &TraceLogger {
        &self.tracer
    }

    pub fn managed_forms(&self) -> Vec<(FormElement, FormClassification)> {
        select_managed(&self.document.forms())
    }

    /// Wire one controller per managed form.
    pub fn attach(&self, transport: Arc<dyn Transport>) -> Vec<SubmissionController> {
        let managed = self.managed_forms();
        if managed.is_empty() {
            tracing::debug!("no managed forms on page");
            return vec![];
        }

        let base_url = self.document.base_url();
        managed
            .into_iter()
            .map(|(element, classification)| {
                let descriptor =
                    FormDescriptor::with_default_timeout(&element, self.config.request.default_timeout_ms)
                        .resolve_against(base_url.as_deref());
                tracing::debug!(form = %descriptor.name, ?classification, "attached controller");

                SubmissionController::new(
                    descriptor,
                    Arc::clone(&self.document),
                    Arc::clone(&transport),
                    self.notifier(),
                    Arc::clone(&self.tracer),
                )
            })
            .collect()
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(
            Arc::clone(&self.document),
            Arc::clone(&self.toast_area),
            self.config.notify.durations(),
        )
    }

    /// The shared toast area, or None if nothing has been toasted yet.
    pub fn toasts(&self) -> Option<&ToastArea> {
        self.toast_area.get()
    }
}
