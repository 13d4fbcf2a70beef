use crate::dom::dom_model::FormElement;

pub const OPT_IN_ATTR: &str = "data-ajax";
pub const HOSTED_BACKEND_HOST: &str = "formspree.io";
pub const LEGACY_FORM_IDS: [&str; 2] = ["bookingForm", "contactForm"];

/// Why a form is (or is not) intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormClassification {
    ManagedByAttribute,
    ManagedByEndpoint,
    ManagedByLegacyId,
    Unmanaged,
}

impl FormClassification {
    pub fn is_managed(&self) -> bool {
        !matches!(self, FormClassification::Unmanaged)
    }
}

pub fn classify_form(form: &FormElement) -> FormClassification {
    if form.has_attr(OPT_IN_ATTR) {
        return FormClassification::ManagedByAttribute;
    }

    if form.attr("action").is_some_and(is_hosted_backend) {
        return FormClassification::ManagedByEndpoint;
    }

    if form
        .id
        .as_deref()
        .is_some_and(|id| LEGACY_FORM_IDS.contains(&id))
    {
        return FormClassification::ManagedByLegacyId;
    }

    FormClassification::Unmanaged
}

/// Keep only managed forms, paired with the reason they qualified.
pub fn select_managed(forms: &[FormElement]) -> Vec<(FormElement, FormClassification)> {
    forms
        .iter()
        .map(|f| (f, classify_form(f)))
        .filter(|(_, c)| c.is_managed())
        .map(|(f, c)| (f.clone(), c))
        .collect()
}

/// Does the endpoint point at the hosted form backend?
/// Relative or unparsable addresses never match.
pub fn is_hosted_backend(endpoint: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(endpoint.trim()) else {
        return false;
    };

    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == HOSTED_BACKEND_HOST || host.ends_with(&format!(".{}", HOSTED_BACKEND_HOST))
        }
        None => false,
    }
}
