use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::dom::dom_model::Severity;

pub const FADE_IN_DELAY: Duration = Duration::from_millis(100);
pub const FADE_OUT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Entering,
    Visible,
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub severity: Severity,
    pub message: String,
    pub duration: Duration,
    pub phase: ToastPhase,
}

/// Page-level stack of floating notifications, shared by every form.
///
/// Appends from concurrent submissions keep append order. Each toast runs
/// its own fade-in / display / fade-out timeline on the ambient tokio
/// runtime and detaches itself at the end.
#[derive(Debug, Default)]
pub struct ToastArea {
    toasts: Arc<Mutex<Vec<Toast>>>,
    next_id: AtomicU64,
}

impl ToastArea {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        lock_toasts(&self.toasts)
    }

    pub fn append(&self, message: &str, severity: Severity, duration: Duration) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.lock().push(Toast {
            id,
            severity,
            message: message.to_string(),
            duration,
            phase: ToastPhase::Entering,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let toasts = Arc::clone(&self.toasts);
                handle.spawn(run_lifecycle(toasts, id, duration));
            }
            Err(_) => tracing::debug!(?id, "no runtime, toast stays until removed"),
        }

        id
    }

    /// Detach a toast. Returns false if it was already gone.
    pub fn remove(&self, id: ToastId) -> bool {
        remove_toast(&self.toasts, id)
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|t| t.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn lock_toasts(toasts: &Mutex<Vec<Toast>>) -> MutexGuard<'_, Vec<Toast>> {
    toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_phase(toasts: &Mutex<Vec<Toast>>, id: ToastId, phase: ToastPhase) {
    if let Some(t) = lock_toasts(toasts).iter_mut().find(|t| t.id == id) {
        t.phase = phase;
    }
}

fn remove_toast(toasts: &Mutex<Vec<Toast>>, id: ToastId) -> bool {
    let mut toasts = lock_toasts(toasts);
    let before = toasts.len();
    toasts.retain(|t| t.id != id);
    toasts.len() != before
}

async fn run_lifecycle(toasts: Arc<Mutex<Vec<Toast>>>, id: ToastId, duration: Duration) {
    tokio::time::sleep(FADE_IN_DELAY).await;
    set_phase(&toasts, id, ToastPhase::Visible);

    tokio::time::sleep(duration).await;
    set_phase(&toasts, id, ToastPhase::Leaving);

    tokio::time::sleep(FADE_OUT_DELAY).await;
    remove_toast(&toasts, id);
}
