use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::{Mutex, MutexGuard};

use crate::trace::trace::{SubmissionTrace, TraceEvent};

/// Per-form count of each trace event.
pub type EventTally = BTreeMap<TraceEvent, usize>;

/// Appends [`SubmissionTrace`] events as JSON lines and keeps a per-form
/// tally of what happened.
///
/// Lines are buffered while a request is in flight and flushed once the
/// submission settles.
pub struct TraceLogger {
    sink: Option<Mutex<BufWriter<File>>>,
    tally: Mutex<BTreeMap<String, EventTally>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        let sink = match file {
            Ok(f) => Some(Mutex::new(BufWriter::new(f))),
            Err(e) => {
                tracing::warn!("could not open trace file '{}': {}", path, e);
                None
            }
        };

        Self {
            sink,
            tally: Mutex::new(BTreeMap::new()),
        }
    }

    /// Tallies events without writing a file.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            tally: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, event: &SubmissionTrace) {
        *lock(&self.tally)
            .entry(event.form.clone())
            .or_default()
            .entry(event.event)
            .or_insert(0) += 1;

        let Some(sink) = &self.sink else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("failed to serialize trace event: {}", e);
                return;
            }
        };

        let mut out = lock(sink);
        if let Err(e) = writeln!(out, "{}", json) {
            tracing::warn!(form = %event.form, "failed to write trace event: {}", e);
            return;
        }
        if event.event.is_terminal() {
            if let Err(e) = out.flush() {
                tracing::warn!(form = %event.form, "failed to flush trace file: {}", e);
            }
        }
    }

    /// Events recorded so far for one form.
    pub fn tally(&self, form: &str) -> EventTally {
        lock(&self.tally).get(form).cloned().unwrap_or_default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
