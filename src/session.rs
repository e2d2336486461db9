//! Per-report editing state.
//!
//! The original layer kept the current report, the save-in-flight flag,
//! and the edit map in module globals; here they live in an explicit
//! session passed to the resolver and the save pipeline, so two reports
//! can be edited independently (and tested without shared state).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::project::{Contractor, Project};
use crate::report::Report;
use crate::resolve::Resolver;

pub struct ReportSession {
    pub project: Option<Project>,
    pub report: Report,
    /// Header row id once known; minting a new one is the save pipeline's
    /// job, after the duplicate lookup.
    pub report_id: Option<String>,
    pub report_date: String,
    saving: Arc<AtomicBool>,
}

impl ReportSession {
    pub fn new(
        project: Option<Project>,
        report: Report,
        report_id: Option<String>,
        report_date: impl Into<String>,
    ) -> Self {
        Self {
            project,
            report,
            report_id,
            report_date: report_date.into(),
            saving: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn contractors(&self) -> &[Contractor] {
        self.project
            .as_ref()
            .map(|p| p.contractors.as_slice())
            .unwrap_or_default()
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.report)
    }

    /// Record a field edit (UI blur handler entry point).
    pub fn record_edit(&mut self, path: &str, value: Value) {
        self.report.apply_edit(path, value);
    }

    /// Claim the in-flight save slot. Returns `None` when a save is already
    /// running: the new request is dropped, not queued; the debounce timer
    /// restarting on every edit guarantees the settled state still lands.
    pub fn begin_save(&self) -> Option<SaveGuard> {
        if self.saving.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(SaveGuard {
            flag: Arc::clone(&self.saving),
        })
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }
}

/// Clears the in-flight flag when the save finishes, panic or not.
pub struct SaveGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Debounced scheduling for auto-save: each call replaces the previously
/// scheduled task, so a burst of edits collapses into one write reflecting
/// the last call once the quiet period elapses.
pub struct SaveDebouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.pending.lock().expect("save debouncer mutex poisoned");
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        let delay = self.delay;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Wait for the currently scheduled save, if any, to run. Used on page
    /// teardown and in tests; an aborted task resolves silently.
    pub async fn settled(&self) {
        let handle = self
            .pending
            .lock()
            .expect("save debouncer mutex poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
