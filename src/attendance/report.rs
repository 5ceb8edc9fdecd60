//! Append-only report shared by the character tasks of one account run.

use std::sync::{Mutex, MutexGuard};

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub level: FragmentLevel,
}

#[derive(Debug, Default)]
struct ReportInner {
    fragments: Vec<Fragment>,
    has_error: bool,
}

/// Ordered message fragments plus a sticky error flag.
///
/// Appends take a short lock and never hold it across an `.await`, so
/// concurrently running character tasks can share one `&Report`.
#[derive(Debug, Default)]
pub struct Report {
    inner: Mutex<ReportInner>,
}

/// The body delivered to notification channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub body: String,
    pub has_error: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a report with an informational header that is not logged.
    pub fn with_header(header: &str) -> Self {
        let report = Self::new();
        report.push(header.to_string(), FragmentLevel::Info);
        report
    }

    /// Appends a fragment and mirrors it to the log.
    pub fn add(&self, text: impl Into<String>, is_error: bool) {
        let text = text.into();
        let level = if is_error {
            error!("{text}");
            FragmentLevel::Error
        } else {
            info!("{text}");
            FragmentLevel::Info
        };
        self.push(text, level);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.add(text, false);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.add(text, true);
    }

    fn push(&self, text: String, level: FragmentLevel) {
        let mut inner = self.lock();
        if level == FragmentLevel::Error {
            inner.has_error = true;
        }
        inner.fragments.push(Fragment { text, level });
    }

    pub fn has_error(&self) -> bool {
        self.lock().has_error
    }

    pub fn len(&self) -> usize {
        self.lock().fragments.len()
    }

    pub fn fragments(&self) -> Vec<Fragment> {
        self.lock().fragments.clone()
    }

    /// Joins all fragments with a blank line.
    pub fn finalize(self) -> FinalReport {
        let inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let body = inner
            .fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        FinalReport {
            body,
            has_error: inner.has_error,
        }
    }

    // A panic while holding the lock cannot leave a half-written fragment,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, ReportInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
