//! Bounded, injectable error-report queue.
//!
//! [`ErrorReporter`] collects failures worth surfacing later (storage
//! failures after retries, rejected input) in a ring buffer that drops the
//! oldest report once full. It is created once at startup and handed to
//! whoever needs it as an `Arc<ErrorReporter>`; there is no global instance.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Default number of reports kept before the oldest is evicted.
pub const DEFAULT_REPORT_CAPACITY: usize = 50;

/// Where a reported error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A front-end component failed.
    Component,
    /// The persistence layer gave up after retrying.
    Storage,
    /// A network call failed.
    Network,
    /// User input was rejected.
    Validation,
    /// Anything else.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Storage => write!(f, "storage"),
            Self::Network => write!(f, "network"),
            Self::Validation => write!(f, "validation"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// How serious a reported error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single recorded error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Identifier unique within one reporter.
    pub id: u64,
    /// Source of the error.
    pub kind: ErrorKind,
    /// Seriousness of the error.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Extra key/value context (operation, storage key, rejected input...).
    pub context: BTreeMap<String, String>,
    /// When the error was reported.
    pub reported_at: DateTime<Utc>,
    /// Whether someone has acknowledged the report.
    pub handled: bool,
}

#[derive(Debug)]
struct Queue {
    reports: VecDeque<ErrorReport>,
    next_id: u64,
}

/// Ring buffer of [`ErrorReport`]s shared by the components that report into it.
#[derive(Debug)]
pub struct ErrorReporter {
    queue: Mutex<Queue>,
    capacity: usize,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_CAPACITY)
    }
}

impl ErrorReporter {
    /// Create a reporter keeping at most `capacity` reports (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(Queue {
                reports: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
            capacity,
        }
    }

    /// Maximum number of reports kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an error and return its id.
    ///
    /// When the buffer is full the oldest report is dropped.
    pub fn report(
        &self,
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<String>,
        context: BTreeMap<String, String>,
    ) -> u64 {
        let message = message.into();
        tracing::debug!(%kind, %severity, %message, ?context, "error reported");

        let mut queue = self.queue.lock();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.reports.push_back(ErrorReport {
            id,
            kind,
            severity,
            message,
            context,
            reported_at: Utc::now(),
            handled: false,
        });
        if queue.reports.len() > self.capacity {
            queue.reports.pop_front();
        }
        id
    }

    /// Record a storage failure (medium severity).
    pub fn report_storage_error(
        &self,
        message: impl Into<String>,
        context: BTreeMap<String, String>,
    ) -> u64 {
        self.report(ErrorKind::Storage, Severity::Medium, message, context)
    }

    /// Record rejected user input (low severity). The input is kept as context.
    pub fn report_validation_error(&self, message: impl Into<String>, value: &str) -> u64 {
        let context = BTreeMap::from([("value".to_string(), value.to_string())]);
        self.report(ErrorKind::Validation, Severity::Low, message, context)
    }

    /// All reports not yet marked as handled, oldest first.
    #[must_use]
    pub fn unhandled(&self) -> Vec<ErrorReport> {
        self.queue
            .lock()
            .reports
            .iter()
            .filter(|r| !r.handled)
            .cloned()
            .collect()
    }

    /// Mark the report with `id` as handled. Returns `false` if it is no
    /// longer in the buffer.
    pub fn mark_handled(&self, id: u64) -> bool {
        let mut queue = self.queue.lock();
        match queue.reports.iter_mut().find(|r| r.id == id) {
            Some(report) => {
                report.handled = true;
                true
            }
            None => false,
        }
    }

    /// Drop every handled report.
    pub fn clear_handled(&self) {
        self.queue.lock().reports.retain(|r| !r.handled);
    }

    /// Drain every report, logging the unhandled ones.
    pub fn flush(&self) -> Vec<ErrorReport> {
        let reports: Vec<ErrorReport> = self.queue.lock().reports.drain(..).collect();
        for report in reports.iter().filter(|r| !r.handled) {
            tracing::warn!(
                id = report.id,
                kind = %report.kind,
                severity = %report.severity,
                reported_at = %report.reported_at.to_rfc3339(),
                context = ?report.context,
                "{}",
                report.message
            );
        }
        reports
    }

    /// Number of reports currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().reports.len()
    }

    /// Whether no reports are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().reports.is_empty()
    }
}
