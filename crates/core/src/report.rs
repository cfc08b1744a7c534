//! Run statistics and the reporter that observes a run.
//!
//! The engine holds a [`SyncReporter`] instead of writing to a global
//! logger: it receives every isolated callback failure, the conflict listing
//! and, exactly once per `sync` call, the final statistics.
//! [`TracingReporter`] is the default and forwards everything to `tracing`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::errors::SyncError;
use crate::models::{Operation, Side};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters for the operations applied to one side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SideStats {
    /// Display name of the side.
    pub title: String,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl SideStats {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Total number of successful operations.
    pub fn applied(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl fmt::Display for SideStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "-".repeat(self.title.chars().count()))?;
        writeln!(f, "\t* Items created: {}", self.created)?;
        writeln!(f, "\t* Items updated: {}", self.updated)?;
        writeln!(f, "\t* Items deleted: {}", self.deleted)?;
        writeln!(f, "\t* Errors:        {}", self.errors)
    }
}

/// Statistics for one `sync` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    pub side_a: SideStats,
    pub side_b: SideStats,
    pub conflicts_detected: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncStats {
    /// Fresh counters for a new run.
    pub fn start(title_a: &str, title_b: &str) -> Self {
        Self {
            side_a: SideStats::new(title_a),
            side_b: SideStats::new(title_b),
            conflicts_detected: 0,
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    pub fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideStats {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    pub fn total_errors(&self) -> usize {
        self.side_a.errors + self.side_b.errors
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.side_a, self.side_b)
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// A callback failure the engine recovered from.
#[derive(Debug)]
pub struct OperationFailure<'a> {
    /// The side whose callback failed.
    pub side: Side,
    pub operation: Operation,
    /// Rendered identifier the operation was about.
    pub id: &'a str,
    pub reason: &'a anyhow::Error,
}

/// Observer of a reconciliation run.
pub trait SyncReporter {
    /// An isolated callback failure.
    fn operation_failed(&self, failure: &OperationFailure<'_>);

    /// The conflicts about to be resolved, already rendered.
    fn conflicts_detected(&self, _strategy: &str, _conflicts: &[String]) {}

    /// End of a `sync` call, whether it completed or aborted.
    fn finished(&self, stats: &SyncStats, outcome: Result<(), &SyncError>);
}

/// Default reporter backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl SyncReporter for TracingReporter {
    fn operation_failed(&self, failure: &OperationFailure<'_>) {
        error!(
            side = %failure.side,
            operation = %failure.operation,
            id = failure.id,
            "[{} {}] operation failed",
            failure.side,
            failure.operation
        );
        debug!(reason = ?failure.reason, "operation failure detail");
    }

    fn conflicts_detected(&self, strategy: &str, conflicts: &[String]) {
        if conflicts.is_empty() {
            return;
        }
        debug!(
            strategy,
            count = conflicts.len(),
            "items modified on both sides:\n\n{}",
            conflicts.join("\n")
        );
    }

    fn finished(&self, stats: &SyncStats, outcome: Result<(), &SyncError>) {
        match outcome {
            Ok(()) => info!(
                created_a = stats.side_a.created,
                created_b = stats.side_b.created,
                errors = stats.total_errors(),
                "sync finished\n\n{stats}"
            ),
            Err(e) if e.is_callback_failure() => {
                warn!(error = %e, "sync aborted by a failed callback\n\n{stats}")
            }
            Err(e) => error!(error = %e, "sync aborted\n\n{stats}"),
        }
    }
}
