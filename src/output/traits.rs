//! Sink trait and error types
//!
//! A sink persists a snapshot of accumulated records. Flushes are
//! overwrite-style snapshots, never drains: the same records may be flushed
//! many times as a crawl progresses.

use crate::record::PropertyRecord;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Lifecycle of a harvest run, as recorded in the `runs` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    /// Every selected category reached its stop condition
    Completed,
    /// Stopped by Ctrl-C; the latest checkpoints hold the data
    Interrupted,
    /// Setup failed after the sinks were opened
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for record sinks
///
/// Implementations must be thread-safe: category crawls running side by
/// side share one sink.
pub trait Sink: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Persists a snapshot of `records` under `label`
    ///
    /// # Arguments
    ///
    /// * `records` - Every record accumulated so far (not just new ones)
    /// * `label` - Snapshot label, e.g. `sale_checkpoint_2000` or `sale_final`
    fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()>;

    /// Finalizes the sink once every category has finished
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the run
    fn finalize(&self, status: RunStatus) -> SinkResult<()> {
        let _ = status;
        Ok(())
    }
}
