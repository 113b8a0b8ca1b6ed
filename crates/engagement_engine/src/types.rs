use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use engagement_core::{OutputRow, RowIndex};

/// Produces the timestamp text written into the `ts` column.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// RFC 3339 UTC wall clock.
pub fn utc_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().to_rfc3339())
}

/// Row indices whose batch failed; drained by the fallback pass.
pub type FailedIndexSet = BTreeSet<RowIndex>;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Success(Vec<OutputRow>),
    Failed {
        indices: Vec<RowIndex>,
        cause: GraphError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    BatchesPlanned { batches: usize, rows: usize },
    BatchCompleted { batch: usize, rows: usize },
    BatchFailed { batch: usize, rows: usize, cause: String },
    FallbackPlanned { rows: usize },
    FallbackRowCompleted { index: RowIndex, errors: usize },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: RunEvent) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub fallback_rows: usize,
    pub fallback_errors: usize,
    pub rows_written: usize,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be between 1 and {max}, got {got}")]
    BatchSize { got: usize, max: usize },
    #[error("invalid graph endpoint {url}: {message}")]
    Endpoint { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GraphError {
    pub kind: GraphErrorKind,
    pub message: String,
}

impl GraphError {
    pub fn new(kind: GraphErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphErrorKind {
    InvalidIdentifier,
    HttpStatus(u16),
    Api {
        code: Option<i64>,
        error_type: Option<String>,
    },
    MalformedResponse,
    Timeout,
    Network,
}

impl fmt::Display for GraphErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphErrorKind::InvalidIdentifier => write!(f, "invalid identifier"),
            GraphErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            GraphErrorKind::Api { code, error_type } => {
                write!(f, "graph api error")?;
                if let Some(error_type) = error_type {
                    write!(f, " {error_type}")?;
                }
                if let Some(code) = code {
                    write!(f, " (code {code})")?;
                }
                Ok(())
            }
            GraphErrorKind::MalformedResponse => write!(f, "malformed response"),
            GraphErrorKind::Timeout => write!(f, "timeout"),
            GraphErrorKind::Network => write!(f, "network error"),
        }
    }
}
