//! Error types shared across sampling and aggregation.

use std::path::PathBuf;

/// Errors that can occur while sampling a device or aggregating run logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requested data point is not in the supported metric set.
    ///
    /// Non-fatal at configuration time: invalid entries are dropped with a
    /// warning. Surfaces as an error only when a caller parses a metric
    /// name directly.
    #[error("unsupported metric '{0}'")]
    UnsupportedMetric(String),

    /// The device reported that the profiled app/package is not running.
    #[error("no process found on device for '{0}'")]
    ProcessNotFound(String),

    /// A run directory or run file has nothing to average over.
    #[error("nothing to aggregate in {path:?}: {reason}")]
    EmptyAggregationSet { path: PathBuf, reason: String },

    /// A run or aggregate file could not be interpreted as a metric table.
    #[error("malformed table in {path:?}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },

    /// The device shell transport failed.
    #[error("device '{device}' shell failed: {reason}")]
    Device { device: String, reason: String },

    /// Read/write failure on a run or aggregate file.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
