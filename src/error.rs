//! Error types for printwatch.
//!
//! - [`ConfigError`]: startup validation, fatal before the loop starts
//! - [`SourceError`]: a whole fetch failed; the tick sees zero jobs
//! - [`JobError`]: one job in a batch could not be read; it is skipped

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Invalid startup configuration. The monitor never starts polling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Interval must be a positive integer.")]
    IntervalNotPositive { value: i64 },

    #[error("Max pages must be a positive integer.")]
    MaxPagesNotPositive { value: i64 },

    #[error("Command timeout must be a positive integer.")]
    CommandTimeoutNotPositive,

    /// Settings file could not be read or parsed
    #[error("failed to load settings from {path}: {reason}")]
    SettingsFile { path: PathBuf, reason: String },
}

/// Failure of a whole job listing.
///
/// `Unavailable` and `CommandNotFound` mean the source does not exist on this
/// host. The other variants mean it exists but the query failed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Platform print service could not be reached
    #[error("print service unavailable: {reason}")]
    Unavailable { reason: String },

    /// External status command is not installed
    #[error("{command} command not found. Ensure CUPS is installed and configured correctly.")]
    CommandNotFound { command: &'static str },

    /// External status command ran and reported failure
    #[error("Error running {command} command: exited with code {code:?}: {stderr}")]
    NonZeroExit {
        command: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// External status command did not finish in time and was killed
    #[error("{command} command timed out after {limit:?}")]
    Timeout {
        command: &'static str,
        limit: Duration,
    },

    /// External status command could not be started or read
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Platform API call returned a failure status
    #[error("{op} failed (os error {code})")]
    QueryFailed { op: &'static str, code: u32 },
}

/// A single job in an otherwise readable listing could not be retrieved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Error retrieving job {job_id}: {reason}")]
pub struct JobError {
    pub job_id: u32,
    pub reason: String,
}
