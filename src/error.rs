use std::num::ParseIntError;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed document identifier {id:?}: {source}")]
    MalformedIdentifier {
        id: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid date range: earliest {earliest} is after latest {latest}")]
    InvalidDateRange {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    /// Failure raised by the aggregation collaborator, passed through as-is.
    #[error(transparent)]
    Aggregation(anyhow::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Worker pool is shut down")]
    PoolClosed,

    #[error("Blocking task was cancelled before completion")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;
