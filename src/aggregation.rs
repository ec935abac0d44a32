use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional date filter applied by the aggregation collaborator.
///
/// A `None` bound means the filter is absent and the collaborator must not
/// apply any restriction on that side. A `Some` bound is always forwarded
/// verbatim, so implementations can tell "no filter" apart from a filter that
/// happens to match nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub earliest_date: Option<DateTime<Utc>>,
    pub latest_date: Option<DateTime<Utc>>,
}

impl DateBounds {
    pub fn since(earliest_date: Option<DateTime<Utc>>) -> Self {
        Self {
            earliest_date,
            latest_date: None,
        }
    }

    pub fn between(earliest_date: DateTime<Utc>, latest_date: DateTime<Utc>) -> Self {
        Self {
            earliest_date: Some(earliest_date),
            latest_date: Some(latest_date),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.earliest_date.is_none() && self.latest_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulateRequest {
    pub prompt: String,
    pub source_document_ids: Vec<i64>,
    pub bounds: DateBounds,
}

/// External service that gathers content across a filtered set of indexed
/// documents and synthesizes text from it with the given prompt.
#[async_trait::async_trait]
pub trait AggregationService: Send + Sync {
    async fn accumulate_over(&self, request: &AccumulateRequest) -> anyhow::Result<String>;
}

pub(crate) fn classify_error(err: &anyhow::Error) -> &'static str {
    let msg = err.to_string().to_lowercase();
    if msg.contains("timeout") || msg.contains("timed out") || msg.contains("deadline") {
        "timeout"
    } else if msg.contains("connect")
        || msg.contains("dns")
        || msg.contains("network")
        || msg.contains("reset")
    {
        "network_error"
    } else if msg.contains("500")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("server")
        || msg.contains("backend")
    {
        "server_error"
    } else if msg.contains("400") || msg.contains("422") || msg.contains("invalid") {
        "invalid_request"
    } else {
        "unknown_error"
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.char_indices()
            .take_while(|&(i, _)| i < max)
            .map(|(_, c)| c)
            .collect()
    }
}
