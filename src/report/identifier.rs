use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

pub const REPORT_ID_PREFIX: &str = "generated_report_";

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// How generated report identifiers are formed.
///
/// `Timestamp` is `generated_report_YYYYMMDDHHMMSS`, so two reports produced
/// within the same second share an id. `Unique` appends the microsecond
/// fraction and a short random suffix to the same prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportIdScheme {
    #[default]
    Timestamp,
    Unique,
}

impl ReportIdScheme {
    pub fn report_id(&self, now: DateTime<Utc>) -> String {
        let stamp = now.format("%Y%m%d%H%M%S");
        match self {
            ReportIdScheme::Timestamp => format!("{REPORT_ID_PREFIX}{stamp}"),
            ReportIdScheme::Unique => {
                // Leap seconds report subsec values past one million.
                let micros = now.timestamp_subsec_micros() % 1_000_000;
                let suffix: String = (0..4)
                    .map(|_| char::from(SUFFIX_ALPHABET[fastrand::usize(..SUFFIX_ALPHABET.len())]))
                    .collect();
                format!("{REPORT_ID_PREFIX}{stamp}_{micros:06}{suffix}")
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportIdScheme::Timestamp => "timestamp",
            ReportIdScheme::Unique => "unique",
        }
    }
}

impl fmt::Display for ReportIdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportIdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(ReportIdScheme::Timestamp),
            "unique" => Ok(ReportIdScheme::Unique),
            other => Err(format!(
                "unknown report id scheme {other:?}, expected \"timestamp\" or \"unique\""
            )),
        }
    }
}
