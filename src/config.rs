use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::report::{DEFAULT_STRATEGY, ReportIdScheme};

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub report_strategy: String,
    pub report_id_scheme: ReportIdScheme,
    pub dispatch_max_blocking: usize,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            report_strategy: DEFAULT_STRATEGY.to_string(),
            report_id_scheme: ReportIdScheme::Timestamp,
            dispatch_max_blocking: 16,
            otel_service_name: "generative-reader".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys fall back to
    /// [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let dispatch_max_blocking = match lookup("DISPATCH_MAX_BLOCKING") {
            Some(raw) => {
                let value: usize = parse_var("DISPATCH_MAX_BLOCKING", &raw)?;
                if value == 0 {
                    return Err(ConfigError::Invalid {
                        key: "DISPATCH_MAX_BLOCKING",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                value
            }
            None => defaults.dispatch_max_blocking,
        };

        let report_id_scheme = match lookup("REPORT_ID_SCHEME") {
            Some(raw) => parse_var("REPORT_ID_SCHEME", &raw)?,
            None => defaults.report_id_scheme,
        };

        Ok(Self {
            environment: lookup("APP_ENVIRONMENT").unwrap_or(defaults.environment),
            report_strategy: lookup("REPORT_STRATEGY")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.report_strategy),
            report_id_scheme,
            dispatch_max_blocking,
            otel_service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.otel_service_name),
            otel_exporter_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otel_exporter_endpoint),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.report_strategy, "accumulate_over");
        assert_eq!(config.report_id_scheme, ReportIdScheme::Timestamp);
        assert_eq!(config.dispatch_max_blocking, 16);
        assert_eq!(config.otel_service_name, "generative-reader");
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("APP_ENVIRONMENT", "production"),
            ("REPORT_STRATEGY", "accumulate"),
            ("REPORT_ID_SCHEME", "unique"),
            ("DISPATCH_MAX_BLOCKING", " 4 "),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.report_strategy, "accumulate");
        assert_eq!(config.report_id_scheme, ReportIdScheme::Unique);
        assert_eq!(config.dispatch_max_blocking, 4);
        assert_eq!(config.otel_exporter_endpoint, "http://collector:4317");
    }

    #[test]
    fn test_blank_strategy_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("REPORT_STRATEGY", "  ")])).unwrap();
        assert_eq!(config.report_strategy, DEFAULT_STRATEGY);
    }

    #[test]
    fn test_invalid_max_blocking() {
        let err = Config::from_lookup(lookup_from(&[("DISPATCH_MAX_BLOCKING", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "DISPATCH_MAX_BLOCKING",
                ..
            }
        ));

        let err =
            Config::from_lookup(lookup_from(&[("DISPATCH_MAX_BLOCKING", "0")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value \"0\" for DISPATCH_MAX_BLOCKING: must be at least 1"
        );
    }

    #[test]
    fn test_invalid_id_scheme() {
        let err =
            Config::from_lookup(lookup_from(&[("REPORT_ID_SCHEME", "uuid")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "REPORT_ID_SCHEME",
                ..
            }
        ));
    }
}
