use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::identifier::ReportIdScheme;
use crate::aggregation::{
    AccumulateRequest, AggregationService, DateBounds, classify_error, truncate,
};
use crate::config::Config;
use crate::document::Document;
use crate::error::{ReportError, ReportResult};
use crate::telemetry::metrics::{
    REPORT_AGGREGATION_ERROR_COUNT, REPORT_GENERATION_DURATION, REPORT_SOURCE_DOCUMENTS,
};

pub const DEFAULT_STRATEGY: &str = "accumulate_over";

/// Produces a single report document from a set of indexed source documents
/// by running a prompt through the aggregation service.
///
/// The strategy tag is recorded in the output metadata and never dispatched on.
pub struct ReportGenerator {
    target_data_source: String,
    prompt: String,
    strategy: String,
    name: Option<String>,
    id_scheme: ReportIdScheme,
    aggregation: Arc<dyn AggregationService>,
}

impl ReportGenerator {
    pub fn new(
        target_data_source: impl Into<String>,
        prompt: impl Into<String>,
        aggregation: Arc<dyn AggregationService>,
    ) -> Self {
        Self {
            target_data_source: target_data_source.into(),
            prompt: prompt.into(),
            strategy: DEFAULT_STRATEGY.to_string(),
            name: None,
            id_scheme: ReportIdScheme::default(),
            aggregation,
        }
    }

    pub fn from_config(
        config: &Config,
        target_data_source: impl Into<String>,
        prompt: impl Into<String>,
        aggregation: Arc<dyn AggregationService>,
    ) -> Self {
        Self::new(target_data_source, prompt, aggregation)
            .with_strategy(config.report_strategy.clone())
            .with_id_scheme(config.report_id_scheme)
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id_scheme(mut self, id_scheme: ReportIdScheme) -> Self {
        self.id_scheme = id_scheme;
        self
    }

    pub fn target_data_source(&self) -> &str {
        &self.target_data_source
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Generates the report over `document_ids`, restricted to content created
    /// on or after `earliest_date` when one is given.
    ///
    /// Always yields exactly one document on success.
    pub async fn generate<S: AsRef<str>>(
        &self,
        document_ids: &[S],
        earliest_date: Option<DateTime<Utc>>,
    ) -> ReportResult<Vec<Document>> {
        self.generate_within(document_ids, DateBounds::since(earliest_date))
            .await
    }

    #[tracing::instrument(
        name = "report.generate",
        skip(self, document_ids, bounds),
        fields(
            report.target = %self.target_data_source,
            report.strategy = %self.strategy,
            report.documents_count = document_ids.len(),
            report.id,
        )
    )]
    pub async fn generate_within<S: AsRef<str>>(
        &self,
        document_ids: &[S],
        bounds: DateBounds,
    ) -> ReportResult<Vec<Document>> {
        let start = Instant::now();

        if let DateBounds {
            earliest_date: Some(earliest),
            latest_date: Some(latest),
        } = bounds
            && earliest > latest
        {
            return Err(ReportError::InvalidDateRange { earliest, latest });
        }

        let source_document_ids = parse_document_ids(document_ids)?;

        let request = AccumulateRequest {
            prompt: self.prompt.clone(),
            source_document_ids,
            bounds,
        };

        let text = self.accumulate(&request).await?;

        let generated_on = Utc::now();
        let original_ids: Vec<String> = document_ids
            .iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let mut document = Document::new(self.id_scheme.report_id(generated_on), text)
            .with_metadata("prompt", self.prompt.as_str())
            .with_metadata("strategy", self.strategy.as_str())
            .with_metadata("document_ids", original_ids)
            .with_metadata("generated_on", generated_on.to_rfc3339());
        if let Some(name) = &self.name {
            document = document.with_metadata("name", name.as_str());
        }

        let strategy_kv = KeyValue::new("report.strategy", self.strategy.clone());
        REPORT_GENERATION_DURATION.record(start.elapsed().as_secs_f64(), &[strategy_kv.clone()]);
        REPORT_SOURCE_DOCUMENTS.record(request.source_document_ids.len() as f64, &[strategy_kv]);

        tracing::Span::current().record("report.id", document.id.as_str());

        Ok(vec![document])
    }

    async fn accumulate(&self, request: &AccumulateRequest) -> ReportResult<String> {
        let span = tracing::info_span!(
            "aggregation.accumulate_over",
            report.target = %self.target_data_source,
            aggregation.source_documents = request.source_document_ids.len() as i64,
            aggregation.prompt_chars = request.prompt.chars().count() as i64,
            aggregation.bounded = !request.bounds.is_unbounded(),
            otel.status_code = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );

        span.add_event(
            "aggregation.prompt",
            vec![KeyValue::new(
                "aggregation.prompt",
                truncate(&request.prompt, 1000),
            )],
        );

        match self
            .aggregation
            .accumulate_over(request)
            .instrument(span.clone())
            .await
        {
            Ok(text) => {
                span.record("otel.status_code", "OK");
                Ok(text)
            }
            Err(err) => {
                let error_type = classify_error(&err);
                span.record("otel.status_code", "ERROR");
                span.record("error.type", error_type);

                REPORT_AGGREGATION_ERROR_COUNT.add(
                    1,
                    &[
                        KeyValue::new("error.type", error_type),
                        KeyValue::new("report.strategy", self.strategy.clone()),
                    ],
                );

                Err(ReportError::Aggregation(err))
            }
        }
    }
}

fn parse_document_ids<S: AsRef<str>>(document_ids: &[S]) -> ReportResult<Vec<i64>> {
    document_ids
        .iter()
        .map(|id| {
            let raw = id.as_ref();
            raw.trim()
                .parse::<i64>()
                .map_err(|source| ReportError::MalformedIdentifier {
                    id: raw.to_string(),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct BackendDown;

    struct RecordingAggregation {
        calls: Mutex<Vec<AccumulateRequest>>,
        fail: bool,
    }

    impl RecordingAggregation {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            })
        }

        fn calls(&self) -> Vec<AccumulateRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AggregationService for RecordingAggregation {
        async fn accumulate_over(&self, request: &AccumulateRequest) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(request.clone());
            if self.fail {
                Err(anyhow::Error::new(BackendDown))
            } else {
                Ok("Report text".to_string())
            }
        }
    }

    fn generator(aggregation: Arc<RecordingAggregation>) -> ReportGenerator {
        ReportGenerator::new("messages", "Summarize the conversation", aggregation)
    }

    fn is_timestamp_id(id: &str) -> bool {
        id.strip_prefix("generated_report_")
            .is_some_and(|rest| rest.len() == 14 && rest.chars().all(|c| c.is_ascii_digit()))
    }

    #[tokio::test]
    async fn test_generate_single_document() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());

        let docs = tokio_test::assert_ok!(generator.generate(&["1", "2", "3"], None).await);

        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.text, "Report text");
        assert!(is_timestamp_id(&doc.id), "unexpected id {}", doc.id);
        assert_eq!(doc.metadata["document_ids"], json!(["1", "2", "3"]));
        assert_eq!(doc.metadata["strategy"], "accumulate_over");
        assert_eq!(doc.metadata["prompt"], "Summarize the conversation");
        assert!(!doc.metadata.contains_key("name"));

        let generated_on = doc.metadata["generated_on"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(generated_on).is_ok());

        let calls = aggregation.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "Summarize the conversation");
        assert_eq!(calls[0].source_document_ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_converted_in_order() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());

        generator
            .generate(&["42", " 7", "-3", "0"], None)
            .await
            .unwrap();

        assert_eq!(aggregation.calls()[0].source_document_ids, vec![42, 7, -3, 0]);
    }

    #[tokio::test]
    async fn test_metadata_keeps_original_strings() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation);

        let docs = generator.generate(&["007", " 8"], None).await.unwrap();

        let meta = docs[0].report_metadata().unwrap();
        assert_eq!(meta.document_ids, vec!["007", " 8"]);
    }

    #[tokio::test]
    async fn test_empty_id_list() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());

        let ids: Vec<String> = Vec::new();
        let docs = generator.generate(&ids, None).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata["document_ids"], json!([]));
        assert!(aggregation.calls()[0].source_document_ids.is_empty());
    }

    #[tokio::test]
    async fn test_earliest_date_omitted() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());

        generator.generate(&["1"], None).await.unwrap();

        let bounds = aggregation.calls()[0].bounds;
        assert_eq!(bounds.earliest_date, None);
        assert!(bounds.is_unbounded());
    }

    #[tokio::test]
    async fn test_earliest_date_forwarded() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());
        let earliest = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();

        generator.generate(&["1"], Some(earliest)).await.unwrap();

        let bounds = aggregation.calls()[0].bounds;
        assert_eq!(bounds.earliest_date, Some(earliest));
        assert_eq!(bounds.latest_date, None);
    }

    #[tokio::test]
    async fn test_malformed_identifier_skips_aggregation() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());

        let err = tokio_test::assert_err!(generator.generate(&["1", "abc", "3"], None).await);

        match err {
            ReportError::MalformedIdentifier { id, .. } => assert_eq!(id, "abc"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(aggregation.calls().is_empty());
    }

    #[tokio::test]
    async fn test_aggregation_failure_propagates() {
        let aggregation = RecordingAggregation::failing();
        let generator = generator(aggregation.clone());

        let err = generator.generate(&["1"], None).await.unwrap_err();

        assert_eq!(err.to_string(), "backend unavailable");
        match err {
            ReportError::Aggregation(inner) => assert!(inner.downcast_ref::<BackendDown>().is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(aggregation.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_inverted_range_skips_aggregation() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());
        let earliest = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let err = generator
            .generate_within(&["1"], DateBounds::between(earliest, latest))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::InvalidDateRange { .. }));
        assert!(aggregation.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_within_forwards_both_bounds() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation.clone());
        let earliest = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        generator
            .generate_within(&["5"], DateBounds::between(earliest, latest))
            .await
            .unwrap();

        assert_eq!(
            aggregation.calls()[0].bounds,
            DateBounds::between(earliest, latest)
        );
    }

    #[tokio::test]
    async fn test_name_and_strategy_in_metadata() {
        let aggregation = RecordingAggregation::ok();
        let generator = generator(aggregation)
            .with_strategy("accumulate")
            .with_name("Weekly digest");

        let docs = generator.generate(&["1"], None).await.unwrap();

        let meta = docs[0].report_metadata().unwrap();
        assert_eq!(meta.strategy, "accumulate");
        assert_eq!(meta.name.as_deref(), Some("Weekly digest"));
    }

    #[tokio::test]
    async fn test_from_config_applies_scheme_and_strategy() {
        let config = Config {
            report_strategy: "accumulate".to_string(),
            report_id_scheme: ReportIdScheme::Unique,
            ..Config::default()
        };
        let generator =
            ReportGenerator::from_config(&config, "messages", "p", RecordingAggregation::ok());
        assert_eq!(generator.strategy(), "accumulate");
        assert_eq!(generator.target_data_source(), "messages");

        let docs = generator.generate(&["1"], None).await.unwrap();
        let rest = docs[0].id.strip_prefix("generated_report_").unwrap();
        assert_eq!(rest.len(), 14 + 1 + 10);
        assert_eq!(&rest[14..15], "_");
    }
}
