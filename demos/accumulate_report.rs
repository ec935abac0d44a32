use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::runtime::Handle;

use generative_reader::{
    AccumulateRequest, AggregationService, Config, Dispatcher, ReportGenerator, Task, WorkerPool,
    init_telemetry,
};

const TRAITS_PROMPT: &str = "Analyze the document fragments to identify enduring character \
    traits, values, and beliefs of the subjects. Present your findings as a bullet-point list.";

struct Fragment {
    id: i64,
    created_at: DateTime<Utc>,
    text: String,
}

/// Stand-in for a real index: keeps fragments in memory and echoes the ones
/// that pass the filter.
struct InMemoryIndex {
    fragments: Vec<Fragment>,
}

#[async_trait::async_trait]
impl AggregationService for InMemoryIndex {
    async fn accumulate_over(&self, request: &AccumulateRequest) -> anyhow::Result<String> {
        let selected: Vec<&Fragment> = self
            .fragments
            .iter()
            .filter(|f| request.source_document_ids.contains(&f.id))
            .filter(|f| request.bounds.earliest_date.is_none_or(|d| f.created_at >= d))
            .filter(|f| request.bounds.latest_date.is_none_or(|d| f.created_at <= d))
            .collect();

        if selected.is_empty() {
            anyhow::bail!("no indexed fragments match the request");
        }

        let body: Vec<String> = selected
            .iter()
            .map(|f| format!("* [{}] {}", f.id, f.text))
            .collect();
        Ok(format!("{}\n\n{}", request.prompt, body.join("\n")))
    }
}

fn load_fragments(now: DateTime<Utc>) -> Vec<Fragment> {
    [
        (1, 30, "Alice organised the neighbourhood cleanup again."),
        (2, 10, "John planned the trip two months ahead."),
        (3, 2, "Alice mentored two new volunteers this week."),
    ]
    .into_iter()
    .map(|(id, days_ago, text)| Fragment {
        id,
        created_at: now - Duration::days(days_ago),
        text: text.to_string(),
    })
    .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let telemetry_guard = init_telemetry(&config)?;

    let dispatcher = Dispatcher::new(WorkerPool::from_config(Handle::current(), &config));

    let now = Utc::now();
    let fragments = dispatcher
        .run(Task::blocking(move || load_fragments(now)))
        .await?;

    tracing::info!(fragments = fragments.len(), "Index loaded");

    let index = Arc::new(InMemoryIndex { fragments });
    let generator = ReportGenerator::from_config(&config, "messages", TRAITS_PROMPT, index)
        .with_name("Character traits");

    let ids = ["1", "2", "3"];
    let reports = generator
        .generate(&ids, Some(now - Duration::days(14)))
        .await?;

    for report in &reports {
        tracing::info!(report.id = %report.id, "Report generated");
        println!("{}\n{}", report.id, report.text);
        println!("{}", serde_json::to_string_pretty(&report.metadata)?);
    }

    dispatcher.pool().shutdown().await;
    telemetry_guard.shutdown();

    Ok(())
}
