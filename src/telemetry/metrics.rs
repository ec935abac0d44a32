use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("generative-reader"));

// --- Report Metrics ---

pub static REPORT_GENERATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.generation.duration")
        .with_description("Total report generation duration in seconds")
        .with_unit("s")
        .build()
});

pub static REPORT_SOURCE_DOCUMENTS: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.source_documents")
        .with_description("Number of source documents aggregated per report")
        .with_unit("{document}")
        .build()
});

pub static REPORT_AGGREGATION_ERROR_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.aggregation.error.count")
        .with_description("Number of failed aggregation calls")
        .with_unit("{error}")
        .build()
});

// --- Dispatch Metrics ---

pub static DISPATCH_CALLS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("dispatch.calls")
        .with_description("Number of dispatched tasks by execution path")
        .with_unit("{task}")
        .build()
});

pub static DISPATCH_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("dispatch.duration")
        .with_description("Dispatched task duration in seconds")
        .with_unit("s")
        .build()
});
