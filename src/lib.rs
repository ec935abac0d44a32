//! Report generation over indexed documents, and uniform dispatch of async
//! and blocking work.
//!
//! [`ReportGenerator`] turns a prompt and a set of source document ids into a
//! single [`Document`] by calling an injected [`AggregationService`].
//! [`Dispatcher`] runs a [`Task`] in place when it is async and on an owned
//! [`WorkerPool`] when it blocks.

pub mod aggregation;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod report;
pub mod telemetry;

pub use aggregation::{AccumulateRequest, AggregationService, DateBounds};
pub use config::Config;
pub use dispatch::{Dispatcher, Task, WorkerPool};
pub use document::{Document, ReportMetadata};
pub use error::{ConfigError, DispatchError, ReportError, ReportResult};
pub use report::{DEFAULT_STRATEGY, REPORT_ID_PREFIX, ReportGenerator, ReportIdScheme};
pub use telemetry::{TelemetryGuard, init_telemetry};
