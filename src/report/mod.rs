pub mod generator;
pub mod identifier;

pub use generator::{DEFAULT_STRATEGY, ReportGenerator};
pub use identifier::{REPORT_ID_PREFIX, ReportIdScheme};
