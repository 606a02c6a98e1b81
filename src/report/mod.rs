//! Report validation, document rendering and persistence.

pub mod format;
pub mod store;
pub mod validation;

pub use format::render_document;
pub use store::{JsonFileStore, MemoryReportStore, ReportFilter, ReportStore};
pub use validation::{ValidationRules, sanitize, sanitize_report};
