//! Public types for the Escriba API.

mod generate;
mod model;
mod report;

pub use generate::{GenerateOptions, GenerateResponse};
pub use model::ModelInfo;
pub use report::{BopmReport, Details, SaveOutcome, StoredReport, Team};
