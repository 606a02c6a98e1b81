//! Provider trait for remote text generation.
//!
//! The [`Rewriter`](crate::Rewriter) talks to the outside world only
//! through [`GenerateProvider`]. The model identifier travels in
//! [`GenerateOptions::model`]; a provider makes exactly one attempt per
//! call and reports any failure as an error. Trying the next candidate
//! is the caller's job.
//!
//! # Example
//!
//! ```ignore
//! struct Canned;
//!
//! #[async_trait]
//! impl GenerateProvider for Canned {
//!     fn name(&self) -> &str { "canned" }
//!
//!     async fn generate(&self, _prompt: &str, options: &GenerateOptions) -> Result<GenerateResponse> {
//!         Ok(GenerateResponse::text(format!("from {}", options.model)))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::types::{GenerateOptions, GenerateResponse, ModelInfo};
use crate::{EscribaError, Result};

/// Provider for single-prompt text generation.
#[async_trait]
pub trait GenerateProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate text for `prompt` with the model named in `options`.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateResponse>;

    /// Models the provider advertises.
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Err(EscribaError::InvalidInput(format!(
            "{} does not support model listing",
            self.name()
        )))
    }
}
