//! Generation providers.
//!
//! [`GenerateProvider`] is the seam between the rewriter and a remote
//! model API; [`GeminiClient`] is the production implementation. The
//! candidate-list fallback lives in [`candidates`].

pub mod candidates;
pub mod gemini;
pub mod traits;

pub use candidates::{CandidateFailure, ChainOutcome, ModelCandidates};
pub use gemini::GeminiClient;
pub use traits::GenerateProvider;
