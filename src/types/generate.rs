//! Types for single-prompt text generation.

use serde::{Deserialize, Serialize};

/// Options for one generation call against one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Model to use for generation.
    pub model: String,

    /// Sampling temperature (0.0 to 2.0).
    /// Lower values keep the rewrite closer to the draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Number of candidate completions to request. Only the first is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
}

impl GenerateOptions {
    /// Create options with the specified model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            candidate_count: None,
        }
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the requested candidate count.
    pub fn candidate_count(mut self, n: u32) -> Self {
        self.candidate_count = Some(n);
        self
    }
}

/// Response from text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text.
    pub text: String,

    /// Model that produced the text, as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider-specific reason generation stopped (e.g. "STOP", "MAX_TOKENS").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl GenerateResponse {
    /// A bare text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            finish_reason: None,
        }
    }
}
