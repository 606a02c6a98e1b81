//! Remote model listing types.

use serde::{Deserialize, Serialize};

/// A model advertised by the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Identifier usable as a candidate (e.g. "gemini-2.5-flash").
    pub id: String,
    /// Human-readable name, if the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the model accepts single-prompt generation requests.
    pub supports_generate: bool,
}

impl ModelInfo {
    /// Create model info for a generation-capable model.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            supports_generate: true,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
