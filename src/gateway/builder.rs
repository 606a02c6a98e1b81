//! Builder for configuring rewriter instances

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::prompt::PromptTemplate;
use super::rewriter::{Rewriter, RewriterParts};
use crate::cache::{CacheConfig, ResultCache};
use crate::config::{Config, Secrets};
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::providers::{GeminiClient, GenerateProvider, ModelCandidates};
use crate::{EscribaError, Result};

/// Default sampling temperature; low to keep rewrites faithful.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Main entry point for creating rewriter instances.
pub struct Escriba;

impl Escriba {
    /// Create a new builder for configuring the rewriter.
    pub fn builder() -> EscribaBuilder {
        EscribaBuilder::new()
    }
}

/// Builder for configuring rewriter instances.
pub struct EscribaBuilder {
    gemini_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    provider: Option<Arc<dyn GenerateProvider>>,
    models: Option<Vec<String>>,
    temperature: f32,
    candidate_count: u32,
    prompt_template: Option<String>,
    cache: CacheConfig,
}

impl EscribaBuilder {
    pub fn new() -> Self {
        Self {
            gemini_key: None,
            base_url: None,
            timeout: None,
            provider: None,
            models: None,
            temperature: DEFAULT_TEMPERATURE,
            candidate_count: 1,
            prompt_template: None,
            cache: CacheConfig::default(),
        }
    }

    /// Start from a loaded configuration and secrets.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        let generation = &config.generation;
        let mut builder = Self::new()
            .models(generation.models.iter())
            .temperature(generation.temperature)
            .candidate_count(generation.candidate_count)
            .prompt_template(generation.prompt_template.clone())
            .base_url(generation.base_url.clone())
            .timeout_secs(generation.request_timeout_secs)
            .cache(CacheConfig::new().max_entries(config.cache.max_entries));

        if let Some(key) = secrets.api_key("gemini") {
            builder = builder.gemini(key);
        }
        builder
    }

    /// Configure the Gemini provider with an API key.
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_key = Some(api_key.into());
        self
    }

    /// Override the Gemini base URL (for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout (seconds).
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Use a custom provider instead of the Gemini client.
    ///
    /// Takes precedence over [`gemini()`](Self::gemini).
    pub fn provider(mut self, provider: Arc<dyn GenerateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the candidate models, highest priority first.
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.models = Some(models.into_iter().map(|m| m.as_ref().to_string()).collect());
        self
    }

    /// Set the sampling temperature (0.0 to 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the number of completions requested per call.
    pub fn candidate_count(mut self, n: u32) -> Self {
        self.candidate_count = n;
        self
    }

    /// Set the prompt template; must contain `{nature}` and `{draft}`.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Set the result cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Build the rewriter.
    ///
    /// Invalid settings (empty candidate list, malformed template,
    /// out-of-range temperature, zero cache size) are errors. A missing
    /// API key is not: the rewriter is built without a provider and
    /// answers every request with the unconfigured marker.
    pub fn build(self) -> Result<Rewriter> {
        let candidates = match self.models {
            Some(models) => ModelCandidates::new(models)?,
            None => ModelCandidates::default(),
        };

        let template = match self.prompt_template {
            Some(t) => PromptTemplate::new(t)?,
            None => PromptTemplate::default(),
        };

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(EscribaError::Configuration(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.candidate_count == 0 {
            return Err(EscribaError::Configuration(
                "candidate_count must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(EscribaError::Configuration(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        let cache = ResultCache::new(&self.cache)?;

        let provider: Option<Arc<dyn GenerateProvider>> = match (self.provider, self.gemini_key) {
            (Some(provider), _) => Some(provider),
            (None, Some(key)) => {
                let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
                let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
                match GeminiClient::with_base_url(key, base_url, timeout) {
                    Ok(client) => {
                        info!("Gemini client initialised");
                        Some(Arc::new(client) as Arc<dyn GenerateProvider>)
                    }
                    Err(e) => {
                        error!(error = %e, "failed to initialise Gemini client");
                        None
                    }
                }
            }
            (None, None) => {
                warn!("no Gemini API key configured");
                None
            }
        };

        info!(
            candidates = candidates.len(),
            cache_size = self.cache.max_entries,
            configured = provider.is_some(),
            "rewriter ready"
        );

        Ok(Rewriter::new(RewriterParts {
            provider,
            candidates,
            template,
            temperature: self.temperature,
            candidate_count: self.candidate_count,
            cache,
        }))
    }
}

impl Default for EscribaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
