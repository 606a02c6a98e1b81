//! Rewriter - cached, fallback-chained draft formalization.
//!
//! Per request:
//!
//! ```text
//!   draft blank? ──yes──► EmptyDraft marker
//!        │
//!   provider configured? ──no──► Unconfigured marker   (cache untouched)
//!        │
//!   cache lookup ──hit──► cached text
//!        │ miss
//!   candidates[0..n] ──first ok──► store in cache, return text
//!        │ all failed
//!        ▼
//!   Exhausted marker                                  (cache untouched)
//! ```
//!
//! Every path returns a string; markers embed the operator's draft
//! verbatim so nothing typed is lost.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use super::prompt::PromptTemplate;
use crate::cache::{CacheStats, ResultCache, fingerprint};
use crate::providers::{ChainOutcome, GenerateProvider, ModelCandidates};
use crate::telemetry;
use crate::types::{GenerateOptions, ModelInfo};
use crate::{EscribaError, Result};

/// Marker heading returned when no generation provider is available.
pub const UNCONFIGURED_MARKER: &str = "[ERRO] IA não configurada.";

/// Marker heading returned when every candidate model failed.
pub const EXHAUSTED_MARKER: &str = "[FALHA] IA indisponível.";

/// Marker heading returned for a blank draft.
pub const EMPTY_DRAFT_MARKER: &str = "[ERRO] Rascunho vazio.";

const CONNECTION_CHECK_PROMPT: &str = "Teste";

/// Where the text of a [`Rewrite`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Served from the result cache.
    Cache,
    /// Generated by the named candidate model.
    Model(String),
    /// No provider; text is the unconfigured marker.
    Unconfigured,
    /// All candidates failed; text is the exhausted marker.
    Exhausted,
    /// Blank draft; text is the empty-draft marker.
    EmptyDraft,
}

impl Origin {
    fn label(&self) -> &'static str {
        match self {
            Origin::Cache => "cache",
            Origin::Model(_) => "model",
            Origin::Unconfigured => "unconfigured",
            Origin::Exhausted => "exhausted",
            Origin::EmptyDraft => "empty_draft",
        }
    }
}

/// Text returned for a rewrite request, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub origin: Origin,
}

impl Rewrite {
    /// Whether `text` is formal text rather than a fallback marker.
    pub fn is_generated(&self) -> bool {
        matches!(self.origin, Origin::Cache | Origin::Model(_))
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

pub(crate) struct RewriterParts {
    pub provider: Option<Arc<dyn GenerateProvider>>,
    pub candidates: ModelCandidates,
    pub template: PromptTemplate,
    pub temperature: f32,
    pub candidate_count: u32,
    pub cache: ResultCache,
}

/// Turns operator drafts into formal report text.
///
/// Cheap to clone; clones share the provider and the result cache, so a
/// request can be moved onto a background task with `tokio::spawn`.
#[derive(Clone)]
pub struct Rewriter {
    inner: Arc<RewriterParts>,
}

impl Rewriter {
    pub(crate) fn new(parts: RewriterParts) -> Self {
        Self {
            inner: Arc::new(parts),
        }
    }

    /// Whether a generation provider is available.
    pub fn is_configured(&self) -> bool {
        self.inner.provider.is_some()
    }

    /// The candidate models, in the order they are tried.
    pub fn candidates(&self) -> &ModelCandidates {
        &self.inner.candidates
    }

    /// The shared result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    /// Rewrite `draft` for an incident of the given `nature`, using the cache.
    pub async fn rewrite(&self, draft: &str, nature: &str) -> String {
        self.rewrite_detailed(draft, nature, true).await.into_text()
    }

    /// Rewrite with explicit control over cache use.
    ///
    /// With `use_cache = false` the cache is neither read nor written.
    pub async fn rewrite_with(&self, draft: &str, nature: &str, use_cache: bool) -> String {
        self.rewrite_detailed(draft, nature, use_cache)
            .await
            .into_text()
    }

    /// Rewrite and report which path produced the text.
    #[instrument(skip(self, draft), fields(nature = %nature.trim(), draft_len = draft.len()))]
    pub async fn rewrite_detailed(&self, draft: &str, nature: &str, use_cache: bool) -> Rewrite {
        let start = Instant::now();
        let rewrite = self.resolve(draft, nature, use_cache).await;

        metrics::counter!(telemetry::REWRITES_TOTAL, "origin" => rewrite.origin.label())
            .increment(1);
        metrics::histogram!(telemetry::REWRITE_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        rewrite
    }

    async fn resolve(&self, draft: &str, nature: &str, use_cache: bool) -> Rewrite {
        if draft.trim().is_empty() {
            warn!("blank draft submitted");
            return marker(EMPTY_DRAFT_MARKER, draft, Origin::EmptyDraft);
        }

        let Some(provider) = self.inner.provider.as_deref() else {
            warn!("generation provider unavailable");
            return marker(UNCONFIGURED_MARKER, draft, Origin::Unconfigured);
        };

        let key = fingerprint(draft, nature);
        if use_cache && let Some(text) = self.inner.cache.get(&key) {
            info!(%key, "rewrite served from cache");
            return Rewrite {
                text,
                origin: Origin::Cache,
            };
        }

        let prompt = self.inner.template.render(nature.trim(), draft.trim());
        let outcome = self
            .inner
            .candidates
            .run(
                provider,
                &prompt,
                self.inner.temperature,
                self.inner.candidate_count,
            )
            .await;

        match outcome {
            ChainOutcome::Generated {
                model, response, ..
            } => {
                if use_cache {
                    self.inner.cache.put(key, response.text.clone());
                    info!(%key, size = self.inner.cache.len(), "rewrite cached");
                }
                info!(model = %model, "rewrite generated");
                Rewrite {
                    text: response.text,
                    origin: Origin::Model(model),
                }
            }
            ChainOutcome::Exhausted { failures } => {
                warn!(failed = failures.len(), "returning draft unchanged");
                marker(EXHAUSTED_MARKER, draft, Origin::Exhausted)
            }
        }
    }

    /// Drop all cached rewrites and reset the hit/miss counters.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Current cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Send a short test prompt to the first candidate.
    ///
    /// Unlike [`rewrite`](Self::rewrite), this surfaces the provider error.
    pub async fn check_connection(&self) -> Result<()> {
        let provider = self
            .inner
            .provider
            .as_deref()
            .ok_or(EscribaError::NoProvider)?;
        let options = GenerateOptions::new(self.inner.candidates.first())
            .temperature(0.1)
            .candidate_count(1);
        provider.generate(CONNECTION_CHECK_PROMPT, &options).await?;
        Ok(())
    }

    /// Models advertised by the provider.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let provider = self
            .inner
            .provider
            .as_deref()
            .ok_or(EscribaError::NoProvider)?;
        provider.list_models().await
    }
}

fn marker(heading: &str, draft: &str, origin: Origin) -> Rewrite {
    Rewrite {
        text: format!("{heading}\nTexto Original:\n{draft}"),
        origin,
    }
}
