//! Ordered candidate models with first-success fallback.
//!
//! [`ModelCandidates`] holds the model identifiers in priority order
//! (index 0 = tried first). [`ModelCandidates::run`] walks the list
//! against a single [`GenerateProvider`]:
//!
//! ```text
//!   prompt ──► candidate[0] ──ok──► Generated
//!                  │ err
//!                  ▼
//!              candidate[1] ──ok──► Generated
//!                  │ err
//!                  ▼
//!                 ...
//!                  │ err (last)
//!                  ▼
//!              Exhausted { failures }
//! ```
//!
//! Every error moves on to the next candidate immediately. There is no
//! backoff and no second attempt at a candidate that already failed.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::traits::GenerateProvider;
use crate::telemetry;
use crate::types::{GenerateOptions, GenerateResponse};
use crate::{EscribaError, Result};

/// Models tried when no list is configured, fastest and newest first.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];

/// Immutable, non-empty, ordered list of model identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates {
    models: Arc<[String]>,
}

/// One candidate that failed during a chain run.
#[derive(Debug)]
pub struct CandidateFailure {
    pub model: String,
    pub error: EscribaError,
}

/// Result of walking the candidate list once.
#[derive(Debug)]
pub enum ChainOutcome {
    /// A candidate produced text. `failures` lists the ones tried before it.
    Generated {
        model: String,
        response: GenerateResponse,
        failures: Vec<CandidateFailure>,
    },
    /// Every candidate failed, in list order.
    Exhausted { failures: Vec<CandidateFailure> },
}

impl ModelCandidates {
    /// Build a candidate list.
    ///
    /// Identifiers are trimmed. An empty list, or a blank identifier, is a
    /// configuration error.
    pub fn new<I, S>(models: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .collect();

        if models.is_empty() {
            return Err(EscribaError::Configuration(
                "at least one model candidate is required".to_string(),
            ));
        }
        if models.iter().any(String::is_empty) {
            return Err(EscribaError::Configuration(
                "model candidate identifiers must not be blank".to_string(),
            ));
        }

        Ok(Self {
            models: models.into(),
        })
    }

    /// Identifiers in the order they are tried.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    /// The highest-priority candidate.
    pub fn first(&self) -> &str {
        &self.models[0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false; construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Try each candidate in order until one returns non-blank text.
    ///
    /// Never fails: provider errors are collected into the outcome. A
    /// response whose text is blank counts as [`EscribaError::EmptyResponse`].
    #[instrument(skip(self, provider, prompt), fields(provider = provider.name(), candidates = self.len()))]
    pub async fn run(
        &self,
        provider: &dyn GenerateProvider,
        prompt: &str,
        temperature: f32,
        candidate_count: u32,
    ) -> ChainOutcome {
        let mut failures = Vec::new();

        for model in self.iter() {
            let options = GenerateOptions::new(model)
                .temperature(temperature)
                .candidate_count(candidate_count);

            info!(model, "trying candidate");
            let attempt = match provider.generate(prompt, &options).await {
                Ok(response) if response.text.trim().is_empty() => Err(EscribaError::EmptyResponse),
                other => other,
            };

            match attempt {
                Ok(response) => {
                    record_attempt(model, true);
                    info!(model, "candidate succeeded");
                    return ChainOutcome::Generated {
                        model: model.to_string(),
                        response,
                        failures,
                    };
                }
                Err(e) => {
                    record_attempt(model, false);
                    warn!(model, error = %e, "candidate failed");
                    failures.push(CandidateFailure {
                        model: model.to_string(),
                        error: e,
                    });
                }
            }
        }

        error!(attempted = failures.len(), "all candidates failed");
        ChainOutcome::Exhausted { failures }
    }
}

impl Default for ModelCandidates {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

fn record_attempt(model: &str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::CANDIDATE_ATTEMPTS_TOTAL,
        "model" => model.to_owned(),
        "status" => status,
    )
    .increment(1);
}
