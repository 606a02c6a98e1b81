//! Tests for the rewriter: cache short-circuit, candidate fallback and
//! the fallback markers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use escriba::gateway::{EMPTY_DRAFT_MARKER, EXHAUSTED_MARKER, UNCONFIGURED_MARKER};
use escriba::{
    CacheConfig, Escriba, EscribaError, GenerateOptions, GenerateProvider, GenerateResponse,
    Origin, Result, Rewriter, fingerprint,
};

const DRAFT: &str = "vi o cara pulando o muro e correndo pro mato com a bolsa";
const NATURE: &str = "Furto";

// ============================================================================
// Mock provider
// ============================================================================

/// Scripted provider: models listed in `failing` error out, the rest
/// answer with `"{model}: formal text"`.
struct ScriptedProvider {
    failing: Vec<&'static str>,
    calls: AtomicUsize,
    order: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(failing: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            failing: failing.to_vec(),
            calls: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerateProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push(options.model.clone());
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.failing.contains(&options.model.as_str()) {
            return Err(EscribaError::Api {
                status: 503,
                message: format!("{} overloaded", options.model),
            });
        }
        Ok(GenerateResponse::text(format!(
            "{}: formal text",
            options.model
        )))
    }
}

/// Always answers with whitespace.
struct BlankProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl GenerateProvider for BlankProvider {
    fn name(&self) -> &str {
        "blank"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerateResponse::text("  \n "))
    }
}

fn rewriter_with(provider: Arc<dyn GenerateProvider>) -> Rewriter {
    Escriba::builder()
        .provider(provider)
        .models(["A", "B", "C"])
        .build()
        .unwrap()
}

// ============================================================================
// Candidate fallback
// ============================================================================

#[tokio::test]
async fn fallback_tries_candidates_in_order() {
    let provider = ScriptedProvider::new(&["A", "B"]);
    let rewriter = rewriter_with(provider.clone());

    let rewrite = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(rewrite.text, "C: formal text");
    assert_eq!(rewrite.origin, Origin::Model("C".to_string()));
    assert_eq!(provider.order(), vec!["A", "B", "C"]);
    assert_eq!(provider.calls(), 3);

    // The winning text is cached under the request's fingerprint.
    let key = fingerprint(DRAFT, NATURE);
    assert!(rewriter.cache().contains(&key));
    assert_eq!(
        rewriter.cache().get(&key).as_deref(),
        Some("C: formal text")
    );
    assert_eq!(rewriter.rewrite(DRAFT, NATURE).await, "C: formal text");
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn first_success_stops_the_chain() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    let text = rewriter.rewrite(DRAFT, NATURE).await;

    assert_eq!(text, "A: formal text");
    assert_eq!(provider.order(), vec!["A"]);
}

#[tokio::test]
async fn total_failure_returns_draft_and_leaves_cache_empty() {
    let provider = ScriptedProvider::new(&["A", "B", "C"]);
    let rewriter = rewriter_with(provider.clone());

    let rewrite = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(rewrite.origin, Origin::Exhausted);
    assert!(rewrite.text.starts_with(EXHAUSTED_MARKER));
    assert!(rewrite.text.ends_with(DRAFT));
    assert!(!rewrite.is_generated());
    assert_eq!(provider.calls(), 3);
    assert_eq!(rewriter.cache_stats().size, 0);
    assert!(!rewriter.cache().contains(&fingerprint(DRAFT, NATURE)));
}

#[tokio::test]
async fn failed_request_is_retried_on_next_call() {
    let provider = ScriptedProvider::new(&["A", "B", "C"]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.rewrite(DRAFT, NATURE).await;
    rewriter.rewrite(DRAFT, NATURE).await;

    // Nothing was cached, so every candidate is tried again.
    assert_eq!(provider.calls(), 6);
}

#[tokio::test]
async fn blank_response_counts_as_failure() {
    let provider = Arc::new(BlankProvider {
        calls: AtomicUsize::new(0),
    });
    let rewriter = rewriter_with(provider.clone());

    let rewrite = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(rewrite.origin, Origin::Exhausted);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(rewriter.cache_stats().size, 0);
}

// ============================================================================
// Cache interaction
// ============================================================================

#[tokio::test]
async fn second_identical_call_is_served_from_cache() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    let first = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;
    let second = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(first.text, second.text);
    assert_eq!(second.origin, Origin::Cache);
    assert_eq!(provider.calls(), 1);

    let stats = rewriter.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn surrounding_whitespace_hits_the_same_entry() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.rewrite(DRAFT, NATURE).await;
    let rewrite = rewriter
        .rewrite_detailed(&format!("  {DRAFT}\n"), " Furto ", true)
        .await;

    assert_eq!(rewrite.origin, Origin::Cache);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn different_nature_is_a_different_entry() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.rewrite(DRAFT, "Furto").await;
    rewriter.rewrite(DRAFT, "Roubo").await;

    assert_eq!(provider.calls(), 2);
    assert_eq!(rewriter.cache_stats().size, 2);
}

#[tokio::test]
async fn bypassing_the_cache_neither_reads_nor_writes() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.rewrite_with(DRAFT, NATURE, false).await;
    rewriter.rewrite_with(DRAFT, NATURE, false).await;

    assert_eq!(provider.calls(), 2);
    let stats = rewriter.cache_stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.hits + stats.misses, 0);
}

#[tokio::test]
async fn clear_cache_forces_regeneration() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.rewrite(DRAFT, NATURE).await;
    rewriter.clear_cache();
    let rewrite = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(rewrite.origin, Origin::Model("A".to_string()));
    assert_eq!(provider.calls(), 2);
    assert_eq!(rewriter.cache_stats().hits, 0);
}

#[tokio::test]
async fn cache_capacity_is_respected() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = Escriba::builder()
        .provider(provider.clone())
        .models(["A"])
        .cache(CacheConfig::new().max_entries(2))
        .build()
        .unwrap();

    for nature in ["Furto", "Roubo", "Dano"] {
        rewriter.rewrite(DRAFT, nature).await;
    }

    let stats = rewriter.cache_stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.max_size, 2);
    // Oldest entry was evicted.
    assert!(!rewriter.cache().contains(&fingerprint(DRAFT, "Furto")));
    assert!(rewriter.cache().contains(&fingerprint(DRAFT, "Dano")));
}

// ============================================================================
// Short-circuit paths
// ============================================================================

#[tokio::test]
async fn unconfigured_rewriter_returns_marker_without_touching_cache() {
    let rewriter = Escriba::builder().build().unwrap();
    assert!(!rewriter.is_configured());

    let rewrite = rewriter.rewrite_detailed(DRAFT, NATURE, true).await;

    assert_eq!(rewrite.origin, Origin::Unconfigured);
    assert_eq!(
        rewrite.text,
        format!("{UNCONFIGURED_MARKER}\nTexto Original:\n{DRAFT}")
    );
    let stats = rewriter.cache_stats();
    assert_eq!(stats.hits + stats.misses, 0);
}

#[tokio::test]
async fn blank_draft_returns_marker_without_calling_provider() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    let rewrite = rewriter.rewrite_detailed("   \n", NATURE, true).await;

    assert_eq!(rewrite.origin, Origin::EmptyDraft);
    assert!(rewrite.text.starts_with(EMPTY_DRAFT_MARKER));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unconfigured_check_connection_is_an_error() {
    let rewriter = Escriba::builder().build().unwrap();
    let result = rewriter.check_connection().await;
    assert!(matches!(result, Err(EscribaError::NoProvider)));
}

// ============================================================================
// Prompt and connection check
// ============================================================================

#[tokio::test]
async fn prompt_carries_trimmed_nature_and_draft() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = Escriba::builder()
        .provider(provider.clone())
        .models(["A"])
        .prompt_template("[{nature}] {draft}")
        .build()
        .unwrap();

    rewriter.rewrite("  texto {nature} cru  ", " Dano ").await;

    assert_eq!(
        provider.last_prompt().as_deref(),
        Some("[Dano] texto {nature} cru")
    );
}

#[tokio::test]
async fn check_connection_uses_first_candidate_only() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    rewriter.check_connection().await.unwrap();

    assert_eq!(provider.order(), vec!["A"]);
    assert_eq!(rewriter.cache_stats().size, 0);
}

#[tokio::test]
async fn check_connection_surfaces_provider_error() {
    let provider = ScriptedProvider::new(&["A"]);
    let rewriter = rewriter_with(provider.clone());

    let err = rewriter.check_connection().await.unwrap_err();
    assert!(err.is_transient());
    // No fallback for the connection check.
    assert_eq!(provider.calls(), 1);
}

// ============================================================================
// Builder validation
// ============================================================================

#[test]
fn builder_rejects_invalid_settings() {
    assert!(Escriba::builder().models(Vec::<String>::new()).build().is_err());
    assert!(Escriba::builder().models(["A", " "]).build().is_err());
    assert!(Escriba::builder().temperature(2.5).build().is_err());
    assert!(Escriba::builder().candidate_count(0).build().is_err());
    assert!(Escriba::builder().timeout_secs(0).build().is_err());
    assert!(
        Escriba::builder()
            .prompt_template("no slots here")
            .build()
            .is_err()
    );
    assert!(
        Escriba::builder()
            .cache(CacheConfig::new().max_entries(0))
            .build()
            .is_err()
    );
}

#[test]
fn builder_with_blank_key_builds_unconfigured() {
    let rewriter = Escriba::builder().gemini("   ").build().unwrap();
    assert!(!rewriter.is_configured());
}

// ============================================================================
// Background execution
// ============================================================================

#[tokio::test]
async fn rewrite_runs_on_a_spawned_task() {
    let provider = ScriptedProvider::new(&["A"]);
    let rewriter = rewriter_with(provider.clone());

    let background = rewriter.clone();
    let handle = tokio::spawn(async move { background.rewrite(DRAFT, NATURE).await });
    let text = handle.await.unwrap();

    assert_eq!(text, "B: formal text");
    // The clone shares the cache with the original.
    assert_eq!(rewriter.cache_stats().size, 1);
}

#[tokio::test]
async fn concurrent_rewrites_share_one_cache() {
    let provider = ScriptedProvider::new(&[]);
    let rewriter = rewriter_with(provider.clone());

    let handles: Vec<_> = ["Furto", "Roubo", "Dano", "Ameaça"]
        .into_iter()
        .map(|nature| {
            let rewriter = rewriter.clone();
            tokio::spawn(async move { rewriter.rewrite(DRAFT, nature).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(rewriter.cache_stats().size, 4);
    assert_eq!(provider.calls(), 4);
}
