//! Telemetry metric name constants.
//!
//! Centralised metric names for escriba operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `escriba_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `model`: candidate model identifier (e.g. "gemini-2.5-flash")
//! - `status`: outcome: "ok" or "error"
//! - `origin`: where a rewrite came from: "cache", "model",
//!   "unconfigured", "exhausted", "empty_draft"

/// Total result-cache hits.
pub const CACHE_HITS_TOTAL: &str = "escriba_cache_hits_total";

/// Total result-cache misses.
pub const CACHE_MISSES_TOTAL: &str = "escriba_cache_misses_total";

/// Total entries evicted from the result cache for capacity.
pub const CACHE_EVICTIONS_TOTAL: &str = "escriba_cache_evictions_total";

/// Total candidate model invocations.
///
/// Labels: `model`, `status` ("ok" | "error").
pub const CANDIDATE_ATTEMPTS_TOTAL: &str = "escriba_candidate_attempts_total";

/// Total rewrite requests answered.
///
/// Labels: `origin`.
pub const REWRITES_TOTAL: &str = "escriba_rewrites_total";

/// End-to-end rewrite duration in seconds (cache lookup included).
pub const REWRITE_DURATION_SECONDS: &str = "escriba_rewrite_duration_seconds";
