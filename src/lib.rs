//! Escriba - formal incident-report drafting
//!
//! An operator types an informal narrative; [`Rewriter`] turns it into
//! formal report language by asking a remote model, trying an ordered
//! list of candidate models until one answers. Results are remembered in
//! a bounded LRU cache keyed by the (draft, nature) pair, so resubmitting
//! the same narrative costs nothing.
//!
//! `rewrite` never fails: when no provider is configured, or every
//! candidate fails, it returns a marker message that embeds the
//! operator's draft verbatim.
//!
//! # Example
//!
//! ```rust,no_run
//! use escriba::Escriba;
//!
//! #[tokio::main]
//! async fn main() -> escriba::Result<()> {
//!     let rewriter = Escriba::builder()
//!         .gemini("your-api-key")
//!         .models(["gemini-2.5-flash", "gemini-2.0-flash"])
//!         .build()?;
//!
//!     let text = rewriter
//!         .rewrite("vi o cara pulando o muro e correndo pro mato", "Furto")
//!         .await;
//!     println!("{text}");
//!
//!     let stats = rewriter.cache_stats();
//!     println!("cache: {}/{} entries", stats.size, stats.max_size);
//!     Ok(())
//! }
//! ```
//!
//! # Saving reports
//!
//! ```rust
//! use escriba::{BopmReport, MemoryReportStore, ReportStore, SaveOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> escriba::Result<()> {
//! let store = MemoryReportStore::default();
//! let report = BopmReport::new("2024-0001")
//!     .offender("Fulano de Tal")
//!     .nature("Furto")
//!     .team("Sd Silva", "Sgt Souza")
//!     .draft("Durante patrulhamento avistamos o suspeito saindo da loja.");
//!
//! assert_eq!(store.save(&report, "Texto formal.").await?, SaveOutcome::Created);
//! assert!(store.find_by_number("2024-0001").await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod report;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use error::{EscribaError, Result};
pub use gateway::{Escriba, EscribaBuilder, Origin, PromptTemplate, Rewrite, Rewriter};

pub use cache::{CacheConfig, CacheStats, Fingerprint, ResultCache, fingerprint};
pub use config::{Config, Secrets};
pub use providers::{
    CandidateFailure, ChainOutcome, GeminiClient, GenerateProvider, ModelCandidates,
};
pub use report::{
    JsonFileStore, MemoryReportStore, ReportFilter, ReportStore, ValidationRules, render_document,
};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    BopmReport, Details, GenerateOptions, GenerateResponse, ModelInfo, SaveOutcome, StoredReport,
    Team,
};
