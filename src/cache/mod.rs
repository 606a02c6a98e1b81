//! Caching subsystem.
//!
//! - [`ResultCache`]: bounded, strictly-LRU store of generated report
//!   text, consulted by the [`Rewriter`](crate::Rewriter) before any
//!   remote call. See [`result`] for key scope and concurrency notes.
//! - [`fingerprint()`]: the deterministic key derivation shared by the
//!   rewriter and anyone who wants to query the cache directly.
//!
//! Recency is tracked by [`lru::LruCache`]; eviction order is exact LRU.

mod key;
pub mod result;

pub use key::{Fingerprint, fingerprint};
pub use result::{CacheConfig, CacheStats, ResultCache};
