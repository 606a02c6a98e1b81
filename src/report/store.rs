//! Report persistence.
//!
//! [`ReportStore`] is the boundary between the application and whatever
//! document store holds finished reports. Reports are keyed by their
//! (sanitized) number; saving an existing number replaces it.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryReportStore`]: process-local, for tests and dry runs.
//! - [`JsonFileStore`]: a single JSON document on disk, rewritten
//!   atomically (temp file + rename) on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::validation::{ValidationRules, sanitize, sanitize_report};
use crate::types::{BopmReport, SaveOutcome, StoredReport};
use crate::{EscribaError, Result};

/// Persistence collaborator for finished reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Sanitize, validate and upsert `report` with its final text.
    async fn save(&self, report: &BopmReport, final_text: &str) -> Result<SaveOutcome>;

    /// Look up a report by number.
    async fn find_by_number(&self, number: &str) -> Result<Option<StoredReport>>;

    /// Most recently written reports first, at most `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<StoredReport>>;

    /// Number of stored reports.
    async fn count(&self) -> Result<usize>;

    /// Remove a report. Returns whether it existed.
    async fn delete(&self, number: &str) -> Result<bool>;

    /// Reports matching every set field of `filter`, newest first, at
    /// most `limit`.
    async fn search(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<StoredReport>>;
}

/// Search criteria for [`ReportStore::search`].
///
/// Each set field is a case-insensitive substring match; blank fields
/// match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub number: Option<String>,
    pub offender: Option<String>,
    pub nature: Option<String>,
    pub driver: Option<String>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn offender(mut self, offender: impl Into<String>) -> Self {
        self.offender = Some(offender.into());
        self
    }

    pub fn nature(mut self, nature: impl Into<String>) -> Self {
        self.nature = Some(nature.into());
        self
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    fn matches(&self, report: &BopmReport) -> bool {
        [
            (&self.number, &report.number),
            (&self.offender, &report.offender),
            (&self.nature, &report.nature),
            (&self.driver, &report.team.driver),
        ]
        .into_iter()
        .all(|(wanted, actual)| match wanted.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => actual.to_lowercase().contains(&wanted.to_lowercase()),
        })
    }
}

/// In-memory state shared by both store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Documents {
    /// Monotonic write counter; orders `list_recent`.
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    reports: BTreeMap<String, StoredReport>,
}

impl Documents {
    fn upsert(
        &mut self,
        rules: &ValidationRules,
        report: &BopmReport,
        final_text: &str,
    ) -> Result<SaveOutcome> {
        let report = sanitize_report(report);
        rules.validate(&report)?;

        self.revision += 1;
        let number = report.number.clone();
        let stored = StoredReport {
            report,
            final_text: final_text.to_string(),
            updated_at: unix_now(),
            revision: self.revision,
        };

        let outcome = match self.reports.insert(number.clone(), stored) {
            Some(_) => SaveOutcome::Updated,
            None => SaveOutcome::Created,
        };
        info!(number = %number, ?outcome, "report saved");
        Ok(outcome)
    }

    fn find(&self, number: &str) -> Option<StoredReport> {
        let number = sanitize(number);
        let found = self.reports.get(&number).cloned();
        if found.is_none() {
            debug!(number = %number, "report not found");
        }
        found
    }

    fn recent(&self, limit: usize) -> Vec<StoredReport> {
        newest_first(self.reports.values(), limit)
    }

    fn search(&self, filter: &ReportFilter, limit: usize) -> Vec<StoredReport> {
        let found = newest_first(
            self.reports.values().filter(|s| filter.matches(&s.report)),
            limit,
        );
        debug!(?filter, found = found.len(), "report search");
        found
    }

    fn remove(&mut self, number: &str) -> bool {
        let number = sanitize(number);
        let removed = self.reports.remove(&number).is_some();
        if removed {
            warn!(number = %number, "report deleted");
        }
        removed
    }
}

fn newest_first<'a>(
    reports: impl Iterator<Item = &'a StoredReport>,
    limit: usize,
) -> Vec<StoredReport> {
    let mut reports: Vec<_> = reports.cloned().collect();
    reports.sort_by(|a, b| b.revision.cmp(&a.revision));
    reports.truncate(limit);
    reports
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local report store.
#[derive(Default)]
pub struct MemoryReportStore {
    rules: ValidationRules,
    docs: Mutex<Documents>,
}

impl MemoryReportStore {
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules,
            docs: Mutex::new(Documents::default()),
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(&self, report: &BopmReport, final_text: &str) -> Result<SaveOutcome> {
        self.docs.lock().await.upsert(&self.rules, report, final_text)
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<StoredReport>> {
        Ok(self.docs.lock().await.find(number))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<StoredReport>> {
        Ok(self.docs.lock().await.recent(limit))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.docs.lock().await.reports.len())
    }

    async fn delete(&self, number: &str) -> Result<bool> {
        Ok(self.docs.lock().await.remove(number))
    }

    async fn search(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<StoredReport>> {
        Ok(self.docs.lock().await.search(filter, limit))
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Report store backed by one JSON file.
///
/// The whole document is held in memory and flushed after each write.
/// A write that fails to reach disk leaves the in-memory state untouched.
/// Not safe for several processes sharing one file.
pub struct JsonFileStore {
    path: PathBuf,
    rules: ValidationRules,
    docs: Mutex<Documents>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; the file and its parent
    /// directory are created on first write.
    pub async fn open(path: impl Into<PathBuf>, rules: ValidationRules) -> Result<Self> {
        let path = path.into();
        let docs = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                EscribaError::Storage(format!("failed to parse report file {path:?}: {e}"))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Documents::default(),
            Err(e) => {
                return Err(EscribaError::Storage(format!(
                    "failed to read report file {path:?}: {e}"
                )));
            }
        };
        info!(path = %path.display(), reports = docs.reports.len(), "report store opened");

        Ok(Self {
            path,
            rules,
            docs: Mutex::new(docs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, docs: &Documents) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(docs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for JsonFileStore {
    async fn save(&self, report: &BopmReport, final_text: &str) -> Result<SaveOutcome> {
        let mut docs = self.docs.lock().await;
        let mut next = docs.clone();
        let outcome = next.upsert(&self.rules, report, final_text)?;
        self.flush(&next).await?;
        *docs = next;
        Ok(outcome)
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<StoredReport>> {
        Ok(self.docs.lock().await.find(number))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<StoredReport>> {
        Ok(self.docs.lock().await.recent(limit))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.docs.lock().await.reports.len())
    }

    async fn delete(&self, number: &str) -> Result<bool> {
        let mut docs = self.docs.lock().await;
        if !docs.reports.contains_key(&sanitize(number)) {
            return Ok(false);
        }
        let mut next = docs.clone();
        next.remove(number);
        self.flush(&next).await?;
        *docs = next;
        Ok(true)
    }

    async fn search(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<StoredReport>> {
        Ok(self.docs.lock().await.search(filter, limit))
    }
}
