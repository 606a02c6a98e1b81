//! Report sanitization and validation.

use serde::Deserialize;
use tracing::{info, warn};

use crate::types::BopmReport;
use crate::{EscribaError, Result};

/// Field length limits applied before a report is saved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationRules {
    /// Minimum draft length in characters (default: 20).
    #[serde(default = "default_min_draft_len")]
    pub min_draft_len: usize,
    /// Maximum draft length in characters (default: 10,000).
    #[serde(default = "default_max_draft_len")]
    pub max_draft_len: usize,
    /// Maximum report number length in characters (default: 50).
    #[serde(default = "default_max_number_len")]
    pub max_number_len: usize,
    /// Minimum length of required free-text fields (default: 2).
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

fn default_min_draft_len() -> usize {
    20
}

fn default_max_draft_len() -> usize {
    10_000
}

fn default_max_number_len() -> usize {
    50
}

fn default_min_text_len() -> usize {
    2
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_draft_len: default_min_draft_len(),
            max_draft_len: default_max_draft_len(),
            max_number_len: default_max_number_len(),
            min_text_len: default_min_text_len(),
        }
    }
}

impl ValidationRules {
    /// Validate the report number.
    pub fn validate_number(&self, number: &str) -> Result<()> {
        let number = number.trim();
        if number.is_empty() {
            return Err(invalid("number", "report number is required"));
        }
        if number.chars().count() > self.max_number_len {
            return Err(invalid(
                "number",
                format!("report number too long (max {} characters)", self.max_number_len),
            ));
        }
        Ok(())
    }

    /// Validate a free-text field.
    pub fn validate_text(&self, field: &'static str, value: &str, required: bool) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            if required {
                return Err(invalid(field, "is required"));
            }
            return Ok(());
        }
        if value.chars().count() < self.min_text_len {
            return Err(invalid(
                field,
                format!("too short (min {} characters)", self.min_text_len),
            ));
        }
        Ok(())
    }

    /// Validate the draft narrative.
    pub fn validate_draft(&self, draft: &str) -> Result<()> {
        let draft = draft.trim();
        if draft.is_empty() {
            return Err(invalid("draft", "draft narrative is required"));
        }
        let len = draft.chars().count();
        if len < self.min_draft_len {
            return Err(invalid(
                "draft",
                format!("draft too short (min {} characters)", self.min_draft_len),
            ));
        }
        if len > self.max_draft_len {
            return Err(invalid(
                "draft",
                format!("draft too long (max {} characters)", self.max_draft_len),
            ));
        }
        Ok(())
    }

    /// Validate every rule; the first failure is returned.
    ///
    /// Order: number, offender, nature, driver, commander, draft.
    pub fn validate(&self, report: &BopmReport) -> Result<()> {
        let result = self
            .validate_number(&report.number)
            .and_then(|_| self.validate_text("offender", &report.offender, true))
            .and_then(|_| self.validate_text("nature", &report.nature, true))
            .and_then(|_| self.validate_text("driver", &report.team.driver, true))
            .and_then(|_| self.validate_text("commander", &report.team.commander, true))
            .and_then(|_| self.validate_draft(&report.draft));

        match &result {
            Ok(()) => info!(number = %report.number.trim(), "report validated"),
            Err(e) => warn!(error = %e, "report validation failed"),
        }
        result
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> EscribaError {
    EscribaError::Validation {
        field,
        message: message.into(),
    }
}

/// Strip control characters (keeping newline and tab) and trim.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !matches!(c,
                '\u{00}'..='\u{08}'
                | '\u{0B}'..='\u{0C}'
                | '\u{0E}'..='\u{1F}'
                | '\u{7F}'..='\u{9F}')
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// A copy of `report` with every text field sanitized.
pub fn sanitize_report(report: &BopmReport) -> BopmReport {
    let mut clean = report.clone();
    for field in [
        &mut clean.number,
        &mut clean.offender,
        &mut clean.nature,
        &mut clean.team.driver,
        &mut clean.team.commander,
        &mut clean.team.aux1,
        &mut clean.team.aux2,
        &mut clean.details.material,
        &mut clean.details.procedures,
        &mut clean.details.signature,
        &mut clean.draft,
    ] {
        *field = sanitize(field);
    }
    clean
}
