//! Incident report (BOPM) data types.

use serde::{Deserialize, Serialize};

/// Officers attending the incident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub driver: String,
    pub commander: String,
    #[serde(default)]
    pub aux1: String,
    #[serde(default)]
    pub aux2: String,
}

/// Free-form supplementary sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    /// Seized or involved material.
    #[serde(default)]
    pub material: String,
    /// Procedures adopted.
    #[serde(default)]
    pub procedures: String,
    #[serde(default)]
    pub signature: String,
}

/// Operator-entered report fields.
///
/// `number` identifies the report; saving a report with an existing
/// number replaces the stored copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BopmReport {
    pub number: String,
    pub offender: String,
    pub nature: String,
    pub team: Team,
    #[serde(default)]
    pub details: Details,
    /// The informal narrative as typed by the operator.
    pub draft: String,
}

impl BopmReport {
    /// Start a report with its number; remaining fields default to empty.
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    pub fn offender(mut self, offender: impl Into<String>) -> Self {
        self.offender = offender.into();
        self
    }

    pub fn nature(mut self, nature: impl Into<String>) -> Self {
        self.nature = nature.into();
        self
    }

    pub fn team(mut self, driver: impl Into<String>, commander: impl Into<String>) -> Self {
        self.team.driver = driver.into();
        self.team.commander = commander.into();
        self
    }

    pub fn auxiliaries(mut self, aux1: impl Into<String>, aux2: impl Into<String>) -> Self {
        self.team.aux1 = aux1.into();
        self.team.aux2 = aux2.into();
        self
    }

    pub fn details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = draft.into();
        self
    }
}

/// A persisted report together with its final formal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(flatten)]
    pub report: BopmReport,
    pub final_text: String,
    /// Last write time, seconds since the Unix epoch.
    pub updated_at: u64,
    /// Store-wide write sequence number; higher is newer.
    #[serde(default)]
    pub revision: u64,
}

/// Whether a save inserted a new report or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Created,
    Updated,
}
