//! Batch merge of validation records from YAML or JSON files
//!
//! A batch file carries optional file-level defaults and a list of entries:
//!
//! ```yaml
//! study: Taschner et al., 2016
//! pmid: "27932497"
//! confidence: high
//! entries:
//!   - bait: IFT46
//!     prey: IFT52
//!     method: Biochemical reconstitution
//!   - bait: Hs:IFT81
//!     prey: IFT74
//!     method: Cryo-EM
//!     notes: N-terminal coiled coils
//! ```

use super::{CurationError, Curator};
use crate::model::{lenient_opt_string, Confidence, MergeOutcome, ValidationRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Values applied to every entry that does not set them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchDefaults {
    #[serde(default)]
    pub study: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub pmid: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub doi: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

/// One literature confirmation of a bait/prey pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationEntry {
    /// UniProt ID, gene name or alias; organism prefix allowed
    pub bait: String,
    pub prey: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub study: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub pmid: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub doi: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Protein used as the experimental bait, when the study declares one
    #[serde(default)]
    pub bait_protein: Option<String>,
    /// Additional fields carried into the record unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ValidationEntry {
    pub fn new(bait: impl Into<String>, prey: impl Into<String>) -> Self {
        Self {
            bait: bait.into(),
            prey: prey.into(),
            method: None,
            study: None,
            pmid: None,
            doi: None,
            confidence: None,
            notes: None,
            bait_protein: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_study(mut self, study: impl Into<String>) -> Self {
        self.study = Some(study.into());
        self
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }

    /// Build the validation record, filling unset fields from `defaults`
    pub fn to_record(&self, defaults: &BatchDefaults) -> Result<ValidationRecord, CurationError> {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        let method = non_empty(&self.method)
            .or_else(|| non_empty(&defaults.method))
            .ok_or(CurationError::MissingField("method"))?;
        let study = non_empty(&self.study)
            .or_else(|| non_empty(&defaults.study))
            .ok_or(CurationError::MissingField("study"))?;
        let confidence = match non_empty(&self.confidence).or_else(|| non_empty(&defaults.confidence)) {
            Some(label) => label.parse()?,
            None => Confidence::default(),
        };

        let mut record = ValidationRecord::new(method.trim(), study.trim(), confidence);
        record.pmid = self.pmid.clone().or_else(|| defaults.pmid.clone());
        record.doi = self.doi.clone().or_else(|| defaults.doi.clone());
        record.bait_protein = non_empty(&self.bait_protein);
        record.notes = self.notes.clone().unwrap_or_default();
        record.extra = self.extra.clone();
        Ok(record)
    }
}

/// A batch file: defaults plus entries
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationBatch {
    #[serde(flatten)]
    pub defaults: BatchDefaults,
    #[serde(default)]
    pub entries: Vec<ValidationEntry>,
}

impl ValidationBatch {
    pub fn new(entries: Vec<ValidationEntry>) -> Self {
        Self {
            defaults: BatchDefaults::default(),
            entries,
        }
    }

    pub fn with_defaults(mut self, defaults: BatchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Load a batch; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| CurationError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// What happened to one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The pair had no document; one was created
    Added,
    /// Record appended to an existing document
    Updated,
    /// A record with the same (study, method) already exists
    Skipped,
    /// No interaction exists for the pair
    NotFound,
}

/// An entry that failed to apply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryFailure {
    pub index: usize,
    pub bait: String,
    pub prey: String,
    pub message: String,
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub errors: usize,
    pub failures: Vec<EntryFailure>,
}

impl BatchReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Entries processed
    pub fn total(&self) -> usize {
        self.added + self.updated + self.skipped + self.not_found + self.errors
    }

    fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Added => self.added += 1,
            EntryOutcome::Updated => self.updated += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::NotFound => self.not_found += 1,
        }
    }
}

impl Curator {
    /// Merge one entry into its pair's document
    pub fn apply_entry(
        &self,
        entry: &ValidationEntry,
        defaults: &BatchDefaults,
    ) -> Result<EntryOutcome, CurationError> {
        let record = entry.to_record(defaults)?;

        let Some(pair) = self.resolve_pair(&entry.bait, &entry.prey)? else {
            warn!(bait = %entry.bait, prey = %entry.prey, "no interaction for pair, skipping");
            return Ok(EntryOutcome::NotFound);
        };

        let mut outcome = EntryOutcome::Skipped;
        self.store().modify_validation(&pair, &mut |document| {
            let was_empty = document.is_empty();
            match document.merge(record.clone()) {
                MergeOutcome::Added => {
                    outcome = if was_empty { EntryOutcome::Added } else { EntryOutcome::Updated };
                    true
                }
                MergeOutcome::Duplicate => false,
            }
        })?;

        debug!(%pair, method = %record.method, study = %record.study, ?outcome, "entry applied");
        Ok(outcome)
    }

    /// Apply every entry of a batch. Failures are logged and counted; they
    /// never stop the remaining entries.
    pub fn apply_batch(&self, batch: &ValidationBatch) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, entry) in batch.entries.iter().enumerate() {
            match self.apply_entry(entry, &batch.defaults) {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(index, bait = %entry.bait, prey = %entry.prey, error = %e, "entry failed");
                    report.errors += 1;
                    report.failures.push(EntryFailure {
                        index,
                        bait: entry.bait.clone(),
                        prey: entry.prey.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            added = report.added,
            updated = report.updated,
            skipped = report.skipped,
            not_found = report.not_found,
            errors = report.errors,
            "validation batch applied"
        );
        report
    }
}
