//! Maintenance passes over stored validation records

use super::{CurationError, Curator};
use crate::model::PairKey;
use serde::Serialize;
use tracing::info;

/// Validation coverage of the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationStatus {
    pub total_interactions: usize,
    pub validated_interactions: usize,
    /// Percentage of interactions with at least one record
    pub validation_rate: f64,
    pub validated: Vec<StatusEntry>,
}

/// One validated interaction and its methods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub interaction_id: i64,
    pub bait: String,
    pub prey: String,
    pub methods: Vec<String>,
    pub validation_count: usize,
}

impl Curator {
    /// Fill the PMID of every `study` record that has none. Returns the
    /// number of pairs touched.
    pub fn backfill_pmid(&self, study: &str, pmid: &str) -> Result<usize, CurationError> {
        let touched = self.update_study_records(study, |record| {
            if record.pmid.is_some() {
                return false;
            }
            record.pmid = Some(pmid.to_string());
            true
        })?;
        info!(study, pmid, pairs = touched, "PMID backfilled");
        Ok(touched)
    }

    /// Blank the notes of every `study` record. Returns the number of pairs
    /// touched.
    pub fn clear_notes(&self, study: &str) -> Result<usize, CurationError> {
        let touched = self.update_study_records(study, |record| {
            if record.notes.is_empty() {
                return false;
            }
            record.notes.clear();
            true
        })?;
        info!(study, pairs = touched, "notes cleared");
        Ok(touched)
    }

    /// Union the source pair's records into the target pair, e.g. to carry
    /// validation across isoforms. Returns the number of records added.
    pub fn copy_validations(&self, source: &PairKey, target: &PairKey) -> Result<usize, CurationError> {
        let document = self
            .store()
            .load_validation(source)?
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CurationError::NoValidation(source.clone()))?;

        if self.store().find_pair(target)?.is_empty() {
            return Err(CurationError::PairNotFound(target.clone()));
        }

        let mut added = 0;
        self.store().modify_validation(target, &mut |stored| {
            added = stored.union_with(&document);
            added > 0
        })?;

        info!(%source, %target, added, "validations copied");
        Ok(added)
    }

    /// Validation coverage and the methods behind every validated interaction
    pub fn status(&self) -> Result<CurationStatus, CurationError> {
        let interactions = self.store().list_interactions()?;
        let total_interactions = interactions.len();

        let validated: Vec<StatusEntry> = interactions
            .iter()
            .filter_map(|i| {
                let document = i.experimental_validation.as_ref().filter(|d| !d.is_empty())?;
                Some(StatusEntry {
                    interaction_id: i.id.0,
                    bait: i.bait.display_name().to_string(),
                    prey: i.prey.display_name().to_string(),
                    methods: document.methods().into_iter().map(String::from).collect(),
                    validation_count: document.summary().validation_count,
                })
            })
            .collect();

        let validation_rate = if total_interactions == 0 {
            0.0
        } else {
            validated.len() as f64 * 100.0 / total_interactions as f64
        };

        Ok(CurationStatus {
            total_interactions,
            validated_interactions: validated.len(),
            validation_rate,
            validated,
        })
    }

    fn update_study_records(
        &self,
        study: &str,
        mut update: impl FnMut(&mut crate::model::ValidationRecord) -> bool,
    ) -> Result<usize, CurationError> {
        let mut touched = 0;
        for (pair, document) in self.store().list_validations()? {
            if !document.studies().contains(&study) {
                continue;
            }
            let changed = self.store().modify_validation(&pair, &mut |stored| {
                stored.update_records(|record| record.study == study && update(record)) > 0
            })?;
            if changed {
                touched += 1;
            }
        }
        Ok(touched)
    }
}
