//! Supplementary dataset export

use crate::model::{ExperimentalValidation, Interaction};
use crate::storage::{InteractionStore, ProteinStats, StorageError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize export: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_interactions: usize,
    pub total_proteins: usize,
    pub total_baits: usize,
    pub experimentally_validated: usize,
}

/// One interaction flattened for tabular use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRow {
    pub interaction_id: i64,
    pub bait_uniprot: String,
    pub bait_gene: Option<String>,
    pub bait_organism: Option<String>,
    pub prey_uniprot: String,
    pub prey_gene: Option<String>,
    pub prey_organism: Option<String>,
    pub ipsae: Option<f64>,
    pub ipsae_confidence_class: Option<String>,
    pub iptm: Option<f64>,
    pub mean_interface_plddt: Option<f64>,
    pub contacts_pae_lt_3: Option<i64>,
    pub contacts_pae_lt_6: Option<i64>,
    pub analysis_version: Option<String>,
    pub alphafold_version: Option<String>,
    pub source_path: Option<String>,
    pub quality_class: Option<String>,
    pub experimental_validation: Option<ExperimentalValidation>,
}

impl From<&Interaction> for InteractionRow {
    fn from(i: &Interaction) -> Self {
        let p = &i.prediction;
        Self {
            interaction_id: i.id.0,
            bait_uniprot: i.bait.uniprot_id.to_string(),
            bait_gene: i.bait.gene_name.clone(),
            bait_organism: i.bait.organism.clone(),
            prey_uniprot: i.prey.uniprot_id.to_string(),
            prey_gene: i.prey.gene_name.clone(),
            prey_organism: i.prey.organism.clone(),
            ipsae: p.scores.ipsae,
            ipsae_confidence_class: p.ipsae_confidence.clone(),
            iptm: p.scores.iptm,
            mean_interface_plddt: p.scores.interface_plddt,
            contacts_pae_lt_3: p.scores.contacts_pae_lt_3,
            contacts_pae_lt_6: p.scores.contacts_pae_lt_6,
            analysis_version: p.analysis_version.clone(),
            alphafold_version: p.alphafold_version.map(|v| v.as_str().to_string()),
            source_path: p.source_path.clone(),
            quality_class: p.confidence.clone(),
            experimental_validation: i.experimental_validation.clone().filter(|d| !d.is_empty()),
        }
    }
}

/// One literature-validated interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRow {
    pub bait_gene: String,
    pub prey_gene: String,
    pub ipsae: Option<f64>,
    pub ipsae_confidence: Option<String>,
    /// Methods joined with ", "
    pub validation_methods: String,
    /// Studies joined with "; "
    pub validation_studies: String,
    pub validation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplementaryExport {
    pub metadata: ExportMetadata,
    pub interactions: Vec<InteractionRow>,
    pub proteins: Vec<ProteinStats>,
    pub experimental_validation: Vec<ValidationRow>,
}

/// ipSAE descending with missing scores last
fn by_ipsae_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn join_or_unknown(items: Vec<&str>, separator: &str) -> String {
    if items.is_empty() {
        "Unknown".to_string()
    } else {
        items.join(separator)
    }
}

impl SupplementaryExport {
    /// Collect the complete dataset from the store
    pub fn build(store: &dyn InteractionStore) -> Result<Self, ExportError> {
        let mut interactions = store.list_interactions()?;
        interactions.sort_by(|a, b| {
            by_ipsae_desc(a.prediction.scores.ipsae, b.prediction.scores.ipsae)
                .then_with(|| a.bait.display_name().cmp(b.bait.display_name()))
                .then_with(|| a.prey.display_name().cmp(b.prey.display_name()))
        });

        let experimental_validation: Vec<ValidationRow> = interactions
            .iter()
            .filter_map(|i| {
                let document = i.experimental_validation.as_ref().filter(|d| !d.is_empty())?;
                Some(ValidationRow {
                    bait_gene: i.bait.display_name().to_string(),
                    prey_gene: i.prey.display_name().to_string(),
                    ipsae: i.prediction.scores.ipsae,
                    ipsae_confidence: i.prediction.ipsae_confidence.clone(),
                    validation_methods: join_or_unknown(
                        document.records().iter().map(|r| r.method.as_str()).collect(),
                        ", ",
                    ),
                    validation_studies: join_or_unknown(
                        document.records().iter().map(|r| r.study.as_str()).collect(),
                        "; ",
                    ),
                    validation_count: document.len(),
                })
            })
            .collect();

        let proteins = store.protein_stats()?;
        let baits: HashSet<_> = interactions.iter().map(|i| &i.bait.uniprot_id).collect();

        let metadata = ExportMetadata {
            generated_at: Utc::now(),
            total_interactions: interactions.len(),
            total_proteins: proteins.len(),
            total_baits: baits.len(),
            experimentally_validated: experimental_validation.len(),
        };

        Ok(Self {
            metadata,
            interactions: interactions.iter().map(InteractionRow::from).collect(),
            proteins,
            experimental_validation,
        })
    }

    /// Write pretty-printed JSON to `path`
    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(
            path = %path.display(),
            interactions = self.metadata.total_interactions,
            proteins = self.metadata.total_proteins,
            validated = self.metadata.experimentally_validated,
            "supplementary data exported"
        );
        Ok(())
    }
}
