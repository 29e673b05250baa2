//! Transport-independent API layer
//!
//! `InteractomeApi` is the single entry point for read operations. The HTTP
//! routes and the `search` subcommand call it; neither reaches into the
//! store or the structure files directly.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AlphafoldVersion, ComplexInteraction, ExperimentalValidation, Interaction, ProteinComplex,
};
use crate::query::{InteractionQuery, QueryError, Ranked, ScoringMode, SearchTerm, Tier};
use crate::storage::{BaitSummary, Diagnostics, InteractionStore, StorageError};
use crate::structure::{CifFile, StructureError, StructureFiles};

/// Errors surfaced to API callers
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Complex not found: {0}")]
    ComplexNotFound(String),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// One interaction as a flat row: bait and prey columns, scores, the pair's
/// validation document and the tier it was classified into
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionView {
    pub id: i64,
    pub bait_uniprot: String,
    pub bait_gene: Option<String>,
    pub bait_organism: Option<String>,
    pub bait_organism_code: Option<String>,
    pub bait_common_name: Option<String>,
    pub prey_uniprot: String,
    pub prey_gene: Option<String>,
    pub prey_organism: Option<String>,
    pub prey_organism_code: Option<String>,
    pub prey_common_name: Option<String>,
    pub iptm: Option<f64>,
    pub interface_plddt: Option<f64>,
    pub contacts_pae_lt_3: Option<i64>,
    pub contacts_pae_lt_6: Option<i64>,
    pub ipsae: Option<f64>,
    pub ipsae_confidence: Option<String>,
    pub ipsae_pae_cutoff: Option<f64>,
    /// Stored v3 quality class
    pub confidence: Option<String>,
    pub alphafold_version: Option<AlphafoldVersion>,
    pub analysis_version: Option<String>,
    pub source_path: Option<String>,
    pub experimental_validation: Option<ExperimentalValidation>,
    pub tier: Option<Tier>,
}

impl From<Ranked<Interaction>> for InteractionView {
    fn from(ranked: Ranked<Interaction>) -> Self {
        let Ranked { item, tier } = ranked;
        let Interaction {
            id,
            bait,
            prey,
            prediction,
            experimental_validation,
        } = item;
        let scores = prediction.scores;
        Self {
            id: id.0,
            bait_uniprot: bait.uniprot_id.to_string(),
            bait_gene: bait.gene_name,
            bait_organism: bait.organism,
            bait_organism_code: bait.organism_code,
            bait_common_name: bait.common_name,
            prey_uniprot: prey.uniprot_id.to_string(),
            prey_gene: prey.gene_name,
            prey_organism: prey.organism,
            prey_organism_code: prey.organism_code,
            prey_common_name: prey.common_name,
            iptm: scores.iptm,
            interface_plddt: scores.interface_plddt,
            contacts_pae_lt_3: scores.contacts_pae_lt_3,
            contacts_pae_lt_6: scores.contacts_pae_lt_6,
            ipsae: scores.ipsae,
            ipsae_confidence: prediction.ipsae_confidence,
            ipsae_pae_cutoff: scores.ipsae_pae_cutoff,
            confidence: prediction.confidence,
            alphafold_version: prediction.alphafold_version,
            analysis_version: prediction.analysis_version,
            source_path: prediction.source_path,
            experimental_validation,
            tier,
        }
    }
}

/// Interactions of one protein, filtered and ranked
#[derive(Debug, Clone, Serialize)]
pub struct InteractionSearch {
    pub search_term: String,
    pub organism_code: Option<String>,
    pub mode: ScoringMode,
    /// Tier tokens the caller asked for; empty means all
    pub confidence_levels: Vec<String>,
    /// Matching rows before tier filtering
    pub total_count: usize,
    pub count: usize,
    pub interactions: Vec<InteractionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexList {
    pub complexes: Vec<ProteinComplex>,
    pub count: usize,
    pub mode: ScoringMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexInteractions {
    pub complex: ProteinComplex,
    pub mode: ScoringMode,
    pub confidence_levels: Vec<String>,
    pub total_count: usize,
    pub count: usize,
    pub interactions: Vec<Ranked<ComplexInteraction>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaitList {
    pub baits: Vec<BaitSummary>,
    pub count: usize,
}

fn confidence_levels(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single entry point for query operations
#[derive(Clone)]
pub struct InteractomeApi {
    store: Arc<dyn InteractionStore>,
    structures: Arc<StructureFiles>,
}

impl InteractomeApi {
    pub fn new(store: Arc<dyn InteractionStore>, structures: Arc<StructureFiles>) -> Self {
        Self { store, structures }
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    /// Interactions of every protein matching `identifier`, classified and
    /// ranked under `mode` and filtered to the `confidence` tiers
    pub fn search_interactions(
        &self,
        identifier: &str,
        mode: Option<&str>,
        confidence: Option<&str>,
    ) -> Result<InteractionSearch, ServiceError> {
        let query = InteractionQuery::from_params(mode, confidence)?;
        let term = SearchTerm::parse(identifier)?;

        let rows = self.store.search_interactions(&term)?;
        let result = query.execute(rows);
        debug!(
            term = %term.raw,
            mode = %query.mode,
            matched = result.total_count,
            returned = result.len(),
            "interaction search"
        );

        Ok(InteractionSearch {
            search_term: term.raw,
            organism_code: term.organism_code,
            mode: query.mode,
            confidence_levels: confidence_levels(confidence),
            total_count: result.total_count,
            count: result.items.len(),
            interactions: result.items.into_iter().map(InteractionView::from).collect(),
        })
    }

    /// All complexes; in v4 mode interaction counts cover only v4
    /// predictions with an ipSAE score
    pub fn complexes(&self, mode: Option<&str>) -> Result<ComplexList, ServiceError> {
        let mode: ScoringMode = mode.unwrap_or_default().parse()?;
        let complexes = self.store.list_complexes(mode == ScoringMode::V4)?;
        Ok(ComplexList {
            count: complexes.len(),
            complexes,
            mode,
        })
    }

    /// Predictions of a complex (by numeric id or name), classified and
    /// ranked like pairwise interactions
    pub fn complex_interactions(
        &self,
        key: &str,
        mode: Option<&str>,
        confidence: Option<&str>,
    ) -> Result<ComplexInteractions, ServiceError> {
        let query = InteractionQuery::from_params(mode, confidence)?;
        let complex = self
            .store
            .find_complex(key.trim())?
            .ok_or_else(|| ServiceError::ComplexNotFound(key.to_string()))?;

        let result = query.execute(self.store.complex_interactions(complex.id)?);
        Ok(ComplexInteractions {
            complex,
            mode: query.mode,
            confidence_levels: confidence_levels(confidence),
            total_count: result.total_count,
            count: result.items.len(),
            interactions: result.items,
        })
    }

    /// Bait proteins with interaction counts
    pub fn baits(&self) -> Result<BaitList, ServiceError> {
        let baits = self.store.bait_counts()?;
        Ok(BaitList {
            count: baits.len(),
            baits,
        })
    }

    pub fn diagnostics(&self) -> Result<Diagnostics, ServiceError> {
        Ok(self.store.diagnostics()?)
    }

    pub async fn structure(&self, id: &str) -> Result<CifFile, ServiceError> {
        Ok(self.structures.cif(id).await?)
    }

    pub async fn pae_contacts(&self, id: &str) -> Result<serde_json::Value, ServiceError> {
        Ok(self.structures.pae_contacts(id).await?)
    }
}
