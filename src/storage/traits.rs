//! Storage trait definitions

use crate::model::{
    Alias, ComplexId, ComplexInteraction, ExperimentalValidation, Interaction, InteractionId,
    NewComplex, NewComplexInteraction, NewInteraction, NewProtein, PairKey, Protein, ProteinComplex,
    ProteinId, UniprotId,
};
use crate::query::SearchTerm;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Protein not found: {0}")]
    ProteinNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Row counts across the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub proteins: usize,
    pub aliases: usize,
    pub interactions: usize,
    /// Interactions whose pair carries a non-empty validation document
    pub validated_interactions: usize,
    pub validated_pairs: usize,
    pub complexes: usize,
}

/// A bait protein with the number of interactions it was screened against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaitSummary {
    pub uniprot_id: UniprotId,
    pub gene_name: Option<String>,
    pub organism: Option<String>,
    pub organism_code: Option<String>,
    pub interaction_count: usize,
}

/// Network statistics of a protein that appears in at least one interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinStats {
    #[serde(flatten)]
    pub protein: Protein,
    /// Distinct preys this protein was screened against
    pub interactions_as_bait: usize,
    /// Distinct baits this protein was detected by
    pub interactions_as_prey: usize,
    /// Distinct partners in either role
    pub total_interactions: usize,
}

/// Store self-description for the debug endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub tables: Vec<String>,
    pub interaction_columns: Vec<String>,
    pub sample_proteins: Vec<UniprotId>,
    pub stats: StoreStats,
}

/// Trait for interaction storage backends
///
/// Implementations must be thread-safe (Send + Sync) so one store can back
/// the HTTP service and the curation passes.
pub trait InteractionStore: Send + Sync {
    // === Protein Operations ===

    /// Insert a protein, or update its gene name/organism if it exists.
    /// Existing non-empty values are kept when the new value is missing.
    fn upsert_protein(&self, protein: &NewProtein) -> StorageResult<ProteinId>;

    /// Load a protein by UniProt ID
    fn get_protein(&self, uniprot: &UniprotId) -> StorageResult<Option<Protein>>;

    /// Proteins whose UniProt ID, gene name or alias equals `identifier`
    /// (case-insensitive). UniProt matches come first, then gene names.
    fn find_proteins(&self, identifier: &str) -> StorageResult<Vec<Protein>>;

    /// List all proteins ordered by UniProt ID
    fn list_proteins(&self) -> StorageResult<Vec<Protein>>;

    /// Overwrite a protein's gene name; false if the protein is unknown
    fn set_gene_name(&self, uniprot: &UniprotId, gene_name: &str) -> StorageResult<bool>;

    /// Attach an alias; false if it was already present
    fn add_alias(&self, uniprot: &UniprotId, alias: &Alias) -> StorageResult<bool>;

    /// Aliases of a protein
    fn list_aliases(&self, uniprot: &UniprotId) -> StorageResult<Vec<Alias>>;

    /// Network statistics for every protein with at least one interaction
    fn protein_stats(&self) -> StorageResult<Vec<ProteinStats>>;

    // === Interaction Operations ===

    /// Insert an interaction; both proteins must already exist
    fn insert_interaction(&self, interaction: &NewInteraction) -> StorageResult<InteractionId>;

    /// Load one interaction with proteins and pair validation
    fn get_interaction(&self, id: InteractionId) -> StorageResult<Option<Interaction>>;

    /// All interactions of a pair, in either direction
    fn find_pair(&self, pair: &PairKey) -> StorageResult<Vec<Interaction>>;

    /// Interactions touching any protein that matches the search term
    fn search_interactions(&self, term: &SearchTerm) -> StorageResult<Vec<Interaction>>;

    /// Every interaction, ordered by id
    fn list_interactions(&self) -> StorageResult<Vec<Interaction>>;

    /// Baits with their interaction counts, ordered by gene name then UniProt ID
    fn bait_counts(&self) -> StorageResult<Vec<BaitSummary>>;

    /// Delete interactions duplicating (bait, prey, ipsae, iptm), keeping the
    /// lowest id. Returns the number of rows deleted.
    fn delete_duplicate_interactions(&self) -> StorageResult<usize>;

    // === Validation Operations ===

    /// Load the validation document of a pair
    fn load_validation(&self, pair: &PairKey) -> StorageResult<Option<ExperimentalValidation>>;

    /// All stored validation documents
    fn list_validations(&self) -> StorageResult<Vec<(PairKey, ExperimentalValidation)>>;

    /// Read-modify-write a pair's document inside one transaction.
    ///
    /// `f` receives the stored document (empty if none) and returns whether
    /// it changed it. The document is written back only on change; an empty
    /// document removes the row. Returns whether a write happened.
    fn modify_validation(
        &self,
        pair: &PairKey,
        f: &mut dyn FnMut(&mut ExperimentalValidation) -> bool,
    ) -> StorageResult<bool>;

    // === Complex Operations ===

    /// Create or replace a complex definition and its members
    fn save_complex(&self, complex: &NewComplex) -> StorageResult<ComplexId>;

    /// Insert a prediction of a complex against a prey protein
    fn insert_complex_interaction(
        &self,
        complex: ComplexId,
        interaction: &NewComplexInteraction,
    ) -> StorageResult<i64>;

    /// All complexes ordered by display name; when `v4_only`, interaction
    /// counts include only v4 predictions with an ipSAE score
    fn list_complexes(&self, v4_only: bool) -> StorageResult<Vec<ProteinComplex>>;

    /// Find a complex by numeric id or complex name
    fn find_complex(&self, key: &str) -> StorageResult<Option<ProteinComplex>>;

    /// Predictions of a complex
    fn complex_interactions(&self, complex: ComplexId) -> StorageResult<Vec<ComplexInteraction>>;

    // === Store Operations ===

    fn stats(&self) -> StorageResult<StoreStats>;

    fn diagnostics(&self) -> StorageResult<Diagnostics>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: InteractionStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
