//! Validation curation
//!
//! All writes to validation documents go through the [`Curator`]: batch
//! merges from YAML/JSON files, reconciliation of legacy per-direction
//! documents, and maintenance passes over existing records. Each pair
//! update is a single read-merge-write transaction in the store.

mod batch;
mod maintenance;
mod reconcile;

pub use batch::{BatchDefaults, BatchReport, EntryFailure, EntryOutcome, ValidationBatch, ValidationEntry};
pub use maintenance::{CurationStatus, StatusEntry};
pub use reconcile::{find_mismatches, reconcile, DirectionalDocument, Mismatch, MismatchKind, ReconcileReport};

use crate::model::{ConfidenceParseError, PairKey, Protein};
use crate::query::SearchTerm;
use crate::storage::{InteractionStore, StorageError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while curating validation documents
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid batch file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Entry is missing '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Confidence(#[from] ConfidenceParseError),

    #[error("Protein not found: {0}")]
    ProteinNotFound(String),

    #[error("Identifier '{identifier}' matches {count} proteins; add an organism prefix or use a UniProt ID")]
    AmbiguousProtein { identifier: String, count: usize },

    #[error("No interaction between {0}")]
    PairNotFound(PairKey),

    #[error("No validation recorded for {0}")]
    NoValidation(PairKey),
}

/// Applies curation passes to a shared store
#[derive(Clone)]
pub struct Curator {
    store: Arc<dyn InteractionStore>,
}

impl Curator {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    /// Resolve a UniProt ID, gene name or alias, optionally organism-prefixed
    /// (`Hs:IFT46`, `CrIFT46`), to exactly one protein
    pub fn resolve_protein(&self, identifier: &str) -> Result<Protein, CurationError> {
        let term = SearchTerm::parse(identifier)
            .map_err(|_| CurationError::ProteinNotFound(identifier.to_string()))?;

        let mut candidates = self.store.find_proteins(&term.term)?;
        if candidates.is_empty() && term.organism_code.is_some() {
            // "Hs..." may itself be a UniProt ID or gene name
            candidates = self.store.find_proteins(&term.raw)?;
        } else if let Some(code) = &term.organism_code {
            candidates.retain(|p| p.organism_code.as_deref() == Some(code.as_str()));
        }

        if let Some(exact) = candidates
            .iter()
            .position(|p| p.uniprot_id.as_str().eq_ignore_ascii_case(&term.term))
        {
            return Ok(candidates.swap_remove(exact));
        }

        match candidates.len() {
            0 => Err(CurationError::ProteinNotFound(identifier.to_string())),
            1 => Ok(candidates.remove(0)),
            count => Err(CurationError::AmbiguousProtein {
                identifier: identifier.to_string(),
                count,
            }),
        }
    }

    /// Resolve two identifiers to the pair key of an existing interaction.
    /// `Ok(None)` when either protein or the interaction is unknown.
    pub fn resolve_pair(&self, a: &str, b: &str) -> Result<Option<PairKey>, CurationError> {
        let first = match self.resolve_protein(a) {
            Ok(protein) => protein,
            Err(CurationError::ProteinNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let second = match self.resolve_protein(b) {
            Ok(protein) => protein,
            Err(CurationError::ProteinNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let pair = PairKey::new(first.uniprot_id, second.uniprot_id);
        if self.store.find_pair(&pair)?.is_empty() {
            return Ok(None);
        }
        Ok(Some(pair))
    }
}
