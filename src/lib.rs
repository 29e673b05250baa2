//! Interactome: curation and query layer for predicted protein interactions
//!
//! Stores AlphaFold-predicted bait/prey interactions of intraflagellar
//! transport and BBSome proteins together with their literature validation,
//! and serves them filtered by confidence tier.
//!
//! # Core Concepts
//!
//! - **Interactions**: directional (bait, prey) predictions with interface scores
//! - **Pair keys**: the unordered protein pair; validation is stored once per pair
//! - **Validation documents**: literature records merged by (study, method)
//! - **Scoring modes**: v3 interface-quality tiers or v4 ipSAE tiers
//!
//! # Example
//!
//! ```
//! use interactome::{ExperimentalValidation, Confidence, ValidationRecord};
//!
//! let mut doc = ExperimentalValidation::new();
//! doc.merge(ValidationRecord::new("Y2H", "Lucker et al., 2005", Confidence::Medium));
//! doc.merge(ValidationRecord::new("Cryo-EM", "Petriman et al., 2022", Confidence::High));
//! assert_eq!(doc.summary().strongest_method.as_deref(), Some("Cryo-EM"));
//! ```

pub mod api;
pub mod config;
pub mod curation;
pub mod enrich;
pub mod export;
pub mod http;
pub mod import;
pub mod logging;
pub mod model;
pub mod query;
pub mod storage;
pub mod structure;

pub use api::{InteractomeApi, ServiceError};
pub use config::Config;
pub use curation::{BatchReport, CurationError, Curator, ValidationBatch};
pub use model::{
    Confidence, ExperimentalValidation, Interaction, InteractionId, PairKey, Protein, UniprotId,
    ValidationRecord,
};
pub use query::{ConfidenceFilter, InteractionQuery, QueryError, QueryResult, ScoringMode, Tier};
pub use storage::{InteractionStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
