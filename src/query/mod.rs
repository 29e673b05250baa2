//! Query system for the interactome
//!
//! Parses protein search terms, classifies predictions into confidence
//! tiers under the v3 or v4 scoring mode, and filters and ranks them.

mod find;
mod search;
mod tier;
mod types;

pub use find::{ConfidenceFilter, InteractionQuery};
pub use search::{SearchTerm, KNOWN_ORGANISM_CODES};
pub use tier::{ipsae_tier, v3_tier, v4_tier, ScoringMode, Tier, IPSAE_HIGH, IPSAE_MEDIUM};
pub use types::{QueryError, QueryResult, Ranked};
