//! Core data model: proteins, directional interactions, pair keys and
//! validation documents

mod complex;
mod interaction;
mod pair;
mod protein;
mod validation;

pub use complex::{
    ComplexId, ComplexInteraction, ComplexMember, NewComplex, NewComplexInteraction,
    NewComplexMember, ProteinComplex,
};
pub use interaction::{
    AlphafoldVersion, Interaction, InteractionId, NewInteraction, PredictionInfo,
    PredictionScores, Scored,
};
pub use pair::PairKey;
pub use protein::{Alias, AliasType, NewProtein, Protein, ProteinId, UniprotId};
pub use validation::{
    method_priority, Confidence, ConfidenceParseError, ExperimentalValidation, MergeOutcome,
    UnionKey, ValidationRecord, ValidationSummary,
};
pub(crate) use validation::lenient_opt_string;
