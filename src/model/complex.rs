//! Multi-chain bait complexes

use super::interaction::{PredictionInfo, Scored};
use super::protein::Protein;
use serde::{Deserialize, Serialize};

/// Row identifier of a protein complex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplexId(pub i64);

/// A protein that is one chain of a complex
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexMember {
    #[serde(flatten)]
    pub protein: Protein,
    pub chain_id: String,
    pub position: i64,
    pub role: Option<String>,
}

/// A complex with its members and interaction count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinComplex {
    pub id: ComplexId,
    pub complex_name: String,
    pub display_name: String,
    pub num_proteins: usize,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub interaction_count: usize,
    pub proteins: Vec<ComplexMember>,
}

/// A prediction of a complex (as bait) against a single prey protein
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexInteraction {
    pub id: i64,
    pub complex_id: ComplexId,
    pub complex_name: String,
    pub prey: Protein,
    pub prediction: PredictionInfo,
}

impl Scored for ComplexInteraction {
    fn row_id(&self) -> i64 {
        self.id
    }

    fn prediction(&self) -> &PredictionInfo {
        &self.prediction
    }
}

/// Member fields supplied at import time
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewComplexMember {
    pub uniprot_id: String,
    #[serde(default)]
    pub gene_name: Option<String>,
    pub chain_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Complex definition supplied at import time
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewComplex {
    pub complex_name: String,
    pub display_name: String,
    pub members: Vec<NewComplexMember>,
}

/// Complex prediction fields supplied at import time
#[derive(Debug, Clone, PartialEq)]
pub struct NewComplexInteraction {
    pub prey_uniprot: String,
    pub prediction: PredictionInfo,
}
