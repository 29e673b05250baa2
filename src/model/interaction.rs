//! Directional interaction predictions

use super::protein::Protein;
use super::validation::ExperimentalValidation;
use serde::{Deserialize, Serialize};

/// Row identifier of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(pub i64);

impl std::fmt::Display for InteractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// AlphaFold release that produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlphafoldVersion {
    #[serde(rename = "AF2")]
    Af2,
    #[serde(rename = "AF3")]
    Af3,
}

impl AlphafoldVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            AlphafoldVersion::Af2 => "AF2",
            AlphafoldVersion::Af3 => "AF3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AF2" => Some(AlphafoldVersion::Af2),
            "AF3" => Some(AlphafoldVersion::Af3),
            _ => None,
        }
    }
}

/// AlphaFold-derived interface scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionScores {
    pub iptm: Option<f64>,
    pub interface_plddt: Option<f64>,
    /// Residue contacts with PAE < 3 Å
    pub contacts_pae_lt_3: Option<i64>,
    /// Residue contacts with PAE < 6 Å
    pub contacts_pae_lt_6: Option<i64>,
    pub ipsae: Option<f64>,
    pub ipsae_pae_cutoff: Option<f64>,
}

/// Prediction metadata shared by pairwise and complex interactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionInfo {
    pub scores: PredictionScores,
    /// Quality class assigned by the analysis pipeline
    pub confidence: Option<String>,
    /// ipSAE class assigned by the analysis pipeline
    pub ipsae_confidence: Option<String>,
    /// Analysis pipeline version tag (e.g. "v3", "v4")
    pub analysis_version: Option<String>,
    pub alphafold_version: Option<AlphafoldVersion>,
    pub source_path: Option<String>,
}

/// Anything the tier classifier and sorter can rank
pub trait Scored {
    fn row_id(&self) -> i64;
    fn prediction(&self) -> &PredictionInfo;
}

/// A directional interaction joined with both proteins and the validation
/// document of its pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub bait: Protein,
    pub prey: Protein,
    pub prediction: PredictionInfo,
    pub experimental_validation: Option<ExperimentalValidation>,
}

impl Scored for Interaction {
    fn row_id(&self) -> i64 {
        self.id.0
    }

    fn prediction(&self) -> &PredictionInfo {
        &self.prediction
    }
}

/// Interaction fields supplied at import time
#[derive(Debug, Clone, PartialEq)]
pub struct NewInteraction {
    pub bait_uniprot: String,
    pub prey_uniprot: String,
    pub prediction: PredictionInfo,
}

impl NewInteraction {
    pub fn new(bait_uniprot: impl Into<String>, prey_uniprot: impl Into<String>) -> Self {
        Self {
            bait_uniprot: bait_uniprot.into(),
            prey_uniprot: prey_uniprot.into(),
            prediction: PredictionInfo::default(),
        }
    }

    pub fn with_prediction(mut self, prediction: PredictionInfo) -> Self {
        self.prediction = prediction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphafold_version_parse() {
        assert_eq!(AlphafoldVersion::parse("af3"), Some(AlphafoldVersion::Af3));
        assert_eq!(AlphafoldVersion::parse("AF2"), Some(AlphafoldVersion::Af2));
        assert_eq!(AlphafoldVersion::parse("AF4"), None);
    }

    #[test]
    fn test_alphafold_version_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&AlphafoldVersion::Af3).unwrap(), "\"AF3\"");
    }
}
