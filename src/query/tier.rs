//! Confidence tiers under the v3 and v4 scoring modes
//!
//! v3 is an interface-quality heuristic over ipTM, PAE contacts and
//! interface pLDDT, defined for AlphaFold 3 predictions only. v4 buckets the
//! ipSAE score and excludes predictions without one.

use super::types::QueryError;
use crate::model::{AlphafoldVersion, PredictionInfo};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ipSAE strictly above this is high confidence
pub const IPSAE_HIGH: f64 = 0.7;
/// ipSAE at or above this (and not high) is medium confidence
pub const IPSAE_MEDIUM: f64 = 0.5;

/// How predictions are classified and ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    V3,
    V4,
}

impl ScoringMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringMode::V3 => "v3",
            ScoringMode::V4 => "v4",
        }
    }

    /// Tier of a prediction under this mode
    pub fn classify(self, prediction: &PredictionInfo) -> Option<Tier> {
        match self {
            ScoringMode::V3 => v3_tier(prediction),
            ScoringMode::V4 => v4_tier(prediction),
        }
    }
}

impl FromStr for ScoringMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "v3" => Ok(ScoringMode::V3),
            "v4" | "ipsae" => Ok(ScoringMode::V4),
            other => Err(QueryError::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence tier; orders best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    /// Sort rank, 1 = best
    pub fn rank(self) -> u8 {
        match self {
            Tier::High => 1,
            Tier::Medium => 2,
            Tier::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
        }
    }
}

impl FromStr for Tier {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Tier::High),
            "medium" => Ok(Tier::Medium),
            "low" => Ok(Tier::Low),
            _ => Err(QueryError::UnknownTier(s.trim().to_string())),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// v3 tier of an AlphaFold 3 prediction; `None` for any other version.
///
/// A missing score fails every threshold it takes part in. In the
/// exclusion clause a missing ipTM counts as below 0.75.
pub fn v3_tier(prediction: &PredictionInfo) -> Option<Tier> {
    if prediction.alphafold_version != Some(AlphafoldVersion::Af3) {
        return None;
    }

    let scores = &prediction.scores;
    let contacts = scores.contacts_pae_lt_3.unwrap_or(0);
    let iptm_at_least = |t: f64| scores.iptm.is_some_and(|v| v >= t);
    let plddt_at_least = |t: f64| scores.interface_plddt.is_some_and(|v| v >= t);

    let strong = iptm_at_least(0.7)
        || (contacts >= 40 && plddt_at_least(80.0))
        || (contacts >= 30 && iptm_at_least(0.5) && plddt_at_least(80.0));
    let sparse_interface = !iptm_at_least(0.75) && contacts < 5;
    if strong && !sparse_interface {
        return Some(Tier::High);
    }

    let moderate = iptm_at_least(0.6)
        || (contacts >= 20 && plddt_at_least(75.0))
        || (contacts >= 15 && iptm_at_least(0.45));
    if moderate {
        return Some(Tier::Medium);
    }

    Some(Tier::Low)
}

/// v4 tier from the ipSAE score; `None` when the prediction has none
pub fn v4_tier(prediction: &PredictionInfo) -> Option<Tier> {
    prediction.scores.ipsae.map(ipsae_tier)
}

pub fn ipsae_tier(ipsae: f64) -> Tier {
    if ipsae > IPSAE_HIGH {
        Tier::High
    } else if ipsae >= IPSAE_MEDIUM {
        Tier::Medium
    } else {
        Tier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PredictionScores;

    fn af3(iptm: Option<f64>, contacts: Option<i64>, plddt: Option<f64>) -> PredictionInfo {
        PredictionInfo {
            scores: PredictionScores {
                iptm,
                contacts_pae_lt_3: contacts,
                interface_plddt: plddt,
                ..Default::default()
            },
            alphafold_version: Some(AlphafoldVersion::Af3),
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("".parse::<ScoringMode>(), Ok(ScoringMode::V3));
        assert_eq!("V3".parse::<ScoringMode>(), Ok(ScoringMode::V3));
        assert_eq!("ipsae".parse::<ScoringMode>(), Ok(ScoringMode::V4));
        assert_eq!(
            "v5".parse::<ScoringMode>(),
            Err(QueryError::UnknownMode("v5".to_string()))
        );
    }

    #[test]
    fn test_tier_parsing_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Tier>(), Ok(Tier::High));
        assert_eq!(" medium ".parse::<Tier>(), Ok(Tier::Medium));
        assert!("very high".parse::<Tier>().is_err());
    }

    #[test]
    fn test_v3_high_by_iptm() {
        assert_eq!(v3_tier(&af3(Some(0.8), Some(10), Some(70.0))), Some(Tier::High));
    }

    #[test]
    fn test_v3_high_by_contacts_and_plddt() {
        assert_eq!(v3_tier(&af3(Some(0.3), Some(40), Some(80.0))), Some(Tier::High));
        assert_eq!(v3_tier(&af3(Some(0.5), Some(30), Some(85.0))), Some(Tier::High));
    }

    #[test]
    fn test_v3_sparse_interface_is_not_high() {
        // ipTM 0.72 passes the strong clause but < 0.75 with only 3 contacts
        assert_eq!(v3_tier(&af3(Some(0.72), Some(3), None)), Some(Tier::Medium));
        // missing contacts count as zero
        assert_eq!(v3_tier(&af3(Some(0.72), None, None)), Some(Tier::Medium));
        // ipTM 0.75 is exempt from the exclusion
        assert_eq!(v3_tier(&af3(Some(0.75), Some(0), None)), Some(Tier::High));
    }

    #[test]
    fn test_v3_medium_clauses() {
        assert_eq!(v3_tier(&af3(Some(0.6), Some(0), None)), Some(Tier::Medium));
        assert_eq!(v3_tier(&af3(None, Some(20), Some(75.0))), Some(Tier::Medium));
        assert_eq!(v3_tier(&af3(Some(0.45), Some(15), None)), Some(Tier::Medium));
    }

    #[test]
    fn test_v3_low_and_missing_scores() {
        assert_eq!(v3_tier(&af3(Some(0.44), Some(14), Some(90.0))), Some(Tier::Low));
        assert_eq!(v3_tier(&af3(None, None, None)), Some(Tier::Low));
    }

    #[test]
    fn test_v3_ignores_non_af3() {
        let mut prediction = af3(Some(0.9), Some(50), Some(90.0));
        prediction.alphafold_version = Some(AlphafoldVersion::Af2);
        assert_eq!(v3_tier(&prediction), None);
        prediction.alphafold_version = None;
        assert_eq!(v3_tier(&prediction), None);
    }

    #[test]
    fn test_ipsae_boundaries() {
        assert_eq!(ipsae_tier(0.71), Tier::High);
        assert_eq!(ipsae_tier(0.7), Tier::Medium);
        assert_eq!(ipsae_tier(0.5), Tier::Medium);
        assert_eq!(ipsae_tier(0.49), Tier::Low);
    }

    #[test]
    fn test_v4_requires_ipsae() {
        let mut prediction = af3(Some(0.9), None, None);
        assert_eq!(ScoringMode::V4.classify(&prediction), None);
        prediction.scores.ipsae = Some(0.55);
        assert_eq!(ScoringMode::V4.classify(&prediction), Some(Tier::Medium));
    }
}
