//! Canonical unordered protein pair

use super::protein::UniprotId;
use serde::{Deserialize, Serialize};

/// Unordered pair of proteins, stored with `a <= b`
///
/// Both directions of an interaction (A->B and B->A) map to the same key,
/// which is what validation documents are stored under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    a: UniprotId,
    b: UniprotId,
}

impl PairKey {
    /// Build the key for a pair given in either order
    pub fn new(x: impl Into<UniprotId>, y: impl Into<UniprotId>) -> Self {
        let (x, y) = (x.into(), y.into());
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// Lower member of the pair
    pub fn first(&self) -> &UniprotId {
        &self.a
    }

    /// Upper member of the pair
    pub fn second(&self) -> &UniprotId {
        &self.b
    }

    /// Whether the pair contains the given protein
    pub fn contains(&self, id: &UniprotId) -> bool {
        &self.a == id || &self.b == id
    }

    /// A protein paired with itself (homodimer prediction)
    pub fn is_self_pair(&self) -> bool {
        self.a == self.b
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<->{}", self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_insensitive() {
        assert_eq!(PairKey::new("Q8NFJ9", "P51610"), PairKey::new("P51610", "Q8NFJ9"));
        let key = PairKey::new("Q8NFJ9", "P51610");
        assert_eq!(key.first().as_str(), "P51610");
        assert_eq!(key.second().as_str(), "Q8NFJ9");
    }

    #[test]
    fn test_pair_key_contains() {
        let key = PairKey::new("Q9Y366", "Q9NQC8");
        assert!(key.contains(&UniprotId::new("Q9Y366")));
        assert!(!key.contains(&UniprotId::new("Q13099")));
        assert!(!key.is_self_pair());
        assert!(PairKey::new("Q13099", "Q13099").is_self_pair());
    }
}
