//! Filtering and ranking of scored interactions

use super::tier::{ScoringMode, Tier};
use super::types::{QueryError, QueryResult, Ranked};
use crate::model::{AlphafoldVersion, PredictionInfo, Scored};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Caller-selected confidence tiers
///
/// Empty means no filtering. In v3 mode the `AF2` pseudo-tier selects
/// AlphaFold 2 predictions, which carry no v3 tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfidenceFilter {
    tiers: BTreeSet<Tier>,
    af2: bool,
}

impl ConfidenceFilter {
    /// Parse a comma-separated list such as `High,Medium` or `low,AF2`
    pub fn parse(raw: &str, mode: ScoringMode) -> Result<Self, QueryError> {
        let mut filter = Self::default();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("af2") {
                if mode != ScoringMode::V3 {
                    return Err(QueryError::TierNotAvailable {
                        tier: token.to_string(),
                        mode,
                    });
                }
                filter.af2 = true;
            } else {
                filter.tiers.insert(token.parse()?);
            }
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty() && !self.af2
    }

    fn admits(&self, prediction: &PredictionInfo, tier: Option<Tier>) -> bool {
        if self.is_empty() {
            return true;
        }
        let tier_match = tier.is_some_and(|t| self.tiers.contains(&t));
        let af2_match = self.af2 && prediction.alphafold_version == Some(AlphafoldVersion::Af2);
        tier_match || af2_match
    }
}

/// Query over a set of scored interactions
///
/// Classifies every row under the scoring mode, drops rows the filter does
/// not admit and sorts the rest:
///
/// - v3: AF3 first, tier, PAE<3 contacts desc, ipTM desc, id
/// - v4: tier, ipSAE desc, ipTM desc, id (rows without ipSAE are dropped)
///
/// Missing scores sort after present ones.
#[derive(Debug, Clone, Default)]
pub struct InteractionQuery {
    pub mode: ScoringMode,
    pub filter: ConfidenceFilter,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl InteractionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ScoringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filter(mut self, filter: ConfidenceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build from the raw `mode` and `confidence` request parameters
    pub fn from_params(mode: Option<&str>, confidence: Option<&str>) -> Result<Self, QueryError> {
        let mode: ScoringMode = mode.unwrap_or_default().parse()?;
        let filter = ConfidenceFilter::parse(confidence.unwrap_or_default(), mode)?;
        Ok(Self::new().with_mode(mode).with_filter(filter))
    }

    /// Execute the query over rows
    pub fn execute<T: Scored>(&self, rows: Vec<T>) -> QueryResult<T> {
        let total_count = rows.len();

        let mut items: Vec<Ranked<T>> = rows
            .into_iter()
            .filter(|row| self.mode != ScoringMode::V4 || row.prediction().scores.ipsae.is_some())
            .map(|row| {
                let tier = self.mode.classify(row.prediction());
                Ranked { item: row, tier }
            })
            .filter(|ranked| self.filter.admits(ranked.item.prediction(), ranked.tier))
            .collect();

        items.sort_by(|a, b| self.compare(a, b));

        if let Some(limit) = self.limit {
            items.truncate(limit);
        }

        QueryResult { items, total_count }
    }

    fn compare<T: Scored>(&self, a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
        let (pa, pb) = (a.item.prediction(), b.item.prediction());
        let by_tier = tier_rank(a.tier).cmp(&tier_rank(b.tier));

        let primary = match self.mode {
            ScoringMode::V3 => is_af3(pb)
                .cmp(&is_af3(pa))
                .then(by_tier)
                .then_with(|| desc_missing_last(pa.scores.contacts_pae_lt_3, pb.scores.contacts_pae_lt_3)),
            ScoringMode::V4 => by_tier.then_with(|| desc_missing_last(pa.scores.ipsae, pb.scores.ipsae)),
        };

        primary
            .then_with(|| desc_missing_last(pa.scores.iptm, pb.scores.iptm))
            .then_with(|| a.item.row_id().cmp(&b.item.row_id()))
    }
}

fn is_af3(prediction: &PredictionInfo) -> bool {
    prediction.alphafold_version == Some(AlphafoldVersion::Af3)
}

/// Rows without a tier rank after every tier
fn tier_rank(tier: Option<Tier>) -> u8 {
    tier.map_or(4, Tier::rank)
}

fn desc_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PredictionScores;

    #[derive(Debug, Clone)]
    struct Row {
        id: i64,
        prediction: PredictionInfo,
    }

    impl Scored for Row {
        fn row_id(&self) -> i64 {
            self.id
        }

        fn prediction(&self) -> &PredictionInfo {
            &self.prediction
        }
    }

    fn row(id: i64, af: AlphafoldVersion, iptm: Option<f64>, contacts: Option<i64>, ipsae: Option<f64>) -> Row {
        Row {
            id,
            prediction: PredictionInfo {
                scores: PredictionScores {
                    iptm,
                    contacts_pae_lt_3: contacts,
                    ipsae,
                    ..Default::default()
                },
                alphafold_version: Some(af),
                ..Default::default()
            },
        }
    }

    fn ids<T: Scored>(result: &QueryResult<T>) -> Vec<i64> {
        result.items.iter().map(|r| r.item.row_id()).collect()
    }

    fn sample() -> Vec<Row> {
        use AlphafoldVersion::*;
        vec![
            row(1, Af2, Some(0.9), Some(60), Some(0.8)),
            row(2, Af3, Some(0.55), Some(10), Some(0.52)), // v3 low, v4 medium
            row(3, Af3, Some(0.8), Some(12), Some(0.75)),  // v3 high, v4 high
            row(4, Af3, Some(0.8), Some(30), None),        // v3 high, no ipSAE
            row(5, Af3, Some(0.62), Some(2), Some(0.3)),   // v3 medium, v4 low
            row(6, Af3, None, Some(12), Some(0.75)),       // v3 low, v4 high, no ipTM
        ]
    }

    #[test]
    fn test_v3_sort_order() {
        let result = InteractionQuery::new().execute(sample());
        // AF3 tiers with contacts desc inside each, then the untiered AF2 row
        assert_eq!(ids(&result), vec![4, 3, 5, 6, 2, 1]);
        assert_eq!(result.total_count, 6);
        assert_eq!(result.items[5].tier, None);
    }

    #[test]
    fn test_v4_sort_order_excludes_missing_ipsae() {
        let result = InteractionQuery::new().with_mode(ScoringMode::V4).execute(sample());
        // 1 and 3 and 6 are high: ipSAE 0.8, then 0.75 with ipTM before missing
        assert_eq!(ids(&result), vec![1, 3, 6, 2, 5]);
        assert_eq!(result.total_count, 6);
    }

    #[test]
    fn test_filter_by_tiers() {
        let query = InteractionQuery::from_params(Some("v3"), Some("high,Medium")).unwrap();
        assert_eq!(ids(&query.execute(sample())), vec![4, 3, 5]);

        let query = InteractionQuery::from_params(Some("v4"), Some("Low")).unwrap();
        assert_eq!(ids(&query.execute(sample())), vec![5]);
    }

    #[test]
    fn test_af2_pseudo_tier() {
        let query = InteractionQuery::from_params(None, Some("AF2")).unwrap();
        assert_eq!(ids(&query.execute(sample())), vec![1]);

        let err = InteractionQuery::from_params(Some("v4"), Some("AF2")).unwrap_err();
        assert!(matches!(err, QueryError::TierNotAvailable { .. }));
    }

    #[test]
    fn test_empty_filter_admits_all() {
        let filter = ConfidenceFilter::parse(" , ", ScoringMode::V3).unwrap();
        assert!(filter.is_empty());
        assert_eq!(InteractionQuery::new().with_filter(filter).execute(sample()).len(), 6);
    }

    #[test]
    fn test_unknown_inputs_rejected() {
        assert_eq!(
            InteractionQuery::from_params(Some("v9"), None).unwrap_err(),
            QueryError::UnknownMode("v9".to_string())
        );
        assert_eq!(
            InteractionQuery::from_params(None, Some("High,Certain")).unwrap_err(),
            QueryError::UnknownTier("Certain".to_string())
        );
    }

    #[test]
    fn test_limit() {
        let result = InteractionQuery::new().limit(2).execute(sample());
        assert_eq!(ids(&result), vec![4, 3]);
    }
}
