//! Reconciliation of per-direction validation documents
//!
//! Legacy dumps carry one document per directional interaction row, and the
//! two directions of a pair drift apart when a curation pass only touches
//! one of them. Reconciliation unions both directions keyed by
//! (study, method, pmid) into one document per pair.

use super::{CurationError, Curator};
use crate::model::{ExperimentalValidation, PairKey, UniprotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A validation document attached to one direction of a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalDocument {
    #[serde(alias = "bait_uniprot")]
    pub bait: UniprotId,
    #[serde(alias = "prey_uniprot")]
    pub prey: UniprotId,
    #[serde(default)]
    pub experimental_validation: Option<ExperimentalValidation>,
}

impl DirectionalDocument {
    pub fn new(
        bait: impl Into<UniprotId>,
        prey: impl Into<UniprotId>,
        document: Option<ExperimentalValidation>,
    ) -> Self {
        Self {
            bait: bait.into(),
            prey: prey.into(),
            experimental_validation: document,
        }
    }

    fn document_len(&self) -> usize {
        self.experimental_validation.as_ref().map_or(0, |d| d.len())
    }
}

/// How the two directions of a pair disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// One direction has records, the other none
    OneSideEmpty,
    /// Both have records but different (study, method, pmid) sets
    RecordsDiffer,
}

/// A pair whose directions disagree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub pair: PairKey,
    pub kind: MismatchKind,
    /// Record count of the `pair.first() -> pair.second()` direction
    pub forward_count: usize,
    /// Record count of the `pair.second() -> pair.first()` direction
    pub reverse_count: usize,
}

/// Result of reconciling a set of directional documents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Directions that had no records and received the pair's records
    pub synced: usize,
    /// Directions whose records were extended by the other direction's
    pub merged: usize,
    /// Directions already holding the pair's full record set
    pub unchanged: usize,
    /// One document per pair with at least one record, ordered by pair
    #[serde(skip)]
    pub documents: Vec<(PairKey, ExperimentalValidation)>,
}

/// Both directions of one pair; several rows of the same direction are
/// folded together in input order
#[derive(Default)]
struct PairDirections<'a> {
    all: Vec<&'a DirectionalDocument>,
    forward: Vec<&'a DirectionalDocument>,
    reverse: Vec<&'a DirectionalDocument>,
}

impl PairDirections<'_> {
    fn union(rows: &[&DirectionalDocument]) -> ExperimentalValidation {
        let mut document = ExperimentalValidation::new();
        for row in rows {
            if let Some(d) = &row.experimental_validation {
                document.union_with(d);
            }
        }
        document
    }
}

fn group_by_pair(rows: &[DirectionalDocument]) -> BTreeMap<PairKey, PairDirections<'_>> {
    let mut pairs: BTreeMap<PairKey, PairDirections<'_>> = BTreeMap::new();
    for row in rows {
        let pair = PairKey::new(row.bait.clone(), row.prey.clone());
        let forward = &row.bait == pair.first();
        let entry = pairs.entry(pair).or_default();
        entry.all.push(row);
        if forward {
            entry.forward.push(row);
        } else {
            entry.reverse.push(row);
        }
    }
    pairs
}

/// Pairs whose two directions carry different record sets. Pairs screened
/// in only one direction cannot disagree and are not reported.
pub fn find_mismatches(rows: &[DirectionalDocument]) -> Vec<Mismatch> {
    group_by_pair(rows)
        .into_iter()
        .filter(|(_, d)| !d.forward.is_empty() && !d.reverse.is_empty())
        .filter_map(|(pair, directions)| {
            let forward = PairDirections::union(&directions.forward);
            let reverse = PairDirections::union(&directions.reverse);

            let kind = match (forward.is_empty(), reverse.is_empty()) {
                (true, true) => return None,
                (true, false) | (false, true) => MismatchKind::OneSideEmpty,
                (false, false) if forward.union_keys() != reverse.union_keys() => {
                    MismatchKind::RecordsDiffer
                }
                (false, false) => return None,
            };

            Some(Mismatch {
                pair,
                kind,
                forward_count: forward.len(),
                reverse_count: reverse.len(),
            })
        })
        .collect()
}

/// Union every pair's directional documents into one document.
///
/// Records are keyed by (study, method, pmid) with an empty PMID equal to a
/// missing one; the first occurrence in input order wins.
pub fn reconcile(rows: &[DirectionalDocument]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for (pair, directions) in group_by_pair(rows) {
        let unified = PairDirections::union(&directions.all);
        let unified_keys = unified.union_keys();

        for row in &directions.all {
            let keys = row
                .experimental_validation
                .as_ref()
                .map(|d| d.union_keys())
                .unwrap_or_default();
            if keys == unified_keys {
                report.unchanged += 1;
            } else if row.document_len() == 0 {
                report.synced += 1;
            } else {
                report.merged += 1;
            }
        }

        if !unified.is_empty() {
            debug!(%pair, records = unified.len(), "pair reconciled");
            report.documents.push((pair, unified));
        }
    }

    report
}

impl Curator {
    /// Reconcile directional documents and union each result into the
    /// stored pair document
    pub fn absorb(&self, rows: &[DirectionalDocument]) -> Result<ReconcileReport, CurationError> {
        let report = reconcile(rows);

        let mut written = 0;
        for (pair, document) in &report.documents {
            let changed = self
                .store()
                .modify_validation(pair, &mut |stored| stored.union_with(document) > 0)?;
            if changed {
                written += 1;
            }
        }

        info!(
            synced = report.synced,
            merged = report.merged,
            unchanged = report.unchanged,
            pairs_written = written,
            "directional documents reconciled"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::seeded_store;
    use super::*;
    use crate::model::{Confidence, ValidationRecord};

    fn doc(records: &[(&str, &str, Option<&str>)]) -> Option<ExperimentalValidation> {
        Some(ExperimentalValidation::from_records(records.iter().map(|(study, method, pmid)| {
            let record = ValidationRecord::new(*method, *study, Confidence::Medium);
            match pmid {
                Some(p) => record.with_pmid(*p),
                None => record,
            }
        })))
    }

    #[test]
    fn test_mismatch_one_side_empty() {
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", None)])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", None),
        ];
        let mismatches = find_mismatches(&rows);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].kind, MismatchKind::OneSideEmpty);
        assert_eq!(mismatches[0].forward_count, 1);
        assert_eq!(mismatches[0].reverse_count, 0);
    }

    #[test]
    fn test_mismatch_records_differ_by_pmid() {
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", Some("123"))])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", doc(&[("S1", "Y2H", None)])),
        ];
        assert_eq!(find_mismatches(&rows)[0].kind, MismatchKind::RecordsDiffer);
    }

    #[test]
    fn test_no_mismatch_for_equal_or_one_way_pairs() {
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", Some(""))])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", doc(&[("S1", "Y2H", None)])),
            DirectionalDocument::new("Q9NQC8", "Q8NFJ9", doc(&[("S2", "MS", None)])),
        ];
        assert!(find_mismatches(&rows).is_empty());
    }

    #[test]
    fn test_reconcile_counts_and_unions() {
        let rows = vec![
            // synced: reverse direction empty
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", None)])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", None),
            // merged: both sides gain a record
            DirectionalDocument::new("Q9NQC8", "Q8NFJ9", doc(&[("S2", "MS", Some("1"))])),
            DirectionalDocument::new("Q8NFJ9", "Q9NQC8", doc(&[("S3", "Co-IP", None)])),
            // unchanged: one-way pair
            DirectionalDocument::new("Q9Y366", "Q8NFJ9", doc(&[("S4", "Y2H", None)])),
        ];

        let report = reconcile(&rows);
        assert_eq!(report.synced, 1);
        assert_eq!(report.merged, 2);
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.documents.len(), 3);

        let (_, unified) = report
            .documents
            .iter()
            .find(|(pair, _)| *pair == PairKey::new("Q8NFJ9", "Q9NQC8"))
            .unwrap();
        assert_eq!(unified.len(), 2);
        assert_eq!(unified.summary().validation_count, 2);
    }

    #[test]
    fn test_reconcile_first_occurrence_wins() {
        let mut first = ValidationRecord::new("Y2H", "S1", Confidence::High);
        first.notes = "from forward".to_string();
        let mut second = ValidationRecord::new("Y2H", "S1", Confidence::Low);
        second.notes = "from reverse".to_string();

        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", Some(ExperimentalValidation::from_records([first]))),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", Some(ExperimentalValidation::from_records([second]))),
        ];
        let report = reconcile(&rows);
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.documents[0].1.records()[0].notes, "from forward");
    }

    #[test]
    fn test_reconcile_drops_empty_pairs() {
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", None),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", Some(ExperimentalValidation::new())),
        ];
        let report = reconcile(&rows);
        assert!(report.documents.is_empty());
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn test_absorb_writes_pair_documents() {
        let curator = Curator::new(seeded_store());
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", None)])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", doc(&[("S2", "Cryo-EM", None)])),
        ];

        curator.absorb(&rows).unwrap();
        // absorbing again adds nothing
        curator.absorb(&rows).unwrap();

        let interactions = curator.store().find_pair(&PairKey::new("Q9NQC8", "Q9Y366")).unwrap();
        assert_eq!(interactions.len(), 2);
        for interaction in interactions {
            let document = interaction.experimental_validation.unwrap();
            assert_eq!(document.len(), 2);
        }
    }

    #[test]
    fn test_absorb_keeps_records_differing_by_pmid() {
        let curator = Curator::new(seeded_store());
        let pair = PairKey::new("Q9NQC8", "Q9Y366");
        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", doc(&[("S1", "Y2H", Some("123"))])),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", doc(&[("S1", "Y2H", None)])),
        ];

        let report = curator.absorb(&rows).unwrap();
        let stored = curator.store().load_validation(&pair).unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored, report.documents[0].1);

        // the stored document already holds everything, so nothing is rewritten
        let rewritten = curator
            .store()
            .modify_validation(&pair, &mut |d| d.union_with(&report.documents[0].1) > 0)
            .unwrap();
        assert!(!rewritten);
    }

    #[test]
    fn test_directional_document_accepts_dump_field_names() {
        let row: DirectionalDocument = serde_json::from_str(
            r#"{"bait_uniprot": "Q9NQC8", "prey_uniprot": "Q9Y366", "experimental_validation": null}"#,
        )
        .unwrap();
        assert_eq!(row.bait.as_str(), "Q9NQC8");
        assert!(row.experimental_validation.is_none());
    }
}
