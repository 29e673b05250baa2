//! Property tests for validation document merging

use interactome::curation::{reconcile, DirectionalDocument};
use interactome::{Confidence, ExperimentalValidation, ValidationRecord};
use proptest::prelude::*;

fn confidence() -> impl Strategy<Value = Confidence> {
    prop_oneof![Just(Confidence::High), Just(Confidence::Medium), Just(Confidence::Low)]
}

fn record() -> impl Strategy<Value = ValidationRecord> {
    (
        prop::sample::select(vec!["Y2H", "Co-IP", "Cryo-EM", "Pulldown", "XL-MS", "MS"]),
        prop::sample::select(vec!["S1", "S2", "S3", "S4"]),
        prop::option::of(prop::sample::select(vec!["", "111", "222"])),
        confidence(),
    )
        .prop_map(|(method, study, pmid, confidence)| {
            let record = ValidationRecord::new(method, study, confidence);
            match pmid {
                Some(pmid) => record.with_pmid(pmid),
                None => record,
            }
        })
}

fn document(records: &[ValidationRecord]) -> ExperimentalValidation {
    let mut doc = ExperimentalValidation::new();
    for r in records {
        doc.merge(r.clone());
    }
    doc
}

proptest! {
    #[test]
    fn count_matches_records(records in prop::collection::vec(record(), 0..20)) {
        let doc = document(&records);
        prop_assert_eq!(doc.summary().validation_count, doc.records().len());
        prop_assert_eq!(doc.summary().is_validated, !doc.is_empty());
    }

    #[test]
    fn merging_twice_equals_merging_once(records in prop::collection::vec(record(), 0..20)) {
        let once = document(&records);
        let mut twice = once.clone();
        for r in &records {
            twice.merge(r.clone());
        }
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn consensus_is_the_highest_confidence(records in prop::collection::vec(record(), 1..20)) {
        let doc = document(&records);
        let highest = doc.records().iter().map(|r| r.confidence.rank()).max();
        prop_assert_eq!(doc.summary().consensus_confidence.map(Confidence::rank), highest);
    }

    #[test]
    fn reconciled_directions_agree(
        forward in prop::collection::vec(record(), 0..8),
        reverse in prop::collection::vec(record(), 0..8),
    ) {
        let forward = ExperimentalValidation::from_records(forward);
        let reverse = ExperimentalValidation::from_records(reverse);
        let mut expected = forward.union_keys();
        expected.extend(reverse.union_keys());

        let rows = vec![
            DirectionalDocument::new("Q9NQC8", "Q9Y366", Some(forward)),
            DirectionalDocument::new("Q9Y366", "Q9NQC8", Some(reverse)),
        ];
        let swapped = vec![rows[1].clone(), rows[0].clone()];

        let report = reconcile(&rows);
        let swapped_report = reconcile(&swapped);
        prop_assert_eq!(report.synced + report.merged + report.unchanged, 2);

        let keys = |r: &interactome::curation::ReconcileReport| {
            r.documents.first().map(|(_, d)| d.union_keys()).unwrap_or_default()
        };
        prop_assert_eq!(keys(&report), expected);
        prop_assert_eq!(keys(&report), keys(&swapped_report));
    }
}
