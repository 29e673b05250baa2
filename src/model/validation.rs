//! Experimental validation records and the per-pair validation document
//!
//! A validation document is a list of literature-derived records plus a
//! summary derived from them. The summary is never stored independently of
//! the records: every mutation recomputes it, and deserialization rebuilds
//! it, so `validation_count` always equals the number of records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Error for labels that are not a known confidence level
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown confidence label: {0:?}")]
pub struct ConfidenceParseError(pub String);

/// Confidence label of a validation record
///
/// Ordinal: high > medium > low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Ordinal rank used to pick the strongest record
    pub fn rank(self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = ConfidenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "very high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(ConfidenceParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Confidence {
    type Error = ConfidenceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence priority of an experimental method, used as a tie-breaker
/// between records of equal confidence. Structural > biochemical > MS.
pub fn method_priority(method: &str) -> u8 {
    const PRIORITY: &[(&str, u8)] = &[
        ("crystal structure", 100),
        ("cryo-em", 90),
        ("nmr", 85),
        ("biochemical reconstitution", 70),
        ("pulldown", 60),
        ("co-ip", 60),
        ("y2h", 50),
        ("xl-ms", 45),
        ("sf-tap-ms", 40),
        ("tap-ms", 35),
        ("ms", 30),
    ];
    let method = method.trim().to_ascii_lowercase();
    PRIORITY
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

/// Accept a string, a number or null for identifier-like fields (PMIDs are
/// numbers in some dumps). Empty strings become `None`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One literature-derived confirmation of an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Experimental method (e.g. "Y2H", "Cryo-EM")
    pub method: String,
    /// Source study citation (e.g. "Taschner et al., 2016")
    pub study: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub doi: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    /// Protein used as the experimental bait, when the study declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bait_protein: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// Fields this crate does not interpret, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ValidationRecord {
    pub fn new(method: impl Into<String>, study: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            method: method.into(),
            study: study.into(),
            pmid: None,
            doi: None,
            confidence,
            bait_protein: None,
            notes: String::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_pmid(mut self, pmid: impl Into<String>) -> Self {
        let pmid = pmid.into();
        self.pmid = if pmid.trim().is_empty() { None } else { Some(pmid) };
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_bait(mut self, bait: impl Into<String>) -> Self {
        self.bait_protein = Some(bait.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Identity used when merging a new record: (study, method)
    pub fn merge_key(&self) -> (&str, &str) {
        (&self.study, &self.method)
    }

    /// Identity used when reconciling two documents: (study, method, pmid)
    pub fn union_key(&self) -> UnionKey {
        UnionKey {
            study: self.study.clone(),
            method: self.method.clone(),
            pmid: self.pmid.clone().unwrap_or_default(),
        }
    }
}

/// Record identity for reconciliation; a missing PMID equals an empty one
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UnionKey {
    pub study: String,
    pub method: String,
    pub pmid: String,
}

/// Summary derived from the records of a document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub is_validated: bool,
    pub validation_count: usize,
    pub strongest_method: Option<String>,
    pub consensus_confidence: Option<Confidence>,
}

/// Result of merging one record into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Record appended
    Added,
    /// A record with the same (study, method) already exists; no change
    Duplicate,
}

/// Validation document of one interaction pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ExperimentalValidation {
    experimental_methods: Vec<ValidationRecord>,
    validation_summary: ValidationSummary,
}

impl ExperimentalValidation {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from records, dropping (study, method) duplicates
    pub fn from_records(records: impl IntoIterator<Item = ValidationRecord>) -> Self {
        let mut doc = Self::new();
        for record in records {
            if !doc.contains(&record.study, &record.method) {
                doc.experimental_methods.push(record);
            }
        }
        doc.recompute_summary();
        doc
    }

    /// Rebuild a persisted document. Records differing only by PMID were
    /// kept by reconciliation, so only exact (study, method, pmid) repeats
    /// are dropped.
    fn from_stored(records: Vec<ValidationRecord>) -> Self {
        let mut seen = BTreeSet::new();
        let mut doc = Self::new();
        doc.experimental_methods = records
            .into_iter()
            .filter(|r| seen.insert(r.union_key()))
            .collect();
        doc.recompute_summary();
        doc
    }

    pub fn records(&self) -> &[ValidationRecord] {
        &self.experimental_methods
    }

    pub fn summary(&self) -> &ValidationSummary {
        &self.validation_summary
    }

    pub fn len(&self) -> usize {
        self.experimental_methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experimental_methods.is_empty()
    }

    /// Whether a record with this (study, method) is present
    pub fn contains(&self, study: &str, method: &str) -> bool {
        self.experimental_methods
            .iter()
            .any(|r| r.merge_key() == (study, method))
    }

    /// Append a record unless its (study, method) is already present
    pub fn merge(&mut self, record: ValidationRecord) -> MergeOutcome {
        if self.contains(&record.study, &record.method) {
            return MergeOutcome::Duplicate;
        }
        self.experimental_methods.push(record);
        self.recompute_summary();
        MergeOutcome::Added
    }

    /// Add every record of `other` whose (study, method, pmid) is not yet
    /// present. Returns the number of records added.
    pub fn union_with(&mut self, other: &ExperimentalValidation) -> usize {
        let mut seen = self.union_keys();
        let mut added = 0;
        for record in &other.experimental_methods {
            if seen.insert(record.union_key()) {
                self.experimental_methods.push(record.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.recompute_summary();
        }
        added
    }

    /// The set of (study, method, pmid) keys in this document
    pub fn union_keys(&self) -> BTreeSet<UnionKey> {
        self.experimental_methods.iter().map(|r| r.union_key()).collect()
    }

    /// Apply `f` to every record; `f` returns whether it changed the record.
    /// Returns the number of records changed.
    pub fn update_records(&mut self, mut f: impl FnMut(&mut ValidationRecord) -> bool) -> usize {
        let mut changed = 0;
        for record in &mut self.experimental_methods {
            if f(record) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.recompute_summary();
        }
        changed
    }

    /// Distinct method names in record order
    pub fn methods(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.experimental_methods
            .iter()
            .map(|r| r.method.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Distinct studies in record order
    pub fn studies(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.experimental_methods
            .iter()
            .map(|r| r.study.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    fn recompute_summary(&mut self) {
        let strongest = self.strongest_record();
        self.validation_summary = ValidationSummary {
            is_validated: !self.experimental_methods.is_empty(),
            validation_count: self.experimental_methods.len(),
            strongest_method: strongest.map(|r| r.method.clone()),
            consensus_confidence: strongest.map(|r| r.confidence),
        };
    }

    /// Highest confidence wins; method priority breaks ties, then list order
    fn strongest_record(&self) -> Option<&ValidationRecord> {
        let mut best: Option<&ValidationRecord> = None;
        for record in &self.experimental_methods {
            let better = match best {
                None => true,
                Some(current) => {
                    (record.confidence.rank(), method_priority(&record.method))
                        > (current.confidence.rank(), method_priority(&current.method))
                }
            };
            if better {
                best = Some(record);
            }
        }
        best
    }

    /// Convert the legacy single-record shape
    /// (`{method, source, pmid, doi, notes, confidence, validated, ...}`).
    fn from_legacy(mut obj: Map<String, Value>) -> Result<Self, serde_json::Error> {
        obj.remove("validated");
        if !obj.contains_key("study") {
            if let Some(source) = obj.remove("source") {
                obj.insert("study".to_string(), source);
            }
        }
        if !obj.contains_key("confidence") {
            obj.insert("confidence".to_string(), Value::String("low".to_string()));
        }
        let record: ValidationRecord = serde_json::from_value(Value::Object(obj))?;
        Ok(Self::from_records([record]))
    }
}

impl TryFrom<Value> for ExperimentalValidation {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        use serde::de::Error as _;

        let mut obj = match value {
            Value::Object(obj) => obj,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(serde_json::Error::custom(format!(
                    "validation document must be an object, got {}",
                    other
                )))
            }
        };

        if let Some(methods) = obj.remove("experimental_methods") {
            let records: Vec<ValidationRecord> = serde_json::from_value(methods)?;
            return Ok(Self::from_stored(records));
        }
        if obj.contains_key("method") {
            return Self::from_legacy(obj);
        }
        if obj.is_empty() {
            return Ok(Self::new());
        }
        Err(serde_json::Error::custom(
            "unrecognised validation document: expected experimental_methods or method",
        ))
    }
}
