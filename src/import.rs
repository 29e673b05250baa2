//! Bulk import of prediction data
//!
//! Three input shapes are supported:
//!
//! - analysis files (`{"interactions": [{protein_1, protein_2, quality_assessment}]}`)
//!   where `protein_1` is the bait, imported incrementally per bait
//! - flat extraction dumps (an array of rows with `bait_*`/`prey_*` fields
//!   and an optional per-row `experimental_validation` document)
//! - complex datasets (a complex definition plus its predictions)

use crate::curation::{CurationError, Curator, DirectionalDocument, ReconcileReport};
use crate::model::{
    AlphafoldVersion, ExperimentalValidation, NewComplex, NewComplexInteraction, NewComplexMember,
    NewInteraction, NewProtein, PredictionInfo, PredictionScores,
};
use crate::storage::{InteractionStore, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Organism assumed for analysis-file proteins that do not declare one
pub const DEFAULT_ORGANISM: (&str, &str) = ("Homo sapiens", "Hs");

/// Errors raised while importing data files
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Curation(#[from] CurationError),
}

/// Counters for one import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub files_processed: usize,
    /// Files whose bait already had interactions, or that could not be read
    pub files_skipped: usize,
    pub proteins: usize,
    pub interactions: usize,
    /// Rows without both UniProt IDs
    pub rows_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconcileReport>,
}

/// Accept a number or a numeric string; anything else is missing
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite()))
}

/// Accept an integer, a float (truncated) or a numeric string
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v.trunc() as i64))
}

/// Scores block of an analysis-file interaction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QualityAssessment {
    #[serde(default)]
    pub quality_class: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub iptm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub interface_plddt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub contacts_pae_lt_3: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub contacts_pae_lt_6: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ipsae: Option<f64>,
    #[serde(default)]
    pub ipsae_confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ipsae_pae_cutoff: Option<f64>,
}

impl QualityAssessment {
    /// Prediction tagged as a v4 AlphaFold 3 analysis
    pub fn into_prediction(self, source_path: Option<String>) -> PredictionInfo {
        PredictionInfo {
            scores: PredictionScores {
                iptm: self.iptm,
                interface_plddt: self.interface_plddt,
                contacts_pae_lt_3: self.contacts_pae_lt_3,
                contacts_pae_lt_6: self.contacts_pae_lt_6,
                ipsae: self.ipsae,
                ipsae_pae_cutoff: self.ipsae_pae_cutoff,
            },
            confidence: self.quality_class,
            ipsae_confidence: self.ipsae_confidence,
            analysis_version: Some("v4".to_string()),
            alphafold_version: Some(AlphafoldVersion::Af3),
            source_path,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProteinRef {
    #[serde(default)]
    uniprot_id: Option<String>,
    #[serde(default)]
    gene_name: Option<String>,
    #[serde(default)]
    organism: Option<String>,
    #[serde(default)]
    organism_code: Option<String>,
}

impl ProteinRef {
    fn uniprot(&self) -> Option<&str> {
        self.uniprot_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn to_new_protein(&self, uniprot: &str) -> NewProtein {
        let (organism, code) = DEFAULT_ORGANISM;
        NewProtein {
            uniprot_id: uniprot.to_string(),
            gene_name: self.gene_name.clone(),
            organism: Some(self.organism.clone().unwrap_or_else(|| organism.to_string())),
            organism_code: Some(self.organism_code.clone().unwrap_or_else(|| code.to_string())),
            common_name: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisInteraction {
    #[serde(default)]
    protein_1: Option<ProteinRef>,
    #[serde(default)]
    protein_2: Option<ProteinRef>,
    #[serde(default)]
    quality_assessment: QualityAssessment,
}

#[derive(Debug, Deserialize)]
struct AnalysisFile {
    #[serde(default)]
    interactions: Vec<AnalysisInteraction>,
}

/// One row of a flat extraction dump
#[derive(Debug, Deserialize)]
struct ExtractionRow {
    #[serde(default)]
    bait_uniprot: Option<String>,
    #[serde(default)]
    bait_gene: Option<String>,
    #[serde(default)]
    bait_organism: Option<String>,
    #[serde(default)]
    bait_organism_code: Option<String>,
    #[serde(default)]
    prey_uniprot: Option<String>,
    #[serde(default)]
    prey_gene: Option<String>,
    #[serde(default)]
    prey_organism: Option<String>,
    #[serde(default)]
    prey_organism_code: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    iptm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    interface_plddt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    contacts_pae_lt_3: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    contacts_pae_lt_6: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ipsae: Option<f64>,
    #[serde(default)]
    ipsae_confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ipsae_pae_cutoff: Option<f64>,
    #[serde(default)]
    analysis_version: Option<String>,
    #[serde(default)]
    alphafold_version: Option<String>,
    #[serde(default)]
    source_path: Option<String>,
    #[serde(default)]
    experimental_validation: Option<ExperimentalValidation>,
}

impl ExtractionRow {
    fn prediction(&self) -> PredictionInfo {
        PredictionInfo {
            scores: PredictionScores {
                iptm: self.iptm,
                interface_plddt: self.interface_plddt,
                contacts_pae_lt_3: self.contacts_pae_lt_3,
                contacts_pae_lt_6: self.contacts_pae_lt_6,
                ipsae: self.ipsae,
                ipsae_pae_cutoff: self.ipsae_pae_cutoff,
            },
            confidence: self.confidence.clone(),
            ipsae_confidence: self.ipsae_confidence.clone(),
            analysis_version: self.analysis_version.clone(),
            alphafold_version: self.alphafold_version.as_deref().and_then(AlphafoldVersion::parse),
            source_path: self.source_path.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComplexPrediction {
    prey: ProteinRef,
    #[serde(default)]
    quality_assessment: QualityAssessment,
    #[serde(default)]
    source_path: Option<String>,
}

/// A complex definition with its predictions against prey proteins
#[derive(Debug, Deserialize)]
struct ComplexDataset {
    complex_name: String,
    display_name: String,
    members: Vec<NewComplexMember>,
    #[serde(default)]
    interactions: Vec<ComplexPrediction>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ImportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Loads data files into a store
pub struct Importer {
    store: Arc<dyn InteractionStore>,
    force: bool,
}

impl Importer {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store, force: false }
    }

    /// Import analysis files even when their bait already has interactions
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Import analysis files, skipping any whose bait is already present.
    /// Unreadable files are logged and counted as skipped.
    pub fn import_analysis(&self, paths: &[PathBuf]) -> Result<ImportReport, ImportError> {
        let mut known_baits: HashSet<String> = self
            .store
            .bait_counts()?
            .into_iter()
            .map(|b| b.uniprot_id.as_str().to_string())
            .collect();
        if !known_baits.is_empty() {
            info!(baits = known_baits.len(), "baits already imported");
        }

        let mut report = ImportReport::default();
        for path in paths {
            let file: AnalysisFile = match read_json(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable analysis file");
                    report.files_skipped += 1;
                    continue;
                }
            };

            let bait = file
                .interactions
                .iter()
                .find_map(|i| i.protein_1.as_ref().and_then(ProteinRef::uniprot))
                .map(str::to_string);
            let Some(bait) = bait else {
                warn!(path = %path.display(), "analysis file has no interactions");
                report.files_skipped += 1;
                continue;
            };

            if !self.force && known_baits.contains(&bait) {
                info!(%bait, path = %path.display(), "bait already imported, skipping");
                report.files_skipped += 1;
                continue;
            }

            self.import_analysis_file(file, path, &mut report)?;
            known_baits.insert(bait);
            report.files_processed += 1;
        }

        info!(
            processed = report.files_processed,
            skipped = report.files_skipped,
            interactions = report.interactions,
            proteins = report.proteins,
            "analysis import finished"
        );
        Ok(report)
    }

    fn import_analysis_file(
        &self,
        file: AnalysisFile,
        path: &Path,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        let source_path = path.to_string_lossy().to_string();
        let mut seen = HashSet::new();
        let count = file.interactions.len();

        for interaction in file.interactions {
            let (Some(p1), Some(p2)) = (&interaction.protein_1, &interaction.protein_2) else {
                report.rows_skipped += 1;
                continue;
            };
            let (Some(bait), Some(prey)) = (p1.uniprot(), p2.uniprot()) else {
                report.rows_skipped += 1;
                continue;
            };

            for (protein, uniprot) in [(p1, bait), (p2, prey)] {
                if seen.insert(uniprot.to_string()) {
                    self.store.upsert_protein(&protein.to_new_protein(uniprot))?;
                    report.proteins += 1;
                }
            }

            let prediction = interaction
                .quality_assessment
                .clone()
                .into_prediction(Some(source_path.clone()));
            self.store
                .insert_interaction(&NewInteraction::new(bait, prey).with_prediction(prediction))?;
            report.interactions += 1;
        }

        debug!(path = %path.display(), interactions = count, "analysis file imported");
        Ok(())
    }

    /// Import a flat extraction dump and fold its per-row validation
    /// documents into the pair store
    pub fn import_extraction(&self, path: &Path) -> Result<ImportReport, ImportError> {
        let rows: Vec<ExtractionRow> = read_json(path)?;
        let mut report = ImportReport::default();
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for row in &rows {
            let (Some(bait), Some(prey)) = (non_empty(&row.bait_uniprot), non_empty(&row.prey_uniprot)) else {
                report.rows_skipped += 1;
                continue;
            };

            let proteins = [
                (bait, &row.bait_gene, &row.bait_organism, &row.bait_organism_code),
                (prey, &row.prey_gene, &row.prey_organism, &row.prey_organism_code),
            ];
            for (uniprot, gene, organism, code) in proteins {
                if seen.insert(uniprot.to_string()) {
                    self.store.upsert_protein(&NewProtein {
                        uniprot_id: uniprot.to_string(),
                        gene_name: gene.clone(),
                        organism: organism.clone(),
                        organism_code: code.clone(),
                        common_name: None,
                    })?;
                    report.proteins += 1;
                }
            }

            self.store
                .insert_interaction(&NewInteraction::new(bait, prey).with_prediction(row.prediction()))?;
            report.interactions += 1;

            documents.push(DirectionalDocument::new(
                bait,
                prey,
                row.experimental_validation.clone(),
            ));
        }

        let reconciliation = Curator::new(self.store.clone()).absorb(&documents)?;
        report.reconciliation = Some(reconciliation);
        report.files_processed = 1;

        info!(
            interactions = report.interactions,
            proteins = report.proteins,
            rows_skipped = report.rows_skipped,
            "extraction import finished"
        );
        Ok(report)
    }

    /// Import a complex definition and its predictions. Re-importing a
    /// complex replaces its member list.
    pub fn import_complex(&self, path: &Path) -> Result<ImportReport, ImportError> {
        let dataset: ComplexDataset = read_json(path)?;
        let mut report = ImportReport::default();

        let complex = NewComplex {
            complex_name: dataset.complex_name,
            display_name: dataset.display_name,
            members: dataset.members,
        };
        let complex_id = self.store.save_complex(&complex)?;
        report.proteins += complex.members.len();

        let default_path = path.to_string_lossy().to_string();
        for prediction in dataset.interactions {
            let Some(prey) = prediction.prey.uniprot() else {
                report.rows_skipped += 1;
                continue;
            };
            self.store.upsert_protein(&prediction.prey.to_new_protein(prey))?;
            report.proteins += 1;

            let source_path = prediction.source_path.clone().or_else(|| Some(default_path.clone()));
            self.store.insert_complex_interaction(
                complex_id,
                &NewComplexInteraction {
                    prey_uniprot: prey.to_string(),
                    prediction: prediction.quality_assessment.clone().into_prediction(source_path),
                },
            )?;
            report.interactions += 1;
        }
        report.files_processed = 1;

        info!(
            complex = %complex.complex_name,
            members = complex.members.len(),
            interactions = report.interactions,
            "complex imported"
        );
        Ok(report)
    }

    /// Delete duplicate interactions; returns the number removed
    pub fn dedupe(&self) -> Result<usize, ImportError> {
        let removed = self.store.delete_duplicate_interactions()?;
        info!(removed, "duplicate interactions removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InteractionId, PairKey, UniprotId};
    use crate::storage::{OpenStore, SqliteStore};
    use serde_json::json;

    fn store() -> Arc<dyn InteractionStore> {
        Arc::new(SqliteStore::open_in_memory().unwrap())
    }

    fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn analysis(bait: &str, preys: &[(&str, Value)]) -> Value {
        json!({
            "interactions": preys.iter().map(|(prey, qa)| json!({
                "protein_1": {"uniprot_id": bait},
                "protein_2": {"uniprot_id": prey},
                "quality_assessment": qa,
            })).collect::<Vec<_>>()
        })
    }

    #[test]
    fn test_quality_assessment_accepts_strings() {
        let qa: QualityAssessment = serde_json::from_value(json!({
            "quality_class": "High",
            "iptm": "0.81",
            "contacts_pae_lt_3": 42.0,
            "contacts_pae_lt_6": "57",
            "ipsae": "n/a",
            "interface_plddt": null
        }))
        .unwrap();
        assert_eq!(qa.iptm, Some(0.81));
        assert_eq!(qa.contacts_pae_lt_3, Some(42));
        assert_eq!(qa.contacts_pae_lt_6, Some(57));
        assert_eq!(qa.ipsae, None);
        assert_eq!(qa.interface_plddt, None);

        let prediction = qa.into_prediction(None);
        assert_eq!(prediction.analysis_version.as_deref(), Some("v4"));
        assert_eq!(prediction.alphafold_version, Some(AlphafoldVersion::Af3));
        assert_eq!(prediction.confidence.as_deref(), Some("High"));
    }

    #[test]
    fn test_analysis_import_is_incremental() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let ift46 = write_json(
            dir.path(),
            "Q9NQC8_IFT46.json",
            &analysis("Q9NQC8", &[("Q9Y366", json!({"iptm": 0.82, "ipsae": 0.71})), ("Q8NFJ9", json!({"iptm": 0.3}))]),
        );
        let ift52 = write_json(
            dir.path(),
            "Q9Y366_IFT52.json",
            &analysis("Q9Y366", &[("Q9NQC8", json!({"iptm": 0.79}))]),
        );

        let importer = Importer::new(store.clone());
        let first = importer.import_analysis(&[ift46.clone()]).unwrap();
        assert_eq!(first.files_processed, 1);
        assert_eq!(first.interactions, 2);
        assert_eq!(first.proteins, 3);

        let second = importer.import_analysis(&[ift46.clone(), ift52, dir.path().join("missing.json")]).unwrap();
        assert_eq!(second.files_processed, 1);
        assert_eq!(second.files_skipped, 2);
        assert_eq!(store.stats().unwrap().interactions, 3);

        let forced = Importer::new(store.clone()).force(true).import_analysis(&[ift46]).unwrap();
        assert_eq!(forced.interactions, 2);
        assert_eq!(store.stats().unwrap().interactions, 5);

        let protein = store.get_protein(&UniprotId::new("Q8NFJ9")).unwrap().unwrap();
        assert_eq!(protein.organism_code.as_deref(), Some("Hs"));
    }

    #[test]
    fn test_analysis_rows_without_ids_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            dir.path(),
            "partial.json",
            &json!({"interactions": [
                {"protein_1": {"uniprot_id": "Q9NQC8"}, "protein_2": {"uniprot_id": "Q9Y366"}},
                {"protein_1": {"uniprot_id": "Q9NQC8"}, "protein_2": {}},
                {"protein_1": {"uniprot_id": "Q9NQC8"}}
            ]}),
        );
        let report = Importer::new(store()).import_analysis(&[path]).unwrap();
        assert_eq!(report.interactions, 1);
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn test_extraction_import_reconciles_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let path = write_json(
            dir.path(),
            "extraction.json",
            &json!([
                {
                    "bait_uniprot": "Q9NQC8", "bait_gene": "IFT46", "bait_organism_code": "Hs",
                    "prey_uniprot": "Q9Y366", "prey_gene": "IFT52", "prey_organism_code": "Hs",
                    "iptm": 0.8, "alphafold_version": "AF3", "analysis_version": "v3",
                    "experimental_validation": {
                        "experimental_methods": [
                            {"method": "Y2H", "study": "Lucker et al., 2005", "confidence": "medium"}
                        ]
                    }
                },
                {
                    "bait_uniprot": "Q9Y366", "bait_gene": "IFT52",
                    "prey_uniprot": "Q9NQC8", "prey_gene": "IFT46",
                    "iptm": "0.77", "alphafold_version": "AF3",
                    "experimental_validation": {
                        "method": "Cryo-EM", "source": "Petriman et al., 2022",
                        "confidence": "high", "validated": true
                    }
                },
                {"bait_uniprot": "", "prey_uniprot": "Q9NQC8"}
            ]),
        );

        let report = Importer::new(store.clone()).import_extraction(&path).unwrap();
        assert_eq!(report.interactions, 2);
        assert_eq!(report.rows_skipped, 1);
        let reconciliation = report.reconciliation.unwrap();
        assert_eq!(reconciliation.merged, 2);

        for id in [InteractionId(1), InteractionId(2)] {
            let interaction = store.get_interaction(id).unwrap().unwrap();
            let document = interaction.experimental_validation.unwrap();
            assert_eq!(document.len(), 2);
            assert_eq!(document.summary().strongest_method.as_deref(), Some("Cryo-EM"));
        }
        assert_eq!(store.stats().unwrap().validated_pairs, 1);
        assert!(store.load_validation(&PairKey::new("Q9NQC8", "Q9Y366")).unwrap().is_some());
    }

    #[test]
    fn test_complex_import() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let path = write_json(
            dir.path(),
            "IFT52_46.json",
            &json!({
                "complex_name": "IFT52_46",
                "display_name": "IFT52-IFT46",
                "members": [
                    {"uniprot_id": "Q9Y366", "gene_name": "IFT52", "chain_id": "A"},
                    {"uniprot_id": "Q9NQC8", "gene_name": "IFT46", "chain_id": "B"}
                ],
                "interactions": [
                    {"prey": {"uniprot_id": "Q8NFJ9", "gene_name": "BBS1"},
                     "quality_assessment": {"iptm": 0.66, "ipsae": 0.58}},
                    {"prey": {}}
                ]
            }),
        );

        let report = Importer::new(store.clone()).import_complex(&path).unwrap();
        assert_eq!(report.interactions, 1);
        assert_eq!(report.rows_skipped, 1);

        let complexes = store.list_complexes(true).unwrap();
        assert_eq!(complexes.len(), 1);
        assert_eq!(complexes[0].interaction_count, 1);
        assert_eq!(complexes[0].proteins[0].protein.gene_name.as_deref(), Some("IFT52"));
    }

    #[test]
    fn test_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let path = write_json(
            dir.path(),
            "Q9NQC8.json",
            &analysis("Q9NQC8", &[("Q9Y366", json!({"iptm": 0.82, "ipsae": 0.71}))]),
        );
        let importer = Importer::new(store.clone()).force(true);
        importer.import_analysis(&[path.clone()]).unwrap();
        importer.import_analysis(&[path]).unwrap();

        assert_eq!(importer.dedupe().unwrap(), 1);
        assert_eq!(store.list_interactions().unwrap()[0].id, InteractionId(1));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();
        let err = Importer::new(store()).import_extraction(&path).unwrap_err();
        assert!(matches!(err, ImportError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
