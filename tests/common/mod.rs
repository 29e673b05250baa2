//! Shared fixtures for integration tests
//!
//! A small IFT dataset: IFT46 screened against IFT52, BBS1 and IFT56, and
//! IFT52 screened against IFT46, imported from analysis files into a
//! database inside a temporary directory.

#![allow(dead_code)]

use interactome::import::Importer;
use interactome::{InteractionStore, OpenStore, SqliteStore};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const IFT46: &str = "Q9NQC8";
pub const IFT52: &str = "Q9Y366";
pub const BBS1: &str = "Q8NFJ9";
pub const IFT56: &str = "A0AVF1";

/// One prey of an analysis file
pub struct Prey {
    pub uniprot: &'static str,
    pub gene: &'static str,
    pub iptm: f64,
    pub ipsae: f64,
    pub contacts: i64,
    pub plddt: f64,
}

/// Analysis file JSON for a bait screened against `preys`
pub fn analysis_file(bait: (&str, &str), preys: &[Prey]) -> Value {
    let interactions: Vec<Value> = preys
        .iter()
        .map(|p| {
            json!({
                "protein_1": {"uniprot_id": bait.0, "gene_name": bait.1},
                "protein_2": {"uniprot_id": p.uniprot, "gene_name": p.gene},
                "quality_assessment": {
                    "quality_class": "High",
                    "iptm": p.iptm,
                    "ipsae": p.ipsae,
                    "contacts_pae_lt_3": p.contacts,
                    "contacts_pae_lt_6": p.contacts * 2,
                    "interface_plddt": p.plddt
                }
            })
        })
        .collect();
    json!({ "interactions": interactions })
}

/// A file-backed store in a temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub db_path: PathBuf,
    pub store: Arc<dyn InteractionStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("interactome.db");
        let store: Arc<dyn InteractionStore> = Arc::new(SqliteStore::open(&db_path).unwrap());
        Self { dir, db_path, store }
    }

    /// Fixture with the IFT dataset imported
    pub fn with_dataset() -> Self {
        let fixture = Self::new();
        let files = fixture.write_dataset();
        let report = Importer::new(fixture.store.clone()).import_analysis(&files).unwrap();
        assert_eq!(report.interactions, 4);
        fixture
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &serde_json::to_string_pretty(value).unwrap())
    }

    /// Write the two analysis files of the dataset
    pub fn write_dataset(&self) -> Vec<PathBuf> {
        let ift46 = analysis_file(
            (IFT46, "IFT46"),
            &[
                Prey { uniprot: IFT52, gene: "IFT52", iptm: 0.82, ipsae: 0.76, contacts: 45, plddt: 85.0 },
                Prey { uniprot: BBS1, gene: "BBS1", iptm: 0.41, ipsae: 0.32, contacts: 3, plddt: 60.0 },
                Prey { uniprot: IFT56, gene: "IFT56", iptm: 0.62, ipsae: 0.55, contacts: 22, plddt: 78.0 },
            ],
        );
        let ift52 = analysis_file(
            (IFT52, "IFT52"),
            &[Prey { uniprot: IFT46, gene: "IFT46", iptm: 0.79, ipsae: 0.71, contacts: 41, plddt: 84.0 }],
        );
        vec![
            self.write_json("AF3/Q9NQC8_IFT46/analysis/Q9NQC8_IFT46_analysis.json", &ift46),
            self.write_json("AF3/Q9Y366_IFT52/analysis/Q9Y366_IFT52_analysis.json", &ift52),
        ]
    }

    /// Open a second connection to the same database
    pub fn reopen(&self) -> Arc<dyn InteractionStore> {
        Arc::new(SqliteStore::open(&self.db_path).unwrap())
    }
}
