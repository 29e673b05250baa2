//! Predicted structure files (CIF) and PAE contact data
//!
//! CIF paths come from a manifest JSON keyed by interaction id, read on the
//! first request and kept for the life of the process. PAE contact data is
//! read from `<contacts_dir>/<id>.json` on every request.

use crate::config::StructureSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Invalid interaction id: {0}")]
    InvalidId(String),

    #[error("Interaction not found: {0}")]
    NotInManifest(String),

    #[error("CIF file not found for interaction {id}")]
    CifMissing { id: String, expected_path: Option<String> },

    #[error("PAE contact data has not been generated for interaction {0}")]
    ContactsMissing(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StructureError {
    /// Whether the request named something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StructureError::InvalidId(_)
                | StructureError::NotInManifest(_)
                | StructureError::CifMissing { .. }
                | StructureError::ContactsMissing(_)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CifManifestEntry {
    #[serde(default)]
    pub cif_path: Option<String>,
    #[serde(default)]
    pub interaction_directory: Option<String>,
    /// Gene names, scores and status written by the manifest generator
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Interaction id -> structure file mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CifManifest {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub found: Option<usize>,
    #[serde(default)]
    pub not_found: Option<usize>,
    #[serde(default)]
    pub errors: Option<usize>,
    #[serde(default)]
    pub entries: HashMap<String, CifManifestEntry>,
}

/// A CIF file ready to serve
#[derive(Debug, Clone, PartialEq)]
pub struct CifFile {
    /// Download name, `<interaction directory>.cif`
    pub filename: String,
    pub content: Vec<u8>,
}

/// Interaction ids are positive integers; anything else never names a file
fn parse_id(id: &str) -> Result<i64, StructureError> {
    match id.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(StructureError::InvalidId(id.to_string())),
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, StructureError> {
    tokio::fs::read(path).await.map_err(|source| StructureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Structure file lookup shared by all requests
pub struct StructureFiles {
    manifest_path: Option<PathBuf>,
    contacts_dir: Option<PathBuf>,
    manifest: OnceCell<Arc<CifManifest>>,
}

impl StructureFiles {
    pub fn new(settings: &StructureSettings) -> Self {
        Self {
            manifest_path: settings.manifest.clone(),
            contacts_dir: settings.contacts_dir.clone(),
            manifest: OnceCell::new(),
        }
    }

    /// The manifest, loaded on first use. A failed load is retried on the
    /// next call.
    pub async fn manifest(&self) -> Result<Arc<CifManifest>, StructureError> {
        let manifest = self
            .manifest
            .get_or_try_init(|| async {
                let path = self
                    .manifest_path
                    .as_deref()
                    .ok_or(StructureError::NotConfigured("CIF manifest"))?;
                let bytes = read_file(path).await?;
                let manifest: CifManifest =
                    serde_json::from_slice(&bytes).map_err(|source| StructureError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!(path = %path.display(), entries = manifest.entries.len(), "CIF manifest loaded");
                Ok::<_, StructureError>(Arc::new(manifest))
            })
            .await?;
        Ok(manifest.clone())
    }

    /// CIF file of an interaction
    pub async fn cif(&self, id: &str) -> Result<CifFile, StructureError> {
        let key = parse_id(id)?.to_string();
        let manifest = self.manifest().await?;
        let entry = manifest
            .entries
            .get(&key)
            .ok_or_else(|| StructureError::NotInManifest(key.clone()))?;

        let path = entry
            .cif_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .ok_or_else(|| StructureError::CifMissing {
                id: key.clone(),
                expected_path: entry.cif_path.clone(),
            })?;

        let content = read_file(&path).await?;
        let stem = entry
            .interaction_directory
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&key);
        debug!(id = %key, path = %path.display(), bytes = content.len(), "serving CIF");

        Ok(CifFile {
            filename: format!("{}.cif", stem),
            content,
        })
    }

    /// PAE contact data of an interaction
    pub async fn pae_contacts(&self, id: &str) -> Result<Value, StructureError> {
        let key = parse_id(id)?;
        let dir = self
            .contacts_dir
            .as_deref()
            .ok_or(StructureError::NotConfigured("PAE contacts directory"))?;

        let path = dir.join(format!("{}.json", key));
        if !path.is_file() {
            return Err(StructureError::ContactsMissing(key.to_string()));
        }

        let bytes = read_file(&path).await?;
        serde_json::from_slice(&bytes).map_err(|source| StructureError::Json { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(dir: &Path) -> StructureFiles {
        let cif = dir.join("ift46_ift52_model.cif");
        std::fs::write(&cif, "data_model\n_entry.id IFT46_IFT52\n").unwrap();

        let manifest = json!({
            "generated_at": "2025-01-10T12:00:00Z",
            "total": 3, "found": 2, "not_found": 1, "errors": 0,
            "entries": {
                "12": {
                    "cif_path": cif.to_string_lossy(),
                    "interaction_directory": "Q9NQC8_IFT46_vs_Q9Y366_IFT52",
                    "ipsae": 0.71,
                    "status": "found"
                },
                "13": {"cif_path": dir.join("gone.cif").to_string_lossy(), "status": "found"},
                "14": {"status": "not_found"}
            }
        });
        let manifest_path = dir.join("cif_manifest.json");
        std::fs::write(&manifest_path, manifest.to_string()).unwrap();

        let contacts = dir.join("contacts_data");
        std::fs::create_dir(&contacts).unwrap();
        std::fs::write(contacts.join("12.json"), r#"{"contacts": [[10, 220, 2.1]]}"#).unwrap();

        StructureFiles::new(&StructureSettings {
            manifest: Some(manifest_path),
            contacts_dir: Some(contacts),
        })
    }

    #[tokio::test]
    async fn test_cif_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let files = fixture(dir.path());

        let cif = files.cif("12").await.unwrap();
        assert_eq!(cif.filename, "Q9NQC8_IFT46_vs_Q9Y366_IFT52.cif");
        assert!(String::from_utf8(cif.content).unwrap().starts_with("data_model"));

        let manifest = files.manifest().await.unwrap();
        assert_eq!(manifest.found, Some(2));
        assert_eq!(manifest.entries["12"].extra["status"], "found");
    }

    #[tokio::test]
    async fn test_cif_not_found_cases() {
        let dir = tempfile::tempdir().unwrap();
        let files = fixture(dir.path());

        for (id, expected) in [("abc", "invalid"), ("../12", "invalid"), ("99", "manifest"), ("13", "cif"), ("14", "cif")] {
            let err = files.cif(id).await.unwrap_err();
            assert!(err.is_not_found(), "{id}: {err}");
            let matched = match expected {
                "invalid" => matches!(err, StructureError::InvalidId(_)),
                "manifest" => matches!(err, StructureError::NotInManifest(_)),
                _ => matches!(err, StructureError::CifMissing { .. }),
            };
            assert!(matched, "{id}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_manifest_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let files = fixture(dir.path());
        files.cif("12").await.unwrap();

        std::fs::remove_file(dir.path().join("cif_manifest.json")).unwrap();
        assert!(files.cif("12").await.is_ok());
    }

    #[tokio::test]
    async fn test_pae_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let files = fixture(dir.path());

        let contacts = files.pae_contacts("12").await.unwrap();
        assert_eq!(contacts["contacts"][0][1], 220);

        assert!(matches!(files.pae_contacts("13").await, Err(StructureError::ContactsMissing(_))));
        assert!(matches!(files.pae_contacts("x").await, Err(StructureError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_is_not_a_404() {
        let files = StructureFiles::new(&StructureSettings::default());
        let err = files.cif("12").await.unwrap_err();
        assert!(matches!(err, StructureError::NotConfigured(_)));
        assert!(!err.is_not_found());
    }
}
