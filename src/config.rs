//! Runtime configuration
//!
//! Settings come from an optional YAML file, then `INTERACTOME_DB` and
//! `INTERACTOME_BIND` override the database path and bind address.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the database path
pub const DB_ENV: &str = "INTERACTOME_DB";
/// Environment variable overriding the HTTP bind address
pub const BIND_ENV: &str = "INTERACTOME_BIND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where structure files live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureSettings {
    /// CIF manifest JSON (interaction id -> CIF path)
    pub manifest: Option<PathBuf>,
    /// Directory of `<interaction id>.json` PAE contact files
    pub contacts_dir: Option<PathBuf>,
}

/// UniProt REST API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniprotSettings {
    pub base_url: String,
    /// Accessions per request
    pub batch_size: usize,
    /// Pause between requests in milliseconds
    pub delay_ms: u64,
}

impl Default for UniprotSettings {
    fn default() -> Self {
        Self {
            base_url: "https://rest.uniprot.org".to_string(),
            batch_size: 50,
            delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; defaults to [`default_db_path`]
    pub database: Option<PathBuf>,
    pub bind: String,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub structure: StructureSettings,
    pub uniprot: UniprotSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            bind: "127.0.0.1:3000".to_string(),
            log_filter: "interactome=info,tower_http=info".to_string(),
            structure: StructureSettings::default(),
            uniprot: UniprotSettings::default(),
        }
    }
}

impl Config {
    /// Load the config file if given, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::var(DB_ENV).ok(), std::env::var(BIND_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn apply_overrides(&mut self, database: Option<String>, bind: Option<String>) {
        if let Some(db) = database.filter(|s| !s.is_empty()) {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(bind) = bind.filter(|s| !s.is_empty()) {
            self.bind = bind;
        }
    }

    /// Configured database path, or the default location
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_db_path)
    }
}

/// Get the default database path (~/.local/share/interactome/interactome.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let dir = data_dir.join("interactome");
    std::fs::create_dir_all(&dir).ok();
    dir.join("interactome.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
database: /data/ift.db
structure:
  manifest: cif_manifest.json
uniprot:
  batch_size: 25
"#,
        )
        .unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/data/ift.db")));
        assert_eq!(config.structure.manifest, Some(PathBuf::from("cif_manifest.json")));
        assert_eq!(config.structure.contacts_dir, None);
        assert_eq!(config.uniprot.batch_size, 25);
        assert_eq!(config.uniprot.delay_ms, 100);
        assert_eq!(config.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("/tmp/x.db".into()), Some(String::new()));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.bind, "127.0.0.1:3000");

        config.apply_overrides(None, Some("0.0.0.0:8080".into()));
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_from_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "bind: [not, a, string]").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));

        let missing = Config::from_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
