//! Protein identity and naming

use serde::{Deserialize, Serialize};

/// UniProt accession, the immutable identity of a protein
///
/// Serializes as a plain string (e.g. "Q8NFJ9").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniprotId(String);

impl UniprotId {
    /// Create a UniProt ID, trimming surrounding whitespace
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UniprotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UniprotId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UniprotId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Row identifier of a protein in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProteinId(pub i64);

/// Where an alias came from and what it names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
    GeneName,
    GeneSynonym,
    CommonName,
    Other(String),
}

impl AliasType {
    pub fn as_str(&self) -> &str {
        match self {
            AliasType::GeneName => "gene_name",
            AliasType::GeneSynonym => "gene_synonym",
            AliasType::CommonName => "common_name",
            AliasType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "gene_name" => AliasType::GeneName,
            "gene_synonym" => AliasType::GeneSynonym,
            "common_name" => AliasType::CommonName,
            other => AliasType::Other(other.to_string()),
        }
    }
}

/// Alternative name a protein can be searched by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub alias_name: String,
    pub alias_type: AliasType,
    /// Origin of the alias (e.g. "uniprot")
    pub source: Option<String>,
}

impl Alias {
    pub fn new(alias_name: impl Into<String>, alias_type: AliasType) -> Self {
        Self {
            alias_name: alias_name.into(),
            alias_type,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A protein as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protein {
    pub id: ProteinId,
    pub uniprot_id: UniprotId,
    pub gene_name: Option<String>,
    pub organism: Option<String>,
    /// Two-letter organism code (e.g. "Hs", "Cr")
    pub organism_code: Option<String>,
    pub common_name: Option<String>,
}

impl Protein {
    /// Gene name when known, otherwise the UniProt accession
    pub fn display_name(&self) -> &str {
        self.gene_name
            .as_deref()
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| self.uniprot_id.as_str())
    }
}

/// Protein fields supplied at import time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProtein {
    pub uniprot_id: String,
    pub gene_name: Option<String>,
    pub organism: Option<String>,
    pub organism_code: Option<String>,
    pub common_name: Option<String>,
}

impl NewProtein {
    pub fn new(uniprot_id: impl Into<String>) -> Self {
        Self {
            uniprot_id: uniprot_id.into(),
            ..Default::default()
        }
    }

    pub fn with_gene(mut self, gene_name: impl Into<String>) -> Self {
        self.gene_name = Some(gene_name.into());
        self
    }

    pub fn with_organism(mut self, organism: impl Into<String>, code: impl Into<String>) -> Self {
        self.organism = Some(organism.into());
        self.organism_code = Some(code.into());
        self
    }
}
