//! Gene name and alias backfill from UniProt

use crate::config::UniprotSettings;
use crate::model::{Alias, AliasType, UniprotId};
use crate::storage::{InteractionStore, StorageError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Source tag written on aliases fetched from UniProt
pub const UNIPROT_SOURCE: &str = "uniprot";

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("UniProt request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("UniProt returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Names UniProt knows for one accession
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneNames {
    /// Primary name of the first gene
    pub gene_name: Option<String>,
    pub aliases: Vec<Alias>,
}

/// Anything that can look up gene names for a batch of accessions
#[async_trait]
pub trait GeneNameSource: Send + Sync {
    async fn fetch(&self, accessions: &[UniprotId]) -> Result<HashMap<UniprotId, GeneNames>, EnrichError>;
}

// UniProt accessions endpoint response, reduced to the fields we read
#[derive(Debug, Default, Deserialize)]
struct UniprotResponse {
    #[serde(default)]
    results: Vec<UniprotEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniprotEntry {
    primary_accession: String,
    #[serde(default)]
    genes: Vec<UniprotGene>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniprotGene {
    #[serde(default)]
    gene_name: Option<ValueField>,
    #[serde(default)]
    synonyms: Vec<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    #[serde(default)]
    value: Option<String>,
}

impl ValueField {
    fn text(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Extract gene names and aliases from an accessions-endpoint response.
/// Entries without any name are left out.
pub fn parse_uniprot_response(body: &str) -> Result<HashMap<UniprotId, GeneNames>, serde_json::Error> {
    let response: UniprotResponse = serde_json::from_str(body)?;
    let mut names = HashMap::new();

    for entry in response.results {
        let gene_name = entry
            .genes
            .first()
            .and_then(|g| g.gene_name.as_ref())
            .and_then(ValueField::text)
            .map(str::to_string);

        let mut aliases = Vec::new();
        for gene in &entry.genes {
            if let Some(name) = gene.gene_name.as_ref().and_then(ValueField::text) {
                aliases.push(Alias::new(name, AliasType::GeneName).with_source(UNIPROT_SOURCE));
            }
            for synonym in gene.synonyms.iter().filter_map(ValueField::text) {
                aliases.push(Alias::new(synonym, AliasType::GeneSynonym).with_source(UNIPROT_SOURCE));
            }
        }

        if gene_name.is_some() || !aliases.is_empty() {
            names.insert(UniprotId::new(&entry.primary_accession), GeneNames { gene_name, aliases });
        }
    }

    Ok(names)
}

/// Client for the UniProt REST API
pub struct UniprotClient {
    client: Client,
    base_url: String,
}

impl UniprotClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeneNameSource for UniprotClient {
    async fn fetch(&self, accessions: &[UniprotId]) -> Result<HashMap<UniprotId, GeneNames>, EnrichError> {
        let ids: Vec<&str> = accessions.iter().map(UniprotId::as_str).collect();
        let url = format!(
            "{}/uniprotkb/accessions?accessions={}&format=json&fields=accession,gene_names",
            self.base_url,
            ids.join(",")
        );

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, concat!("interactome/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EnrichError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_uniprot_response(&body).map_err(|e| EnrichError::Status {
            status: status.as_u16(),
            body: format!("unparseable response: {}", e),
        })
    }
}

/// Outcome of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub proteins: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub genes_updated: usize,
    pub aliases_added: usize,
}

/// Backfills gene names and aliases for every stored protein
pub struct Enricher<S> {
    store: Arc<dyn InteractionStore>,
    source: S,
    batch_size: usize,
    delay: Duration,
}

impl<S: GeneNameSource> Enricher<S> {
    pub fn new(store: Arc<dyn InteractionStore>, source: S) -> Self {
        let defaults = UniprotSettings::default();
        Self {
            store,
            source,
            batch_size: defaults.batch_size,
            delay: Duration::from_millis(defaults.delay_ms),
        }
    }

    pub fn with_settings(mut self, settings: &UniprotSettings) -> Self {
        self.batch_size = settings.batch_size.max(1);
        self.delay = Duration::from_millis(settings.delay_ms);
        self
    }

    /// Fetch names batch by batch. A failed batch is logged and skipped.
    pub async fn run(&self) -> Result<EnrichReport, EnrichError> {
        let accessions: Vec<UniprotId> = self
            .store
            .list_proteins()?
            .into_iter()
            .map(|p| p.uniprot_id)
            .collect();

        let mut report = EnrichReport {
            proteins: accessions.len(),
            ..Default::default()
        };
        let total = accessions.len().div_ceil(self.batch_size);

        for (index, batch) in accessions.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            report.batches += 1;
            debug!(batch = index + 1, total, "fetching gene names");

            let mut names = match self.source.fetch(batch).await {
                Ok(names) => names,
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "gene name batch failed");
                    report.failed_batches += 1;
                    continue;
                }
            };

            // merged accessions come back under a primary id that is not stored
            for uniprot in batch {
                let Some(genes) = names.remove(uniprot) else {
                    continue;
                };
                if let Some(name) = &genes.gene_name {
                    if self.store.set_gene_name(&uniprot, name)? {
                        report.genes_updated += 1;
                    }
                }
                for alias in &genes.aliases {
                    if self.store.add_alias(&uniprot, alias)? {
                        report.aliases_added += 1;
                    }
                }
            }
            if !names.is_empty() {
                debug!(unrequested = names.len(), "ignoring names for accessions not in the batch");
            }
        }

        info!(
            proteins = report.proteins,
            genes_updated = report.genes_updated,
            aliases_added = report.aliases_added,
            failed_batches = report.failed_batches,
            "gene name backfill finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewProtein;
    use crate::storage::{OpenStore, SqliteStore};
    use std::sync::Mutex;

    const RESPONSE: &str = r#"{
        "results": [
            {
                "primaryAccession": "Q9NQC8",
                "genes": [{"geneName": {"value": "IFT46"}, "synonyms": [{"value": "C11orf60"}, {"value": ""}]}]
            },
            {
                "primaryAccession": "Q8NFJ9",
                "genes": [{"geneName": {"value": "BBS1"}}, {"geneName": {"value": "BBS1L"}}]
            },
            {"primaryAccession": "P00000", "genes": []}
        ]
    }"#;

    /// Serves names from a fixed response; fails any batch containing `fail_on`
    struct FakeSource {
        names: HashMap<UniprotId, GeneNames>,
        fail_on: Option<UniprotId>,
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl GeneNameSource for FakeSource {
        async fn fetch(&self, accessions: &[UniprotId]) -> Result<HashMap<UniprotId, GeneNames>, EnrichError> {
            self.calls.lock().unwrap().push(accessions.len());
            if let Some(fail) = &self.fail_on {
                if accessions.contains(fail) {
                    return Err(EnrichError::Status {
                        status: 503,
                        body: "unavailable".into(),
                    });
                }
            }
            Ok(accessions
                .iter()
                .filter_map(|a| self.names.get(a).map(|n| (a.clone(), n.clone())))
                .collect())
        }
    }

    fn store() -> Arc<dyn InteractionStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        for uniprot in ["Q9NQC8", "Q8NFJ9", "Q9Y366"] {
            store.upsert_protein(&NewProtein::new(uniprot)).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_parse_uniprot_response() {
        let names = parse_uniprot_response(RESPONSE).unwrap();
        assert_eq!(names.len(), 2);

        let ift46 = &names[&UniprotId::new("Q9NQC8")];
        assert_eq!(ift46.gene_name.as_deref(), Some("IFT46"));
        assert_eq!(ift46.aliases.len(), 2);
        assert_eq!(ift46.aliases[1].alias_type, AliasType::GeneSynonym);
        assert_eq!(ift46.aliases[1].source.as_deref(), Some(UNIPROT_SOURCE));

        let bbs1 = &names[&UniprotId::new("Q8NFJ9")];
        assert_eq!(bbs1.gene_name.as_deref(), Some("BBS1"));
        assert_eq!(bbs1.aliases.len(), 2);
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_uniprot_response("{}").unwrap().is_empty());
        assert!(parse_uniprot_response("not json").is_err());
    }

    #[tokio::test]
    async fn test_backfill_updates_names_and_aliases() {
        let store = store();
        let source = FakeSource {
            names: parse_uniprot_response(RESPONSE).unwrap(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        };
        let enricher = Enricher::new(store.clone(), source).with_settings(&UniprotSettings {
            batch_size: 2,
            delay_ms: 0,
            ..Default::default()
        });

        let report = enricher.run().await.unwrap();
        assert_eq!(report.proteins, 3);
        assert_eq!(report.batches, 2);
        assert_eq!(report.genes_updated, 2);
        assert_eq!(report.aliases_added, 4);
        assert_eq!(*enricher.source.calls.lock().unwrap(), vec![2, 1]);

        let protein = store.get_protein(&UniprotId::new("Q9NQC8")).unwrap().unwrap();
        assert_eq!(protein.gene_name.as_deref(), Some("IFT46"));
        assert_eq!(store.find_proteins("C11orf60").unwrap().len(), 1);

        // a second run finds every alias already present
        let again = enricher.run().await.unwrap();
        assert_eq!(again.aliases_added, 0);
    }

    /// Answers every batch with a fixed map, whatever was requested
    struct RemappingSource(HashMap<UniprotId, GeneNames>);

    #[async_trait]
    impl GeneNameSource for RemappingSource {
        async fn fetch(&self, _accessions: &[UniprotId]) -> Result<HashMap<UniprotId, GeneNames>, EnrichError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_unrequested_accessions_are_ignored() {
        let store = store();
        let mut names = parse_uniprot_response(RESPONSE).unwrap();
        names.insert(
            UniprotId::new("P99999"),
            GeneNames {
                gene_name: Some("CYCS".into()),
                aliases: Vec::new(),
            },
        );
        let report = Enricher::new(store.clone(), RemappingSource(names))
            .with_settings(&UniprotSettings {
                batch_size: 1,
                delay_ms: 0,
                ..Default::default()
            })
            .run()
            .await
            .unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches, 0);
        assert_eq!(report.genes_updated, 2);
        assert!(store.get_protein(&UniprotId::new("P99999")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped() {
        let store = store();
        let source = FakeSource {
            names: parse_uniprot_response(RESPONSE).unwrap(),
            fail_on: Some(UniprotId::new("Q8NFJ9")),
            calls: Mutex::new(Vec::new()),
        };
        let report = Enricher::new(store.clone(), source)
            .with_settings(&UniprotSettings {
                batch_size: 1,
                delay_ms: 0,
                ..Default::default()
            })
            .run()
            .await
            .unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.genes_updated, 1);
        let bbs1 = store.get_protein(&UniprotId::new("Q8NFJ9")).unwrap().unwrap();
        assert_eq!(bbs1.gene_name, None);
    }
}
