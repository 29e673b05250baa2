//! Interactome CLI: import, curate, enrich, export, query and serve.
//!
//! Usage:
//!   interactome serve [--bind addr] [--db path] [--config file]
//!   interactome import analysis|extraction|complex <files...>
//!   interactome curate add|audit|backfill-pmid|clear-notes|copy|status
//!   interactome search <identifier> [--mode v3|v4] [--confidence High,Medium]

use clap::{Parser, Subcommand};
use interactome::curation::{find_mismatches, reconcile, DirectionalDocument};
use interactome::enrich::{Enricher, UniprotClient};
use interactome::export::SupplementaryExport;
use interactome::import::Importer;
use interactome::structure::StructureFiles;
use interactome::{
    logging, Config, Curator, InteractionStore, InteractomeApi, OpenStore, SqliteStore,
    ValidationBatch,
};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "interactome",
    version,
    about = "Curation and query tool for predicted IFT/BBSome protein interactions"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// YAML config file
    #[arg(long, global = true, env = "INTERACTOME_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind, overriding the config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Import prediction data
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },
    /// Delete duplicate interactions
    Dedupe,
    /// Curate experimental validation
    Curate {
        #[command(subcommand)]
        action: CurateAction,
    },
    /// Backfill gene names and aliases from UniProt
    Enrich,
    /// Export the supplementary dataset as JSON
    Export {
        /// Output file
        #[arg(short, long, default_value = "supplementary_data.json")]
        output: PathBuf,
    },
    /// Search interactions of a protein
    Search {
        /// UniProt ID, gene name or alias, optionally organism-prefixed (Hs:BBS7)
        identifier: String,
        /// Scoring mode (v3 or v4)
        #[arg(long)]
        mode: Option<String>,
        /// Comma-separated tiers (High,Medium,Low,AF2)
        #[arg(long)]
        confidence: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportSource {
    /// AlphaFold analysis files (protein_1 is the bait)
    Analysis {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Re-import baits that already have interactions
        #[arg(long)]
        force: bool,
    },
    /// Flat extraction dump with per-row validation documents
    Extraction { file: PathBuf },
    /// Complex definition with its predictions
    Complex { file: PathBuf },
}

#[derive(Subcommand)]
enum CurateAction {
    /// Merge a YAML/JSON validation batch
    Add { file: PathBuf },
    /// Report direction mismatches in a dump of directional documents
    Audit { file: PathBuf },
    /// Set the PMID on records of a study that lack one
    BackfillPmid { study: String, pmid: String },
    /// Clear the notes of every record of a study
    ClearNotes { study: String },
    /// Copy validation from one pair to another (e.g. between isoforms)
    Copy {
        source_a: String,
        source_b: String,
        target_a: String,
        target_b: String,
    },
    /// Validation coverage summary
    Status {
        /// List every validated interaction
        #[arg(long)]
        verbose: bool,
    },
}

fn open_store(config: &Config) -> Result<Arc<dyn InteractionStore>, String> {
    let db_path = config.database_path();
    let store = SqliteStore::open(&db_path)
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))?;
    Ok(Arc::new(store))
}

fn block_on<F: Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {}", e))?;
    Ok(runtime.block_on(future))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn fail(e: impl std::fmt::Display) -> i32 {
    eprintln!("Error: {}", e);
    1
}

fn cmd_serve(config: &Config, store: Arc<dyn InteractionStore>, bind: Option<String>) -> i32 {
    let bind = bind.unwrap_or_else(|| config.bind.clone());
    let api = InteractomeApi::new(store, Arc::new(StructureFiles::new(&config.structure)));
    match block_on(interactome::http::serve(api, &bind)) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => fail(format!("server error on {}: {}", bind, e)),
        Err(e) => fail(e),
    }
}

fn cmd_import(store: Arc<dyn InteractionStore>, source: ImportSource) -> i32 {
    let result = match source {
        ImportSource::Analysis { files, force } => Importer::new(store).force(force).import_analysis(&files),
        ImportSource::Extraction { file } => Importer::new(store).import_extraction(&file),
        ImportSource::Complex { file } => Importer::new(store).import_complex(&file),
    };
    match result {
        Ok(report) => print_json(&report),
        Err(e) => fail(e),
    }
}

fn cmd_dedupe(store: Arc<dyn InteractionStore>) -> i32 {
    match Importer::new(store).dedupe() {
        Ok(removed) => {
            println!("Removed {} duplicate interactions", removed);
            0
        }
        Err(e) => fail(e),
    }
}

fn cmd_curate_add(curator: &Curator, file: &Path) -> i32 {
    let batch = match ValidationBatch::from_path(file) {
        Ok(batch) => batch,
        Err(e) => return fail(e),
    };
    let report = curator.apply_batch(&batch);
    println!(
        "added: {}  updated: {}  skipped: {}  not found: {}  errors: {}",
        report.added, report.updated, report.skipped, report.not_found, report.errors
    );
    for failure in &report.failures {
        eprintln!(
            "  entry {} ({} <-> {}): {}",
            failure.index, failure.bait, failure.prey, failure.message
        );
    }
    if report.has_errors() {
        1
    } else {
        0
    }
}

fn cmd_curate_audit(file: &Path) -> i32 {
    let rows: Vec<DirectionalDocument> = match std::fs::read_to_string(file)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(rows) => rows,
        Err(e) => return fail(format!("{}: {}", file.display(), e)),
    };

    let mismatches = find_mismatches(&rows);
    for m in &mismatches {
        println!(
            "{}  {:?}  forward: {}  reverse: {}",
            m.pair, m.kind, m.forward_count, m.reverse_count
        );
    }
    let report = reconcile(&rows);
    println!(
        "{} mismatched pairs; reconciliation would sync {}, merge {}, leave {} unchanged",
        mismatches.len(),
        report.synced,
        report.merged,
        report.unchanged
    );
    0
}

fn cmd_curate_copy(curator: &Curator, source: (&str, &str), target: (&str, &str)) -> i32 {
    let resolve = |(a, b): (&str, &str)| match curator.resolve_pair(a, b) {
        Ok(Some(pair)) => Ok(pair),
        Ok(None) => Err(format!("no interaction between {} and {}", a, b)),
        Err(e) => Err(e.to_string()),
    };
    let (source_pair, target_pair) = match (resolve(source), resolve(target)) {
        (Ok(s), Ok(t)) => (s, t),
        (Err(e), _) | (_, Err(e)) => return fail(e),
    };
    match curator.copy_validations(&source_pair, &target_pair) {
        Ok(added) => {
            println!("Copied {} records from {} to {}", added, source_pair, target_pair);
            0
        }
        Err(e) => fail(e),
    }
}

fn cmd_curate_status(curator: &Curator, verbose: bool) -> i32 {
    let status = match curator.status() {
        Ok(status) => status,
        Err(e) => return fail(e),
    };
    println!(
        "{} of {} interactions validated ({:.1}%)",
        status.validated_interactions, status.total_interactions, status.validation_rate
    );
    if verbose {
        for entry in &status.validated {
            println!(
                "  #{} {} -> {}: {} ({})",
                entry.interaction_id,
                entry.bait,
                entry.prey,
                entry.methods.join(", "),
                entry.validation_count
            );
        }
    }
    0
}

fn cmd_curate(store: Arc<dyn InteractionStore>, action: CurateAction) -> i32 {
    let curator = Curator::new(store);
    match action {
        CurateAction::Add { file } => cmd_curate_add(&curator, &file),
        CurateAction::Audit { file } => cmd_curate_audit(&file),
        CurateAction::BackfillPmid { study, pmid } => match curator.backfill_pmid(&study, &pmid) {
            Ok(touched) => {
                println!("Updated {} pairs", touched);
                0
            }
            Err(e) => fail(e),
        },
        CurateAction::ClearNotes { study } => match curator.clear_notes(&study) {
            Ok(touched) => {
                println!("Cleared notes on {} pairs", touched);
                0
            }
            Err(e) => fail(e),
        },
        CurateAction::Copy {
            source_a,
            source_b,
            target_a,
            target_b,
        } => cmd_curate_copy(&curator, (&source_a, &source_b), (&target_a, &target_b)),
        CurateAction::Status { verbose } => cmd_curate_status(&curator, verbose),
    }
}

fn cmd_enrich(config: &Config, store: Arc<dyn InteractionStore>) -> i32 {
    let enricher = Enricher::new(store, UniprotClient::new(&config.uniprot.base_url))
        .with_settings(&config.uniprot);
    match block_on(enricher.run()) {
        Ok(Ok(report)) => print_json(&report),
        Ok(Err(e)) => fail(e),
        Err(e) => fail(e),
    }
}

fn cmd_export(store: Arc<dyn InteractionStore>, output: &Path) -> i32 {
    match SupplementaryExport::build(store.as_ref()).and_then(|export| export.write_json(output)) {
        Ok(()) => {
            println!("Wrote {}", output.display());
            0
        }
        Err(e) => fail(e),
    }
}

fn cmd_search(
    config: &Config,
    store: Arc<dyn InteractionStore>,
    identifier: &str,
    mode: Option<&str>,
    confidence: Option<&str>,
    json: bool,
) -> i32 {
    let api = InteractomeApi::new(store, Arc::new(StructureFiles::new(&config.structure)));
    let result = match api.search_interactions(identifier, mode, confidence) {
        Ok(result) => result,
        Err(e) => return fail(e),
    };
    if json {
        return print_json(&result);
    }

    println!(
        "{} interactions for '{}' ({} mode, {} before filtering)",
        result.count, result.search_term, result.mode, result.total_count
    );
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v));
    for row in &result.interactions {
        let validated = row
            .experimental_validation
            .as_ref()
            .map_or(0, |d| d.len());
        println!(
            "  #{:<6} {:<10} -> {:<10} {:<7} ipTM {}  ipSAE {}  validations {}",
            row.id,
            row.bait_gene.as_deref().unwrap_or(&row.bait_uniprot),
            row.prey_gene.as_deref().unwrap_or(&row.prey_uniprot),
            row.tier.map_or("-", |t| t.as_str()),
            fmt(row.iptm),
            fmt(row.ipsae),
            validated
        );
    }
    0
}

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(db) = cli.db {
        config.database = Some(db);
    }
    logging::init_tracing(&config.log_filter);

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Serve { bind } => cmd_serve(&config, store, bind),
        Commands::Import { source } => cmd_import(store, source),
        Commands::Dedupe => cmd_dedupe(store),
        Commands::Curate { action } => cmd_curate(store, action),
        Commands::Enrich => cmd_enrich(&config, store),
        Commands::Export { output } => cmd_export(store, &output),
        Commands::Search {
            identifier,
            mode,
            confidence,
            json,
        } => cmd_search(
            &config,
            store,
            &identifier,
            mode.as_deref(),
            confidence.as_deref(),
            json,
        ),
    };
    std::process::exit(code);
}
