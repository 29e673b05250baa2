//! SQLite storage backend for the interactome

use super::traits::{
    BaitSummary, Diagnostics, InteractionStore, OpenStore, ProteinStats, StorageError,
    StorageResult, StoreStats,
};
use crate::model::{
    Alias, AliasType, AlphafoldVersion, ComplexId, ComplexInteraction, ComplexMember,
    ExperimentalValidation, Interaction, InteractionId, NewComplex, NewComplexInteraction,
    NewInteraction, NewProtein, PairKey, PredictionInfo, PredictionScores, Protein,
    ProteinComplex, ProteinId, UniprotId,
};
use crate::query::SearchTerm;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Prediction columns shared by `interactions` and `complex_interactions`,
/// in the order `prediction_params` binds and `row_to_prediction` reads them
const PREDICTION_COLUMNS: &str = "iptm, interface_plddt, contacts_pae_lt_3, contacts_pae_lt_6, \
     ipsae, ipsae_pae_cutoff, confidence, ipsae_confidence, analysis_version, \
     alphafold_version, source_path";

/// Interactions joined with both proteins and the pair's validation document.
/// The document lives under the canonical (min, max) UniProt pair, so both
/// directions of a pair read the same row.
const INTERACTION_SELECT: &str = r#"
    SELECT i.id,
           b.id, b.uniprot_id, b.gene_name, b.organism, b.organism_code, b.common_name,
           p.id, p.uniprot_id, p.gene_name, p.organism, p.organism_code, p.common_name,
           i.iptm, i.interface_plddt, i.contacts_pae_lt_3, i.contacts_pae_lt_6, i.ipsae,
           i.ipsae_pae_cutoff, i.confidence, i.ipsae_confidence, i.analysis_version,
           i.alphafold_version, i.source_path,
           v.document_json
    FROM interactions i
    JOIN proteins b ON b.id = i.bait_protein_id
    JOIN proteins p ON p.id = i.prey_protein_id
    LEFT JOIN pair_validations v
        ON v.protein_a = min(b.uniprot_id, p.uniprot_id)
       AND v.protein_b = max(b.uniprot_id, p.uniprot_id)
"#;

const COMPLEX_INTERACTION_SELECT: &str = r#"
    SELECT ci.id, ci.bait_complex_id, c.complex_name,
           p.id, p.uniprot_id, p.gene_name, p.organism, p.organism_code, p.common_name,
           ci.iptm, ci.interface_plddt, ci.contacts_pae_lt_3, ci.contacts_pae_lt_6, ci.ipsae,
           ci.ipsae_pae_cutoff, ci.confidence, ci.ipsae_confidence, ci.analysis_version,
           ci.alphafold_version, ci.source_path
    FROM complex_interactions ci
    JOIN protein_complexes c ON c.id = ci.bait_complex_id
    JOIN proteins p ON p.id = ci.prey_protein_id
"#;

/// Proteins whose identifier, gene name, common name or alias matches ?1
const MATCHED_PROTEINS: &str = r#"(
    SELECT pr.id FROM proteins pr
    WHERE pr.uniprot_id LIKE ?1 ESCAPE '\'
       OR pr.gene_name LIKE ?1 ESCAPE '\'
       OR pr.common_name LIKE ?1 ESCAPE '\'
       OR EXISTS (SELECT 1 FROM protein_aliases a
                  WHERE a.protein_id = pr.id AND a.alias_name LIKE ?1 ESCAPE '\')
)"#;

/// Complex header row: (id, name, display name, protein count, created_at, interaction count)
type ComplexRow = (i64, String, String, i64, Option<String>, i64);

/// SQLite-backed interaction store
///
/// A single database file holds proteins, directional interactions, the
/// pair-keyed validation documents and the complex tables. Thread-safe via
/// an internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS proteins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uniprot_id TEXT NOT NULL UNIQUE,
                gene_name TEXT,
                organism TEXT,
                organism_code TEXT,
                common_name TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_proteins_gene ON proteins(gene_name);
            CREATE INDEX IF NOT EXISTS idx_proteins_organism ON proteins(organism_code);

            CREATE TABLE IF NOT EXISTS protein_aliases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                protein_id INTEGER NOT NULL,
                alias_name TEXT NOT NULL,
                alias_type TEXT NOT NULL,
                source TEXT,
                UNIQUE (protein_id, alias_name),
                FOREIGN KEY (protein_id) REFERENCES proteins(id) ON DELETE CASCADE
            );

            -- Directional predictions; validation is stored per pair, not here
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bait_protein_id INTEGER NOT NULL,
                prey_protein_id INTEGER NOT NULL,
                iptm REAL,
                interface_plddt REAL,
                contacts_pae_lt_3 INTEGER,
                contacts_pae_lt_6 INTEGER,
                ipsae REAL,
                ipsae_pae_cutoff REAL,
                confidence TEXT,
                ipsae_confidence TEXT,
                analysis_version TEXT,
                alphafold_version TEXT,
                source_path TEXT,
                FOREIGN KEY (bait_protein_id) REFERENCES proteins(id) ON DELETE CASCADE,
                FOREIGN KEY (prey_protein_id) REFERENCES proteins(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_bait ON interactions(bait_protein_id);
            CREATE INDEX IF NOT EXISTS idx_interactions_prey ON interactions(prey_protein_id);

            -- One validation document per unordered pair (protein_a <= protein_b)
            CREATE TABLE IF NOT EXISTS pair_validations (
                protein_a TEXT NOT NULL,
                protein_b TEXT NOT NULL,
                document_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (protein_a, protein_b),
                CHECK (protein_a <= protein_b)
            );

            CREATE TABLE IF NOT EXISTS protein_complexes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                complex_name TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                num_proteins INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS complex_proteins (
                complex_id INTEGER NOT NULL,
                protein_id INTEGER NOT NULL,
                chain_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                role TEXT,
                PRIMARY KEY (complex_id, chain_id),
                FOREIGN KEY (complex_id) REFERENCES protein_complexes(id) ON DELETE CASCADE,
                FOREIGN KEY (protein_id) REFERENCES proteins(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS complex_interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bait_complex_id INTEGER NOT NULL,
                prey_protein_id INTEGER NOT NULL,
                iptm REAL,
                interface_plddt REAL,
                contacts_pae_lt_3 INTEGER,
                contacts_pae_lt_6 INTEGER,
                ipsae REAL,
                ipsae_pae_cutoff REAL,
                confidence TEXT,
                ipsae_confidence TEXT,
                analysis_version TEXT,
                alphafold_version TEXT,
                source_path TEXT,
                FOREIGN KEY (bait_complex_id) REFERENCES protein_complexes(id) ON DELETE CASCADE,
                FOREIGN KEY (prey_protein_id) REFERENCES proteins(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_complex_interactions_complex
                ON complex_interactions(bait_complex_id);

            PRAGMA foreign_keys = ON;

            -- WAL lets the HTTP service read while a curation pass writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn row_to_protein(row: &Row<'_>, start: usize) -> rusqlite::Result<Protein> {
        Ok(Protein {
            id: ProteinId(row.get(start)?),
            uniprot_id: UniprotId::new(row.get::<_, String>(start + 1)?),
            gene_name: row.get(start + 2)?,
            organism: row.get(start + 3)?,
            organism_code: row.get(start + 4)?,
            common_name: row.get(start + 5)?,
        })
    }

    fn row_to_prediction(row: &Row<'_>, start: usize) -> rusqlite::Result<PredictionInfo> {
        let alphafold_version: Option<String> = row.get(start + 9)?;
        Ok(PredictionInfo {
            scores: PredictionScores {
                iptm: row.get(start)?,
                interface_plddt: row.get(start + 1)?,
                contacts_pae_lt_3: row.get(start + 2)?,
                contacts_pae_lt_6: row.get(start + 3)?,
                ipsae: row.get(start + 4)?,
                ipsae_pae_cutoff: row.get(start + 5)?,
            },
            confidence: row.get(start + 6)?,
            ipsae_confidence: row.get(start + 7)?,
            analysis_version: row.get(start + 8)?,
            alphafold_version: alphafold_version.as_deref().and_then(AlphafoldVersion::parse),
            source_path: row.get(start + 10)?,
        })
    }

    fn row_to_interaction(row: &Row<'_>) -> rusqlite::Result<(Interaction, Option<String>)> {
        let interaction = Interaction {
            id: InteractionId(row.get(0)?),
            bait: Self::row_to_protein(row, 1)?,
            prey: Self::row_to_protein(row, 7)?,
            prediction: Self::row_to_prediction(row, 13)?,
            experimental_validation: None,
        };
        Ok((interaction, row.get(24)?))
    }

    fn row_to_complex_interaction(row: &Row<'_>) -> rusqlite::Result<ComplexInteraction> {
        Ok(ComplexInteraction {
            id: row.get(0)?,
            complex_id: ComplexId(row.get(1)?),
            complex_name: row.get(2)?,
            prey: Self::row_to_protein(row, 3)?,
            prediction: Self::row_to_prediction(row, 9)?,
        })
    }

    fn query_interactions(
        conn: &Connection,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<Interaction>> {
        let sql = format!("{} {}", INTERACTION_SELECT, clause);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, Self::row_to_interaction)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut interaction, document_json)| -> StorageResult<Interaction> {
                interaction.experimental_validation = document_json
                    .map(|json| serde_json::from_str(&json))
                    .transpose()?;
                Ok(interaction)
            })
            .collect()
    }

    fn upsert_protein_in(conn: &Connection, protein: &NewProtein) -> StorageResult<ProteinId> {
        let uniprot = protein.uniprot_id.trim();
        if uniprot.is_empty() {
            return Err(StorageError::InvalidData("empty UniProt ID".to_string()));
        }

        let id = conn.query_row(
            r#"
            INSERT INTO proteins (uniprot_id, gene_name, organism, organism_code, common_name)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(uniprot_id) DO UPDATE SET
                gene_name = COALESCE(NULLIF(excluded.gene_name, ''), proteins.gene_name),
                organism = COALESCE(NULLIF(excluded.organism, ''), proteins.organism),
                organism_code = COALESCE(NULLIF(excluded.organism_code, ''), proteins.organism_code),
                common_name = COALESCE(NULLIF(excluded.common_name, ''), proteins.common_name)
            RETURNING id
            "#,
            params![
                uniprot,
                protein.gene_name,
                protein.organism,
                protein.organism_code,
                protein.common_name,
            ],
            |row| row.get(0),
        )?;
        Ok(ProteinId(id))
    }

    fn protein_id_in(conn: &Connection, uniprot: &str) -> StorageResult<i64> {
        conn.query_row(
            "SELECT id FROM proteins WHERE uniprot_id = ?1",
            params![uniprot.trim()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StorageError::ProteinNotFound(uniprot.to_string()))
    }

    fn complex_members(conn: &Connection, complex: i64) -> StorageResult<Vec<ComplexMember>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.id, p.uniprot_id, p.gene_name, p.organism, p.organism_code, p.common_name,
                   cp.chain_id, cp.position, cp.role
            FROM complex_proteins cp
            JOIN proteins p ON p.id = cp.protein_id
            WHERE cp.complex_id = ?1
            ORDER BY cp.position
            "#,
        )?;
        let members = stmt
            .query_map(params![complex], |row| {
                Ok(ComplexMember {
                    protein: Self::row_to_protein(row, 0)?,
                    chain_id: row.get(6)?,
                    position: row.get(7)?,
                    role: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    fn load_complexes(
        conn: &Connection,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<ProteinComplex>> {
        let sql = format!(
            r#"
            SELECT c.id, c.complex_name, c.display_name, c.num_proteins, c.created_at,
                   (SELECT COUNT(*) FROM complex_interactions ci
                    WHERE ci.bait_complex_id = c.id
                      AND (?1 = 0 OR (ci.analysis_version = 'v4' AND ci.ipsae IS NOT NULL)))
            FROM protein_complexes c
            {}
            "#,
            clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<ComplexRow> = stmt
            .query_map(params, |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, complex_name, display_name, num_proteins, created_at, count)| -> StorageResult<ProteinComplex> {
                let created_at = created_at
                    .map(|s| {
                        chrono::DateTime::parse_from_rfc3339(&s)
                            .map(|dt| dt.with_timezone(&chrono::Utc))
                            .map_err(|e| StorageError::DateParse(e.to_string()))
                    })
                    .transpose()?;
                Ok(ProteinComplex {
                    id: ComplexId(id),
                    complex_name,
                    display_name,
                    num_proteins: num_proteins.max(0) as usize,
                    created_at,
                    interaction_count: count.max(0) as usize,
                    proteins: Self::complex_members(conn, id)?,
                })
            })
            .collect()
    }

    fn count(conn: &Connection, sql: &str) -> StorageResult<usize> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }
}

/// Bind order matches `PREDICTION_COLUMNS`
macro_rules! prediction_params {
    ($p:expr) => {
        (
            $p.scores.iptm,
            $p.scores.interface_plddt,
            $p.scores.contacts_pae_lt_3,
            $p.scores.contacts_pae_lt_6,
            $p.scores.ipsae,
            $p.scores.ipsae_pae_cutoff,
            $p.confidence.as_deref(),
            $p.ipsae_confidence.as_deref(),
            $p.analysis_version.as_deref(),
            $p.alphafold_version.map(|v| v.as_str()),
            $p.source_path.as_deref(),
        )
    };
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl InteractionStore for SqliteStore {
    // === Protein Operations ===

    fn upsert_protein(&self, protein: &NewProtein) -> StorageResult<ProteinId> {
        let conn = self.conn()?;
        Self::upsert_protein_in(&conn, protein)
    }

    fn get_protein(&self, uniprot: &UniprotId) -> StorageResult<Option<Protein>> {
        let conn = self.conn()?;
        let protein = conn
            .query_row(
                "SELECT id, uniprot_id, gene_name, organism, organism_code, common_name
                 FROM proteins WHERE uniprot_id = ?1",
                params![uniprot.as_str()],
                |row| Self::row_to_protein(row, 0),
            )
            .optional()?;
        Ok(protein)
    }

    fn find_proteins(&self, identifier: &str) -> StorageResult<Vec<Protein>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pr.id, pr.uniprot_id, pr.gene_name, pr.organism, pr.organism_code, pr.common_name
            FROM proteins pr
            WHERE pr.uniprot_id = ?1 COLLATE NOCASE
               OR pr.gene_name = ?1 COLLATE NOCASE
               OR EXISTS (SELECT 1 FROM protein_aliases a
                          WHERE a.protein_id = pr.id AND a.alias_name = ?1 COLLATE NOCASE)
            ORDER BY (pr.uniprot_id = ?1 COLLATE NOCASE) DESC,
                     (pr.gene_name = ?1 COLLATE NOCASE) DESC,
                     pr.id
            "#,
        )?;
        let proteins = stmt
            .query_map(params![identifier.trim()], |row| Self::row_to_protein(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proteins)
    }

    fn list_proteins(&self) -> StorageResult<Vec<Protein>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, uniprot_id, gene_name, organism, organism_code, common_name
             FROM proteins ORDER BY uniprot_id",
        )?;
        let proteins = stmt
            .query_map([], |row| Self::row_to_protein(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proteins)
    }

    fn set_gene_name(&self, uniprot: &UniprotId, gene_name: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE proteins SET gene_name = ?2 WHERE uniprot_id = ?1",
            params![uniprot.as_str(), gene_name],
        )?;
        Ok(changed > 0)
    }

    fn add_alias(&self, uniprot: &UniprotId, alias: &Alias) -> StorageResult<bool> {
        let conn = self.conn()?;
        let protein_id = Self::protein_id_in(&conn, uniprot.as_str())?;
        let inserted = conn.execute(
            r#"
            INSERT INTO protein_aliases (protein_id, alias_name, alias_type, source)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(protein_id, alias_name) DO NOTHING
            "#,
            params![
                protein_id,
                alias.alias_name,
                alias.alias_type.as_str(),
                alias.source,
            ],
        )?;
        Ok(inserted > 0)
    }

    fn list_aliases(&self, uniprot: &UniprotId) -> StorageResult<Vec<Alias>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.alias_name, a.alias_type, a.source
            FROM protein_aliases a
            JOIN proteins p ON p.id = a.protein_id
            WHERE p.uniprot_id = ?1
            ORDER BY a.alias_name
            "#,
        )?;
        let aliases = stmt
            .query_map(params![uniprot.as_str()], |row| {
                let alias_type: String = row.get(1)?;
                Ok(Alias {
                    alias_name: row.get(0)?,
                    alias_type: AliasType::parse(&alias_type),
                    source: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aliases)
    }

    fn protein_stats(&self) -> StorageResult<Vec<ProteinStats>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pr.id, pr.uniprot_id, pr.gene_name, pr.organism, pr.organism_code, pr.common_name,
                   (SELECT COUNT(DISTINCT prey_protein_id) FROM interactions
                    WHERE bait_protein_id = pr.id),
                   (SELECT COUNT(DISTINCT bait_protein_id) FROM interactions
                    WHERE prey_protein_id = pr.id),
                   (SELECT COUNT(*) FROM (
                        SELECT prey_protein_id FROM interactions WHERE bait_protein_id = pr.id
                        UNION
                        SELECT bait_protein_id FROM interactions WHERE prey_protein_id = pr.id))
            FROM proteins pr
            WHERE pr.id IN (SELECT bait_protein_id FROM interactions
                            UNION SELECT prey_protein_id FROM interactions)
            ORDER BY 9 DESC, pr.gene_name, pr.uniprot_id
            "#,
        )?;
        let stats = stmt
            .query_map([], |row| {
                let as_bait: i64 = row.get(6)?;
                let as_prey: i64 = row.get(7)?;
                let total: i64 = row.get(8)?;
                Ok(ProteinStats {
                    protein: Self::row_to_protein(row, 0)?,
                    interactions_as_bait: as_bait as usize,
                    interactions_as_prey: as_prey as usize,
                    total_interactions: total as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    // === Interaction Operations ===

    fn insert_interaction(&self, interaction: &NewInteraction) -> StorageResult<InteractionId> {
        let conn = self.conn()?;
        let bait = Self::protein_id_in(&conn, &interaction.bait_uniprot)?;
        let prey = Self::protein_id_in(&conn, &interaction.prey_uniprot)?;
        let p = &interaction.prediction;
        let (iptm, plddt, c3, c6, ipsae, cutoff, confidence, ipsae_conf, version, af, path) =
            prediction_params!(p);

        conn.execute(
            &format!(
                "INSERT INTO interactions (bait_protein_id, prey_protein_id, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                PREDICTION_COLUMNS
            ),
            params![bait, prey, iptm, plddt, c3, c6, ipsae, cutoff, confidence, ipsae_conf, version, af, path],
        )?;
        Ok(InteractionId(conn.last_insert_rowid()))
    }

    fn get_interaction(&self, id: InteractionId) -> StorageResult<Option<Interaction>> {
        let conn = self.conn()?;
        let mut rows = Self::query_interactions(&conn, "WHERE i.id = ?1", params![id.0])?;
        Ok(rows.pop())
    }

    fn find_pair(&self, pair: &PairKey) -> StorageResult<Vec<Interaction>> {
        let conn = self.conn()?;
        Self::query_interactions(
            &conn,
            "WHERE (b.uniprot_id = ?1 AND p.uniprot_id = ?2)
                OR (b.uniprot_id = ?2 AND p.uniprot_id = ?1)
             ORDER BY i.id",
            params![pair.first().as_str(), pair.second().as_str()],
        )
    }

    fn search_interactions(&self, term: &SearchTerm) -> StorageResult<Vec<Interaction>> {
        let conn = self.conn()?;
        let clause = format!(
            r#"
            WHERE (
                i.bait_protein_id IN {matched}
                OR i.prey_protein_id IN {matched}
                OR i.source_path LIKE ?1 ESCAPE '\'
            )
            AND (?2 IS NULL OR b.organism_code = ?2 OR p.organism_code = ?2)
            ORDER BY i.id
            "#,
            matched = MATCHED_PROTEINS
        );
        Self::query_interactions(&conn, &clause, params![term.like_pattern(), term.organism_code])
    }

    fn list_interactions(&self) -> StorageResult<Vec<Interaction>> {
        let conn = self.conn()?;
        Self::query_interactions(&conn, "ORDER BY i.id", [])
    }

    fn bait_counts(&self) -> StorageResult<Vec<BaitSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pr.uniprot_id, pr.gene_name, pr.organism, pr.organism_code, COUNT(i.id)
            FROM proteins pr
            JOIN interactions i ON i.bait_protein_id = pr.id
            GROUP BY pr.id
            ORDER BY pr.gene_name IS NULL, pr.gene_name, pr.uniprot_id
            "#,
        )?;
        let baits = stmt
            .query_map([], |row| {
                let count: i64 = row.get(4)?;
                Ok(BaitSummary {
                    uniprot_id: UniprotId::new(row.get::<_, String>(0)?),
                    gene_name: row.get(1)?,
                    organism: row.get(2)?,
                    organism_code: row.get(3)?,
                    interaction_count: count as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(baits)
    }

    fn delete_duplicate_interactions(&self) -> StorageResult<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            r#"
            DELETE FROM interactions
            WHERE id NOT IN (
                SELECT MIN(id) FROM interactions
                GROUP BY bait_protein_id, prey_protein_id, ipsae, iptm
            )
            "#,
            [],
        )?;
        Ok(deleted)
    }

    // === Validation Operations ===

    fn load_validation(&self, pair: &PairKey) -> StorageResult<Option<ExperimentalValidation>> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT document_json FROM pair_validations WHERE protein_a = ?1 AND protein_b = ?2",
                params![pair.first().as_str(), pair.second().as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    fn list_validations(&self) -> StorageResult<Vec<(PairKey, ExperimentalValidation)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT protein_a, protein_b, document_json FROM pair_validations
             ORDER BY protein_a, protein_b",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(a, b, json)| -> StorageResult<(PairKey, ExperimentalValidation)> {
                Ok((PairKey::new(a, b), serde_json::from_str(&json)?))
            })
            .collect()
    }

    fn modify_validation(
        &self,
        pair: &PairKey,
        f: &mut dyn FnMut(&mut ExperimentalValidation) -> bool,
    ) -> StorageResult<bool> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock before the read, so a concurrent
        // writer cannot slip in between our read and write
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT document_json FROM pair_validations WHERE protein_a = ?1 AND protein_b = ?2",
                params![pair.first().as_str(), pair.second().as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let mut document = match existing {
            Some(json) => serde_json::from_str(&json)?,
            None => ExperimentalValidation::new(),
        };

        if !f(&mut document) {
            return Ok(false);
        }

        if document.is_empty() {
            tx.execute(
                "DELETE FROM pair_validations WHERE protein_a = ?1 AND protein_b = ?2",
                params![pair.first().as_str(), pair.second().as_str()],
            )?;
        } else {
            tx.execute(
                r#"
                INSERT INTO pair_validations (protein_a, protein_b, document_json, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(protein_a, protein_b) DO UPDATE SET
                    document_json = excluded.document_json,
                    updated_at = excluded.updated_at
                "#,
                params![
                    pair.first().as_str(),
                    pair.second().as_str(),
                    serde_json::to_string(&document)?,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    // === Complex Operations ===

    fn save_complex(&self, complex: &NewComplex) -> StorageResult<ComplexId> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO protein_complexes (complex_name, display_name, num_proteins, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(complex_name) DO UPDATE SET
                display_name = excluded.display_name,
                num_proteins = excluded.num_proteins
            RETURNING id
            "#,
            params![
                complex.complex_name,
                complex.display_name,
                complex.members.len() as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM complex_proteins WHERE complex_id = ?1", params![id])?;

        for (position, member) in complex.members.iter().enumerate() {
            let protein = NewProtein {
                uniprot_id: member.uniprot_id.clone(),
                gene_name: member.gene_name.clone(),
                ..Default::default()
            };
            let protein_id = Self::upsert_protein_in(&tx, &protein)?;
            tx.execute(
                "INSERT INTO complex_proteins (complex_id, protein_id, chain_id, position, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, protein_id.0, member.chain_id, position as i64, member.role],
            )?;
        }

        tx.commit()?;
        Ok(ComplexId(id))
    }

    fn insert_complex_interaction(
        &self,
        complex: ComplexId,
        interaction: &NewComplexInteraction,
    ) -> StorageResult<i64> {
        let conn = self.conn()?;
        let prey = Self::protein_id_in(&conn, &interaction.prey_uniprot)?;
        let p = &interaction.prediction;
        let (iptm, plddt, c3, c6, ipsae, cutoff, confidence, ipsae_conf, version, af, path) =
            prediction_params!(p);

        conn.execute(
            &format!(
                "INSERT INTO complex_interactions (bait_complex_id, prey_protein_id, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                PREDICTION_COLUMNS
            ),
            params![complex.0, prey, iptm, plddt, c3, c6, ipsae, cutoff, confidence, ipsae_conf, version, af, path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_complexes(&self, v4_only: bool) -> StorageResult<Vec<ProteinComplex>> {
        let conn = self.conn()?;
        Self::load_complexes(&conn, "ORDER BY c.display_name", params![v4_only])
    }

    fn find_complex(&self, key: &str) -> StorageResult<Option<ProteinComplex>> {
        let conn = self.conn()?;
        let key = key.trim();
        let mut found = match key.parse::<i64>() {
            Ok(id) => Self::load_complexes(&conn, "WHERE c.id = ?2", params![false, id])?,
            Err(_) => Self::load_complexes(&conn, "WHERE c.complex_name = ?2", params![false, key])?,
        };
        Ok(found.pop())
    }

    fn complex_interactions(&self, complex: ComplexId) -> StorageResult<Vec<ComplexInteraction>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE ci.bait_complex_id = ?1 ORDER BY ci.id",
            COMPLEX_INTERACTION_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![complex.0], Self::row_to_complex_interaction)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // === Store Operations ===

    fn stats(&self) -> StorageResult<StoreStats> {
        let conn = self.conn()?;
        Ok(StoreStats {
            proteins: Self::count(&conn, "SELECT COUNT(*) FROM proteins")?,
            aliases: Self::count(&conn, "SELECT COUNT(*) FROM protein_aliases")?,
            interactions: Self::count(&conn, "SELECT COUNT(*) FROM interactions")?,
            validated_interactions: Self::count(
                &conn,
                r#"
                SELECT COUNT(*) FROM interactions i
                JOIN proteins b ON b.id = i.bait_protein_id
                JOIN proteins p ON p.id = i.prey_protein_id
                JOIN pair_validations v
                    ON v.protein_a = min(b.uniprot_id, p.uniprot_id)
                   AND v.protein_b = max(b.uniprot_id, p.uniprot_id)
                "#,
            )?,
            validated_pairs: Self::count(&conn, "SELECT COUNT(*) FROM pair_validations")?,
            complexes: Self::count(&conn, "SELECT COUNT(*) FROM protein_complexes")?,
        })
    }

    fn diagnostics(&self) -> StorageResult<Diagnostics> {
        let stats = self.stats()?;
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('interactions')")?;
        let interaction_columns = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut stmt = conn.prepare("SELECT uniprot_id FROM proteins ORDER BY id LIMIT 5")?;
        let sample_proteins = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(UniprotId::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Diagnostics {
            tables,
            interaction_columns,
            sample_proteins,
            stats,
        })
    }
}
