//! SQLite database layer
//!
//! Holds the case graph (`cases`, `sections`, `has_section`) and the
//! persisted section embeddings.

use std::path::Path;
use std::time::Duration;

use half::f16;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};

use crate::core::{Case, Section};
use crate::error::{LgError, Result};
use crate::search::vector::{EmbeddingRecord, SectionMetadata};
use crate::storage::migrations;

/// SQLite database wrapper for the case graph and vector store
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

/// A section joined with its owning case, as read for indexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRow {
    pub section_id: String,
    pub label: String,
    pub content: String,
    pub case_id: String,
    pub title: String,
    pub case_type: String,
    pub court: String,
}

impl SectionRow {
    #[must_use]
    pub fn metadata(&self) -> SectionMetadata {
        SectionMetadata {
            section_id: self.section_id.clone(),
            label: self.label.clone(),
            case_id: self.case_id.clone(),
            title: self.title.clone(),
            case_type: self.case_type.clone(),
            court: self.court.clone(),
            content: self.content.clone(),
        }
    }
}

/// Counts from a graph write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub cases: usize,
    pub sections: usize,
}

impl Database {
    /// Open (and migrate) the database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Open an existing database without writing to it
    pub fn open_read_only(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LgError::NotFound(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        // No CREATE flag, so a missing file is never created; query_only
        // blocks writes while still letting SQLite maintain the WAL index.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "query_only", true)?;
        let schema_version = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Get a reference to the connection
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn upsert_case(&self, case: &Case) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cases (id, title, case_type, court, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title=excluded.title,
                case_type=excluded.case_type,
                court=excluded.court",
            params![
                case.id,
                case.title,
                case.case_type,
                case.court,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_case(&self, id: &str) -> Result<Option<Case>> {
        let case = self
            .conn
            .query_row(
                "SELECT id, title, case_type, court FROM cases WHERE id = ?",
                [id],
                case_from_row,
            )
            .optional()?;
        Ok(case)
    }

    /// Insert a section and its `HAS_SECTION` edge from the owning case.
    pub fn upsert_section(&self, section: &Section) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sections (id, case_id, label, content) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                case_id=excluded.case_id,
                label=excluded.label,
                content=excluded.content",
            params![section.id, section.case_id, section.label(), section.content],
        )?;
        self.conn.execute(
            "INSERT INTO has_section (case_id, section_id, section_type) VALUES (?, ?, ?)
             ON CONFLICT(case_id, section_id) DO UPDATE SET
                section_type=excluded.section_type",
            params![section.case_id, section.id, section.label()],
        )?;
        Ok(())
    }

    /// Write cases with their sections in a single transaction.
    pub fn write_cases(&self, cases: &[(Case, Vec<Section>)]) -> Result<WriteStats> {
        let tx = self.conn.unchecked_transaction()?;
        let mut stats = WriteStats::default();

        for (case, sections) in cases {
            self.upsert_case(case)?;
            stats.cases += 1;
            for section in sections.iter().filter(|s| s.has_content()) {
                if section.case_id != case.id {
                    return Err(LgError::InvalidInput(format!(
                        "section {} belongs to {}, not {}",
                        section.id, section.case_id, case.id
                    )));
                }
                self.upsert_section(section)?;
                stats.sections += 1;
            }
        }

        tx.commit()?;
        Ok(stats)
    }

    pub fn count_cases(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub fn count_sections(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Every section with its owning case's metadata, ordered by section id.
    pub fn list_section_rows(&self) -> Result<Vec<SectionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.label, s.content, c.id, c.title, c.case_type, c.court
             FROM sections s
             JOIN cases c ON c.id = s.case_id
             ORDER BY s.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SectionRow {
                section_id: row.get(0)?,
                label: row.get(1)?,
                content: row.get(2)?,
                case_id: row.get(3)?,
                title: row.get(4)?,
                case_type: row.get(5)?,
                court: row.get(6)?,
            })
        })?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Count `case_a -> section <- case_b` paths, optionally restricted to one label.
    ///
    /// A path uses two distinct edges, so a case shares nothing with itself
    /// through its own sections.
    pub fn count_shared_sections(
        &self,
        case_a: &str,
        case_b: &str,
        section_type: Option<&str>,
    ) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM has_section a
             JOIN has_section b ON b.section_id = a.section_id
             JOIN sections s ON s.id = a.section_id
             WHERE a.case_id = ?1 AND b.case_id = ?2
               AND a.case_id <> b.case_id
               AND (?3 IS NULL OR s.label = ?3)",
            params![case_a, case_b, section_type],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub fn upsert_embedding(&self, record: &EmbeddingRecord, embedder_type: &str) -> Result<()> {
        let encoded = encode_embedding_f16(&record.vector);
        let metadata_json = serde_json::to_string(&record.metadata)?;
        let computed_at = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO section_embeddings (
                section_id, embedding, dims, embedder_type, content_hash, document,
                metadata_json, computed_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(section_id, embedder_type) DO UPDATE SET
                embedding=excluded.embedding,
                dims=excluded.dims,
                content_hash=excluded.content_hash,
                document=excluded.document,
                metadata_json=excluded.metadata_json,
                computed_at=excluded.computed_at",
            params![
                record.section_id,
                encoded,
                i64::try_from(record.vector.len()).unwrap_or(i64::MAX),
                embedder_type,
                content_hash(&record.document),
                record.document,
                metadata_json,
                computed_at,
            ],
        )?;
        Ok(())
    }

    /// Content hash of the stored embedding for a section, if one exists for this embedder.
    pub fn get_embedding_hash(
        &self,
        section_id: &str,
        embedder_type: &str,
        dims: usize,
    ) -> Result<Option<String>> {
        let hash: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT content_hash FROM section_embeddings
                 WHERE section_id = ? AND embedder_type = ? AND dims = ?",
                params![section_id, embedder_type, i64::try_from(dims).unwrap_or(i64::MAX)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash.flatten())
    }

    pub fn load_embeddings(&self, embedder_type: &str, dims: usize) -> Result<Vec<EmbeddingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT section_id, embedding, dims, document, metadata_json
             FROM section_embeddings
             WHERE embedder_type = ? AND dims = ?",
        )?;
        let mut rows = stmt.query(params![
            embedder_type,
            i64::try_from(dims).unwrap_or(i64::MAX)
        ])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(embedding_from_row(row)?);
        }
        Ok(records)
    }

    pub fn count_embeddings(&self, embedder_type: &str, dims: usize) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM section_embeddings WHERE embedder_type = ? AND dims = ?",
            params![embedder_type, i64::try_from(dims).unwrap_or(i64::MAX)],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    }
}

/// Hex SHA-256 of a document, used to skip re-embedding unchanged sections
#[must_use]
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    Ok(Case {
        id: row.get(0)?,
        title: row.get(1)?,
        case_type: row.get(2)?,
        court: row.get(3)?,
    })
}

fn embedding_from_row(row: &Row<'_>) -> Result<EmbeddingRecord> {
    let section_id: String = row.get(0)?;
    let blob: Vec<u8> = row.get(1)?;
    let dims: i64 = row.get(2)?;
    let document: String = row.get(3)?;
    let metadata_json: String = row.get(4)?;

    let dims = usize::try_from(dims).unwrap_or(0);
    let vector = decode_embedding_f16(&blob, dims)?;
    let metadata: SectionMetadata = serde_json::from_str(&metadata_json).map_err(|err| {
        LgError::Serialization(format!("metadata for {section_id}: {err}"))
    })?;

    Ok(EmbeddingRecord {
        section_id,
        vector,
        document,
        metadata,
    })
}

fn encode_embedding_f16(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for value in values {
        let bits = f16::from_f32(*value).to_bits();
        out.extend_from_slice(&bits.to_le_bytes());
    }
    out
}

fn decode_embedding_f16(bytes: &[u8], dims: usize) -> Result<Vec<f32>> {
    let expected = dims.saturating_mul(2);
    if bytes.len() != expected {
        return Err(LgError::Serialization(format!(
            "embedding blob length mismatch: expected {}, got {}",
            expected,
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(dims);
    for chunk in bytes.chunks_exact(2) {
        let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(f16::from_bits(bits).to_f32());
    }
    Ok(out)
}
