//! SQLite-backed persistent store.
//!
//! One connection behind a mutex: every write runs inside a transaction
//! while the lock is held, so readers see a file's rows either fully
//! present or fully absent.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::records::{
    AstRecord, CodePatternRecord, EmbeddingRecord, FileEntry, StoreStats, StoredFile,
    UpsertOutcome,
};
use super::schema;
use crate::analysis::ArchitecturalPattern;
use crate::error::{StorageError, StorageResult};
use crate::relationship::{Direction, RelatedFile, RelationKind, Relationship};
use crate::vector::{Embedding, ModelType};

const EMBEDDING_COLUMNS: &str =
    "path, content_hash, embedding, metadata_json, model_type, file_size, language, created_at";

/// Content-hash-keyed cache of embeddings, structure, patterns and relationships
pub struct CodeStore {
    conn: Mutex<Connection>,
}

impl CodeStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::initialize(&conn)?;
        debug!("Opened cache database at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace the rows for `entry.path`.
    ///
    /// When the stored hash equals `entry.content_hash` nothing is written.
    /// Otherwise the embedding row is replaced and the file's structural row
    /// and outgoing relationships are rewritten in one transaction.
    pub fn upsert(&self, entry: &FileEntry) -> StorageResult<UpsertOutcome> {
        let metadata_json =
            serde_json::to_string(&entry.metadata).map_err(StorageError::json("file metadata"))?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT content_hash FROM embeddings WHERE path = ?1",
                [&entry.path],
                |row| row.get(0),
            )
            .optional()?;

        if previous.as_deref() == Some(entry.content_hash.as_str()) {
            return Ok(UpsertOutcome::Unchanged);
        }

        tx.execute(
            "INSERT INTO embeddings (path, content_hash, embedding, metadata_json, model_type, file_size, language, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(path) DO UPDATE SET
                content_hash = excluded.content_hash,
                embedding = excluded.embedding,
                metadata_json = excluded.metadata_json,
                model_type = excluded.model_type,
                file_size = excluded.file_size,
                language = excluded.language,
                created_at = excluded.created_at",
            params![
                entry.path,
                entry.content_hash,
                entry.embedding.to_bytes(),
                metadata_json,
                entry.embedding.model_type.to_string(),
                entry.file_size as i64,
                entry.language,
                now,
            ],
        )?;

        clear_analysis(&tx, &entry.path)?;
        if let Some(analysis) = &entry.analysis {
            tx.execute(
                "INSERT INTO ast_data (path, content_hash, ast_json, architectural_patterns_json, code_metrics_json, relationships_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.path,
                    entry.content_hash,
                    serde_json::to_string(&analysis.description)
                        .map_err(StorageError::json("structural description"))?,
                    serde_json::to_string(&analysis.patterns)
                        .map_err(StorageError::json("architectural patterns"))?,
                    serde_json::to_string(&analysis.metrics)
                        .map_err(StorageError::json("code metrics"))?,
                    serde_json::to_string(&analysis.relationships)
                        .map_err(StorageError::json("relationships"))?,
                    now,
                ],
            )?;
            for relationship in &analysis.relationships {
                insert_relationship(&tx, relationship, &now)?;
            }
        }

        tx.commit()?;

        Ok(match previous {
            Some(previous_hash) => UpsertOutcome::Replaced { previous_hash },
            None => UpsertOutcome::Inserted,
        })
    }

    /// Stored hash for `path`, without loading the rest of the row
    pub fn content_hash(&self, path: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock();
        let hash = conn
            .query_row(
                "SELECT content_hash FROM embeddings WHERE path = ?1",
                [path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub fn get(&self, path: &str) -> StorageResult<Option<StoredFile>> {
        let conn = self.conn.lock();

        let raw = conn
            .query_row(
                &format!("SELECT {EMBEDDING_COLUMNS} FROM embeddings WHERE path = ?1"),
                [path],
                RawEmbedding::from_row,
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let embedding = raw.into_record()?;

        let ast = conn
            .query_row(
                "SELECT path, content_hash, ast_json, architectural_patterns_json, code_metrics_json, relationships_json, created_at
                 FROM ast_data WHERE path = ?1",
                [path],
                RawAst::from_row,
            )
            .optional()?
            .map(RawAst::into_record)
            .transpose()?;

        Ok(Some(StoredFile { embedding, ast }))
    }

    /// Drop every row owned by `path`. Returns whether the file was cached.
    ///
    /// Code-pattern frequencies are corpus history and are left untouched.
    pub fn remove(&self, path: &str) -> StorageResult<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM embeddings WHERE path = ?1", [path])?;
        clear_analysis(&tx, path)?;
        tx.commit()?;

        if removed > 0 {
            debug!("Evicted {path} from cache");
        }
        Ok(removed > 0)
    }

    /// Count one sighting of `(pattern_type, content)` in `path`.
    ///
    /// The first sighting creates the row with frequency 1; later sightings
    /// increment the frequency and add `path` to the file set.
    pub fn record_pattern(&self, pattern_type: &str, content: &str, path: &str) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, file_paths_json FROM code_patterns WHERE pattern_type = ?1 AND pattern_content = ?2",
                params![pattern_type, content],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            Some((id, paths_json)) => {
                let mut paths: Vec<String> = serde_json::from_str(&paths_json)
                    .map_err(StorageError::json("pattern file paths"))?;
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.to_string());
                }
                tx.execute(
                    "UPDATE code_patterns SET frequency = frequency + 1, file_paths_json = ?1 WHERE id = ?2",
                    params![
                        serde_json::to_string(&paths)
                            .map_err(StorageError::json("pattern file paths"))?,
                        id
                    ],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO code_patterns (pattern_type, pattern_content, file_paths_json, frequency, created_at)
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    params![
                        pattern_type,
                        content,
                        serde_json::to_string(&[path])
                            .map_err(StorageError::json("pattern file paths"))?,
                        Utc::now().to_rfc3339()
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Every embedding row, in insertion order
    pub fn all_embeddings(&self) -> StorageResult<Vec<EmbeddingRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EMBEDDING_COLUMNS} FROM embeddings ORDER BY id"
        ))?;
        let raws = stmt
            .query_map([], RawEmbedding::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawEmbedding::into_record).collect()
    }

    /// `(path, patterns)` for every file with a structural row, in insertion order
    pub fn all_architectural_patterns(
        &self,
    ) -> StorageResult<Vec<(String, Vec<ArchitecturalPattern>)>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT path, architectural_patterns_json FROM ast_data ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(path, json)| {
                let patterns = serde_json::from_str(&json)
                    .map_err(StorageError::json("architectural patterns"))?;
                Ok((path, patterns))
            })
            .collect()
    }

    /// Edges touching `path` (as source or target) whose type is in `kinds`,
    /// strongest first. Each result names the other end of the edge.
    pub fn related_to(&self, path: &str, kinds: &[RelationKind]) -> StorageResult<Vec<RelatedFile>> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (0..kinds.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT source, target, relationship_type, strength, metadata_json FROM code_relationships
             WHERE (source = ?1 OR target = ?1) AND relationship_type IN ({placeholders})
             ORDER BY strength DESC, id"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let values = std::iter::once(path.to_string()).chain(kinds.iter().map(|k| k.to_string()));
        let rows = stmt
            .query_map(params_from_iter(values), RawRelationship::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|raw| {
                let relationship = raw.into_relationship()?;
                let (file, direction) = if relationship.source == path {
                    (relationship.target, Direction::Outgoing)
                } else {
                    (relationship.source, Direction::Incoming)
                };
                Ok(RelatedFile {
                    file,
                    kind: relationship.kind,
                    strength: relationship.strength,
                    direction,
                    metadata: relationship.metadata,
                })
            })
            .collect()
    }

    /// Every stored edge, strongest first
    pub fn relationship_graph(&self) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT source, target, relationship_type, strength, metadata_json FROM code_relationships
             ORDER BY strength DESC, id",
        )?;
        let rows = stmt
            .query_map([], RawRelationship::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRelationship::into_relationship).collect()
    }

    /// Code patterns of `pattern_type` (any type when `None`) whose content
    /// contains `needle`, most frequent first
    pub fn find_patterns(
        &self,
        pattern_type: Option<&str>,
        needle: &str,
        limit: usize,
    ) -> StorageResult<Vec<CodePatternRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT pattern_type, pattern_content, file_paths_json, frequency, created_at FROM code_patterns
             WHERE (?1 IS NULL OR pattern_type = ?1) AND (?2 = '' OR instr(pattern_content, ?2) > 0)
             ORDER BY frequency DESC, pattern_content
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![pattern_type, needle, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(pattern_type, pattern_content, paths_json, frequency, created_at)| {
                Ok(CodePatternRecord {
                    pattern_type,
                    pattern_content,
                    file_paths: serde_json::from_str(&paths_json)
                        .map_err(StorageError::json("pattern file paths"))?,
                    frequency: frequency.max(0) as u64,
                    created_at: parse_timestamp(&created_at),
                })
            })
            .collect()
    }

    pub fn stats(&self) -> StorageResult<StoreStats> {
        let conn = self.conn.lock();

        let (total_files, total_size): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0) FROM embeddings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let relationships: i64 =
            conn.query_row("SELECT COUNT(*) FROM code_relationships", [], |row| row.get(0))?;

        let grouped = |sql: &str| -> StorageResult<BTreeMap<String, usize>> {
            let mut stmt = conn.prepare(sql)?;
            let map = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
                })?
                .collect::<Result<_, _>>()?;
            Ok(map)
        };

        Ok(StoreStats {
            total_files: total_files as usize,
            total_size: total_size.max(0) as u64,
            languages: grouped("SELECT language, COUNT(*) FROM embeddings GROUP BY language")?,
            pattern_types: grouped(
                "SELECT pattern_type, COUNT(*) FROM code_patterns GROUP BY pattern_type",
            )?,
            relationships: relationships as usize,
        })
    }
}

fn clear_analysis(tx: &Transaction<'_>, path: &str) -> StorageResult<()> {
    tx.execute("DELETE FROM ast_data WHERE path = ?1", [path])?;
    tx.execute("DELETE FROM code_relationships WHERE source = ?1", [path])?;
    Ok(())
}

fn insert_relationship(
    tx: &Transaction<'_>,
    relationship: &Relationship,
    created_at: &str,
) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO code_relationships (source, target, relationship_type, strength, metadata_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            relationship.source,
            relationship.target,
            relationship.kind.as_str(),
            f64::from(relationship.strength),
            serde_json::to_string(&relationship.metadata)
                .map_err(StorageError::json("relationship metadata"))?,
            created_at,
        ],
    )?;
    Ok(())
}

/// Timestamps are written as RFC 3339; anything unreadable maps to the epoch
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Column values as read, before JSON and blob decoding
struct RawEmbedding {
    path: String,
    content_hash: String,
    embedding: Vec<u8>,
    metadata_json: String,
    model_type: String,
    file_size: i64,
    language: String,
    created_at: String,
}

impl RawEmbedding {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            content_hash: row.get(1)?,
            embedding: row.get(2)?,
            metadata_json: row.get(3)?,
            model_type: row.get(4)?,
            file_size: row.get(5)?,
            language: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_record(self) -> StorageResult<EmbeddingRecord> {
        let corrupt = |reason: String| StorageError::CorruptEmbedding {
            path: self.path.clone(),
            reason,
        };
        let model_type = ModelType::from_str(&self.model_type).map_err(|e| corrupt(e.to_string()))?;
        let embedding =
            Embedding::from_bytes(&self.embedding, model_type).map_err(|e| corrupt(e.to_string()))?;
        let metadata = serde_json::from_str(&self.metadata_json)
            .map_err(StorageError::json("file metadata"))?;

        Ok(EmbeddingRecord {
            created_at: parse_timestamp(&self.created_at),
            path: self.path,
            content_hash: self.content_hash,
            embedding,
            metadata,
            file_size: self.file_size.max(0) as u64,
            language: self.language,
        })
    }
}

struct RawAst {
    path: String,
    content_hash: String,
    ast_json: String,
    patterns_json: String,
    metrics_json: String,
    relationships_json: String,
    created_at: String,
}

impl RawAst {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            content_hash: row.get(1)?,
            ast_json: row.get(2)?,
            patterns_json: row.get(3)?,
            metrics_json: row.get(4)?,
            relationships_json: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> StorageResult<AstRecord> {
        Ok(AstRecord {
            ast: serde_json::from_str(&self.ast_json)
                .map_err(StorageError::json("structural description"))?,
            architectural_patterns: serde_json::from_str(&self.patterns_json)
                .map_err(StorageError::json("architectural patterns"))?,
            code_metrics: serde_json::from_str(&self.metrics_json)
                .map_err(StorageError::json("code metrics"))?,
            relationships: serde_json::from_str(&self.relationships_json)
                .map_err(StorageError::json("relationships"))?,
            created_at: parse_timestamp(&self.created_at),
            path: self.path,
            content_hash: self.content_hash,
        })
    }
}

struct RawRelationship {
    source: String,
    target: String,
    kind: String,
    strength: f64,
    metadata_json: String,
}

impl RawRelationship {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            source: row.get(0)?,
            target: row.get(1)?,
            kind: row.get(2)?,
            strength: row.get(3)?,
            metadata_json: row.get(4)?,
        })
    }

    fn into_relationship(self) -> StorageResult<Relationship> {
        let kind = RelationKind::from_str(&self.kind).map_err(|reason| {
            StorageError::Serialization {
                what: "relationship type",
                source: serde::de::Error::custom(format!("{reason}: {}", self.kind)),
            }
        })?;
        Ok(Relationship {
            source: self.source,
            target: self.target,
            kind,
            strength: self.strength as f32,
            metadata: serde_json::from_str(&self.metadata_json)
                .map_err(StorageError::json("relationship metadata"))?,
        })
    }
}
