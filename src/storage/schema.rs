//! SQLite schema for the cache database

use rusqlite::Connection;

use crate::error::StorageResult;

/// Bumped whenever a table changes shape
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS embeddings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    content_hash TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata_json TEXT NOT NULL,
    model_type TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    language TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ast_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    content_hash TEXT NOT NULL,
    ast_json TEXT NOT NULL,
    architectural_patterns_json TEXT NOT NULL,
    code_metrics_json TEXT NOT NULL,
    relationships_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS code_patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern_type TEXT NOT NULL,
    pattern_content TEXT NOT NULL,
    file_paths_json TEXT NOT NULL,
    frequency INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_code_patterns_key
    ON code_patterns(pattern_type, pattern_content);

CREATE TABLE IF NOT EXISTS code_relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relationship_type TEXT NOT NULL,
    strength REAL NOT NULL,
    metadata_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_code_relationships_source ON code_relationships(source);
CREATE INDEX IF NOT EXISTS idx_code_relationships_target ON code_relationships(target);
";

/// Create any missing tables and indexes
pub fn initialize(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tables,
            vec!["ast_data", "code_patterns", "code_relationships", "embeddings"]
        );

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_pattern_key_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let insert = "INSERT INTO code_patterns (pattern_type, pattern_content, file_paths_json, created_at)
                      VALUES ('function', 'load', '[]', '')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
