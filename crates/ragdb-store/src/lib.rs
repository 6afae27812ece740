//! ragdb-store
//!
//! Durable SQLite-backed store for parent and child chunks. The lexical and
//! vector indexes are disposable derived artifacts; this store is the source
//! of truth for passage text, so reads here must keep working while either
//! index is rebuilt.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use ragdb_core::error::Error;
use ragdb_core::traits::ChunkStorage;
use ragdb_core::types::{ChildChunk, ParentChunk};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS parents (
    parent_id TEXT PRIMARY KEY,
    doc_id    TEXT NOT NULL,
    text      TEXT NOT NULL,
    start_off INTEGER NOT NULL,
    end_off   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS children (
    child_id  TEXT PRIMARY KEY,
    parent_id TEXT NOT NULL,
    text      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_children_parent ON children(parent_id);
"#;

/// rusqlite connections are not Sync, so the connection lives behind a
/// Mutex. Queries are point lookups and batched upserts; contention is not
/// a concern at this layer.
pub struct SqliteChunkStore {
    conn: Mutex<Connection>,
}

impl SqliteChunkStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        // An unreachable store is the fatal error class: without passage
        // text there is no meaningful partial result to serve.
        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        // WAL keeps concurrent query-time readers off the writer's back
        // during ingestion; busy_timeout retries instead of failing on lock.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("chunk store mutex poisoned"))
    }
}

impl ChunkStorage for SqliteChunkStore {
    fn put_parents(&self, parents: &[ParentChunk]) -> Result<()> {
        if parents.is_empty() {
            return Ok(());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO parents (parent_id, doc_id, text, start_off, end_off)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in parents {
                stmt.execute(params![p.parent_id, p.doc_id, p.text, p.start as i64, p.end as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn put_children(&self, children: &[ChildChunk]) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO children (child_id, parent_id, text)
                 VALUES (?1, ?2, ?3)",
            )?;
            for c in children {
                stmt.execute(params![c.child_id, c.parent_id, c.text])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_parent(&self, parent_id: &str) -> Result<Option<ParentChunk>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT parent_id, doc_id, text, start_off, end_off FROM parents WHERE parent_id = ?1",
                params![parent_id],
                |row| {
                    Ok(ParentChunk {
                        parent_id: row.get(0)?,
                        doc_id: row.get(1)?,
                        text: row.get(2)?,
                        start: row.get::<_, i64>(3)? as usize,
                        end: row.get::<_, i64>(4)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn get_child(&self, child_id: &str) -> Result<Option<ChildChunk>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT child_id, parent_id, text FROM children WHERE child_id = ?1",
                params![child_id],
                |row| {
                    Ok(ChildChunk {
                        child_id: row.get(0)?,
                        parent_id: row.get(1)?,
                        text: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}
