/// Corpus store — durable, deduplicated chat lines queryable by scope.
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use thiserror::Error;

use crate::core::formatting::strip_formatting;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage of training lines.
///
/// Line text is unique across the whole store, not per scope: a line seen
/// again anywhere is dropped and keeps the scope of its first sighting.
pub trait CorpusStore {
    /// Insert `text` under `scope` unless the text is already stored.
    /// Returns whether a row was written.
    fn add_line(&self, text: &str, scope: &str) -> Result<bool, CorpusError>;

    /// Up to `limit` lines in random order, formatting stripped.
    /// `None` when nothing matches.
    fn sample(&self, scope: Option<&str>, limit: usize)
        -> Result<Option<Vec<String>>, CorpusError>;

    /// Exact number of stored lines, optionally restricted to `scope`.
    fn count(&self, scope: Option<&str>) -> Result<u64, CorpusError>;
}

fn init_db(conn: &Connection) -> Result<(), CorpusError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS corpus (
            line TEXT PRIMARY KEY,
            channel TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_corpus_channel ON corpus(channel);
        "#,
    )?;
    Ok(())
}

/// SQLite-backed corpus. The primary key on `line` enforces uniqueness,
/// so concurrent writers to the same file cannot duplicate a line.
#[derive(Debug)]
pub struct SqliteCorpus {
    conn: Connection,
}

impl SqliteCorpus {
    /// Open (creating if needed) the database at `path` and its parent directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
                log::debug!("[corpus] Created {} directory", dir.display());
            }
        }
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// A throwaway store that lives as long as the value.
    pub fn in_memory() -> Result<Self, CorpusError> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// The scope a line was first recorded under, if it is stored at all.
    pub fn scope_of(&self, text: &str) -> Result<Option<String>, CorpusError> {
        let scope = self
            .conn
            .query_row(
                "SELECT channel FROM corpus WHERE line = ?1",
                params![text],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(scope.flatten())
    }
}

impl CorpusStore for SqliteCorpus {
    fn add_line(&self, text: &str, scope: &str) -> Result<bool, CorpusError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO corpus (line, channel) VALUES (?1, ?2)",
            params![text, scope],
        )?;
        Ok(inserted > 0)
    }

    fn sample(
        &self,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Option<Vec<String>>, CorpusError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let (sql, args): (&str, Vec<&dyn ToSql>) = match scope {
            Some(ref scope) => (
                "SELECT line FROM corpus WHERE channel = ?1 ORDER BY RANDOM() LIMIT ?2",
                vec![scope as &dyn ToSql, &limit],
            ),
            None => (
                "SELECT line FROM corpus ORDER BY RANDOM() LIMIT ?1",
                vec![&limit as &dyn ToSql],
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let lines = stmt
            .query_map(args.as_slice(), |row| row.get::<_, String>(0))?
            .map(|line| line.map(|line| strip_formatting(&line).into_owned()))
            .collect::<Result<Vec<_>, _>>()?;

        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(lines))
        }
    }

    fn count(&self, scope: Option<&str>) -> Result<u64, CorpusError> {
        let n: i64 = match scope {
            Some(scope) => self.conn.query_row(
                "SELECT COUNT(*) FROM corpus WHERE channel = ?1",
                params![scope],
                |r| r.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM corpus", [], |r| r.get(0))?,
        };
        Ok(u64::try_from(n).unwrap_or(0))
    }
}
