//! `store`: SQLite persistence for thoughts and the question log.
//!
//! One database file, two tables:
//!
//! ```text
//! thoughts  (id, content, created_at)
//! questions (id, question, answer, ip_hash, created_at)
//! ```
//!
//! Every operation opens its own connection and writes at most one row, so
//! there is no shared connection to guard. Methods are blocking; async
//! callers run them through `tokio::task::spawn_blocking`.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Default row cap for [`Store::list_thoughts`].
pub const DEFAULT_THOUGHT_LIMIT: u32 = 50;

/// Length of the stored client-address digest, in hex characters.
pub const IP_HASH_LEN: usize = 16;

/// A short published text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thought {
    pub id: i64,
    pub content: String,
    pub created_at: String,
}

/// One answered question. Write-only from the HTTP side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionLogEntry {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub ip_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Point at `db_path` without touching the filesystem.
    /// Call [`Store::initialize`] before the first read or write.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    /// Open (creating the parent directory and schema if absent).
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let store = Self::new(db_path);
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the parent directory and both tables if they do not exist.
    /// Safe to call repeatedly.
    pub fn initialize(&self) -> Result<(), AppError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let conn = self.open_conn()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL CHECK (length(trim(content)) > 0),
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT,
                ip_hash TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );
            ",
        )
        .map_err(|e| AppError::Store(format!("initialize schema: {e}")))
    }

    /// Up to `limit` thoughts, newest first.
    pub fn list_thoughts(&self, limit: u32) -> Result<Vec<Thought>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, content, created_at FROM thoughts ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| AppError::Store(format!("prepare list_thoughts: {e}")))?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(Thought {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| AppError::Store(format!("query list_thoughts: {e}")))?;

        let mut thoughts = Vec::new();
        for row in rows {
            thoughts.push(row.map_err(|e| AppError::Store(format!("map list_thoughts row: {e}")))?);
        }
        Ok(thoughts)
    }

    /// Insert a thought and return its id. Empty or whitespace-only content
    /// is rejected before touching the database.
    pub fn add_thought(&self, content: &str) -> Result<i64, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Store("thought content must not be empty".into()));
        }
        let conn = self.open_conn()?;
        conn.execute("INSERT INTO thoughts (content) VALUES (?1)", params![content])
            .map_err(|e| AppError::Store(format!("insert thought: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// Append one answered question to the log.
    pub fn log_question(&self, question: &str, answer: &str, ip_hash: &str) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO questions (question, answer, ip_hash) VALUES (?1, ?2, ?3)",
            params![question, answer, ip_hash],
        )
        .map_err(|e| AppError::Store(format!("insert question: {e}")))?;
        Ok(())
    }

    /// Every logged question, oldest first. Not exposed over HTTP.
    pub fn question_log(&self) -> Result<Vec<QuestionLogEntry>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare("SELECT id, question, answer, ip_hash, created_at FROM questions ORDER BY id ASC")
            .map_err(|e| AppError::Store(format!("prepare question_log: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(QuestionLogEntry {
                    id: row.get(0)?,
                    question: row.get(1)?,
                    answer: row.get(2)?,
                    ip_hash: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| AppError::Store(format!("query question_log: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| AppError::Store(format!("map question_log row: {e}")))?);
        }
        Ok(entries)
    }

    /// Open a connection with WAL journaling and a 5 s busy timeout so
    /// concurrent handlers wait instead of failing with `SQLITE_BUSY`.
    fn open_conn(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| AppError::Store(format!("open {}: {e}", self.db_path.display())))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Store(format!("set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| AppError::Store(format!("set busy_timeout: {e}")))?;

        Ok(conn)
    }
}

/// Truncated SHA-256 hex digest of a client address. Deterministic, and the
/// raw address is never stored.
pub fn hash_ip(addr: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(addr.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(IP_HASH_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, Store) {
        let temp = TempDir::new().expect("tempdir");
        let store = Store::open(temp.path().join("kai.db")).expect("open store");
        (temp, store)
    }

    #[test]
    fn initialize_creates_missing_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("deeper").join("kai.db");
        let store = Store::open(&path).expect("open nested");
        assert!(path.exists());
        assert_eq!(store.db_path(), path.as_path());
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_temp, store) = make_store();
        store.add_thought("still here").unwrap();
        store.initialize().expect("second initialize");
        store.initialize().expect("third initialize");
        assert_eq!(store.list_thoughts(10).unwrap().len(), 1);
    }

    #[test]
    fn list_thoughts_empty() {
        let (_temp, store) = make_store();
        assert!(store.list_thoughts(DEFAULT_THOUGHT_LIMIT).unwrap().is_empty());
    }

    #[test]
    fn newest_thought_comes_first() {
        let (_temp, store) = make_store();
        store.add_thought("first").unwrap();
        store.add_thought("second").unwrap();
        let id = store.add_thought("third").unwrap();

        let latest = store.list_thoughts(1).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, id);
        assert_eq!(latest[0].content, "third");
    }

    #[test]
    fn list_respects_limit_and_order() {
        let (_temp, store) = make_store();
        for i in 0..5 {
            store.add_thought(&format!("thought {i}")).unwrap();
        }
        let two = store.list_thoughts(2).unwrap();
        assert_eq!(two.len(), 2);

        let all = store.list_thoughts(100).unwrap();
        assert_eq!(all.len(), 5);
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
            assert!(pair[0].id > pair[1].id);
        }
        assert!(store.list_thoughts(0).unwrap().is_empty());
    }

    #[test]
    fn ids_increase() {
        let (_temp, store) = make_store();
        let a = store.add_thought("a").unwrap();
        let b = store.add_thought("b").unwrap();
        assert!(b > a);
    }

    #[test]
    fn blank_thought_rejected() {
        let (_temp, store) = make_store();
        assert!(store.add_thought("").is_err());
        assert!(store.add_thought("  \n\t").is_err());
        assert!(store.list_thoughts(10).unwrap().is_empty());
    }

    #[test]
    fn log_question_appends_entry() {
        let (_temp, store) = make_store();
        let hash = hash_ip("203.0.113.7");
        store.log_question("What is time?", "A river.", &hash).unwrap();

        let log = store.question_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].question, "What is time?");
        assert_eq!(log[0].answer.as_deref(), Some("A river."));
        assert_eq!(log[0].ip_hash, hash);
        assert!(!log[0].created_at.is_empty());
    }

    #[test]
    fn ip_hash_is_truncated_and_deterministic() {
        let a = hash_ip("198.51.100.1");
        assert_eq!(a.len(), IP_HASH_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, hash_ip("198.51.100.1"));
        assert_ne!(a, hash_ip("198.51.100.2"));
    }

    #[test]
    fn uninitialized_store_reports_error() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("missing").join("kai.db"));
        assert!(store.list_thoughts(1).is_err());
    }
}
