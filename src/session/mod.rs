//! Durable session and dedup stores.
//!
//! Both are persistent string-keyed sets. The engine's exactly-once guarantee
//! rests on one primitive: `claim`, an atomic insert-if-absent. The default
//! backend is embedded SQLite in WAL mode with a uniqueness-keyed table —
//! safe across workers and across processes. The append-text alternative is
//! valid only under the single-process single-worker invariant, which config
//! validation enforces.

pub mod textfile;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::config::{HashAlgo, SessionBackend};
use textfile::TextSet;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processed (
    path TEXT PRIMARY KEY,
    claimed_at INTEGER NOT NULL,
    status TEXT NOT NULL
);
"#;

const DEDUP_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hashes (
    digest TEXT PRIMARY KEY,
    first_path TEXT NOT NULL,
    inserted_at INTEGER NOT NULL
);
"#;

async fn open_pool(path: &Path, schema: &str) -> Result<SqlitePool> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store dir {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open store at {}", path.display()))?;

    sqlx::query(schema)
        .execute(&pool)
        .await
        .context("failed to initialize store schema")?;

    Ok(pool)
}

enum Backend {
    Sqlite(SqlitePool),
    Text(TextSet),
}

/// Durable "processed" set keyed by physical path.
///
/// An entry's presence means "do not process this path again, this run or any
/// later run against the same store". Entries are inserted atomically on
/// claim and never updated by the engine.
pub struct SessionStore {
    backend: Backend,
}

impl SessionStore {
    /// Idempotent open-or-create.
    pub async fn open(backend: SessionBackend, path: &Path) -> Result<Self> {
        let backend = match backend {
            SessionBackend::Sqlite => Backend::Sqlite(open_pool(path, SESSION_SCHEMA).await?),
            SessionBackend::Text => Backend::Text(TextSet::open(path)?),
        };
        Ok(Self { backend })
    }

    /// Atomic insert-if-absent. Returns true when this caller won the claim.
    pub async fn claim(&self, path: &str) -> Result<bool, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO processed (path, claimed_at, status) VALUES (?, ?, 'claimed')",
                )
                .bind(path)
                .bind(chrono::Utc::now().timestamp())
                .execute(pool)
                .await?;
                Ok(result.rows_affected() == 1)
            }
            Backend::Text(set) => Ok(set.claim(path)?),
        }
    }

    pub async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT 1 FROM processed WHERE path = ?")
                    .bind(path)
                    .fetch_optional(pool)
                    .await?;
                Ok(row.is_some())
            }
            Backend::Text(set) => Ok(set.contains(path)),
        }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT COUNT(*) AS n FROM processed")
                    .fetch_one(pool)
                    .await?;
                Ok(row.get::<i64, _>("n") as u64)
            }
            Backend::Text(set) => Ok(set.count()),
        }
    }
}

/// Durable content-hash set. A hit means the file body was already emitted
/// once in the lifetime of this store; the file is marked done and skipped.
pub struct DedupStore {
    backend: Backend,
}

impl DedupStore {
    pub async fn open(backend: SessionBackend, path: &Path) -> Result<Self> {
        let backend = match backend {
            SessionBackend::Sqlite => Backend::Sqlite(open_pool(path, DEDUP_SCHEMA).await?),
            SessionBackend::Text => Backend::Text(TextSet::open(path)?),
        };
        Ok(Self { backend })
    }

    /// Atomic first-sighting insert. Returns true when this digest is new.
    pub async fn claim(&self, digest: &str, first_path: &str) -> Result<bool, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO hashes (digest, first_path, inserted_at) VALUES (?, ?, ?)",
                )
                .bind(digest)
                .bind(first_path)
                .bind(chrono::Utc::now().timestamp())
                .execute(pool)
                .await?;
                Ok(result.rows_affected() == 1)
            }
            Backend::Text(set) => Ok(set.claim(digest)?),
        }
    }

    pub async fn contains(&self, digest: &str) -> Result<bool, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT 1 FROM hashes WHERE digest = ?")
                    .bind(digest)
                    .fetch_optional(pool)
                    .await?;
                Ok(row.is_some())
            }
            Backend::Text(set) => Ok(set.contains(digest)),
        }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT COUNT(*) AS n FROM hashes")
                    .fetch_one(pool)
                    .await?;
                Ok(row.get::<i64, _>("n") as u64)
            }
            Backend::Text(set) => Ok(set.count()),
        }
    }
}

/// Hex digest of a file's content under the configured algorithm.
///
/// Hashing reads the whole file in chunks on the blocking pool.
pub async fn hash_file(path: &Path, algo: HashAlgo) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_file_sync(&path, algo))
        .await
        .context("hash task panicked")?
}

fn hash_file_sync(path: &Path, algo: HashAlgo) -> Result<String> {
    use sha1::Digest as _;
    use std::io::Read;

    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {} for hashing", path.display()))?;
    let mut buf = vec![0u8; 64 * 1024];

    match algo {
        HashAlgo::Md5 => {
            let mut ctx = md5::Context::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                ctx.consume(&buf[..n]);
            }
            Ok(hex::encode(ctx.compute().0))
        }
        HashAlgo::Sha1 => {
            let mut hasher = sha1::Sha1::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
        HashAlgo::Sha256 => {
            let mut hasher = sha2::Sha256::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}
