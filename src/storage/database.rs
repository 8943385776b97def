//! SQLite Database
//!
//! Contact storage using rusqlite with r2d2 connection pooling. Two tables,
//! `phone` and `email`, each holding an auto-assigned id and one text value.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use relay_bot_core::ContactKind;
use rusqlite::params;
use serde::Serialize;

use crate::utils::error::{AppError, AppResult};

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// One stored phone number or e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub id: i64,
    pub value: String,
}

/// Persistence seam used by the dispatcher.
pub trait ContactStore: Send + Sync {
    /// Insert every value as its own row. All-or-nothing: either every value
    /// is stored or none is. Returns the number of rows written.
    fn insert(&self, kind: ContactKind, values: &[String]) -> AppResult<usize>;

    /// All rows of the table in id order.
    fn list(&self, kind: ContactKind) -> AppResult<Vec<ContactRecord>>;
}

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a database from an existing connection pool.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// The pool holds a single connection so every caller sees the same
    /// in-memory database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        tracing::info!(path = %path.display(), "Opened contact database");
        Self::from_pool(pool)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS phone (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS email (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    // ========================================================================
    // Contact Operations
    // ========================================================================

    pub fn insert_phones(&self, phones: &[String]) -> AppResult<usize> {
        self.insert(ContactKind::Phone, phones)
    }

    pub fn insert_emails(&self, emails: &[String]) -> AppResult<usize> {
        self.insert(ContactKind::Email, emails)
    }

    pub fn list_phones(&self) -> AppResult<Vec<ContactRecord>> {
        self.list(ContactKind::Phone)
    }

    pub fn list_emails(&self) -> AppResult<Vec<ContactRecord>> {
        self.list(ContactKind::Email)
    }
}

impl ContactStore for Database {
    fn insert(&self, kind: ContactKind, values: &[String]) -> AppResult<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_connection()?;
        // Dropping the transaction without commit rolls the batch back.
        let tx = conn.transaction()?;
        {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES (?1)",
                kind.table(),
                kind.column()
            );
            let mut stmt = tx.prepare(&sql)?;
            for value in values {
                stmt.execute(params![value])?;
            }
        }
        tx.commit()?;

        tracing::debug!(table = kind.table(), count = values.len(), "Inserted contacts");
        Ok(values.len())
    }

    fn list(&self, kind: ContactKind) -> AppResult<Vec<ContactRecord>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id",
            kind.column(),
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ContactRecord {
                    id: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
