//! Persistence for search results.

use crate::repo::RepositoryRecord;
use async_trait::async_trait;
use failure::{Error, ResultExt};
use rusqlite::{params, Connection};
use std::convert::TryFrom;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A collection of [`RepositoryRecord`]s which remembers insertion order.
///
/// Each method is atomic on its own, but nothing ties consecutive calls
/// together.
#[async_trait]
pub trait Store: Send + Sync {
    /// Remove every record.
    async fn delete_all(&self) -> Result<(), Error>;

    /// Append `records`, preserving their order.
    async fn insert_many(&self, records: &[RepositoryRecord]) -> Result<(), Error>;

    /// Read up to `limit` records, skipping the first `skip`.
    async fn read(&self, skip: u64, limit: u64) -> Result<Vec<RepositoryRecord>, Error>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    stars INTEGER NOT NULL,
    url TEXT NOT NULL
);
";

/// A [`Store`] backed by a single SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteStore, Error> {
        let path = path.as_ref();
        debug!("Opening the database at {}", path.display());

        let conn = Connection::open(path)
            .with_context(|_| format!("Unable to open {}", path.display()))?;
        SqliteStore::with_connection(conn)
    }

    /// Create a store which only lives as long as the process.
    pub fn in_memory() -> Result<SqliteStore, Error> {
        let conn = Connection::open_in_memory().context("Unable to open an in-memory database")?;
        SqliteStore::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<SqliteStore, Error> {
        conn.execute_batch(SCHEMA)
            .context("Unable to initialize the schema")?;

        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking database operation on the blocking thread pool.
    async fn with_conn<F, T>(&self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| failure::err_msg("The database connection is poisoned"))?;
            op(&mut conn)
        })
        .await
        .context("The database task panicked")?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn delete_all(&self) -> Result<(), Error> {
        self.with_conn(|conn| {
            let deleted = conn
                .execute("DELETE FROM repositories", [])
                .context("Unable to delete the old repositories")?;
            debug!("Deleted {} repositories", deleted);
            Ok(())
        })
        .await
    }

    async fn insert_many(&self, records: &[RepositoryRecord]) -> Result<(), Error> {
        let records = records.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction().context("Unable to start a transaction")?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO repositories (name, description, stars, url)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;

                for record in &records {
                    let stars = i64::try_from(record.stars).with_context(|_| {
                        format!("{} has too many stars to store", record.name)
                    })?;
                    stmt.execute(params![record.name, record.description, stars, record.url])
                        .with_context(|_| format!("Unable to insert {}", record.name))?;
                }
            }

            tx.commit().context("Unable to commit the new repositories")?;
            debug!("Inserted {} repositories", records.len());
            Ok(())
        })
        .await
    }

    async fn read(&self, skip: u64, limit: u64) -> Result<Vec<RepositoryRecord>, Error> {
        let skip = match i64::try_from(skip) {
            Ok(skip) => skip,
            // SQLite can't hold that many rows, so there's nothing to skip to
            Err(_) => return Ok(Vec::new()),
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, description, stars, url FROM repositories
                 ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;

            let rows = stmt.query_map(params![limit, skip], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (name, description, stars, url) =
                    row.context("Unable to read a repository")?;
                let stars = u64::try_from(stars)
                    .with_context(|_| format!("{} has a negative star count", name))?;

                records.push(RepositoryRecord {
                    name,
                    description,
                    stars,
                    url,
                });
            }

            trace!("Read {} repositories (skip={}, limit={})", records.len(), skip, limit);
            Ok(records)
        })
        .await
    }
}
