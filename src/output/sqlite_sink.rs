//! SQLite sink
//!
//! Listings are upserted by URL, so overlapping checkpoint and final flushes
//! leave one row per listing. Every flush is also logged against the run
//! that produced it.

use crate::normalize::clean_price;
use crate::output::traits::{RunStatus, Sink, SinkError, SinkResult};
use crate::record::PropertyRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQL schema for the listing database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per listing URL, latest snapshot wins
CREATE TABLE IF NOT EXISTS listings (
    listing_url TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    listing_type TEXT NOT NULL,
    title TEXT NOT NULL,
    price TEXT NOT NULL,
    price_value REAL,
    description TEXT NOT NULL,
    location TEXT NOT NULL,
    size_sqm TEXT NOT NULL,
    bedrooms TEXT NOT NULL,
    bathrooms TEXT NOT NULL,
    furnishing_status TEXT NOT NULL,
    agent_name TEXT NOT NULL,
    contact TEXT NOT NULL,
    image_links TEXT NOT NULL,
    property_description TEXT NOT NULL,
    property_type TEXT NOT NULL,
    listing_date TEXT NOT NULL,
    price_per_sqm TEXT NOT NULL,
    first_seen_run INTEGER NOT NULL REFERENCES runs(id),
    last_seen_run INTEGER NOT NULL REFERENCES runs(id),
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_type ON listings(listing_type);
CREATE INDEX IF NOT EXISTS idx_listings_property_type ON listings(property_type);

-- Track every snapshot written
CREATE TABLE IF NOT EXISTS flushes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    label TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    flushed_at TEXT NOT NULL
);
"#;

const UPSERT_LISTING_SQL: &str = "
INSERT INTO listings (
    listing_url, source, listing_type, title, price, price_value, description,
    location, size_sqm, bedrooms, bathrooms, furnishing_status, agent_name, contact,
    image_links, property_description, property_type, listing_date, price_per_sqm,
    first_seen_run, last_seen_run, updated_at
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19,
    ?20, ?20, ?21
)
ON CONFLICT(listing_url) DO UPDATE SET
    source = excluded.source,
    listing_type = excluded.listing_type,
    title = excluded.title,
    price = excluded.price,
    price_value = excluded.price_value,
    description = excluded.description,
    location = excluded.location,
    size_sqm = excluded.size_sqm,
    bedrooms = excluded.bedrooms,
    bathrooms = excluded.bathrooms,
    furnishing_status = excluded.furnishing_status,
    agent_name = excluded.agent_name,
    contact = excluded.contact,
    image_links = excluded.image_links,
    property_description = excluded.property_description,
    property_type = excluded.property_type,
    listing_date = excluded.listing_date,
    price_per_sqm = excluded.price_per_sqm,
    last_seen_run = excluded.last_seen_run,
    updated_at = excluded.updated_at
";

/// Opens (or creates) the listing database and initializes its schema
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Database ready for use
/// * `Err(SinkError)` - Failed to open or initialize
pub fn open_database(path: &Path) -> SinkResult<Connection> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;

    Ok(conn)
}

/// Sink persisting listings into SQLite under one run
pub struct SqliteSink {
    conn: Mutex<Connection>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens the database and records a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration driving this run
    pub fn open(path: &Path, config_hash: &str) -> SinkResult<Self> {
        Self::start_run(open_database(path)?, config_hash)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(config_hash: &str) -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Self::start_run(conn, config_hash)
    }

    fn start_run(conn: Connection, config_hash: &str) -> SinkResult<Self> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.as_str()],
        )?;
        let run_id = conn.last_insert_rowid();

        tracing::debug!(run_id, "Started database run");
        Ok(Self {
            conn: Mutex::new(conn),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs `f` against the locked connection
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> SinkResult<T>,
    ) -> SinkResult<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> SinkResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SinkError::Unavailable(format!("Failed to lock database: {}", e)))
    }
}

impl Sink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(UPSERT_LISTING_SQL)?;
            for record in records {
                let image_links = serde_json::to_string(&record.image_links)?;
                stmt.execute(params![
                    record.listing_url,
                    record.source,
                    record.listing_type,
                    record.title,
                    record.price,
                    clean_price(&record.price),
                    record.description,
                    record.location,
                    record.size_sqm,
                    record.bedrooms,
                    record.bathrooms,
                    record.furnishing_status,
                    record.agent_name,
                    record.contact,
                    image_links,
                    record.property_description,
                    record.property_type.label(),
                    record.listing_date,
                    record.price_per_sqm,
                    self.run_id,
                    now,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO flushes (run_id, label, record_count, flushed_at) VALUES (?1, ?2, ?3, ?4)",
            params![self.run_id, label, records.len() as i64, now],
        )?;
        tx.commit()?;

        tracing::info!(label, records = records.len(), "Upserted listings into database");
        Ok(())
    }

    fn finalize(&self, status: RunStatus) -> SinkResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, self.run_id],
        )?;
        Ok(())
    }
}
