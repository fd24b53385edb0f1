//! SQLite implementation of the RecordStore trait

use crate::error::{QuoteError, Result};
use crate::model::{FileRef, NewQuote, QuoteId, QuoteRequest, ServiceType};
use crate::records::RecordStore;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS quote_requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL DEFAULT '',
        service_address TEXT NOT NULL,
        service_type TEXT NOT NULL,
        description TEXT NOT NULL,
        image TEXT,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS quote_requests_created_at ON quote_requests (created_at);
";

const COLUMNS: &str = "id, first_name, last_name, email, phone, service_address, \
                       service_type, description, image, created_at";

/// SQLite implementation of RecordStore.
///
/// `created_at` is stored as microseconds since the epoch so the cutoff
/// comparison is a plain integer comparison.
pub struct SQLiteRecordStore {
    conn: Mutex<Connection>,
}

impl SQLiteRecordStore {
    /// Open (creating if needed) the database at `db_path`
    pub fn open(db_path: &Path, wal_mode: bool) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| QuoteError::Storage(e.into()))?;
            }
        }
        let conn = Connection::open(db_path)?;
        if wal_mode {
            let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
            info!("SQLite journal mode: {}", mode);
        }
        info!("Using SQLite record store at {}", db_path.display());
        Self::with_connection(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn query_many(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<QuoteRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, quote_from_row)?;

        let mut quotes = Vec::new();
        for row in rows {
            quotes.push(row?);
        }
        Ok(quotes)
    }
}

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<QuoteRequest> {
    let service_type: String = row.get(6)?;
    let service_type = service_type
        .parse::<ServiceType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    let created_at: i64 = row.get(9)?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(created_at)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(9, created_at))?;

    let phone: String = row.get(4)?;

    Ok(QuoteRequest {
        id: QuoteId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: if phone.is_empty() { None } else { Some(phone) },
        service_address: row.get(5)?,
        service_type,
        description: row.get(7)?,
        image: FileRef::from_column(row.get(8)?),
        created_at,
    })
}

impl RecordStore for SQLiteRecordStore {
    fn insert(&self, quote: &NewQuote, image: Option<&FileRef>, created_at: DateTime<Utc>) -> Result<QuoteRequest> {
        let id = {
            let conn = self.conn();
            conn.execute(
                "INSERT INTO quote_requests (first_name, last_name, email, phone, service_address, \
                 service_type, description, image, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    quote.first_name,
                    quote.last_name,
                    quote.email,
                    quote.phone.as_deref().unwrap_or(""),
                    quote.service_address,
                    quote.service_type.as_str(),
                    quote.description,
                    image.map(FileRef::as_str),
                    created_at.timestamp_micros(),
                ],
            )?;
            QuoteId(conn.last_insert_rowid())
        };
        self.get(id)
    }

    fn get(&self, id: QuoteId) -> Result<QuoteRequest> {
        let conn = self.conn();
        let sql = format!("SELECT {} FROM quote_requests WHERE id = ?1", COLUMNS);
        conn.query_row(&sql, params![id.0], quote_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => QuoteError::NotFound(id),
                other => QuoteError::Database(other),
            })
    }

    fn update(&self, quote: &QuoteRequest) -> Result<()> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE quote_requests SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, \
             service_address = ?5, service_type = ?6, description = ?7, image = ?8 WHERE id = ?9",
            params![
                quote.first_name,
                quote.last_name,
                quote.email,
                quote.phone.as_deref().unwrap_or(""),
                quote.service_address,
                quote.service_type.as_str(),
                quote.description,
                quote.image.as_ref().map(FileRef::as_str),
                quote.id.0,
            ],
        )?;
        if changed == 0 {
            return Err(QuoteError::NotFound(quote.id));
        }
        Ok(())
    }

    fn delete(&self, id: QuoteId) -> Result<bool> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM quote_requests WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn created_on_or_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<QuoteRequest>> {
        let sql = format!(
            "SELECT {} FROM quote_requests WHERE created_at <= ?1 ORDER BY id",
            COLUMNS
        );
        self.query_many(&sql, params![cutoff.timestamp_micros()])
    }

    fn list(&self) -> Result<Vec<QuoteRequest>> {
        let sql = format!(
            "SELECT {} FROM quote_requests ORDER BY created_at DESC, id DESC",
            COLUMNS
        );
        self.query_many(&sql, [])
    }
}
