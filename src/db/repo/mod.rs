//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `circles.rs` - Circle and member operations
//! - `rounds.rs` - Round records and settlement finalization
//! - `ledger.rs` - Payment transactions and payouts

mod circles;
mod ledger;
mod rounds;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap round trip used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Row decoding
// =============================================================================
//
// Stored values go through the domain parsers so a corrupt row surfaces as a
// column decode error instead of a silent default.

fn column_error<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| column_error(column, e))
}

fn parse_optional_column<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| s.parse::<T>().map_err(|e| column_error(column, e)))
        .transpose()
}

fn u32_column(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|e| column_error(column, e))
}

fn optional_u32_column(row: &SqliteRow, column: &str) -> Result<Option<u32>, sqlx::Error> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|v| u32::try_from(v).map_err(|e| column_error(column, e)))
        .transpose()
}

fn instant_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let ms: i64 = row.try_get(column)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: format!("timestamp {} out of range", ms).into(),
        })
}
