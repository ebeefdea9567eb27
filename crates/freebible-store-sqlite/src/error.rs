//! Error type for `freebible-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] freebible_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A value did not fit the storage class of its column.
  #[error("cannot store {value} in column {table}.{column}")]
  Encode {
    table:  &'static str,
    column: &'static str,
    value:  serde_json::Value,
  },

  #[error("no column {column:?} on table {table}")]
  UnknownColumn {
    table:  &'static str,
    column: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
