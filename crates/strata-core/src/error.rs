//! Error types for `strata-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An incoming dump is older than data already merged into the table.
  ///
  /// Raised before any mutation: snapshot-replace tables only ever move
  /// forward in time.
  #[error(
    "stale dump for {table}: incoming {incoming} is older than merged {latest}"
  )]
  StaleDump {
    table:    &'static str,
    incoming: NaiveDate,
    latest:   NaiveDate,
  },

  /// A uniqueness or primary-key constraint was violated.
  #[error("constraint violation in {table}: {detail}")]
  Constraint { table: &'static str, detail: String },

  /// A stored date column failed to parse.
  #[error("invalid date in {column}: {value:?}")]
  InvalidDate { column: &'static str, value: String },

  /// Error surfaced by the storage backend.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
  /// Wrap a backend error into [`Error::Storage`].
  pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
