//! Store traits: the transactional surface merge runs write through.
//!
//! [`CurationTx`] is a synchronous, object-safe view of one open
//! transaction; backends decide how a transaction is obtained.
//! [`CurationStore`] is the async entry point that hands a closure a fresh
//! transaction, committing on success and rolling back on error.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  Result,
  dimension::{Address, Dimension, Sector, Term},
  link::{Notice, NoticeTerm, OrgAddress, OrgSector},
  org::{OrgName, Organisation, RegistryMatch},
  policy::Table,
};

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Operations available inside one merge transaction.
///
/// Writes issued through one `CurationTx` either all commit or all roll
/// back. Methods take `&mut self` because backends hold statement state.
pub trait CurationTx {
  // ── Dimensions ────────────────────────────────────────────────────────

  /// Full scan of a dimension table as `(canonical key, surrogate id)`
  /// pairs. Seeds the allocator; called once at the start of a run.
  fn dimension_keys(&mut self, dim: Dimension) -> Result<Vec<(String, i64)>>;

  fn insert_addresses(&mut self, rows: &[Address]) -> Result<()>;
  fn insert_sectors(&mut self, rows: &[Sector]) -> Result<()>;
  fn insert_terms(&mut self, rows: &[Term]) -> Result<()>;

  fn addresses(&mut self) -> Result<Vec<Address>>;
  fn sectors(&mut self) -> Result<Vec<Sector>>;
  fn terms(&mut self) -> Result<Vec<Term>>;

  // ── Dated association tables ──────────────────────────────────────────

  /// Latest dump date present in `table`, or `None` for an empty table.
  /// Tables without a date column always return `None`.
  fn latest_date(&mut self, table: Table) -> Result<Option<NaiveDate>>;

  /// Delete every row of `table` carrying exactly `date`; returns the
  /// number of rows removed. No-op for tables without a date column.
  fn delete_on(&mut self, table: Table, date: NaiveDate) -> Result<usize>;

  fn insert_org_addresses(&mut self, rows: &[OrgAddress]) -> Result<()>;
  fn insert_org_sectors(&mut self, rows: &[OrgSector]) -> Result<()>;
  fn insert_notices(&mut self, rows: &[Notice]) -> Result<()>;
  fn insert_notice_terms(&mut self, rows: &[NoticeTerm]) -> Result<()>;

  fn org_addresses(&mut self) -> Result<Vec<OrgAddress>>;
  fn org_sectors(&mut self) -> Result<Vec<OrgSector>>;
  fn notices(&mut self) -> Result<Vec<Notice>>;
  fn notice_terms(&mut self) -> Result<Vec<NoticeTerm>>;

  // ── Registry records (keep-first natural keys) ────────────────────────

  fn delete_organisations(&mut self, ids: &[i64]) -> Result<usize>;
  fn insert_organisations(&mut self, rows: &[Organisation]) -> Result<()>;
  /// Clear the active flag on every stored organisation; returns the
  /// number of rows touched.
  fn deactivate_organisations(&mut self) -> Result<usize>;
  fn organisations(&mut self) -> Result<Vec<Organisation>>;

  fn delete_org_names(&mut self, keys: &[(i64, i32)]) -> Result<usize>;
  fn insert_org_names(&mut self, rows: &[OrgName]) -> Result<()>;
  fn org_names(&mut self) -> Result<Vec<OrgName>>;

  fn delete_matches(&mut self, keys: &[(i64, String)]) -> Result<usize>;
  fn insert_matches(&mut self, rows: &[RegistryMatch]) -> Result<()>;
  fn matches(&mut self) -> Result<Vec<RegistryMatch>>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store capable of running merge transactions.
///
/// `exec` opens a transaction, hands it to `run`, commits when the closure
/// returns `Ok` and rolls back when it returns `Err`. Domain errors pass
/// through into the backend error type via `From`.
///
/// The future is `Send` so stores can be driven from multi-threaded async
/// runtimes.
pub trait CurationStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  fn exec<T, F>(
    &self,
    run: F,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn CurationTx) -> Result<T> + Send + 'static;
}
