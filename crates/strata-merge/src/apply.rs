//! Policy-driven table writes.
//!
//! Every mergeable table declares its [`MergePolicy`] on [`Table`]; one
//! generic [`apply`] dispatches on that declaration, so the reconciliation
//! rules live in data rather than in per-table code paths.

use std::{collections::HashSet, hash::Hash};

use chrono::NaiveDate;
use strata_core::{
  Error, Result,
  link::{Notice, NoticeTerm, OrgAddress, OrgSector},
  org::{OrgName, Organisation, RegistryMatch},
  policy::{MergePolicy, Table},
  store::CurationTx,
};

// ─── Row binding ─────────────────────────────────────────────────────────────

/// A row type belonging to one mergeable table.
pub trait TableRow: Sized {
  const TABLE: Table;

  /// Natural key, used for within-batch dedup and keep-first replacement.
  type Key: Eq + Hash;

  fn key(&self) -> Self::Key;

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()>;

  /// Delete stored rows matching the given natural keys, returning the
  /// count removed. Only consulted under the keep-first policy.
  fn delete_keys(
    _tx: &mut dyn CurationTx,
    _keys: &[Self::Key],
  ) -> Result<usize> {
    Ok(0)
  }
}

/// Row accounting for one [`apply`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Applied {
  /// Rows written.
  pub inserted:   usize,
  /// Stored rows removed to make way for the batch.
  pub superseded: usize,
  /// Batch rows dropped as duplicates of an earlier batch row.
  pub duplicates: usize,
}

// ─── Preconditions ───────────────────────────────────────────────────────────

/// Reject a dump older than the newest one already merged into `table`.
///
/// Only snapshot-replace tables carry the precondition; replaying an old
/// dump into one would silently rewrite history for its date. Checked
/// before any mutation, so a rejected run leaves the store untouched.
pub fn require_fresh(
  tx: &mut dyn CurationTx,
  table: Table,
  incoming: NaiveDate,
) -> Result<()> {
  if table.policy() != MergePolicy::SnapshotReplace {
    return Ok(());
  }
  if let Some(latest) = tx.latest_date(table)?
    && incoming < latest
  {
    return Err(Error::StaleDump { table: table.name(), incoming, latest });
  }
  Ok(())
}

// ─── Merge dispatch ──────────────────────────────────────────────────────────

/// Keep the first occurrence of each natural key, in batch order.
fn dedup_first<R: TableRow>(rows: Vec<R>) -> (Vec<R>, usize) {
  let before = rows.len();
  let mut seen = HashSet::new();
  let kept: Vec<R> =
    rows.into_iter().filter(|row| seen.insert(row.key())).collect();
  let dropped = before - kept.len();
  (kept, dropped)
}

/// Write `rows` into their table under the table's declared policy.
///
/// `date` is the dump date; snapshot replacement deletes that date's
/// stored rows before inserting. Callers check [`require_fresh`] first.
pub fn apply<R: TableRow>(
  tx: &mut dyn CurationTx,
  date: NaiveDate,
  rows: Vec<R>,
) -> Result<Applied> {
  match R::TABLE.policy() {
    MergePolicy::SnapshotReplace => {
      let (rows, duplicates) = dedup_first(rows);
      let superseded = tx.delete_on(R::TABLE, date)?;
      R::insert(tx, &rows)?;
      Ok(Applied { inserted: rows.len(), superseded, duplicates })
    }
    MergePolicy::AppendOnly => {
      R::insert(tx, &rows)?;
      Ok(Applied { inserted: rows.len(), superseded: 0, duplicates: 0 })
    }
    MergePolicy::KeepFirst => {
      let (rows, duplicates) = dedup_first(rows);
      let keys: Vec<R::Key> = rows.iter().map(|row| row.key()).collect();
      let superseded = R::delete_keys(tx, &keys)?;
      R::insert(tx, &rows)?;
      Ok(Applied { inserted: rows.len(), superseded, duplicates })
    }
  }
}

// ─── Table bindings ──────────────────────────────────────────────────────────

impl TableRow for OrgAddress {
  const TABLE: Table = Table::OrgAddresses;
  type Key = (i64, i64);

  fn key(&self) -> Self::Key {
    (self.org_id, self.address_id)
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_org_addresses(rows)
  }
}

impl TableRow for OrgSector {
  const TABLE: Table = Table::OrgSectors;
  type Key = (i64, i64);

  fn key(&self) -> Self::Key {
    (self.org_id, self.sector_id)
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_org_sectors(rows)
  }
}

impl TableRow for Notice {
  const TABLE: Table = Table::Notices;
  type Key = String;

  fn key(&self) -> Self::Key {
    self.notice_id.clone()
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_notices(rows)
  }
}

impl TableRow for NoticeTerm {
  const TABLE: Table = Table::NoticeTerms;
  type Key = (String, i64);

  fn key(&self) -> Self::Key {
    (self.notice_id.clone(), self.term_id)
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_notice_terms(rows)
  }
}

impl TableRow for Organisation {
  const TABLE: Table = Table::Organisations;
  type Key = i64;

  fn key(&self) -> Self::Key {
    self.org_id
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_organisations(rows)
  }

  fn delete_keys(tx: &mut dyn CurationTx, keys: &[Self::Key]) -> Result<usize> {
    tx.delete_organisations(keys)
  }
}

impl TableRow for OrgName {
  const TABLE: Table = Table::OrgNames;
  type Key = (i64, i32);

  fn key(&self) -> Self::Key {
    (self.org_id, self.age_index)
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_org_names(rows)
  }

  fn delete_keys(tx: &mut dyn CurationTx, keys: &[Self::Key]) -> Result<usize> {
    tx.delete_org_names(keys)
  }
}

impl TableRow for RegistryMatch {
  const TABLE: Table = Table::RegistryMatches;
  type Key = (i64, String);

  fn key(&self) -> Self::Key {
    (self.org_id, self.company_number.clone())
  }

  fn insert(tx: &mut dyn CurationTx, rows: &[Self]) -> Result<()> {
    tx.insert_matches(rows)
  }

  fn delete_keys(tx: &mut dyn CurationTx, keys: &[Self::Key]) -> Result<usize> {
    tx.delete_matches(keys)
  }
}
