//! [`SqliteStore`], the SQLite implementation of [`CurationStore`].

use std::path::Path;

use chrono::NaiveDate;
use strata_core::{
  Result as CoreResult,
  dimension::{Address, Dimension, Sector, Term},
  link::{Notice, NoticeTerm, OrgAddress, OrgSector},
  org::{OrgName, Organisation, RegistryMatch},
  policy::Table,
  store::{CurationStore, CurationTx},
};

use crate::{
  Error, Result,
  encode::{decode_date, decode_date_opt, encode_date},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Strata curation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CurationStore impl ──────────────────────────────────────────────────────

impl CurationStore for SqliteStore {
  type Error = Error;

  async fn exec<T, F>(&self, run: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn CurationTx) -> CoreResult<T> + Send + 'static,
  {
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let result = run(&mut TxStore { tx: &tx });
        match result {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          // Dropping the uncommitted transaction rolls it back.
          Err(err) => Ok(Err(err)),
        }
      })
      .await?;
    out.map_err(Error::Core)
  }
}

// ─── Transaction view ────────────────────────────────────────────────────────

/// [`CurationTx`] over one open `rusqlite` transaction.
struct TxStore<'c> {
  tx: &'c rusqlite::Transaction<'c>,
}

/// Lift a `rusqlite` result into the core error space.
fn sql<T>(result: rusqlite::Result<T>) -> CoreResult<T> {
  result.map_err(strata_core::Error::storage)
}

const fn has_date_column(table: Table) -> bool {
  matches!(
    table,
    Table::OrgAddresses | Table::OrgSectors | Table::Notices | Table::NoticeTerms
  )
}

impl CurationTx for TxStore<'_> {
  // ── Dimensions ────────────────────────────────────────────────────────

  fn dimension_keys(&mut self, dim: Dimension) -> CoreResult<Vec<(String, i64)>> {
    sql(scan_keys(self.tx, match dim {
      Dimension::Address => "SELECT canon_key, address_id FROM addresses",
      Dimension::Sector => "SELECT canon_key, sector_id FROM sectors",
      Dimension::Term => "SELECT canon_key, term_id FROM terms",
    }))
  }

  fn insert_addresses(&mut self, rows: &[Address]) -> CoreResult<()> {
    sql(insert_addresses(self.tx, rows))
  }

  fn insert_sectors(&mut self, rows: &[Sector]) -> CoreResult<()> {
    sql(insert_sectors(self.tx, rows))
  }

  fn insert_terms(&mut self, rows: &[Term]) -> CoreResult<()> {
    sql(insert_terms(self.tx, rows))
  }

  fn addresses(&mut self) -> CoreResult<Vec<Address>> {
    sql(scan_addresses(self.tx))
  }

  fn sectors(&mut self) -> CoreResult<Vec<Sector>> {
    sql(scan_sectors(self.tx))
  }

  fn terms(&mut self) -> CoreResult<Vec<Term>> {
    let raw = sql(scan_terms(self.tx))?;
    raw
      .into_iter()
      .map(|(term_id, canon_key, term, first_seen)| {
        Ok(Term {
          term_id,
          canon_key,
          term,
          first_seen: decode_date("first_seen", &first_seen)?,
        })
      })
      .collect()
  }

  // ── Dated association tables ──────────────────────────────────────────

  fn latest_date(&mut self, table: Table) -> CoreResult<Option<NaiveDate>> {
    if !has_date_column(table) {
      return Ok(None);
    }
    let text: Option<String> = sql(self.tx.query_row(
      &format!("SELECT MAX(date) FROM {}", table.name()),
      [],
      |row| row.get(0),
    ))?;
    decode_date_opt("date", text.as_deref())
  }

  fn delete_on(&mut self, table: Table, date: NaiveDate) -> CoreResult<usize> {
    if !has_date_column(table) {
      return Ok(0);
    }
    sql(self.tx.execute(
      &format!("DELETE FROM {} WHERE date = ?1", table.name()),
      rusqlite::params![encode_date(date)],
    ))
  }

  fn insert_org_addresses(&mut self, rows: &[OrgAddress]) -> CoreResult<()> {
    sql(insert_org_addresses(self.tx, rows))
  }

  fn insert_org_sectors(&mut self, rows: &[OrgSector]) -> CoreResult<()> {
    sql(insert_org_sectors(self.tx, rows))
  }

  fn insert_notices(&mut self, rows: &[Notice]) -> CoreResult<()> {
    sql(insert_notices(self.tx, rows))
  }

  fn insert_notice_terms(&mut self, rows: &[NoticeTerm]) -> CoreResult<()> {
    sql(insert_notice_terms(self.tx, rows))
  }

  fn org_addresses(&mut self) -> CoreResult<Vec<OrgAddress>> {
    let raw = sql(scan_org_addresses(self.tx))?;
    raw
      .into_iter()
      .map(|(org_id, address_id, rank, date)| {
        Ok(OrgAddress {
          org_id,
          address_id,
          rank,
          date: decode_date("date", &date)?,
        })
      })
      .collect()
  }

  fn org_sectors(&mut self) -> CoreResult<Vec<OrgSector>> {
    let raw = sql(scan_org_sectors(self.tx))?;
    raw
      .into_iter()
      .map(|(org_id, sector_id, rank, date)| {
        Ok(OrgSector {
          org_id,
          sector_id,
          rank,
          date: decode_date("date", &date)?,
        })
      })
      .collect()
  }

  fn notices(&mut self) -> CoreResult<Vec<Notice>> {
    let raw = sql(scan_notices(self.tx))?;
    raw
      .into_iter()
      .map(|(notice_id, org_id, snippet, url, date)| {
        Ok(Notice {
          notice_id,
          org_id,
          snippet,
          url,
          date: decode_date("date", &date)?,
        })
      })
      .collect()
  }

  fn notice_terms(&mut self) -> CoreResult<Vec<NoticeTerm>> {
    let raw = sql(scan_notice_terms(self.tx))?;
    raw
      .into_iter()
      .map(|(notice_id, term_id, date)| {
        Ok(NoticeTerm { notice_id, term_id, date: decode_date("date", &date)? })
      })
      .collect()
  }

  // ── Registry records (keep-first natural keys) ────────────────────────

  fn delete_organisations(&mut self, ids: &[i64]) -> CoreResult<usize> {
    sql(delete_organisations(self.tx, ids))
  }

  fn insert_organisations(&mut self, rows: &[Organisation]) -> CoreResult<()> {
    sql(insert_organisations(self.tx, rows))
  }

  fn deactivate_organisations(&mut self) -> CoreResult<usize> {
    sql(self.tx.execute("UPDATE organisations SET active = 0", []))
  }

  fn organisations(&mut self) -> CoreResult<Vec<Organisation>> {
    sql(scan_organisations(self.tx))
  }

  fn delete_org_names(&mut self, keys: &[(i64, i32)]) -> CoreResult<usize> {
    sql(delete_org_names(self.tx, keys))
  }

  fn insert_org_names(&mut self, rows: &[OrgName]) -> CoreResult<()> {
    sql(insert_org_names(self.tx, rows))
  }

  fn org_names(&mut self) -> CoreResult<Vec<OrgName>> {
    let raw = sql(scan_org_names(self.tx))?;
    raw
      .into_iter()
      .map(|(org_id, age_index, name, invalid_date)| {
        Ok(OrgName {
          org_id,
          age_index,
          name,
          invalid_date: decode_date_opt(
            "invalid_date",
            invalid_date.as_deref(),
          )?,
        })
      })
      .collect()
  }

  fn delete_matches(&mut self, keys: &[(i64, String)]) -> CoreResult<usize> {
    sql(delete_matches(self.tx, keys))
  }

  fn insert_matches(&mut self, rows: &[RegistryMatch]) -> CoreResult<()> {
    sql(insert_matches(self.tx, rows))
  }

  fn matches(&mut self) -> CoreResult<Vec<RegistryMatch>> {
    sql(scan_matches(self.tx))
  }
}

// ─── SQL helpers ─────────────────────────────────────────────────────────────

fn scan_keys(
  tx: &rusqlite::Transaction<'_>,
  sql_text: &str,
) -> rusqlite::Result<Vec<(String, i64)>> {
  let mut stmt = tx.prepare(sql_text)?;
  stmt
    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect()
}

fn insert_addresses(
  tx: &rusqlite::Transaction<'_>,
  rows: &[Address],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO addresses (address_id, canon_key, address_text, postcode)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.address_id,
      row.canon_key,
      row.address_text,
      row.postcode,
    ])?;
  }
  Ok(())
}

fn insert_sectors(
  tx: &rusqlite::Transaction<'_>,
  rows: &[Sector],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO sectors (sector_id, canon_key, name) VALUES (?1, ?2, ?3)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![row.sector_id, row.canon_key, row.name])?;
  }
  Ok(())
}

fn insert_terms(
  tx: &rusqlite::Transaction<'_>,
  rows: &[Term],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO terms (term_id, canon_key, term, first_seen)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.term_id,
      row.canon_key,
      row.term,
      encode_date(row.first_seen),
    ])?;
  }
  Ok(())
}

fn scan_addresses(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<Address>> {
  let mut stmt = tx.prepare(
    "SELECT address_id, canon_key, address_text, postcode FROM addresses
     ORDER BY address_id",
  )?;
  stmt
    .query_map([], |row| {
      Ok(Address {
        address_id:   row.get(0)?,
        canon_key:    row.get(1)?,
        address_text: row.get(2)?,
        postcode:     row.get(3)?,
      })
    })?
    .collect()
}

fn scan_sectors(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<Sector>> {
  let mut stmt = tx.prepare(
    "SELECT sector_id, canon_key, name FROM sectors ORDER BY sector_id",
  )?;
  stmt
    .query_map([], |row| {
      Ok(Sector {
        sector_id: row.get(0)?,
        canon_key: row.get(1)?,
        name:      row.get(2)?,
      })
    })?
    .collect()
}

fn scan_terms(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(i64, String, String, String)>> {
  let mut stmt = tx.prepare(
    "SELECT term_id, canon_key, term, first_seen FROM terms ORDER BY term_id",
  )?;
  stmt
    .query_map([], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?
    .collect()
}

fn insert_org_addresses(
  tx: &rusqlite::Transaction<'_>,
  rows: &[OrgAddress],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO organisation_addresses (org_id, address_id, rank, date)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.org_id,
      row.address_id,
      row.rank,
      encode_date(row.date),
    ])?;
  }
  Ok(())
}

fn insert_org_sectors(
  tx: &rusqlite::Transaction<'_>,
  rows: &[OrgSector],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO organisation_sectors (org_id, sector_id, rank, date)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.org_id,
      row.sector_id,
      row.rank,
      encode_date(row.date),
    ])?;
  }
  Ok(())
}

fn insert_notices(
  tx: &rusqlite::Transaction<'_>,
  rows: &[Notice],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO notices (notice_id, org_id, snippet, url, date)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.notice_id,
      row.org_id,
      row.snippet,
      row.url,
      encode_date(row.date),
    ])?;
  }
  Ok(())
}

fn insert_notice_terms(
  tx: &rusqlite::Transaction<'_>,
  rows: &[NoticeTerm],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO notice_terms (notice_id, term_id, date) VALUES (?1, ?2, ?3)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.notice_id,
      row.term_id,
      encode_date(row.date),
    ])?;
  }
  Ok(())
}

fn scan_org_addresses(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(i64, i64, i32, String)>> {
  let mut stmt = tx.prepare(
    "SELECT org_id, address_id, rank, date FROM organisation_addresses
     ORDER BY org_id, address_id, date",
  )?;
  stmt
    .query_map([], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?
    .collect()
}

fn scan_org_sectors(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(i64, i64, i32, String)>> {
  let mut stmt = tx.prepare(
    "SELECT org_id, sector_id, rank, date FROM organisation_sectors
     ORDER BY org_id, sector_id, date",
  )?;
  stmt
    .query_map([], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?
    .collect()
}

fn scan_notices(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(String, i64, String, String, String)>> {
  let mut stmt = tx.prepare(
    "SELECT notice_id, org_id, snippet, url, date FROM notices
     ORDER BY notice_id",
  )?;
  stmt
    .query_map([], |row| {
      Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
      ))
    })?
    .collect()
}

fn scan_notice_terms(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(String, i64, String)>> {
  let mut stmt = tx.prepare(
    "SELECT notice_id, term_id, date FROM notice_terms
     ORDER BY notice_id, term_id",
  )?;
  stmt
    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
    .collect()
}

fn delete_organisations(
  tx: &rusqlite::Transaction<'_>,
  ids: &[i64],
) -> rusqlite::Result<usize> {
  let mut stmt = tx.prepare("DELETE FROM organisations WHERE org_id = ?1")?;
  let mut removed = 0;
  for id in ids {
    removed += stmt.execute(rusqlite::params![id])?;
  }
  Ok(removed)
}

fn insert_organisations(
  tx: &rusqlite::Transaction<'_>,
  rows: &[Organisation],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO organisations (org_id, name, website, active)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.org_id,
      row.name,
      row.website,
      row.active,
    ])?;
  }
  Ok(())
}

fn scan_organisations(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<Organisation>> {
  let mut stmt = tx.prepare(
    "SELECT org_id, name, website, active FROM organisations ORDER BY org_id",
  )?;
  stmt
    .query_map([], |row| {
      Ok(Organisation {
        org_id:  row.get(0)?,
        name:    row.get(1)?,
        website: row.get(2)?,
        active:  row.get(3)?,
      })
    })?
    .collect()
}

fn delete_org_names(
  tx: &rusqlite::Transaction<'_>,
  keys: &[(i64, i32)],
) -> rusqlite::Result<usize> {
  let mut stmt = tx.prepare(
    "DELETE FROM organisation_names WHERE org_id = ?1 AND age_index = ?2",
  )?;
  let mut removed = 0;
  for (org_id, age_index) in keys {
    removed += stmt.execute(rusqlite::params![org_id, age_index])?;
  }
  Ok(removed)
}

fn insert_org_names(
  tx: &rusqlite::Transaction<'_>,
  rows: &[OrgName],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO organisation_names (org_id, age_index, name, invalid_date)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.org_id,
      row.age_index,
      row.name,
      row.invalid_date.map(encode_date),
    ])?;
  }
  Ok(())
}

fn scan_org_names(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<(i64, i32, String, Option<String>)>> {
  let mut stmt = tx.prepare(
    "SELECT org_id, age_index, name, invalid_date FROM organisation_names
     ORDER BY org_id, age_index",
  )?;
  stmt
    .query_map([], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?
    .collect()
}

fn delete_matches(
  tx: &rusqlite::Transaction<'_>,
  keys: &[(i64, String)],
) -> rusqlite::Result<usize> {
  let mut stmt = tx.prepare(
    "DELETE FROM registry_matches WHERE org_id = ?1 AND company_number = ?2",
  )?;
  let mut removed = 0;
  for (org_id, company_number) in keys {
    removed += stmt.execute(rusqlite::params![org_id, company_number])?;
  }
  Ok(removed)
}

fn insert_matches(
  tx: &rusqlite::Transaction<'_>,
  rows: &[RegistryMatch],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO registry_matches (org_id, company_number, score)
     VALUES (?1, ?2, ?3)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.org_id,
      row.company_number,
      row.score,
    ])?;
  }
  Ok(())
}

fn scan_matches(
  tx: &rusqlite::Transaction<'_>,
) -> rusqlite::Result<Vec<RegistryMatch>> {
  let mut stmt = tx.prepare(
    "SELECT org_id, company_number, score FROM registry_matches
     ORDER BY org_id, company_number",
  )?;
  stmt
    .query_map([], |row| {
      Ok(RegistryMatch {
        org_id:         row.get(0)?,
        company_number: row.get(1)?,
        score:          row.get(2)?,
      })
    })?
    .collect()
}
