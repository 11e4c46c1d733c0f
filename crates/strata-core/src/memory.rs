//! In-memory reference store.
//!
//! Keeps the whole dataset in plain vectors behind a mutex. `exec` clones
//! the committed state, runs the closure against the clone, and swaps it
//! back only on success, which gives the same commit/rollback contract the
//! SQLite backend gets from real transactions. Uniqueness checks mirror the
//! SQLite schema so both backends surface the same conflicts.
//!
//! Writes land via whole-state swap under the single-writer-per-table merge
//! model; concurrent `exec` calls are last-write-wins.

use std::{
  collections::HashSet,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::NaiveDate;

use crate::{
  Error, Result,
  dimension::{Address, Dimension, Sector, Term},
  link::{Notice, NoticeTerm, OrgAddress, OrgSector},
  org::{OrgName, Organisation, RegistryMatch},
  policy::Table,
  store::{CurationStore, CurationTx},
};

// ─── State ───────────────────────────────────────────────────────────────────

/// The complete dataset held by a [`MemStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemState {
  pub addresses:     Vec<Address>,
  pub sectors:       Vec<Sector>,
  pub terms:         Vec<Term>,
  pub org_addresses: Vec<OrgAddress>,
  pub org_sectors:   Vec<OrgSector>,
  pub notices:       Vec<Notice>,
  pub notice_terms:  Vec<NoticeTerm>,
  pub organisations: Vec<Organisation>,
  pub org_names:     Vec<OrgName>,
  pub matches:       Vec<RegistryMatch>,
}

/// A transaction over a borrowed [`MemState`]. All writes target the
/// borrowed state; the owning store discards it on error.
#[derive(Debug)]
pub struct MemTx<'a> {
  state: &'a mut MemState,
}

impl<'a> MemTx<'a> {
  pub fn new(state: &'a mut MemState) -> Self {
    Self { state }
  }
}

fn conflict(table: &'static str, detail: String) -> Error {
  Error::Constraint { table, detail }
}

/// Delete-where over a vector; returns the number of rows removed.
fn remove_where<R>(rows: &mut Vec<R>, predicate: impl Fn(&R) -> bool) -> usize {
  let before = rows.len();
  rows.retain(|row| !predicate(row));
  before - rows.len()
}

impl CurationTx for MemTx<'_> {
  fn dimension_keys(&mut self, dim: Dimension) -> Result<Vec<(String, i64)>> {
    Ok(match dim {
      Dimension::Address => self
        .state
        .addresses
        .iter()
        .map(|a| (a.canon_key.clone(), a.address_id))
        .collect(),
      Dimension::Sector => self
        .state
        .sectors
        .iter()
        .map(|s| (s.canon_key.clone(), s.sector_id))
        .collect(),
      Dimension::Term => self
        .state
        .terms
        .iter()
        .map(|t| (t.canon_key.clone(), t.term_id))
        .collect(),
    })
  }

  fn insert_addresses(&mut self, rows: &[Address]) -> Result<()> {
    let mut keys: HashSet<String> = self
      .state
      .addresses
      .iter()
      .map(|a| a.canon_key.clone())
      .collect();
    for row in rows {
      if !keys.insert(row.canon_key.clone()) {
        return Err(conflict(
          Dimension::Address.table_name(),
          format!("duplicate canon_key {:?}", row.canon_key),
        ));
      }
    }
    self.state.addresses.extend_from_slice(rows);
    Ok(())
  }

  fn insert_sectors(&mut self, rows: &[Sector]) -> Result<()> {
    let mut keys: HashSet<String> = self
      .state
      .sectors
      .iter()
      .map(|s| s.canon_key.clone())
      .collect();
    for row in rows {
      if !keys.insert(row.canon_key.clone()) {
        return Err(conflict(
          Dimension::Sector.table_name(),
          format!("duplicate canon_key {:?}", row.canon_key),
        ));
      }
    }
    self.state.sectors.extend_from_slice(rows);
    Ok(())
  }

  fn insert_terms(&mut self, rows: &[Term]) -> Result<()> {
    let mut keys: HashSet<String> = self
      .state
      .terms
      .iter()
      .map(|t| t.canon_key.clone())
      .collect();
    for row in rows {
      if !keys.insert(row.canon_key.clone()) {
        return Err(conflict(
          Dimension::Term.table_name(),
          format!("duplicate canon_key {:?}", row.canon_key),
        ));
      }
    }
    self.state.terms.extend_from_slice(rows);
    Ok(())
  }

  fn addresses(&mut self) -> Result<Vec<Address>> {
    Ok(self.state.addresses.clone())
  }

  fn sectors(&mut self) -> Result<Vec<Sector>> {
    Ok(self.state.sectors.clone())
  }

  fn terms(&mut self) -> Result<Vec<Term>> {
    Ok(self.state.terms.clone())
  }

  fn latest_date(&mut self, table: Table) -> Result<Option<NaiveDate>> {
    Ok(match table {
      Table::OrgAddresses => {
        self.state.org_addresses.iter().map(|l| l.date).max()
      }
      Table::OrgSectors => self.state.org_sectors.iter().map(|l| l.date).max(),
      Table::Notices => self.state.notices.iter().map(|n| n.date).max(),
      Table::NoticeTerms => self.state.notice_terms.iter().map(|l| l.date).max(),
      Table::Organisations | Table::OrgNames | Table::RegistryMatches => None,
    })
  }

  fn delete_on(&mut self, table: Table, date: NaiveDate) -> Result<usize> {
    Ok(match table {
      Table::OrgAddresses => {
        remove_where(&mut self.state.org_addresses, |l| l.date == date)
      }
      Table::OrgSectors => {
        remove_where(&mut self.state.org_sectors, |l| l.date == date)
      }
      Table::Notices => remove_where(&mut self.state.notices, |n| n.date == date),
      Table::NoticeTerms => {
        remove_where(&mut self.state.notice_terms, |l| l.date == date)
      }
      Table::Organisations | Table::OrgNames | Table::RegistryMatches => 0,
    })
  }

  fn insert_org_addresses(&mut self, rows: &[OrgAddress]) -> Result<()> {
    let mut keys: HashSet<(i64, i64, NaiveDate)> = self
      .state
      .org_addresses
      .iter()
      .map(|l| (l.org_id, l.address_id, l.date))
      .collect();
    for row in rows {
      if !keys.insert((row.org_id, row.address_id, row.date)) {
        return Err(conflict(
          Table::OrgAddresses.name(),
          format!(
            "duplicate link ({}, {}, {})",
            row.org_id, row.address_id, row.date
          ),
        ));
      }
    }
    self.state.org_addresses.extend_from_slice(rows);
    Ok(())
  }

  fn insert_org_sectors(&mut self, rows: &[OrgSector]) -> Result<()> {
    let mut keys: HashSet<(i64, i64, NaiveDate)> = self
      .state
      .org_sectors
      .iter()
      .map(|l| (l.org_id, l.sector_id, l.date))
      .collect();
    for row in rows {
      if !keys.insert((row.org_id, row.sector_id, row.date)) {
        return Err(conflict(
          Table::OrgSectors.name(),
          format!(
            "duplicate link ({}, {}, {})",
            row.org_id, row.sector_id, row.date
          ),
        ));
      }
    }
    self.state.org_sectors.extend_from_slice(rows);
    Ok(())
  }

  fn insert_notices(&mut self, rows: &[Notice]) -> Result<()> {
    let mut keys: HashSet<String> = self
      .state
      .notices
      .iter()
      .map(|n| n.notice_id.clone())
      .collect();
    for row in rows {
      if !keys.insert(row.notice_id.clone()) {
        return Err(conflict(
          Table::Notices.name(),
          format!("duplicate notice_id {:?}", row.notice_id),
        ));
      }
    }
    self.state.notices.extend_from_slice(rows);
    Ok(())
  }

  fn insert_notice_terms(&mut self, rows: &[NoticeTerm]) -> Result<()> {
    let mut keys: HashSet<(String, i64)> = self
      .state
      .notice_terms
      .iter()
      .map(|l| (l.notice_id.clone(), l.term_id))
      .collect();
    for row in rows {
      if !keys.insert((row.notice_id.clone(), row.term_id)) {
        return Err(conflict(
          Table::NoticeTerms.name(),
          format!("duplicate link ({:?}, {})", row.notice_id, row.term_id),
        ));
      }
    }
    self.state.notice_terms.extend_from_slice(rows);
    Ok(())
  }

  fn org_addresses(&mut self) -> Result<Vec<OrgAddress>> {
    Ok(self.state.org_addresses.clone())
  }

  fn org_sectors(&mut self) -> Result<Vec<OrgSector>> {
    Ok(self.state.org_sectors.clone())
  }

  fn notices(&mut self) -> Result<Vec<Notice>> {
    Ok(self.state.notices.clone())
  }

  fn notice_terms(&mut self) -> Result<Vec<NoticeTerm>> {
    Ok(self.state.notice_terms.clone())
  }

  fn delete_organisations(&mut self, ids: &[i64]) -> Result<usize> {
    Ok(remove_where(&mut self.state.organisations, |o| {
      ids.contains(&o.org_id)
    }))
  }

  fn insert_organisations(&mut self, rows: &[Organisation]) -> Result<()> {
    let mut keys: HashSet<i64> =
      self.state.organisations.iter().map(|o| o.org_id).collect();
    for row in rows {
      if !keys.insert(row.org_id) {
        return Err(conflict(
          Table::Organisations.name(),
          format!("duplicate org_id {}", row.org_id),
        ));
      }
    }
    self.state.organisations.extend_from_slice(rows);
    Ok(())
  }

  fn deactivate_organisations(&mut self) -> Result<usize> {
    for org in &mut self.state.organisations {
      org.active = false;
    }
    Ok(self.state.organisations.len())
  }

  fn organisations(&mut self) -> Result<Vec<Organisation>> {
    Ok(self.state.organisations.clone())
  }

  fn delete_org_names(&mut self, keys: &[(i64, i32)]) -> Result<usize> {
    Ok(remove_where(&mut self.state.org_names, |n| {
      keys.contains(&(n.org_id, n.age_index))
    }))
  }

  fn insert_org_names(&mut self, rows: &[OrgName]) -> Result<()> {
    let mut keys: HashSet<(i64, i32)> = self
      .state
      .org_names
      .iter()
      .map(|n| (n.org_id, n.age_index))
      .collect();
    for row in rows {
      if !keys.insert((row.org_id, row.age_index)) {
        return Err(conflict(
          Table::OrgNames.name(),
          format!("duplicate key ({}, {})", row.org_id, row.age_index),
        ));
      }
    }
    self.state.org_names.extend_from_slice(rows);
    Ok(())
  }

  fn org_names(&mut self) -> Result<Vec<OrgName>> {
    Ok(self.state.org_names.clone())
  }

  fn delete_matches(&mut self, keys: &[(i64, String)]) -> Result<usize> {
    Ok(remove_where(&mut self.state.matches, |m| {
      keys
        .iter()
        .any(|(id, num)| *id == m.org_id && *num == m.company_number)
    }))
  }

  fn insert_matches(&mut self, rows: &[RegistryMatch]) -> Result<()> {
    let mut keys: HashSet<(i64, String)> = self
      .state
      .matches
      .iter()
      .map(|m| (m.org_id, m.company_number.clone()))
      .collect();
    for row in rows {
      if !keys.insert((row.org_id, row.company_number.clone())) {
        return Err(conflict(
          Table::RegistryMatches.name(),
          format!("duplicate key ({}, {:?})", row.org_id, row.company_number),
        ));
      }
    }
    self.state.matches.extend_from_slice(rows);
    Ok(())
  }

  fn matches(&mut self) -> Result<Vec<RegistryMatch>> {
    Ok(self.state.matches.clone())
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Shared in-memory store with transactional [`exec`](CurationStore::exec).
#[derive(Debug, Default)]
pub struct MemStore {
  state: Mutex<MemState>,
}

impl MemStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, MemState> {
    // Poisoning cannot corrupt committed state; writes land whole-state.
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Clone of the committed state, for assertions and reporting.
  pub fn snapshot(&self) -> MemState {
    self.lock().clone()
  }

  /// Synchronous [`exec`](CurationStore::exec); the async method delegates
  /// here.
  pub fn exec_sync<T>(
    &self,
    run: impl FnOnce(&mut dyn CurationTx) -> Result<T>,
  ) -> Result<T> {
    let mut working = self.snapshot();
    let out = run(&mut MemTx::new(&mut working))?;
    *self.lock() = working;
    Ok(out)
  }
}

impl CurationStore for MemStore {
  type Error = Error;

  async fn exec<T, F>(&self, run: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn CurationTx) -> Result<T> + Send + 'static,
  {
    self.exec_sync(run)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate {
    s.parse().expect("test date")
  }

  fn address(id: i64, key: &str) -> Address {
    Address {
      address_id:   id,
      canon_key:    key.into(),
      address_text: key.into(),
      postcode:     None,
    }
  }

  fn org_address(org: i64, addr: i64, on: &str) -> OrgAddress {
    OrgAddress {
      org_id:     org,
      address_id: addr,
      rank:       1,
      date:       date(on),
    }
  }

  #[test]
  fn exec_commits_on_ok() {
    let store = MemStore::new();
    store
      .exec_sync(|tx| tx.insert_addresses(&[address(1, "a")]))
      .unwrap();
    assert_eq!(store.snapshot().addresses.len(), 1);
  }

  #[test]
  fn exec_rolls_back_on_err() {
    let store = MemStore::new();
    let result = store.exec_sync(|tx| {
      tx.insert_addresses(&[address(1, "a")])?;
      Err::<(), _>(Error::Constraint {
        table:  "addresses",
        detail: "forced".into(),
      })
    });
    assert!(result.is_err());
    assert!(store.snapshot().addresses.is_empty());
  }

  #[test]
  fn duplicate_canon_key_is_a_conflict() {
    let mut state = MemState::default();
    let mut tx = MemTx::new(&mut state);
    tx.insert_addresses(&[address(1, "a")]).unwrap();
    let err = tx.insert_addresses(&[address(2, "a")]).unwrap_err();
    assert!(matches!(err, Error::Constraint { table: "addresses", .. }));
  }

  #[test]
  fn delete_on_removes_only_that_date() {
    let mut state = MemState::default();
    let mut tx = MemTx::new(&mut state);
    tx.insert_org_addresses(&[
      org_address(1, 1, "2020-04-01"),
      org_address(1, 2, "2020-05-01"),
    ])
    .unwrap();
    let removed = tx.delete_on(Table::OrgAddresses, date("2020-04-01")).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(state.org_addresses.len(), 1);
    assert_eq!(state.org_addresses[0].date, date("2020-05-01"));
  }

  #[test]
  fn latest_date_tracks_the_max() {
    let mut state = MemState::default();
    let mut tx = MemTx::new(&mut state);
    assert_eq!(tx.latest_date(Table::OrgAddresses).unwrap(), None);
    tx.insert_org_addresses(&[
      org_address(1, 1, "2020-05-01"),
      org_address(2, 1, "2020-04-01"),
    ])
    .unwrap();
    assert_eq!(
      tx.latest_date(Table::OrgAddresses).unwrap(),
      Some(date("2020-05-01"))
    );
  }

  #[test]
  fn keyed_deletes_hit_only_listed_keys() {
    let mut state = MemState::default();
    let mut tx = MemTx::new(&mut state);
    tx.insert_org_names(&[
      OrgName { org_id: 1, age_index: 0, name: "A".into(), invalid_date: None },
      OrgName { org_id: 1, age_index: 1, name: "B".into(), invalid_date: None },
      OrgName { org_id: 2, age_index: 0, name: "C".into(), invalid_date: None },
    ])
    .unwrap();
    let removed = tx.delete_org_names(&[(1, 0)]).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(state.org_names.len(), 2);
  }
}
