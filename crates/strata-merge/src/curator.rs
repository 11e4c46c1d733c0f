//! The curation driver: one [`Curator`] per store, one [`Dump`] per merge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strata_core::{
  batch::{
    AddressRecord, MatchRecord, NameRecord, NoticeRecord, OrganisationRecord,
    SectorRecord,
  },
  store::CurationStore,
};

use crate::{
  MergeConfig,
  report::{
    DumpOutcome, LinkOutcome, NoticeOutcome, RecordOutcome, SectorOutcome,
  },
  runs,
};

/// One dated registry dump, already parsed into typed batches by the
/// upstream ingestion step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dump {
  pub date:          NaiveDate,
  #[serde(default)]
  pub organisations: Vec<OrganisationRecord>,
  #[serde(default)]
  pub names:         Vec<NameRecord>,
  #[serde(default)]
  pub matches:       Vec<MatchRecord>,
  #[serde(default)]
  pub addresses:     Vec<AddressRecord>,
  #[serde(default)]
  pub sectors:       Vec<SectorRecord>,
  #[serde(default)]
  pub notices:       Vec<NoticeRecord>,
}

impl Dump {
  /// An empty dump for `date`; fill the batches the dump carries.
  pub fn new(date: NaiveDate) -> Self {
    Self {
      date,
      organisations: Vec::new(),
      names: Vec::new(),
      matches: Vec::new(),
      addresses: Vec::new(),
      sectors: Vec::new(),
      notices: Vec::new(),
    }
  }
}

/// Drives merge runs against a [`CurationStore`].
///
/// Each run executes in its own transaction: the store either reflects the
/// whole run or none of it. The curator holds no state between runs; all
/// continuity lives in the store.
#[derive(Debug, Clone)]
pub struct Curator<S> {
  store: S,
  cfg:   MergeConfig,
}

impl<S: CurationStore> Curator<S> {
  pub fn new(store: S) -> Self {
    Self { store, cfg: MergeConfig::default() }
  }

  pub fn with_config(store: S, cfg: MergeConfig) -> Self {
    Self { store, cfg }
  }

  /// The underlying store, for readback queries.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Merge every non-empty batch of `dump`, parents before the tables
  /// that reference them. Empty batches are skipped, not treated as
  /// "delete everything".
  pub async fn merge_dump(&self, dump: Dump) -> Result<DumpOutcome, S::Error> {
    let date = dump.date;
    let mut outcome = DumpOutcome::default();
    if !dump.organisations.is_empty() {
      outcome.organisations =
        self.merge_organisations(date, dump.organisations).await?;
    }
    if !dump.names.is_empty() {
      outcome.names = self.merge_names(date, dump.names).await?;
    }
    if !dump.matches.is_empty() {
      outcome.matches = self.merge_matches(date, dump.matches).await?;
    }
    if !dump.addresses.is_empty() {
      outcome.addresses = self.merge_addresses(date, dump.addresses).await?;
    }
    if !dump.sectors.is_empty() {
      outcome.sectors = self.merge_sectors(date, dump.sectors).await?;
    }
    if !dump.notices.is_empty() {
      outcome.notices = self.merge_notices(date, dump.notices).await?;
    }
    Ok(outcome)
  }

  pub async fn merge_organisations(
    &self,
    date: NaiveDate,
    batch: Vec<OrganisationRecord>,
  ) -> Result<RecordOutcome, S::Error> {
    self
      .store
      .exec(move |tx| runs::merge_organisations(tx, date, batch))
      .await
  }

  pub async fn merge_names(
    &self,
    date: NaiveDate,
    batch: Vec<NameRecord>,
  ) -> Result<RecordOutcome, S::Error> {
    self
      .store
      .exec(move |tx| runs::merge_names(tx, date, batch))
      .await
  }

  pub async fn merge_matches(
    &self,
    date: NaiveDate,
    batch: Vec<MatchRecord>,
  ) -> Result<RecordOutcome, S::Error> {
    self
      .store
      .exec(move |tx| runs::merge_matches(tx, date, batch))
      .await
  }

  pub async fn merge_addresses(
    &self,
    date: NaiveDate,
    batch: Vec<AddressRecord>,
  ) -> Result<LinkOutcome, S::Error> {
    let cfg = self.cfg.clone();
    self
      .store
      .exec(move |tx| runs::merge_addresses(tx, &cfg, date, batch))
      .await
  }

  pub async fn merge_sectors(
    &self,
    date: NaiveDate,
    batch: Vec<SectorRecord>,
  ) -> Result<SectorOutcome, S::Error> {
    let cfg = self.cfg.clone();
    self
      .store
      .exec(move |tx| runs::merge_sectors(tx, &cfg, date, batch))
      .await
  }

  pub async fn merge_notices(
    &self,
    date: NaiveDate,
    batch: Vec<NoticeRecord>,
  ) -> Result<NoticeOutcome, S::Error> {
    let cfg = self.cfg.clone();
    self
      .store
      .exec(move |tx| runs::merge_notices(tx, &cfg, date, batch))
      .await
  }
}
