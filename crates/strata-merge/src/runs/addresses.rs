//! Address merge: intern address texts, then snapshot-replace the links.

use std::collections::VecDeque;

use chrono::NaiveDate;
use strata_core::{
  Result,
  alloc::{Allocation, KeyAllocator},
  batch::AddressRecord,
  dimension::{Address, Dimension},
  link::OrgAddress,
  policy::Table,
  store::CurationTx,
};

use crate::{MergeConfig, apply, report::LinkOutcome};

/// Merge one dump's address batch.
///
/// Each record's display text resolves to a surrogate address id; records
/// whose text is new under canonicalization mint a dimension row. The link
/// rows for `date` are then replaced wholesale, so re-running the same
/// dump is idempotent.
pub fn merge_addresses(
  tx: &mut dyn CurationTx,
  cfg: &MergeConfig,
  date: NaiveDate,
  batch: Vec<AddressRecord>,
) -> Result<LinkOutcome> {
  apply::require_fresh(tx, Table::OrgAddresses, date)?;

  let existing = tx.dimension_keys(Dimension::Address)?;
  let mut alloc =
    KeyAllocator::seed(cfg.address_key_chars, cfg.first_surrogate_id, existing);

  // Phase one: drain the batch, resolving every record to an id before any
  // link row is built.
  let mut queue = VecDeque::from(batch);
  let mut fresh: Vec<Address> = Vec::new();
  let mut resolved: Vec<(AddressRecord, i64)> = Vec::new();
  while let Some(record) = queue.pop_front() {
    let text = record.address_text();
    match alloc.get_or_create(&text) {
      Allocation::Existing(id) => resolved.push((record, id)),
      Allocation::Created { id, canon_key } => {
        fresh.push(Address {
          address_id:   id,
          canon_key,
          address_text: text,
          postcode:     record.postcode.clone(),
        });
        resolved.push((record, id));
      }
    }
  }

  // Phase two: build links from the fully-resolved map.
  let links: Vec<OrgAddress> = resolved
    .iter()
    .map(|(record, id)| OrgAddress {
      org_id:     record.org_id,
      address_id: *id,
      rank:       record.rank,
      date,
    })
    .collect();

  let created = fresh.len();
  let reused = resolved.len() - created;
  tx.insert_addresses(&fresh)?;
  let applied = apply::apply(tx, date, links)?;

  tracing::info!(
    "merged addresses for {date}: {created} created, {reused} reused, {} \
     links ({} superseded)",
    applied.inserted,
    applied.superseded
  );
  Ok(LinkOutcome {
    created,
    reused,
    links: applied.inserted,
    superseded: applied.superseded,
    duplicates: applied.duplicates,
  })
}
