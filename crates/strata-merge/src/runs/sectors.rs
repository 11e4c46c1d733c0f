//! Sector merge: parse code lines, remap legacy codes, snapshot-replace
//! the links.

use std::collections::VecDeque;

use chrono::NaiveDate;
use strata_core::{
  Result,
  alloc::{Allocation, KeyAllocator},
  batch::SectorRecord,
  dimension::{Dimension, Sector},
  link::OrgSector,
  policy::Table,
  store::CurationTx,
  taxonomy::{self, CodeLine},
};

use crate::{MergeConfig, apply, report::SectorOutcome};

/// Merge one dump's sector batch.
///
/// Combined `"<code> - <description>"` lines are parsed, legacy codes are
/// remapped onto the current taxonomy, and the surviving rows are interned
/// and linked like addresses. Dropped rows are counted, never fatal.
pub fn merge_sectors(
  tx: &mut dyn CurationTx,
  cfg: &MergeConfig,
  date: NaiveDate,
  batch: Vec<SectorRecord>,
) -> Result<SectorOutcome> {
  apply::require_fresh(tx, Table::OrgSectors, date)?;

  let mut malformed = 0usize;
  let mut records: Vec<SectorRecord> = Vec::new();
  let mut lines: Vec<CodeLine> = Vec::new();
  for record in batch {
    match taxonomy::parse_code_line(&record.code) {
      Some(line) => {
        records.push(record);
        lines.push(line);
      }
      None => malformed += 1,
    }
  }

  let taxonomy::Remapped { resolved, unmatched, bad_length } =
    taxonomy::remap(&lines);

  let existing = tx.dimension_keys(Dimension::Sector)?;
  // The canonical key of a sector is its code, so the key limit is the
  // code length itself.
  let mut alloc = KeyAllocator::seed(
    taxonomy::CURRENT_CODE_LEN,
    cfg.first_surrogate_id,
    existing,
  );

  let mut queue: VecDeque<(SectorRecord, Option<CodeLine>)> =
    records.into_iter().zip(resolved).collect();
  let mut fresh: Vec<Sector> = Vec::new();
  let mut kept: Vec<(SectorRecord, i64)> = Vec::new();
  while let Some((record, line)) = queue.pop_front() {
    let Some(line) = line else { continue };
    match alloc.get_or_create(&line.code) {
      Allocation::Existing(id) => kept.push((record, id)),
      Allocation::Created { id, canon_key } => {
        fresh.push(Sector { sector_id: id, canon_key, name: line.description });
        kept.push((record, id));
      }
    }
  }

  let links: Vec<OrgSector> = kept
    .iter()
    .map(|(record, id)| OrgSector {
      org_id:    record.org_id,
      sector_id: *id,
      rank:      record.rank,
      date,
    })
    .collect();

  let created = fresh.len();
  let reused = kept.len() - created;
  tx.insert_sectors(&fresh)?;
  let applied = apply::apply(tx, date, links)?;

  if malformed + unmatched + bad_length > 0 {
    tracing::warn!(
      "dropped sector rows for {date}: {malformed} malformed, {unmatched} \
       unmatched legacy, {bad_length} bad length"
    );
  }
  tracing::info!(
    "merged sectors for {date}: {created} created, {reused} reused, {} links",
    applied.inserted
  );
  Ok(SectorOutcome {
    link: crate::report::LinkOutcome {
      created,
      reused,
      links: applied.inserted,
      superseded: applied.superseded,
      duplicates: applied.duplicates,
    },
    malformed,
    unmatched,
    bad_length,
  })
}
