//! Per-run accounting returned to callers.
//!
//! The same numbers the run logs carry, in a form callers can assert on
//! or serialise into job reports.

use serde::Serialize;

/// Outcome of one dimension-plus-links run (addresses, sectors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
  /// Dimension rows minted this run.
  pub created:    usize,
  /// Batch rows that resolved to an already-known dimension id.
  pub reused:     usize,
  /// Association rows written.
  pub links:      usize,
  /// Stored rows removed by snapshot replacement for this dump date.
  pub superseded: usize,
  /// Batch rows dropped as within-batch duplicates of an earlier row.
  pub duplicates: usize,
}

/// Outcome of a sector run: link accounting plus remap accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectorOutcome {
  pub link:       LinkOutcome,
  /// Rows dropped for a missing `" - "` separator.
  pub malformed:  usize,
  /// Legacy rows whose description matched no current code.
  pub unmatched:  usize,
  /// Rows with a code length neither current nor legacy.
  pub bad_length: usize,
}

/// Outcome of a notices run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoticeOutcome {
  /// Notice rows written.
  pub notices:       usize,
  /// Term dimension rows minted this run.
  pub terms_created: usize,
  /// Term occurrences that resolved to an already-known id.
  pub terms_reused:  usize,
  /// Notice-to-term link rows written.
  pub term_links:    usize,
}

/// Outcome of a keep-first record run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
  /// Rows written from the batch.
  pub inserted:    usize,
  /// Stored rows replaced because the batch carried their natural key.
  pub replaced:    usize,
  /// Batch rows dropped as within-batch duplicates.
  pub duplicates:  usize,
  /// Organisations absent from this dump and now flagged inactive.
  /// Always zero for the other record tables.
  pub deactivated: usize,
}

/// Everything one [`merge_dump`](crate::Curator::merge_dump) call did.
/// Batches the dump did not carry keep a zeroed outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DumpOutcome {
  pub organisations: RecordOutcome,
  pub names:         RecordOutcome,
  pub matches:       RecordOutcome,
  pub addresses:     LinkOutcome,
  pub sectors:       SectorOutcome,
  pub notices:       NoticeOutcome,
}
