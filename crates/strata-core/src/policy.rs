//! Merge policies, declared as data on each association table.
//!
//! How incoming rows meet stored rows is a property of the table, not of
//! whichever code path happens to write it. Each [`Table`] names its policy
//! once; the engine dispatches on it in a single place.

use serde::{Deserialize, Serialize};

/// How a table reconciles an incoming dump with stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
  /// Delete the incoming dump date's rows, then insert the batch.
  /// Idempotent per dump; guarded by the stale-dump precondition.
  SnapshotReplace,
  /// Insert only. Re-running a dump would duplicate history, so the store's
  /// keys reject it; external bookkeeping decides when a dump is new.
  AppendOnly,
  /// Incoming rows win per natural key; stored rows whose keys are absent
  /// from the batch survive.
  KeepFirst,
}

/// The association and record tables the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
  OrgAddresses,
  OrgSectors,
  Notices,
  NoticeTerms,
  Organisations,
  OrgNames,
  RegistryMatches,
}

impl Table {
  pub const fn name(self) -> &'static str {
    match self {
      Self::OrgAddresses => "organisation_addresses",
      Self::OrgSectors => "organisation_sectors",
      Self::Notices => "notices",
      Self::NoticeTerms => "notice_terms",
      Self::Organisations => "organisations",
      Self::OrgNames => "organisation_names",
      Self::RegistryMatches => "registry_matches",
    }
  }

  /// The declared merge policy for this table.
  pub const fn policy(self) -> MergePolicy {
    match self {
      Self::OrgAddresses | Self::OrgSectors => MergePolicy::SnapshotReplace,
      Self::Notices | Self::NoticeTerms => MergePolicy::AppendOnly,
      Self::Organisations | Self::OrgNames | Self::RegistryMatches => {
        MergePolicy::KeepFirst
      }
    }
  }
}
