//! Parent registry records.
//!
//! Parents are keyed by the source registry's own ids; the engine never
//! allocates them. The second registry's string keys appear only in
//! [`RegistryMatch`], the bridge between the two registries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An organisation as described by the most recent dump that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
  pub org_id:  i64,
  pub name:    String,
  pub website: String,
  /// `true` iff the organisation appeared in the latest merged dump.
  pub active:  bool,
}

/// One entry of an organisation's name-change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgName {
  pub org_id:       i64,
  /// 0 = current name, 1 = most recent previous name, and so on.
  pub age_index:    i32,
  pub name:         String,
  /// Date the name stopped being valid; `None` while current.
  pub invalid_date: Option<NaiveDate>,
}

/// A resolved match between an organisation and a company-register entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryMatch {
  pub org_id:         i64,
  pub company_number: String,
  pub score:          f64,
}
