//! Incoming dump records: the typed rows a supplier hands to the merge
//! engine, one vector per table family plus the dump date.
//!
//! Upstream feeds carry the dump date as a constant column on every row;
//! here a run takes the date once and stamps it onto each association row
//! it builds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One address occurrence for a parent organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
  pub org_id:   i64,
  pub line1:    String,
  pub line2:    String,
  pub postcode: Option<String>,
  /// Position in the parent's address list (1 = primary).
  pub rank:     i32,
}

impl AddressRecord {
  /// The display text an address dimension row is built from.
  pub fn address_text(&self) -> String {
    format!("{}, {}", self.line1, self.line2)
  }
}

/// One classification occurrence. `code` is the combined
/// `"<digits> - <description>"` line as shipped in registry dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRecord {
  pub org_id: i64,
  pub code:   String,
  pub rank:   i32,
}

/// One notice with the controlled-vocabulary terms matched against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
  pub org_id:        i64,
  pub notice_id:     String,
  /// Semicolon-delimited matched terms, verbatim from the matcher.
  pub matched_terms: String,
  pub snippet:       String,
  pub url:           String,
}

/// Current registry record for a parent organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationRecord {
  pub org_id:  i64,
  pub name:    String,
  pub website: String,
}

/// One entry of a parent's name-change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
  pub org_id:       i64,
  /// 0 = current name, 1 = most recent previous name, and so on.
  pub age_index:    i32,
  pub name:         String,
  /// Date the name stopped being valid; `None` for the current name.
  pub invalid_date: Option<NaiveDate>,
}

/// An externally-resolved cross-registry match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub org_id:         i64,
  pub company_number: String,
  /// Matcher confidence, already thresholded upstream.
  pub score:          f64,
}
