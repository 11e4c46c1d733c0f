//! Dimension rows: deduplicated entities owned by the curation engine.
//!
//! Dimension rows are immutable once written. Display text and extras are
//! whatever the first dump to mention the key supplied; later dumps only
//! ever add new rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three dimension tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
  Address,
  Sector,
  Term,
}

impl Dimension {
  pub const fn table_name(self) -> &'static str {
    match self {
      Self::Address => "addresses",
      Self::Sector => "sectors",
      Self::Term => "terms",
    }
  }
}

/// A deduplicated postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub address_id:   i64,
  /// Case-folded, truncated form of the text; unique within the table.
  pub canon_key:    String,
  /// Untruncated text as first seen.
  pub address_text: String,
  pub postcode:     Option<String>,
}

/// A current-taxonomy sector. The canonical key is the classification code
/// itself; the description is display text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
  pub sector_id: i64,
  pub canon_key: String,
  pub name:      String,
}

/// A controlled-vocabulary term matched against notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
  pub term_id:    i64,
  pub canon_key:  String,
  pub term:       String,
  /// Dump date on which the term first appeared.
  pub first_seen: NaiveDate,
}
