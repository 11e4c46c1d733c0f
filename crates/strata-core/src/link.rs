//! Dump-dated association rows linking parents to dimension rows.
//!
//! Identity is composite (parent, entity, dump date). History accumulates
//! across dumps; rows for different dump dates coexist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Links an organisation to an address for one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAddress {
  pub org_id:     i64,
  pub address_id: i64,
  pub rank:       i32,
  pub date:       NaiveDate,
}

/// Links an organisation to a sector for one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSector {
  pub org_id:    i64,
  pub sector_id: i64,
  pub rank:      i32,
  pub date:      NaiveDate,
}

/// A published notice attached to an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
  pub notice_id: String,
  pub org_id:    i64,
  pub snippet:   String,
  pub url:       String,
  pub date:      NaiveDate,
}

/// Links a notice to one matched term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeTerm {
  pub notice_id: String,
  pub term_id:   i64,
  pub date:      NaiveDate,
}
