//! Incremental merge engine for Strata.
//!
//! Takes the typed batches of one dated registry dump and merges them into
//! the long-lived dataset behind a
//! [`CurationStore`](strata_core::store::CurationStore): entity values are
//! interned under stable surrogate ids, legacy sector codes are remapped
//! onto the current taxonomy, and every table is reconciled under its
//! declared merge policy.

pub mod apply;
pub mod curator;
pub mod report;
pub mod runs;


pub use curator::{Curator, Dump};
pub use report::DumpOutcome;

use std::path::Path;

use serde::Deserialize;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_key_chars() -> usize {
  200
}

fn default_first_id() -> i64 {
  1
}

/// Tunables for merge runs, loadable from a file and `STRATA_*`
/// environment variables. Every setting has a default, so
/// `MergeConfig::default()` is a complete working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeConfig {
  /// Character limit for address canonical keys. Longer text is stored in
  /// full but compared only up to this many characters.
  #[serde(default = "default_key_chars")]
  pub address_key_chars:  usize,
  /// Character limit for term canonical keys.
  #[serde(default = "default_key_chars")]
  pub term_key_chars:     usize,
  /// Id assigned to the first row of an empty dimension table.
  #[serde(default = "default_first_id")]
  pub first_surrogate_id: i64,
}

impl Default for MergeConfig {
  fn default() -> Self {
    Self {
      address_key_chars:  default_key_chars(),
      term_key_chars:     default_key_chars(),
      first_surrogate_id: default_first_id(),
    }
  }
}

impl MergeConfig {
  /// Load configuration, layering `STRATA_*` environment variables over an
  /// optional file. Missing settings keep their defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(file) = path {
      builder = builder
        .add_source(config::File::from(file.to_path_buf()).required(false));
    }
    builder
      .add_source(config::Environment::with_prefix("STRATA"))
      .build()?
      .try_deserialize()
  }
}
