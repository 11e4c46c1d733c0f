//! Merge two successive registry dumps into a fresh in-memory store and
//! print what happened.
//!
//! ```
//! cargo run -p strata-merge --example merge_dumps
//! ```

use anyhow::Context as _;
use strata_core::{
  batch::{AddressRecord, NoticeRecord, OrganisationRecord, SectorRecord},
  store::CurationStore,
};
use strata_merge::{Curator, Dump, MergeConfig};
use strata_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn address(org: i64, line1: &str, postcode: &str, rank: i32) -> AddressRecord {
  AddressRecord {
    org_id: org,
    line1: line1.into(),
    line2: "Northbridge".into(),
    postcode: Some(postcode.into()),
    rank,
  }
}

fn april() -> Dump {
  let mut dump = Dump::new("2020-04-01".parse().expect("date"));
  dump.organisations = vec![
    OrganisationRecord {
      org_id:  1,
      name:    "Alpha Waste Ltd".into(),
      website: "https://alpha.example.org".into(),
    },
    OrganisationRecord {
      org_id:  2,
      name:    "Beta Skips Ltd".into(),
      website: "https://beta.example.org".into(),
    },
  ];
  dump.addresses = vec![
    address(1, "12 Main Street", "AB1 2CD", 1),
    // Differs only by case: resolves to the same address id.
    address(2, "12 MAIN STREET", "AB1 2CD", 1),
  ];
  dump.sectors = vec![
    SectorRecord {
      org_id: 1,
      code:   "38110 - Collection of non-hazardous waste".into(),
      rank:   1,
    },
    // Legacy four-digit code, remapped by description.
    SectorRecord {
      org_id: 2,
      code:   "3811 - Collection of non-hazardous waste".into(),
      rank:   1,
    },
  ];
  dump.notices = vec![NoticeRecord {
    org_id:        1,
    notice_id:     "N-2020-001".into(),
    matched_terms: "asbestos;landfill".into(),
    snippet:       "waste carrier permit granted".into(),
    url:           "https://example.org/notices/N-2020-001".into(),
  }];
  dump
}

fn may() -> Dump {
  let mut dump = Dump::new("2020-05-01".parse().expect("date"));
  // Beta is gone this month; it stays stored but goes inactive.
  dump.organisations = vec![OrganisationRecord {
    org_id:  1,
    name:    "Alpha Waste Ltd".into(),
    website: "https://alpha.example.org".into(),
  }];
  dump.addresses = vec![
    address(1, "12 Main Street", "AB1 2CD", 1),
    address(1, "Unit 4, Dock Road", "AB9 9ZZ", 2),
  ];
  dump
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  // Load configuration from STRATA_* variables; defaults otherwise.
  let cfg = MergeConfig::load(None).context("failed to load configuration")?;

  let store = SqliteStore::open_in_memory()
    .await
    .context("failed to open store")?;
  let curator = Curator::with_config(store, cfg);

  let outcome = curator.merge_dump(april()).await?;
  tracing::info!("april: {outcome:?}");

  let outcome = curator.merge_dump(may()).await?;
  tracing::info!("may: {outcome:?}");

  let addresses = curator.store().exec(|tx| tx.addresses()).await?;
  for row in &addresses {
    tracing::info!(
      "address {}: {:?} (key {:?})",
      row.address_id,
      row.address_text,
      row.canon_key
    );
  }

  let organisations = curator.store().exec(|tx| tx.organisations()).await?;
  for row in &organisations {
    tracing::info!(
      "organisation {}: {} (active: {})",
      row.org_id,
      row.name,
      row.active
    );
  }

  Ok(())
}
