//! Per-table merge runs.
//!
//! Each run covers one table family for one dump date: check freshness,
//! resolve dimension ids, build rows, then hand them to
//! [`apply`](crate::apply::apply). A run is synchronous and writes through
//! a single open transaction; [`Curator`](crate::Curator) wraps each one
//! in [`exec`](strata_core::store::CurationStore::exec).

mod addresses;
mod notices;
mod records;
mod sectors;

pub use addresses::merge_addresses;
pub use notices::merge_notices;
pub use records::{merge_matches, merge_names, merge_organisations};
pub use sectors::merge_sectors;
