//! Core types and trait definitions for the Strata dump-curation engine.
//!
//! This crate is deliberately free of database dependencies. All other
//! crates depend on it; it depends on nothing heavier than `chrono`.

pub mod alloc;
pub mod batch;
pub mod canon;
pub mod dimension;
pub mod error;
pub mod link;
pub mod memory;
pub mod org;
pub mod policy;
pub mod store;
pub mod taxonomy;

pub use error::{Error, Result};
