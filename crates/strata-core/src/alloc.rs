//! Surrogate key allocation for dimension tables.
//!
//! Ids are plain integers that only ever grow. The allocator seeds itself
//! from one full scan of the committed table, then answers every lookup for
//! the rest of the run from memory: existing keys keep their ids forever,
//! new keys mint the next id in sequence. Re-running a merge against the
//! same committed state therefore assigns identical ids.

use std::collections::HashMap;

use crate::canon::canon_key;

/// Result of a single [`KeyAllocator::get_or_create`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
  /// The canonical key was already present, in the store or earlier in this
  /// batch; no new row needs to be written.
  Existing(i64),
  /// A fresh id was minted; the caller must persist a dimension row
  /// carrying this canonical key.
  Created { id: i64, canon_key: String },
}

impl Allocation {
  pub fn id(&self) -> i64 {
    match self {
      Self::Existing(id) => *id,
      Self::Created { id, .. } => *id,
    }
  }

  pub fn is_new(&self) -> bool {
    matches!(self, Self::Created { .. })
  }
}

/// Allocates stable surrogate ids for canonical keys.
///
/// An explicit object rather than a closure over a counter, so a run's
/// allocation state can be inspected and tested in isolation.
#[derive(Debug)]
pub struct KeyAllocator {
  by_key: HashMap<String, i64>,
  next:   i64,
  limit:  usize,
}

impl KeyAllocator {
  /// Build an allocator from a full scan of the dimension table.
  ///
  /// `existing` holds `(canonical key, id)` pairs as committed; the next id
  /// is one past the highest committed id, or `first_id` for an empty
  /// table. Seeding happens once per run, before any allocation; the
  /// allocator never reads the store again.
  pub fn seed(
    limit: usize,
    first_id: i64,
    existing: Vec<(String, i64)>,
  ) -> Self {
    let next = existing
      .iter()
      .map(|(_, id)| *id)
      .max()
      .map_or(first_id, |max| max + 1);
    Self {
      by_key: existing.into_iter().collect(),
      next,
      limit,
    }
  }

  /// Canonicalize `raw` and return its id, minting one for unseen keys.
  ///
  /// A minted key is recorded immediately, so later occurrences in the same
  /// batch resolve to [`Allocation::Existing`] with the fresh id.
  pub fn get_or_create(&mut self, raw: &str) -> Allocation {
    let key = canon_key(raw, self.limit);
    if let Some(&id) = self.by_key.get(&key) {
      return Allocation::Existing(id);
    }
    let id = self.next;
    self.next += 1;
    self.by_key.insert(key.clone(), id);
    Allocation::Created { id, canon_key: key }
  }

  /// The id the next unseen key would receive.
  pub fn next_id(&self) -> i64 {
    self.next
  }

  /// Number of keys known to the allocator, committed plus minted this run.
  pub fn len(&self) -> usize {
    self.by_key.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_key.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_table_starts_at_first_id() {
    let mut alloc = KeyAllocator::seed(200, 1, vec![]);
    assert_eq!(alloc.next_id(), 1);
    let a = alloc.get_or_create("12 main street");
    assert_eq!(a.id(), 1);
    assert!(a.is_new());
  }

  #[test]
  fn next_id_is_one_past_the_committed_max() {
    let existing = vec![
      ("a".to_string(), 3),
      ("b".to_string(), 7),
      ("c".to_string(), 5),
    ];
    let alloc = KeyAllocator::seed(200, 1, existing);
    assert_eq!(alloc.next_id(), 8);
  }

  #[test]
  fn known_key_reuses_the_committed_id() {
    let existing = vec![("12 main street".to_string(), 4)];
    let mut alloc = KeyAllocator::seed(200, 1, existing);
    assert_eq!(alloc.get_or_create("12 MAIN Street"), Allocation::Existing(4));
    assert_eq!(alloc.next_id(), 5);
  }

  #[test]
  fn repeats_within_a_batch_mint_once() {
    let mut alloc = KeyAllocator::seed(200, 1, vec![]);
    let first = alloc.get_or_create("Unit 9, Dock Road");
    let second = alloc.get_or_create("UNIT 9, DOCK ROAD");
    assert!(first.is_new());
    assert_eq!(second, Allocation::Existing(first.id()));
    assert_eq!(alloc.next_id(), 2);
  }

  #[test]
  fn assignment_is_deterministic_in_input_order() {
    let batch = ["one", "two", "one", "three"];
    let run = |batch: &[&str]| -> Vec<i64> {
      let mut alloc = KeyAllocator::seed(200, 1, vec![]);
      batch
        .iter()
        .map(|raw| alloc.get_or_create(raw).id())
        .collect()
    };
    assert_eq!(run(&batch), run(&batch));
    assert_eq!(run(&batch), vec![1, 2, 1, 3]);
  }

  #[test]
  fn truncation_collapses_over_limit_keys() {
    let mut alloc = KeyAllocator::seed(8, 1, vec![]);
    let a = alloc.get_or_create("warehouse east");
    let b = alloc.get_or_create("warehouse west");
    assert!(a.is_new());
    assert_eq!(b, Allocation::Existing(a.id()));
  }

  #[test]
  fn zero_based_allocation_when_configured() {
    let mut alloc = KeyAllocator::seed(200, 0, vec![]);
    assert_eq!(alloc.get_or_create("x").id(), 0);
    assert_eq!(alloc.get_or_create("y").id(), 1);
  }

  #[test]
  fn empty_string_is_a_legal_key() {
    let mut alloc = KeyAllocator::seed(200, 1, vec![]);
    let a = alloc.get_or_create("");
    assert!(a.is_new());
    assert_eq!(alloc.get_or_create(""), Allocation::Existing(a.id()));
  }
}
