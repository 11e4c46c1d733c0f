//! Canonical key production for dimension text.
//!
//! Two raw strings address the same dimension row iff their canonical keys
//! are equal: case-folded, then truncated to the table's character limit.
//! Truncation happens before comparison, so over-limit strings sharing a
//! prefix collapse into a single row. That is long-standing behaviour of
//! the datasets built on this engine and is kept as-is.

/// Case-fold `raw` and truncate it to at most `limit` characters.
///
/// Pure and deterministic. No whitespace or punctuation normalisation is
/// applied; the empty string is a legal key.
pub fn canon_key(raw: &str, limit: usize) -> String {
  raw.to_lowercase().chars().take(limit).collect()
}

/// Normalise a free-text description for exact matching: lowercase, trim,
/// and collapse internal whitespace runs to a single space.
///
/// Used by the taxonomy remapper; dimension keys use [`canon_key`] instead.
pub fn normalize_description(raw: &str) -> String {
  raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn case_variants_share_a_key() {
    assert_eq!(
      canon_key("12 Main Street", 200),
      canon_key("12 MAIN STREET", 200)
    );
  }

  #[test]
  fn whitespace_and_punctuation_survive() {
    assert_eq!(canon_key("  12,  Main St. ", 200), "  12,  main st. ");
  }

  #[test]
  fn truncates_to_characters_not_bytes() {
    // 'é' is two bytes but one character.
    assert_eq!(canon_key("ééééé", 3), "ééé");
  }

  #[test]
  fn over_limit_strings_sharing_a_prefix_collide() {
    let a = format!("{}, left wing", "x".repeat(200));
    let b = format!("{}, right wing", "x".repeat(200));
    assert_ne!(a, b);
    assert_eq!(canon_key(&a, 200), canon_key(&b, 200));
  }

  #[test]
  fn empty_string_is_a_legal_key() {
    assert_eq!(canon_key("", 200), "");
  }

  #[test]
  fn description_normalisation_collapses_runs() {
    assert_eq!(normalize_description("  Sale of\t cars "), "sale of cars");
    assert_eq!(normalize_description("SALE  OF  CARS"), "sale of cars");
  }
}
