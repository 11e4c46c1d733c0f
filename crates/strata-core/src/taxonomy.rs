//! Taxonomy remapping: translate legacy classification codes onto the
//! current code list by exact description match.
//!
//! Registry dumps occasionally carry codes from the previous taxonomy
//! revision (four digits instead of five). Those index a different
//! classification and must not be stored alongside current codes. The only
//! bridge available in the dump itself is the human-readable description,
//! so legacy rows are resolved by normalised-description lookup against the
//! current-length rows of the same batch. Unresolvable rows are dropped by
//! policy, not treated as faults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::canon::normalize_description;

/// Digit count of a current-revision classification code.
pub const CURRENT_CODE_LEN: usize = 5;

/// Digit count of a legacy-revision code.
pub const LEGACY_CODE_LEN: usize = CURRENT_CODE_LEN - 1;

/// A classification code with its free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLine {
  pub code:        String,
  pub description: String,
}

/// Split a combined `"<code> - <description>"` line.
///
/// Splits on the first `" - "`; any further occurrences stay in the
/// description. Returns `None` when the separator is missing (malformed
/// supplier row; callers drop and count it).
pub fn parse_code_line(line: &str) -> Option<CodeLine> {
  let (code, description) = line.split_once(" - ")?;
  Some(CodeLine {
    code:        code.to_string(),
    description: description.to_string(),
  })
}

/// Outcome of [`remap`]: resolved rows aligned with the input positions,
/// plus counts of dropped rows.
#[derive(Debug, Clone, Default)]
pub struct Remapped {
  /// One slot per input row; `None` where the row was dropped.
  pub resolved:   Vec<Option<CodeLine>>,
  /// Legacy rows whose description matched no current row.
  pub unmatched:  usize,
  /// Rows whose code length was neither current nor legacy.
  pub bad_length: usize,
}

/// Remap a batch of code lines onto the current taxonomy.
///
/// Current-length rows pass through unchanged. Legacy-length rows are
/// replaced by the current row whose normalised description matches theirs
/// exactly; where several current rows share a description, the first in
/// batch order is the representative. Everything else is dropped.
///
/// The lookup is built fresh from each batch; nothing persists between
/// dumps.
pub fn remap(rows: &[CodeLine]) -> Remapped {
  let mut current: HashMap<String, &CodeLine> = HashMap::new();
  for row in rows {
    if row.code.chars().count() == CURRENT_CODE_LEN {
      current
        .entry(normalize_description(&row.description))
        .or_insert(row);
    }
  }

  let mut out = Remapped {
    resolved: Vec::with_capacity(rows.len()),
    ..Default::default()
  };
  for row in rows {
    let slot = match row.code.chars().count() {
      len if len == CURRENT_CODE_LEN => Some(row.clone()),
      len if len == LEGACY_CODE_LEN => {
        match current.get(&normalize_description(&row.description)) {
          Some(hit) => Some((*hit).clone()),
          None => {
            out.unmatched += 1;
            None
          }
        }
      }
      _ => {
        out.bad_length += 1;
        None
      }
    };
    out.resolved.push(slot);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(code: &str, description: &str) -> CodeLine {
    CodeLine {
      code:        code.into(),
      description: description.into(),
    }
  }

  #[test]
  fn parse_splits_on_first_separator() {
    let parsed = parse_code_line("45120 - Sale of cars - retail").unwrap();
    assert_eq!(parsed.code, "45120");
    assert_eq!(parsed.description, "Sale of cars - retail");
  }

  #[test]
  fn parse_rejects_missing_separator() {
    assert!(parse_code_line("45120 Sale of cars").is_none());
    assert!(parse_code_line("").is_none());
  }

  #[test]
  fn legacy_code_follows_matching_description() {
    let rows = vec![line("45120", "Sale of cars"), line("4512", "Sale of cars")];
    let out = remap(&rows);
    assert_eq!(out.resolved[0].as_ref().unwrap().code, "45120");
    assert_eq!(out.resolved[1].as_ref().unwrap().code, "45120");
    assert_eq!(out.unmatched, 0);
  }

  #[test]
  fn description_match_ignores_case_and_spacing() {
    let rows = vec![
      line("45120", "Sale of cars"),
      line("4512", "  SALE   OF cars "),
    ];
    let out = remap(&rows);
    assert_eq!(out.resolved[1].as_ref().unwrap().code, "45120");
  }

  #[test]
  fn unmatched_legacy_rows_drop() {
    let rows = vec![
      line("45120", "Sale of cars"),
      line("1399", "Weaving of textiles"),
    ];
    let out = remap(&rows);
    assert!(out.resolved[1].is_none());
    assert_eq!(out.unmatched, 1);
  }

  #[test]
  fn odd_length_codes_drop() {
    let rows = vec![line("451", "Sale of cars"), line("451200", "Sale of cars")];
    let out = remap(&rows);
    assert!(out.resolved.iter().all(Option::is_none));
    assert_eq!(out.bad_length, 2);
  }

  #[test]
  fn duplicate_descriptions_resolve_to_first_current_row() {
    let rows = vec![
      line("45120", "Sale of cars"),
      line("45190", "Sale of cars"),
      line("4512", "Sale of cars"),
    ];
    let out = remap(&rows);
    assert_eq!(out.resolved[2].as_ref().unwrap().code, "45120");
  }

  #[test]
  fn current_rows_pass_through_untouched() {
    let rows = vec![line("45120", "Sale of cars")];
    let out = remap(&rows);
    assert_eq!(out.resolved[0].as_ref().unwrap(), &rows[0]);
  }
}
