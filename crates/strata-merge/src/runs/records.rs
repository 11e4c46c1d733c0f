//! Registry record merges: organisations, name history, cross-registry
//! matches. All three are keep-first tables.

use chrono::NaiveDate;
use strata_core::{
  Result,
  batch::{MatchRecord, NameRecord, OrganisationRecord},
  org::{OrgName, Organisation, RegistryMatch},
  store::CurationTx,
};

use crate::{apply, report::RecordOutcome};

/// Merge one dump's organisation batch.
///
/// Presence in the incoming dump defines liveness: every stored row is
/// flagged inactive first, then the batch reinstates (and updates) the
/// organisations it carries. Rows absent from the dump survive with
/// `active` cleared.
pub fn merge_organisations(
  tx: &mut dyn CurationTx,
  date: NaiveDate,
  batch: Vec<OrganisationRecord>,
) -> Result<RecordOutcome> {
  let total = tx.deactivate_organisations()?;

  let rows: Vec<Organisation> = batch
    .into_iter()
    .map(|record| Organisation {
      org_id:  record.org_id,
      name:    record.name,
      website: record.website,
      active:  true,
    })
    .collect();
  let applied = apply::apply(tx, date, rows)?;

  let deactivated = total.saturating_sub(applied.superseded);
  tracing::info!(
    "merged organisations for {date}: {} active, {} replaced, {deactivated} \
     deactivated",
    applied.inserted,
    applied.superseded
  );
  Ok(RecordOutcome {
    inserted: applied.inserted,
    replaced: applied.superseded,
    duplicates: applied.duplicates,
    deactivated,
  })
}

/// Merge one dump's name-history batch. Natural key is
/// `(org_id, age_index)`; the newest dump's row wins per key.
pub fn merge_names(
  tx: &mut dyn CurationTx,
  date: NaiveDate,
  batch: Vec<NameRecord>,
) -> Result<RecordOutcome> {
  let rows: Vec<OrgName> = batch
    .into_iter()
    .map(|record| OrgName {
      org_id:       record.org_id,
      age_index:    record.age_index,
      name:         record.name,
      invalid_date: record.invalid_date,
    })
    .collect();
  let applied = apply::apply(tx, date, rows)?;

  tracing::info!(
    "merged names for {date}: {} kept, {} replaced",
    applied.inserted,
    applied.superseded
  );
  Ok(RecordOutcome {
    inserted:    applied.inserted,
    replaced:    applied.superseded,
    duplicates:  applied.duplicates,
    deactivated: 0,
  })
}

/// Merge one dump's cross-registry match batch. Natural key is
/// `(org_id, company_number)`; rescoring an existing pair replaces it.
pub fn merge_matches(
  tx: &mut dyn CurationTx,
  date: NaiveDate,
  batch: Vec<MatchRecord>,
) -> Result<RecordOutcome> {
  let rows: Vec<RegistryMatch> = batch
    .into_iter()
    .map(|record| RegistryMatch {
      org_id:         record.org_id,
      company_number: record.company_number,
      score:          record.score,
    })
    .collect();
  let applied = apply::apply(tx, date, rows)?;

  tracing::info!(
    "merged matches for {date}: {} kept, {} replaced",
    applied.inserted,
    applied.superseded
  );
  Ok(RecordOutcome {
    inserted:    applied.inserted,
    replaced:    applied.superseded,
    duplicates:  applied.duplicates,
    deactivated: 0,
  })
}

#[cfg(test)]
mod tests {
  use strata_core::memory::{MemState, MemTx};

  use super::*;

  fn date(s: &str) -> NaiveDate {
    s.parse().expect("test date")
  }

  fn org(id: i64, name: &str) -> OrganisationRecord {
    OrganisationRecord {
      org_id:  id,
      name:    name.into(),
      website: format!("https://{}.example.org", id),
    }
  }

  #[test]
  fn organisations_missing_from_a_dump_go_inactive() {
    let mut state = MemState::default();
    merge_organisations(&mut MemTx::new(&mut state), date("2020-04-01"), vec![
      org(1, "Alpha Ltd"),
      org(2, "Beta Ltd"),
    ])
    .unwrap();
    let out = merge_organisations(
      &mut MemTx::new(&mut state),
      date("2020-05-01"),
      vec![org(1, "Alpha Ltd")],
    )
    .unwrap();

    assert_eq!(out.deactivated, 1);
    let alpha =
      state.organisations.iter().find(|o| o.org_id == 1).unwrap();
    let beta = state.organisations.iter().find(|o| o.org_id == 2).unwrap();
    assert!(alpha.active);
    assert!(!beta.active);
  }

  #[test]
  fn a_returning_organisation_is_reactivated() {
    let mut state = MemState::default();
    merge_organisations(&mut MemTx::new(&mut state), date("2020-04-01"), vec![
      org(1, "Alpha Ltd"),
    ])
    .unwrap();
    merge_organisations(&mut MemTx::new(&mut state), date("2020-05-01"), vec![])
      .unwrap();
    assert!(!state.organisations[0].active);

    merge_organisations(&mut MemTx::new(&mut state), date("2020-06-01"), vec![
      org(1, "Alpha Renamed Ltd"),
    ])
    .unwrap();
    assert!(state.organisations[0].active);
    assert_eq!(state.organisations[0].name, "Alpha Renamed Ltd");
  }

  #[test]
  fn name_history_keeps_new_rows_per_key() {
    let mut state = MemState::default();
    merge_names(&mut MemTx::new(&mut state), date("2020-04-01"), vec![
      NameRecord {
        org_id:       1,
        age_index:    0,
        name:         "Original Ltd".into(),
        invalid_date: None,
      },
    ])
    .unwrap();
    let out = merge_names(&mut MemTx::new(&mut state), date("2020-05-01"), vec![
      NameRecord {
        org_id:       1,
        age_index:    0,
        name:         "Renamed Ltd".into(),
        invalid_date: None,
      },
      NameRecord {
        org_id:       1,
        age_index:    1,
        name:         "Original Ltd".into(),
        invalid_date: Some(date("2020-04-30")),
      },
    ])
    .unwrap();

    assert_eq!(out.inserted, 2);
    assert_eq!(out.replaced, 1);
    assert_eq!(state.org_names.len(), 2);
    let current =
      state.org_names.iter().find(|n| n.age_index == 0).unwrap();
    assert_eq!(current.name, "Renamed Ltd");
  }

  #[test]
  fn rescored_matches_replace_the_stored_pair() {
    let mut state = MemState::default();
    merge_matches(&mut MemTx::new(&mut state), date("2020-04-01"), vec![
      MatchRecord {
        org_id:         1,
        company_number: "SC123456".into(),
        score:          0.82,
      },
    ])
    .unwrap();
    merge_matches(&mut MemTx::new(&mut state), date("2020-05-01"), vec![
      MatchRecord {
        org_id:         1,
        company_number: "SC123456".into(),
        score:          0.97,
      },
    ])
    .unwrap();

    assert_eq!(state.matches.len(), 1);
    assert!((state.matches[0].score - 0.97).abs() < f64::EPSILON);
  }
}
