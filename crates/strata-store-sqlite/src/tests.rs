use chrono::NaiveDate;
use strata_core::{
  dimension::{Address, Dimension, Term},
  link::{Notice, NoticeTerm, OrgAddress},
  org::{OrgName, Organisation, RegistryMatch},
  policy::Table,
  store::CurationStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn date(text: &str) -> NaiveDate {
  text.parse().expect("test date")
}

fn address(address_id: i64, canon_key: &str) -> Address {
  Address {
    address_id,
    canon_key: canon_key.into(),
    address_text: canon_key.to_uppercase(),
    postcode: None,
  }
}

fn link(org_id: i64, address_id: i64, on: &str) -> OrgAddress {
  OrgAddress { org_id, address_id, rank: 1, date: date(on) }
}

fn org(org_id: i64, name: &str) -> Organisation {
  Organisation {
    org_id,
    name: name.into(),
    website: String::new(),
    active: true,
  }
}

fn org_name(
  org_id: i64,
  age_index: i32,
  text: &str,
  invalid: Option<&str>,
) -> OrgName {
  OrgName {
    org_id,
    age_index,
    name: text.into(),
    invalid_date: invalid.map(date),
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn exec_commits_on_ok() {
  let store = store().await;

  store
    .exec(|tx| {
      tx.insert_addresses(&[
        address(1, "12 main street"),
        Address {
          address_id:   2,
          canon_key:    "9 hill road".into(),
          address_text: "9 Hill Road".into(),
          postcode:     Some("AB1 2CD".into()),
        },
      ])
    })
    .await
    .expect("insert addresses");

  let rows = store.exec(|tx| tx.addresses()).await.expect("scan addresses");
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[1].postcode.as_deref(), Some("AB1 2CD"));
}

#[tokio::test]
async fn exec_rolls_back_on_err() {
  let store = store().await;

  let result = store
    .exec(|tx| {
      tx.insert_addresses(&[address(1, "12 main street")])?;
      Err::<(), _>(strata_core::Error::Constraint {
        table:  "addresses",
        detail: "forced failure".into(),
      })
    })
    .await;
  assert!(matches!(result, Err(Error::Core(_))));

  let rows = store.exec(|tx| tx.addresses()).await.expect("scan addresses");
  assert!(rows.is_empty());
}

#[tokio::test]
async fn reopening_a_file_store_reruns_schema_init_safely() {
  let path = std::env::temp_dir().join("strata-store-reopen-test.sqlite3");
  let _ = std::fs::remove_file(&path);

  {
    let store = SqliteStore::open(&path).await.expect("first open");
    store
      .exec(|tx| tx.insert_addresses(&[address(1, "12 main street")]))
      .await
      .expect("insert addresses");
  }

  // Second open replays the schema batch against the populated file.
  let store = SqliteStore::open(&path).await.expect("second open");
  let rows = store.exec(|tx| tx.addresses()).await.expect("scan addresses");
  assert_eq!(rows.len(), 1);

  let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn duplicate_canon_key_is_a_storage_error() {
  let store = store().await;
  store
    .exec(|tx| tx.insert_addresses(&[address(1, "12 main street")]))
    .await
    .expect("first insert");

  let result = store
    .exec(|tx| tx.insert_addresses(&[address(2, "12 main street")]))
    .await;
  assert!(matches!(
    result,
    Err(Error::Core(strata_core::Error::Storage(_)))
  ));
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn dimension_keys_lists_existing_rows() {
  let store = store().await;
  store
    .exec(|tx| {
      tx.insert_addresses(&[
        address(1, "12 main street"),
        address(2, "9 hill road"),
      ])
    })
    .await
    .expect("insert addresses");

  let keys = store
    .exec(|tx| tx.dimension_keys(Dimension::Address))
    .await
    .expect("dimension keys");
  assert_eq!(keys.len(), 2);
  assert!(keys.contains(&("12 main street".into(), 1)));
  assert!(keys.contains(&("9 hill road".into(), 2)));
}

#[tokio::test]
async fn dates_roundtrip_through_the_store() {
  let store = store().await;
  store
    .exec(|tx| {
      tx.insert_terms(&[Term {
        term_id:    1,
        canon_key:  "asbestos".into(),
        term:       "asbestos".into(),
        first_seen: date("2020-04-01"),
      }])?;
      tx.insert_organisations(&[org(1, "Acme")])?;
      tx.insert_org_names(&[
        org_name(1, 0, "Acme", None),
        org_name(1, 1, "Acme Holdings", Some("2019-06-30")),
      ])
    })
    .await
    .expect("insert rows");

  let (terms, names) = store
    .exec(|tx| Ok((tx.terms()?, tx.org_names()?)))
    .await
    .expect("scan rows");
  assert_eq!(terms[0].first_seen, date("2020-04-01"));
  assert_eq!(names[0].invalid_date, None);
  assert_eq!(names[1].invalid_date, Some(date("2019-06-30")));
}

// ─── Dated association tables ────────────────────────────────────────────────

#[tokio::test]
async fn latest_date_tracks_the_maximum() {
  let store = store().await;

  let empty = store
    .exec(|tx| tx.latest_date(Table::OrgAddresses))
    .await
    .expect("latest date");
  assert_eq!(empty, None);

  store
    .exec(|tx| {
      tx.insert_addresses(&[address(1, "12 main street")])?;
      tx.insert_org_addresses(&[
        link(10, 1, "2020-04-01"),
        link(11, 1, "2020-03-01"),
      ])
    })
    .await
    .expect("insert links");

  let latest = store
    .exec(|tx| tx.latest_date(Table::OrgAddresses))
    .await
    .expect("latest date");
  assert_eq!(latest, Some(date("2020-04-01")));
}

#[tokio::test]
async fn delete_on_scopes_to_one_date() {
  let store = store().await;
  store
    .exec(|tx| {
      tx.insert_addresses(&[address(1, "12 main street")])?;
      tx.insert_org_addresses(&[
        link(10, 1, "2020-03-01"),
        link(10, 1, "2020-04-01"),
        link(11, 1, "2020-04-01"),
      ])
    })
    .await
    .expect("insert links");

  let removed = store
    .exec(|tx| tx.delete_on(Table::OrgAddresses, date("2020-04-01")))
    .await
    .expect("delete by date");
  assert_eq!(removed, 2);

  let rows =
    store.exec(|tx| tx.org_addresses()).await.expect("scan links");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].date, date("2020-03-01"));

  // Tables without a date column are untouched by date-scoped deletes.
  let untouched = store
    .exec(|tx| tx.delete_on(Table::Organisations, date("2020-04-01")))
    .await
    .expect("delete on record table");
  assert_eq!(untouched, 0);
}

#[tokio::test]
async fn notice_rows_link_to_terms() {
  let store = store().await;
  store
    .exec(|tx| {
      tx.insert_terms(&[Term {
        term_id:    1,
        canon_key:  "landfill".into(),
        term:       "landfill".into(),
        first_seen: date("2020-04-01"),
      }])?;
      tx.insert_notices(&[Notice {
        notice_id: "N-2020-001".into(),
        org_id:    10,
        snippet:   "unauthorised deposit".into(),
        url:       "https://example.org/n/1".into(),
        date:      date("2020-04-01"),
      }])?;
      tx.insert_notice_terms(&[NoticeTerm {
        notice_id: "N-2020-001".into(),
        term_id:   1,
        date:      date("2020-04-01"),
      }])
    })
    .await
    .expect("insert notice rows");

  let links =
    store.exec(|tx| tx.notice_terms()).await.expect("scan links");
  assert_eq!(links.len(), 1);
  assert_eq!(links[0].notice_id, "N-2020-001");
  assert_eq!(links[0].term_id, 1);
}

// ─── Registry records ────────────────────────────────────────────────────────

#[tokio::test]
async fn keyed_deletes_remove_only_named_rows() {
  let store = store().await;
  store
    .exec(|tx| {
      tx.insert_organisations(&[org(1, "Acme"), org(2, "Bolt")])?;
      tx.insert_org_names(&[
        org_name(1, 0, "Acme", None),
        org_name(1, 1, "Acme Old", Some("2019-01-01")),
      ])?;
      tx.insert_matches(&[RegistryMatch {
        org_id:         1,
        company_number: "SC123456".into(),
        score:          0.91,
      }])
    })
    .await
    .expect("seed records");

  let removed = store
    .exec(|tx| {
      let names = tx.delete_org_names(&[(1, 0)])?;
      let matches = tx.delete_matches(&[(1, "SC123456".into())])?;
      let orgs = tx.delete_organisations(&[2])?;
      Ok((names, matches, orgs))
    })
    .await
    .expect("delete rows");
  assert_eq!(removed, (1, 1, 1));

  let (names, orgs) = store
    .exec(|tx| Ok((tx.org_names()?, tx.organisations()?)))
    .await
    .expect("scan records");
  assert_eq!(names.len(), 1);
  assert_eq!(names[0].age_index, 1);
  assert_eq!(orgs.len(), 1);
  assert_eq!(orgs[0].org_id, 1);
}

#[tokio::test]
async fn deactivate_flags_every_row() {
  let store = store().await;
  store
    .exec(|tx| tx.insert_organisations(&[org(1, "Acme"), org(2, "Bolt")]))
    .await
    .expect("insert organisations");

  let touched = store
    .exec(|tx| tx.deactivate_organisations())
    .await
    .expect("deactivate");
  assert_eq!(touched, 2);

  let orgs = store.exec(|tx| tx.organisations()).await.expect("scan");
  assert!(orgs.iter().all(|org| !org.active));
}
