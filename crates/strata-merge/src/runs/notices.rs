//! Notice merge: intern matched terms, append notices and term links.

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDate;
use strata_core::{
  Result,
  alloc::{Allocation, KeyAllocator},
  batch::NoticeRecord,
  dimension::{Dimension, Term},
  link::{Notice, NoticeTerm},
  store::CurationTx,
};

use crate::{MergeConfig, apply, report::NoticeOutcome};

/// Merge one dump's notice batch.
///
/// Each notice's semicolon-delimited terms are resolved to surrogate term
/// ids; notices and their term links are then appended. Notices are
/// permanent history, so re-running a dump collides on notice ids and
/// rolls the run back rather than duplicating rows.
pub fn merge_notices(
  tx: &mut dyn CurationTx,
  cfg: &MergeConfig,
  date: NaiveDate,
  batch: Vec<NoticeRecord>,
) -> Result<NoticeOutcome> {
  let existing = tx.dimension_keys(Dimension::Term)?;
  let mut alloc =
    KeyAllocator::seed(cfg.term_key_chars, cfg.first_surrogate_id, existing);

  let mut queue = VecDeque::from(batch);
  let mut fresh: Vec<Term> = Vec::new();
  let mut notices: Vec<Notice> = Vec::new();
  let mut term_links: Vec<NoticeTerm> = Vec::new();
  let mut reused = 0usize;
  while let Some(record) = queue.pop_front() {
    // Terms are split verbatim; segments are not trimmed, and an empty
    // segment is a legal term with its own stable id.
    let mut term_ids: Vec<i64> = Vec::new();
    for raw in record.matched_terms.split(';') {
      match alloc.get_or_create(raw) {
        Allocation::Existing(id) => {
          reused += 1;
          term_ids.push(id);
        }
        Allocation::Created { id, canon_key } => {
          fresh.push(Term {
            term_id: id,
            canon_key,
            term: raw.to_string(),
            first_seen: date,
          });
          term_ids.push(id);
        }
      }
    }
    // A notice may name the same term twice once canonicalization has
    // collapsed variants; link each term once.
    let mut seen = HashSet::new();
    term_ids.retain(|id| seen.insert(*id));

    for term_id in term_ids {
      term_links.push(NoticeTerm {
        notice_id: record.notice_id.clone(),
        term_id,
        date,
      });
    }
    notices.push(Notice {
      notice_id: record.notice_id,
      org_id:    record.org_id,
      snippet:   record.snippet,
      url:       record.url,
      date,
    });
  }

  let terms_created = fresh.len();
  tx.insert_terms(&fresh)?;
  let applied_notices = apply::apply(tx, date, notices)?;
  let applied_links = apply::apply(tx, date, term_links)?;

  tracing::info!(
    "merged notices for {date}: {} notices, {terms_created} terms created, \
     {} term links",
    applied_notices.inserted,
    applied_links.inserted
  );
  Ok(NoticeOutcome {
    notices:       applied_notices.inserted,
    terms_created,
    terms_reused:  reused,
    term_links:    applied_links.inserted,
  })
}
