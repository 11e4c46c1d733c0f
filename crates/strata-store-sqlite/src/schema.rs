//! SQL schema for the Strata SQLite store.
//!
//! Executed once at connection startup. Dates are ISO `YYYY-MM-DD` text,
//! which compares and MAX()es correctly as strings. Future migrations
//! will be gated on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Parent records, keyed by the source registry's own ids.
CREATE TABLE IF NOT EXISTS organisations (
    org_id   INTEGER PRIMARY KEY,
    name     TEXT NOT NULL,
    website  TEXT NOT NULL,
    active   INTEGER NOT NULL     -- 1 iff present in the latest merged dump
);

CREATE TABLE IF NOT EXISTS organisation_names (
    org_id       INTEGER NOT NULL,
    age_index    INTEGER NOT NULL,   -- 0 = current name
    name         TEXT NOT NULL,
    invalid_date TEXT,               -- NULL while the name is current
    PRIMARY KEY (org_id, age_index)
);

CREATE TABLE IF NOT EXISTS registry_matches (
    org_id         INTEGER NOT NULL,
    company_number TEXT NOT NULL,
    score          REAL NOT NULL,
    PRIMARY KEY (org_id, company_number)
);

-- Dimension tables. Rows are created once and never deleted; canon_key
-- carries the uniqueness the allocator relies on.
CREATE TABLE IF NOT EXISTS addresses (
    address_id   INTEGER PRIMARY KEY,
    canon_key    TEXT NOT NULL UNIQUE,
    address_text TEXT NOT NULL,       -- untruncated, as first seen
    postcode     TEXT
);

CREATE TABLE IF NOT EXISTS sectors (
    sector_id INTEGER PRIMARY KEY,
    canon_key TEXT NOT NULL UNIQUE,   -- the five-digit code
    name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS terms (
    term_id    INTEGER PRIMARY KEY,
    canon_key  TEXT NOT NULL UNIQUE,
    term       TEXT NOT NULL,
    first_seen TEXT NOT NULL
);

-- Dated association tables.
CREATE TABLE IF NOT EXISTS organisation_addresses (
    org_id     INTEGER NOT NULL,
    address_id INTEGER NOT NULL REFERENCES addresses(address_id),
    rank       INTEGER NOT NULL,
    date       TEXT NOT NULL,
    PRIMARY KEY (org_id, address_id, date)
);

CREATE TABLE IF NOT EXISTS organisation_sectors (
    org_id    INTEGER NOT NULL,
    sector_id INTEGER NOT NULL REFERENCES sectors(sector_id),
    rank      INTEGER NOT NULL,
    date      TEXT NOT NULL,
    PRIMARY KEY (org_id, sector_id, date)
);

CREATE TABLE IF NOT EXISTS notices (
    notice_id TEXT PRIMARY KEY,
    org_id    INTEGER NOT NULL,
    snippet   TEXT NOT NULL,
    url       TEXT NOT NULL,
    date      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notice_terms (
    notice_id TEXT NOT NULL REFERENCES notices(notice_id),
    term_id   INTEGER NOT NULL REFERENCES terms(term_id),
    date      TEXT NOT NULL,
    PRIMARY KEY (notice_id, term_id)
);

CREATE INDEX IF NOT EXISTS org_addresses_date_idx ON organisation_addresses(date);
CREATE INDEX IF NOT EXISTS org_sectors_date_idx   ON organisation_sectors(date);
CREATE INDEX IF NOT EXISTS notices_org_idx        ON notices(org_id);
CREATE INDEX IF NOT EXISTS addresses_postcode_idx ON addresses(postcode);

PRAGMA user_version = 1;
";
