//! Encoding helpers between `chrono` dates and the ISO text stored in
//! SQLite date columns.

use chrono::NaiveDate;
use strata_core::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String {
  date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(
  column: &'static str,
  value: &str,
) -> strata_core::Result<NaiveDate> {
  NaiveDate::parse_from_str(value, DATE_FORMAT)
    .map_err(|_| Error::InvalidDate { column, value: value.to_string() })
}

pub fn decode_date_opt(
  column: &'static str,
  value: Option<&str>,
) -> strata_core::Result<Option<NaiveDate>> {
  value.map(|v| decode_date(column, v)).transpose()
}
