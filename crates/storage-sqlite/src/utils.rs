//! Helpers shared by the SQLite repositories.
//!
//! Decimals and dates are persisted as text so that values round-trip
//! exactly; these functions are the single place that encodes them.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use navfolio_core::constants::DECIMAL_PRECISION;

use crate::errors::StorageError;

/// Maximum number of bound parameters sent in one SQLite statement.
///
/// SQLite caps bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// 999 on older builds); 500 leaves room for the other parameters in a query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Splits rows for a multi-row INSERT so that `rows * columns_per_row`
/// stays within `SQLITE_MAX_PARAMS_CHUNK` bound parameters.
pub fn chunk_rows_for_sqlite<T>(rows: &[T], columns_per_row: usize) -> impl Iterator<Item = &[T]> {
    rows.chunks((SQLITE_MAX_PARAMS_CHUNK / columns_per_row.max(1)).max(1))
}

pub fn decimal_to_db(value: Decimal) -> String {
    value.round_dp(DECIMAL_PRECISION).normalize().to_string()
}

/// Parses a stored decimal.
///
/// Values written as REAL by older datasets are read through `f64`. Anything
/// that is neither a decimal nor a finite float is reported as malformed.
pub fn decimal_from_db(value: &str, field_name: &str) -> Result<Decimal, StorageError> {
    match Decimal::from_str(value) {
        Ok(d) => Ok(d),
        Err(e_decimal) => match f64::from_str(value) {
            Ok(f_val) => Decimal::from_f64(f_val).ok_or_else(|| {
                log::error!(
                    "Failed to convert {} '{}' (parsed as f64: {}) to Decimal.",
                    field_name,
                    value,
                    f_val
                );
                StorageError::Malformed(format!("{} '{}' is not a finite number", field_name, value))
            }),
            Err(e_f64) => {
                log::error!(
                    "Failed to parse {} '{}': as Decimal (err: {}), and as f64 (err: {}).",
                    field_name,
                    value,
                    e_decimal,
                    e_f64
                );
                Err(StorageError::Malformed(format!(
                    "{} '{}' is not a number",
                    field_name, value
                )))
            }
        },
    }
}

pub fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn date_from_db(value: &str, field_name: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        log::error!("Failed to parse {} '{}' as date: {}", field_name, value, e);
        StorageError::Malformed(format!("{} '{}' is not a YYYY-MM-DD date", field_name, value))
    })
}
