//! Bulk loading of customers from raw `"First Last"` names.

use rusqlite::{params, Connection};
use tracing::info;

use crate::error::{Error, Result};

/// Splits `"First Last"` on its single space.
pub fn split_name(raw: &str) -> Result<(String, String)> {
    let malformed = || Error::MalformedName {
        name: raw.to_string(),
    };
    let (first, last) = raw.split_once(' ').ok_or_else(malformed)?;
    if first.is_empty() || last.is_empty() || last.contains(' ') {
        return Err(malformed());
    }
    Ok((first.to_string(), last.to_string()))
}

const INSERT_CUSTOMER: &str = "INSERT INTO customers(first_name, last_name) VALUES (?, ?)";

/// Inserts every name through one prepared statement and returns the number
/// of rows written.
///
/// All names are validated before any SQL runs, so a malformed entry writes
/// nothing. Rows are auto-committed one by one; a store failure part way
/// leaves the earlier rows in place.
pub fn insert_customers<S: AsRef<str>>(conn: &Connection, raw_names: &[S]) -> Result<usize> {
    let pairs = raw_names
        .iter()
        .map(|name| split_name(name.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    if pairs.is_empty() {
        return Ok(0);
    }

    for (first, last) in &pairs {
        info!("Inserting customer record for {first} {last}");
    }

    let mut stmt = conn.prepare(INSERT_CUSTOMER)?;
    let mut inserted = 0;
    for (first, last) in &pairs {
        inserted += stmt.execute(params![first, last])?;
    }
    Ok(inserted)
}
