//! The `Customer` record and its explicit row mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored customer. `id` is assigned by the store and never supplied on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Customer {
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Builds a customer from the `id`, `first_name` and `last_name` columns.
    pub fn from_row(row: &impl RowAccess) -> Result<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            first_name: row.get_text("first_name")?,
            last_name: row.get_text("last_name")?,
        })
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer[id={}, firstName='{}', lastName='{}']",
            self.id, self.first_name, self.last_name
        )
    }
}

/// By-name column getters over a single result row.
pub trait RowAccess {
    fn get_i64(&self, column: &str) -> Result<i64>;
    fn get_text(&self, column: &str) -> Result<String>;
}

fn mapping_err(column: &str, e: rusqlite::Error) -> Error {
    Error::Mapping {
        column: column.to_string(),
        reason: e.to_string(),
    }
}

impl RowAccess for rusqlite::Row<'_> {
    fn get_i64(&self, column: &str) -> Result<i64> {
        self.get(column).map_err(|e| mapping_err(column, e))
    }

    fn get_text(&self, column: &str) -> Result<String> {
        self.get(column).map_err(|e| mapping_err(column, e))
    }
}
