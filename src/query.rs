//! Ad-hoc script execution and customer queries.

use std::time::Instant;

use rusqlite::{Connection, Rows, Statement};
use tracing::{debug, info};

use crate::customer::Customer;
use crate::error::{Error, Result};
use crate::script::{split_statements, ScriptOptions};
use crate::sqlite::Params;

/// Runs every statement in `sql_text` in order, without binding or capturing
/// results. Returns how many statements ran; stops at the first failure.
pub fn execute_script(conn: &Connection, sql_text: &str, options: &ScriptOptions) -> Result<usize> {
    let started = Instant::now();
    let statements = split_statements(sql_text, options);
    for (i, statement) in statements.iter().enumerate() {
        debug!("executing statement {} of {}: {statement}", i + 1, statements.len());
        conn.execute_batch(statement)
            .map_err(|e| Error::query(statement, e))?;
    }
    info!(
        "Executed SQL script ({} statements) in {} ms.",
        statements.len(),
        started.elapsed().as_millis()
    );
    Ok(statements.len())
}

/// Customers mapped one row at a time as the cursor advances.
///
/// A failure while stepping the cursor is reported against the query's SQL.
pub struct CustomerRows<'stmt> {
    sql: &'stmt str,
    rows: Rows<'stmt>,
}

impl Iterator for CustomerRows<'_> {
    type Item = Result<Customer>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(Customer::from_row(row)),
            Ok(None) => None,
            Err(e) => Some(Err(Error::query(self.sql, e))),
        }
    }
}

/// A prepared customer query whose rows are mapped lazily.
pub struct PreparedQuery<'conn> {
    sql: String,
    statement: Statement<'conn>,
}

impl<'conn> PreparedQuery<'conn> {
    pub fn prepare(conn: &'conn Connection, sql: &str) -> Result<Self> {
        let statement = conn.prepare(sql).map_err(|e| Error::query(sql, e))?;
        Ok(Self {
            sql: sql.to_string(),
            statement,
        })
    }

    /// Binds `params` and yields customers in store cursor order.
    pub fn customers(&mut self, params: &Params) -> Result<CustomerRows<'_>> {
        let sql = self.sql.as_str();
        let rows = self
            .statement
            .query(rusqlite::params_from_iter(params.values.iter()))
            .map_err(|e| Error::query(sql, e))?;
        Ok(CustomerRows { sql, rows })
    }
}

/// Runs one statement with positional parameters and maps every row into a
/// [`Customer`]. No ordering is imposed.
pub fn query(conn: &Connection, sql_text: &str, params: &Params) -> Result<Vec<Customer>> {
    let mut prepared = PreparedQuery::prepare(conn, sql_text)?;
    // Bound first so the row cursor is dropped before `prepared`.
    let customers = prepared.customers(params)?.collect::<Result<Vec<_>>>();
    customers
}
