//! The `customers` table lifecycle.

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::sqlite::{ColumnConstraint, ColumnDefinition, DataType, TableDefinition};

pub const CUSTOMERS: &str = "customers";

/// `customers(id SERIAL, first_name VARCHAR(255), last_name VARCHAR(255))`
/// in SQLite terms.
pub fn customers_table() -> TableDefinition {
    TableDefinition::new(CUSTOMERS)
        .add_column(
            ColumnDefinition::new("id", DataType::Integer)
                .with_constraint(ColumnConstraint::PrimaryKey)
                .with_constraint(ColumnConstraint::AutoIncrement),
        )
        .add_column(ColumnDefinition::new("first_name", DataType::Varchar(255)))
        .add_column(ColumnDefinition::new("last_name", DataType::Varchar(255)))
}

/// Drops `customers` if present and creates it empty. Existing rows are lost.
pub fn reset_table(conn: &Connection) -> Result<()> {
    info!("Creating tables");
    let table = customers_table();
    conn.execute(&table.drop_sql(), [])?;
    conn.execute(&table.create_sql(), [])?;
    Ok(())
}

pub fn count_customers(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
    Ok(count)
}
