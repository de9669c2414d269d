use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use crate::error::Result;

/// Core value types for SQLite bind parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Positional parameter bindings for `?` placeholders, in bind order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: Vec<Value>,
}

impl Params {
    /// Create an empty Params object
    pub fn new() -> Self {
        Self::default()
    }
    /// Append the value bound to the next placeholder
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// SQL statement with typed positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Params::new(),
        }
    }
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Table definition rendered into DDL by the schema manager
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        format!("CREATE TABLE {} ({})", self.name, columns.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.to_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.to_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Integer,
    Varchar(u32),
}

impl DataType {
    fn to_sql(&self) -> String {
        match self {
            DataType::Integer => "INTEGER".to_string(),
            DataType::Varchar(len) => format!("VARCHAR({len})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    PrimaryKey,
    // Only valid after PrimaryKey on an INTEGER column.
    AutoIncrement,
}

impl ColumnConstraint {
    fn to_sql(&self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::AutoIncrement => "AUTOINCREMENT",
        }
    }
}

pub const IN_MEMORY: &str = ":memory:";

/// SQLite store configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub path: String,
}

impl StoreConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// The single store connection, opened once and lent to every component.
pub struct Store {
    connection: Connection,
}

impl Store {
    /// Open the store described by `config`
    pub fn open(config: StoreConfig) -> Result<Self> {
        info!("opening sqlite store at path: {}", config.path);
        let connection = if config.path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(StoreConfig::new(IN_MEMORY))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}
