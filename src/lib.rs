//! SQLite customer datasource walkthrough.
//!
//! # Intention
//!
//! - Reset a `customers` table, batch-load it, run SQL scripts from a bundled
//!   resource and from disk, and run a parameterized lookup.
//! - Keep every store operation an explicit call over a borrowed
//!   `rusqlite::Connection`; there is no ambient connection state.
//!
//! # Architectural Boundaries
//!
//! - Only the store, script and mapping code lives here.
//! - Bootstrap (configuration, logging subscriber, exit code) belongs to the binary.

pub mod batch;
pub mod config;
pub mod customer;
pub mod error;
pub mod query;
pub mod runner;
pub mod schema;
pub mod script;
pub mod sqlite;

pub use customer::{Customer, RowAccess};
pub use error::{Error, Result};
pub use runner::{RunState, Runner, Stage, Step, Workflow};
pub use sqlite::{Params, SqlQuery, Store, StoreConfig, Value};
