//! Error taxonomy for the datasource walkthrough.
//!
//! Nothing here is recovered locally: every variant aborts the run and is
//! surfaced to the process boundary unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::{Stage, Step};

/// Where a script was supposed to come from, kept for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    Resource(String),
    Path(PathBuf),
}

impl std::fmt::Display for ScriptOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptOrigin::Resource(name) => write!(f, "resource '{name}'"),
            ScriptOrigin::Path(path) => write!(f, "file '{}'", path.display()),
        }
    }
}

/// Errors raised by the store, script and query layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity, permission or constraint failure from the store.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Missing or unreadable script source.
    #[error("failed to load script from {origin}: {reason}")]
    ScriptLoad { origin: ScriptOrigin, reason: String },

    /// Malformed SQL or a constraint violation while running ad-hoc SQL.
    #[error("query failed for `{sql}`: {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A result row could not be mapped, e.g. an expected column is missing.
    #[error("cannot map column '{column}': {reason}")]
    Mapping { column: String, reason: String },

    /// A raw name that does not split into exactly `first last`.
    #[error("malformed customer name {name:?}: expected exactly one space between first and last name")]
    MalformedName { name: String },

    /// A runner step was invoked from the wrong stage.
    #[error("step {step:?} cannot run from stage {stage:?}")]
    OutOfSequence { step: Step, stage: Stage },

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    pub(crate) fn query(sql: &str, source: rusqlite::Error) -> Self {
        Error::Query {
            sql: sql.to_string(),
            source,
        }
    }

    /// True for both the execution and the row-mapping flavours of query failure.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Query { .. } | Error::Mapping { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
