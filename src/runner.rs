//! The fixed startup sequence.
//!
//! `START → RESET_SCHEMA → SEED_BATCH → RUN_WRITE_SCRIPT →
//! LOAD_AND_RUN_READ_SCRIPT → RUN_PARAMETERIZED_QUERY → DONE`
//!
//! Each [`Step`] takes the connection and the prior [`RunState`] and returns
//! the next state. The first error aborts the run; nothing is retried or
//! skipped.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::batch::insert_customers;
use crate::config::ScriptConfig;
use crate::customer::Customer;
use crate::error::{Error, Result};
use crate::query::{execute_script, query};
use crate::schema::reset_table;
use crate::script::{load_script, ScriptOptions, ScriptSource, WRITE_SCRIPT};
use crate::sqlite::{Params, SqlQuery};

pub const SEED_NAMES: [&str; 6] = [
    "John Woo",
    "Jeff Dean",
    "Josh Bloch",
    "Josh Long",
    "Eric Mooney",
    "Elvis Presley",
];

pub const LOOKUP_SQL: &str = "SELECT id, first_name, last_name FROM customers WHERE first_name = ?";
pub const LOOKUP_FIRST_NAME: &str = "Josh";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Start,
    SchemaReset,
    Seeded,
    WriteScriptRun,
    ReadScriptRun,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ResetSchema,
    SeedBatch,
    RunWriteScript,
    LoadAndRunReadScript,
    RunParameterizedQuery,
}

impl Step {
    pub const SEQUENCE: [Step; 5] = [
        Step::ResetSchema,
        Step::SeedBatch,
        Step::RunWriteScript,
        Step::LoadAndRunReadScript,
        Step::RunParameterizedQuery,
    ];

    /// The stage this step must start from.
    pub fn requires(self) -> Stage {
        match self {
            Step::ResetSchema => Stage::Start,
            Step::SeedBatch => Stage::SchemaReset,
            Step::RunWriteScript => Stage::Seeded,
            Step::LoadAndRunReadScript => Stage::WriteScriptRun,
            Step::RunParameterizedQuery => Stage::ReadScriptRun,
        }
    }

    /// The stage reached when this step succeeds.
    pub fn produces(self) -> Stage {
        match self {
            Step::ResetSchema => Stage::SchemaReset,
            Step::SeedBatch => Stage::Seeded,
            Step::RunWriteScript => Stage::WriteScriptRun,
            Step::LoadAndRunReadScript => Stage::ReadScriptRun,
            Step::RunParameterizedQuery => Stage::Done,
        }
    }
}

/// What the run has produced so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub stage: Stage,
    pub seeded: usize,
    pub write_statements: usize,
    pub read_sql: Option<String>,
    pub read_results: Vec<Customer>,
    pub lookup_results: Vec<Customer>,
}

/// Inputs for one run: seed names, script sources and the lookup query.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub seed_names: Vec<String>,
    pub write_script: ScriptSource,
    pub read_script: ScriptSource,
    pub options: ScriptOptions,
    pub lookup: SqlQuery,
}

impl Workflow {
    pub fn new(read_script: ScriptSource) -> Self {
        Self {
            seed_names: SEED_NAMES.iter().map(|name| name.to_string()).collect(),
            write_script: ScriptSource::resource(WRITE_SCRIPT),
            read_script,
            options: ScriptOptions::default(),
            lookup: SqlQuery::new(LOOKUP_SQL)
                .with_params(Params::new().with_value(LOOKUP_FIRST_NAME)),
        }
    }

    pub fn from_config(scripts: &ScriptConfig) -> Self {
        Self {
            write_script: scripts.write_source(),
            options: scripts.options(),
            ..Self::new(scripts.read_source())
        }
    }

    pub fn with_seed_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.seed_names = names.into_iter().map(Into::into).collect();
        self
    }
}

pub struct Runner<'conn> {
    conn: &'conn Connection,
    workflow: Workflow,
}

impl<'conn> Runner<'conn> {
    pub fn new(conn: &'conn Connection, workflow: Workflow) -> Self {
        Self { conn, workflow }
    }

    /// Runs every step in order from a fresh state.
    pub fn run(&self) -> Result<RunState> {
        Step::SEQUENCE
            .iter()
            .try_fold(RunState::default(), |state, step| self.step(*step, state))
    }

    /// Runs a single step against `state`.
    pub fn step(&self, step: Step, mut state: RunState) -> Result<RunState> {
        if state.stage != step.requires() {
            return Err(Error::OutOfSequence {
                step,
                stage: state.stage,
            });
        }
        debug!("running step {step:?}");

        match step {
            Step::ResetSchema => reset_table(self.conn)?,
            Step::SeedBatch => {
                state.seeded = insert_customers(self.conn, self.workflow.seed_names.as_slice())?;
            }
            Step::RunWriteScript => {
                let script = load_script(&self.workflow.write_script, &self.workflow.options)?;
                state.write_statements = execute_script(self.conn, &script, &self.workflow.options)?;
            }
            Step::LoadAndRunReadScript => {
                let sql = load_script(&self.workflow.read_script, &self.workflow.options)?;
                info!("----------");
                info!("This is what came back from reading the sql in a file:");
                info!("sql file contents: {sql}");
                state.read_results = query(self.conn, &sql, &Params::new())?;
                log_customers(&state.read_results);
                info!("-------");
                info!("sql statement coming from read.sql is {sql}");
                info!("-------");
                state.read_sql = Some(sql);
            }
            Step::RunParameterizedQuery => {
                info!("Querying for customer records where first_name = '{LOOKUP_FIRST_NAME}':");
                let lookup = &self.workflow.lookup;
                state.lookup_results = query(self.conn, &lookup.statement, &lookup.params)?;
                log_customers(&state.lookup_results);
            }
        }

        state.stage = step.produces();
        Ok(state)
    }
}

fn log_customers(customers: &[Customer]) {
    for customer in customers {
        info!("{customer}");
    }
}
