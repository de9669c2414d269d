use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use datasource::batch::insert_customers;
use datasource::query::{execute_script, query};
use datasource::runner::{LOOKUP_SQL, SEED_NAMES};
use datasource::schema::{count_customers, reset_table};
use datasource::script::{load_script, ScriptOptions, ScriptSource, READ_SCRIPT, WRITE_SCRIPT};
use datasource::{Customer, Error, Params, Result, RunState, Runner, Stage, Step, Store, StoreConfig, Workflow};
use tempfile::NamedTempFile;
use tracing::Level;

// Helper function to create an in-memory store with an empty customers table
fn create_test_db() -> Result<Store> {
    let store = Store::open_in_memory()?;
    reset_table(store.connection())?;
    Ok(store)
}

// Helper function to create a temporary file-based store
fn create_temp_db() -> Result<(Store, NamedTempFile)> {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap();
    let store = Store::open(StoreConfig::new(path))?;
    reset_table(store.connection())?;
    Ok((store, temp_file))
}

fn read_script_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join(READ_SCRIPT)
}

fn all_customers(store: &Store) -> Result<Vec<Customer>> {
    query(
        store.connection(),
        "SELECT id, first_name, last_name FROM customers",
        &Params::new(),
    )
}

#[test]
fn test_seed_and_lookup() {
    test_seed_and_lookup_impl().unwrap();
}

fn test_seed_and_lookup_impl() -> Result<()> {
    let store = create_test_db()?;
    let conn = store.connection();

    assert_eq!(insert_customers(conn, &SEED_NAMES)?, 6);
    assert_eq!(count_customers(conn)?, 6);

    let joshes = query(conn, LOOKUP_SQL, &Params::new().with_value("Josh"))?;
    assert_eq!(joshes.len(), 2);
    let last_names: HashSet<&str> = joshes.iter().map(|c| c.last_name.as_str()).collect();
    assert_eq!(last_names, HashSet::from(["Bloch", "Long"]));
    assert!(joshes.iter().all(|c| c.first_name == "Josh"));

    Ok(())
}

#[test]
fn test_each_name_gets_one_fresh_row() {
    test_each_name_gets_one_fresh_row_impl().unwrap();
}

fn test_each_name_gets_one_fresh_row_impl() -> Result<()> {
    let store = create_test_db()?;
    let conn = store.connection();
    insert_customers(conn, &["Ada Lovelace"])?;
    let before: HashSet<i64> = all_customers(&store)?.iter().map(|c| c.id).collect();

    insert_customers(conn, &["Alan Turing"])?;
    let after = all_customers(&store)?;
    assert_eq!(after.len(), before.len() + 1);

    let added: Vec<&Customer> = after.iter().filter(|c| !before.contains(&c.id)).collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].first_name, "Alan");
    assert_eq!(added[0].last_name, "Turing");
    Ok(())
}

#[test]
fn test_write_script_adds_exactly_one_row() {
    test_write_script_adds_exactly_one_row_impl().unwrap();
}

fn test_write_script_adds_exactly_one_row_impl() -> Result<()> {
    let store = create_test_db()?;
    let conn = store.connection();
    let options = ScriptOptions::default();
    insert_customers(conn, &SEED_NAMES)?;

    let script = load_script(&ScriptSource::resource(WRITE_SCRIPT), &options)?;
    assert_eq!(execute_script(conn, &script, &options)?, 1);
    assert_eq!(count_customers(conn)?, 7);
    Ok(())
}

#[test]
fn test_read_script_round_trips_file_content() {
    test_read_script_round_trips_file_content_impl().unwrap();
}

fn test_read_script_round_trips_file_content_impl() -> Result<()> {
    let (store, _temp) = create_temp_db()?;
    let conn = store.connection();
    insert_customers(conn, &["John Woo", "Jeff Dean"])?;

    let script_file = NamedTempFile::new().unwrap();
    std::fs::write(
        script_file.path(),
        "-- only the Woos\nSELECT id, first_name, last_name\nFROM customers\nWHERE last_name = 'Woo'",
    )
    .unwrap();

    let sql = load_script(&ScriptSource::path(script_file.path()), &ScriptOptions::default())?;
    assert_eq!(
        sql,
        "SELECT id, first_name, last_name\nFROM customers\nWHERE last_name = 'Woo'"
    );

    let found = query(conn, &sql, &Params::new())?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].first_name, "John");
    Ok(())
}

#[test]
fn test_full_run_against_file_store() {
    test_full_run_against_file_store_impl().unwrap();
}

fn test_full_run_against_file_store_impl() -> Result<()> {
    let (store, temp) = create_temp_db()?;
    let state = Runner::new(
        store.connection(),
        Workflow::new(ScriptSource::path(read_script_path())),
    )
    .run()?;

    assert_eq!(state.stage, Stage::Done);
    assert_eq!(state.read_results.len(), 7);
    assert!(state
        .read_results
        .iter()
        .any(|c| c.first_name == "Grace" && c.last_name == "Hopper"));
    drop(store);

    // rows survive in the file after the connection is gone
    let reopened = Store::open(StoreConfig::new(temp.path().to_str().unwrap()))?;
    assert_eq!(count_customers(reopened.connection())?, 7);
    Ok(())
}

#[test]
fn test_rerun_resets_table() {
    test_rerun_resets_table_impl().unwrap();
}

fn test_rerun_resets_table_impl() -> Result<()> {
    let (store, _temp) = create_temp_db()?;
    let workflow = Workflow::new(ScriptSource::path(read_script_path()));
    Runner::new(store.connection(), workflow.clone()).run()?;
    let second = Runner::new(store.connection(), workflow).run()?;
    assert_eq!(second.read_results.len(), 7);
    assert_eq!(count_customers(store.connection())?, 7);
    Ok(())
}

#[test]
fn test_missing_read_script_aborts_before_lookup() {
    let store = Store::open_in_memory().unwrap();
    let runner = Runner::new(
        store.connection(),
        Workflow::new(ScriptSource::path("/no/such/dir/read.sql")),
    );

    let err = runner.run().unwrap_err();
    assert!(matches!(err, Error::ScriptLoad { .. }), "unexpected error: {err}");

    // Replaying the steps shows where the run stopped.
    let mut state = RunState::default();
    for step in Step::SEQUENCE {
        match runner.step(step, state.clone()) {
            Ok(next) => state = next,
            Err(_) => break,
        }
    }
    assert_eq!(state.stage, Stage::WriteScriptRun);
    assert!(state.lookup_results.is_empty());
}

#[test]
fn test_malformed_seed_aborts_run() {
    let store = Store::open_in_memory().unwrap();
    let workflow =
        Workflow::new(ScriptSource::path(read_script_path())).with_seed_names(["John Woo", "Madonna"]);
    let err = Runner::new(store.connection(), workflow).run().unwrap_err();
    assert!(matches!(err, Error::MalformedName { ref name } if name == "Madonna"));
    assert_eq!(count_customers(store.connection()).unwrap(), 0);
}

// Log sink shared between the subscriber and the assertions
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }
}

#[test]
fn test_full_run_logs_results_in_order() {
    test_full_run_logs_results_in_order_impl().unwrap();
}

fn test_full_run_logs_results_in_order_impl() -> Result<()> {
    let store = create_test_db()?;
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        Runner::new(
            store.connection(),
            Workflow::new(ScriptSource::path(read_script_path())),
        )
        .run()
    })?;

    let lines = log.lines();
    let position = |wanted: &str| {
        lines
            .iter()
            .position(|line| line.starts_with(wanted))
            .unwrap_or_else(|| panic!("no log line starting with {wanted:?} in {lines:#?}"))
    };

    let mut last_insert = 0;
    for name in SEED_NAMES {
        let at = position(&format!("Inserting customer record for {name}"));
        assert!(at >= last_insert, "{name} logged out of order");
        last_insert = at;
    }
    assert!(last_insert < position("Executed SQL script"));

    let banner = position("----------");
    assert!(banner > last_insert);
    assert_eq!(lines[banner + 1], "This is what came back from reading the sql in a file:");
    assert!(lines[banner + 2].starts_with("sql file contents: SELECT id, first_name, last_name FROM customers"));

    let read_rows = &lines[banner + 3..banner + 10];
    assert!(read_rows.iter().all(|line| line.starts_with("Customer[id=")));
    assert!(read_rows
        .iter()
        .any(|line| line.ends_with("firstName='Grace', lastName='Hopper']")));

    assert_eq!(lines[banner + 10], "-------");
    assert!(lines[banner + 11].starts_with("sql statement coming from read.sql is SELECT"));
    assert_eq!(lines[banner + 12], "-------");
    assert_eq!(
        lines[banner + 13],
        "Querying for customer records where first_name = 'Josh':"
    );

    let lookup_rows = &lines[banner + 14..];
    assert_eq!(lookup_rows.len(), 2, "{lookup_rows:#?}");
    assert!(lookup_rows
        .iter()
        .all(|line| line.starts_with("Customer[id=") && line.contains("firstName='Josh'")));
    Ok(())
}

#[test]
fn test_customer_serializes_with_field_names() {
    let customer = Customer::new(3, "Josh", "Bloch");
    let json = serde_json::to_value(&customer).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "id": 3, "first_name": "Josh", "last_name": "Bloch" })
    );
}
