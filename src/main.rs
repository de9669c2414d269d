use anyhow::Context;
use datasource::config::AppConfig;
use datasource::{Runner, Store, Workflow};
use tracing::{error, info, Level};

fn main() -> anyhow::Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            config
        }
        Err(e) => {
            tracing_subscriber::fmt::init();
            error!("failed to load configuration: {e}");
            return Err(e).context("loading configuration");
        }
    };

    let store = Store::open(config.database.clone()).context("opening store")?;
    let workflow = Workflow::from_config(&config.scripts);

    match Runner::new(store.connection(), workflow).run() {
        Ok(state) => {
            info!(
                "run finished: {} seeded, {} read back, {} matched lookup",
                state.seeded,
                state.read_results.len(),
                state.lookup_results.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("run aborted: {e}");
            Err(e).context("running datasource workflow")
        }
    }
}
