use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::script::{
    ScriptOptions, ScriptSource, DEFAULT_COMMENT_PREFIX, DEFAULT_STATEMENT_SEPARATOR, WRITE_SCRIPT,
};
use crate::sqlite::{StoreConfig, IN_MEMORY};

/// Optional settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "datasource";
pub const ENV_PREFIX: &str = "DATASOURCE";

/// Where the read script lives when nothing overrides it.
pub const DEFAULT_READ_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/read.sql");

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database: StoreConfig,
    pub scripts: ScriptConfig,
    pub logger: Logger,
}

impl AppConfig {
    /// Defaults, then `datasource.toml` if present, then `DATASOURCE__*` env vars.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`] but with an explicit, required settings file.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("database.path", IN_MEMORY)?
            .set_default("scripts.write_resource", WRITE_SCRIPT)?
            .set_default("scripts.read_path", DEFAULT_READ_PATH)?
            .set_default("scripts.comment_prefix", DEFAULT_COMMENT_PREFIX)?
            .set_default("scripts.separator", DEFAULT_STATEMENT_SEPARATOR)?
            .set_default("logger.level", "info")?;
        let builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(CONFIG_FILE).required(false)),
        };
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<AppConfig>()?;
        Ok(config)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptConfig {
    /// Bundled script run as a fire-and-forget write.
    pub write_resource: String,
    /// Script on disk run as a row-returning query.
    pub read_path: PathBuf,
    pub comment_prefix: String,
    pub separator: String,
}

impl ScriptConfig {
    pub fn write_source(&self) -> ScriptSource {
        ScriptSource::resource(self.write_resource.clone())
    }

    pub fn read_source(&self) -> ScriptSource {
        ScriptSource::path(self.read_path.clone())
    }

    pub fn options(&self) -> ScriptOptions {
        ScriptOptions {
            comment_prefix: self.comment_prefix.clone(),
            separator: self.separator.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}
