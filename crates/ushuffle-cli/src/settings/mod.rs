use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use ushuffle_core::{schema_defaults, DEFAULT_DB_NAME};
use ushuffle_db::negotiate::is_valid_database_name;
use ushuffle_db::{BackendOptions, SchemaManager};

use crate::cli_args::Cli;

mod env_config;

use env_config::{env_parsed, env_string, load_config};

const DEFAULT_CONFIG_PATH: &str = "ushuffle.yaml";
const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_name: String,
    pub data_dir: PathBuf,
    pub mysql_url: String,
    pub postgres_url: String,
    pub acquire_timeout: Duration,
    pub schema_retries: u32,
    pub schema_cooldown: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        let backend = BackendOptions::default();
        Self {
            db_name: DEFAULT_DB_NAME.to_string(),
            data_dir: backend.data_dir,
            mysql_url: backend.mysql_url,
            postgres_url: backend.postgres_url,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECONDS),
            schema_retries: schema_defaults::RETRIES,
            schema_cooldown: Duration::from_secs(schema_defaults::COOLDOWN_SECONDS),
        }
    }
}

impl Settings {
    /// Defaults, then the YAML file at `USHUFFLE_CONFIG_PATH`, then the
    /// `USHUFFLE_*` environment.
    #[must_use]
    pub fn from_env() -> Self {
        let config_path =
            env_string("USHUFFLE_CONFIG_PATH").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let file = load_config(&config_path);
        let mut settings = Self::default();

        let db_name = env_string("USHUFFLE_DB_NAME").or(file.database.name);
        if let Some(name) = db_name {
            if is_valid_database_name(&name) {
                settings.db_name = name;
            } else {
                warn!(event = "config_invalid", field = "USHUFFLE_DB_NAME", value = %name);
            }
        }
        if let Some(dir) = env_string("USHUFFLE_DATA_DIR").or(file.database.data_dir) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = env_string("USHUFFLE_MYSQL_URL").or(file.database.mysql_url) {
            settings.mysql_url = url;
        }
        if let Some(url) = env_string("USHUFFLE_POSTGRES_URL").or(file.database.postgres_url) {
            settings.postgres_url = url;
        }

        let acquire_timeout = env_parsed::<u64>("USHUFFLE_ACQUIRE_TIMEOUT_SECONDS")
            .or(file.database.acquire_timeout_seconds);
        match acquire_timeout {
            Some(0) => warn!(
                event = "config_invalid",
                field = "USHUFFLE_ACQUIRE_TIMEOUT_SECONDS",
                value = 0
            ),
            Some(seconds) => settings.acquire_timeout = Duration::from_secs(seconds),
            None => {}
        }
        if let Some(retries) =
            env_parsed::<u32>("USHUFFLE_SCHEMA_RETRIES").or(file.schema.retries)
        {
            settings.schema_retries = retries;
        }
        if let Some(seconds) =
            env_parsed::<u64>("USHUFFLE_SCHEMA_COOLDOWN_SECONDS").or(file.schema.cooldown_seconds)
        {
            settings.schema_cooldown = Duration::from_secs(seconds);
        }
        settings
    }

    /// Command-line flags win over the environment and the config file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(name) = &cli.db_name {
            self.db_name = name.clone();
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            data_dir: self.data_dir.clone(),
            mysql_url: self.mysql_url.clone(),
            postgres_url: self.postgres_url.clone(),
            acquire_timeout: self.acquire_timeout,
        }
    }

    pub fn schema_manager(&self) -> SchemaManager {
        SchemaManager::new(self.schema_retries, self.schema_cooldown)
    }
}
