use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Optional YAML file underneath the environment. Every key may be left out.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub database: DatabaseSection,
    pub schema: SchemaSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct DatabaseSection {
    pub name: Option<String>,
    pub data_dir: Option<String>,
    pub mysql_url: Option<String>,
    pub postgres_url: Option<String>,
    pub acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SchemaSection {
    pub retries: Option<u32>,
    pub cooldown_seconds: Option<u64>,
}

pub(super) fn load_config(path: &str) -> FileConfig {
    if !Path::new(path).exists() {
        return FileConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path, error = %err);
            return FileConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path, error = %err);
            FileConfig::default()
        }
    }
}

/// Non-empty value of `field`, or `None` when unset or blank.
pub(super) fn env_string(field: &'static str) -> Option<String> {
    env::var(field)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parsed value of `field`. Unparseable values are logged and ignored.
pub(super) fn env_parsed<T: std::str::FromStr>(field: &'static str) -> Option<T> {
    let value = env_string(field)?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(event = "config_invalid", field, value = %value);
            None
        }
    }
}
