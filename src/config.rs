use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

use crate::analysis::DEFAULT_LATENCY;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/arbolitos";
pub const DEFAULT_STORE_PATH: &str = "arbolitos.json";

/// Where plant histories live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// JSON file on disk
    File,
    /// Process memory, gone on exit
    Memory,
    /// No storage at all: reads are empty, writes are dropped
    Detached,
    /// MongoDB collection
    Mongo,
}

/// Settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub store_path: PathBuf,
    pub mongo_uri: String,
    pub analysis_delay: Duration,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::File,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            analysis_delay: DEFAULT_LATENCY,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(raw) = lookup("ARBOLITOS_BACKEND") {
            config.backend = Backend::from_str(&raw, true)
                .map_err(|e| anyhow!("ARBOLITOS_BACKEND '{raw}' is not valid: {e}"))?;
        }
        if let Some(path) = lookup("ARBOLITOS_STORE") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(uri) = lookup("MONGO_URI") {
            config.mongo_uri = uri;
        }
        if let Some(raw) = lookup("ARBOLITOS_ANALYSIS_DELAY_MS") {
            let ms = raw
                .parse::<u64>()
                .with_context(|| format!("ARBOLITOS_ANALYSIS_DELAY_MS '{raw}' must be milliseconds"))?;
            config.analysis_delay = Duration::from_millis(ms);
        }
        if let Some(level) = lookup("RUST_LOG") {
            config.rust_log = level;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.mongo_uri, DEFAULT_MONGO_URI);
        assert_eq!(config.analysis_delay, Duration::from_millis(2000));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ARBOLITOS_BACKEND", "Memory"),
            ("ARBOLITOS_STORE", "/tmp/plantas.json"),
            ("ARBOLITOS_ANALYSIS_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.store_path, PathBuf::from("/tmp/plantas.json"));
        assert_eq!(config.analysis_delay, Duration::ZERO);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("ARBOLITOS_BACKEND", "redis")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ARBOLITOS_ANALYSIS_DELAY_MS", "soon")])).is_err());
    }
}
