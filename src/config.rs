use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use strata_runtime::PoolConfig;

pub const ENV_ASSETS: &str = "STRATA_ASSETS";
pub const ENV_FALLBACK_VERSION: &str = "STRATA_FALLBACK_VERSION";

/// Contents of `strata.toml`. Every field is optional.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tick_ms: default_tick_ms(),
            assets: AssetsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_tick_ms() -> u64 {
    50
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssetsConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub fallback_version: Option<String>,
    /// Atlas path used instead of `textures/<version>.png`.
    #[serde(default)]
    pub texture_override: Option<String>,
    /// Descriptor table used instead of `blocksStates/<version>.toml`.
    #[serde(default)]
    pub table_override: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            log::debug!("config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Applies `STRATA_ASSETS` and `STRATA_FALLBACK_VERSION` when set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_ASSETS).ok(),
            std::env::var(ENV_FALLBACK_VERSION).ok(),
        );
    }

    fn apply_overrides(&mut self, assets: Option<String>, fallback: Option<String>) {
        if let Some(root) = assets.filter(|s| !s.is_empty()) {
            self.assets.root = Some(PathBuf::from(root));
        }
        if let Some(v) = fallback.filter(|s| !s.is_empty()) {
            self.assets.fallback_version = Some(v);
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers.max(1),
            tick: Duration::from_millis(self.tick_ms.max(1)),
        }
    }

    /// Parsed log level, `Info` when unrecognised.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
