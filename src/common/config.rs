//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI
use crate::transport::local::DEFAULT_IP_PROBE;
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port both peers agree on unless told otherwise.
pub const DEFAULT_PORT: u16 = 9999;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 60 * 60;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "peerdrop")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("peerdrop.toml"))
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port the receiver listens on and the sender dials.
    pub port: u16,
    /// How long the receiver waits for the sender to dial in.
    pub accept_timeout_secs: u64,
    /// How long the sender waits for the dial to complete.
    pub connect_timeout_secs: u64,
    /// Where received files are written.
    pub output_dir: PathBuf,
    /// External address used to pick the LAN-facing interface. Never contacted.
    pub ip_probe: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            accept_timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from("."),
            ip_probe: DEFAULT_IP_PROBE.to_string(),
        }
    }
}

impl AppConfig {
    /// Rejects values the handler cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.port > 0, "Invalid config: port must be > 0");
        for (name, secs) in [
            ("accept_timeout_secs", self.accept_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ] {
            ensure!(secs > 0, "Invalid config: {name} must be > 0");
            ensure!(
                secs <= MAX_TIMEOUT_SECS,
                "Invalid config: {name} must be <= {MAX_TIMEOUT_SECS}"
            );
        }
        ensure!(
            !self.ip_probe.trim().is_empty(),
            "Invalid config: ip_probe must not be empty"
        );
        Ok(())
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_secs(self.accept_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Values supplied on the command line, applied last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub output_dir: Option<PathBuf>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

/// Same as [`load_config`] with an explicit config file location.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PEERDROP_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> Result<AppConfig> {
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(dir) = &overrides.output_dir {
        config.output_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}
