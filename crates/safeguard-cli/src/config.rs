//! Supervisor configuration – reads `~/.safeguard/config.toml`.
//!
//! The file is optional and every field has a default, so an absent or
//! partial file still yields a complete [`Config`].  The CLI never writes it.
//!
//! ```toml
//! tick_interval_ms = 100
//! auto_activate = true
//! command_queue = 32
//! diagnostics = false
//!
//! [safety]
//! battery_threshold = 30.0
//! collision_threshold = 0.2
//! rotation_angular_velocity = 0.5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use safeguard_runtime::SupervisorConfig;
use safeguard_types::{SafetyConfig, SafetyError};
use serde::Deserialize;

/// Runtime configuration for the `safeguard` binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Hazard thresholds and recovery rotation speed.
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Period of timer-driven evaluation ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Activate the supervisor at startup instead of waiting for an
    /// `activate` line on stdin.
    #[serde(default = "default_auto_activate")]
    pub auto_activate: bool,

    /// Capacity of the queue between the supervisor and the command writer.
    #[serde(default = "default_command_queue")]
    pub command_queue: usize,

    /// Echo the supervisor's transition log to stderr as JSON lines.
    #[serde(default)]
    pub diagnostics: bool,
}

fn default_tick_interval_ms() -> u64 {
    100
}
fn default_auto_activate() -> bool {
    true
}
fn default_command_queue() -> usize {
    32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safety: SafetyConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
            auto_activate: default_auto_activate(),
            command_queue: default_command_queue(),
            diagnostics: false,
        }
    }
}

impl Config {
    /// The supervisor's view of this configuration.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            safety: self.safety.clone(),
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
        }
    }
}

/// Return the config path: `$SAFEGUARD_CONFIG`, else `~/.safeguard/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SAFEGUARD_CONFIG") {
        return PathBuf::from(path);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".safeguard").join("config.toml")
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Load the effective config: the file when present, defaults otherwise,
/// with environment overrides applied in both cases.
pub fn load() -> Result<(Config, ConfigSource), SafetyError> {
    load_or_default(&config_path())
}

/// Defaults plus environment overrides, for when the file cannot be used.
pub fn from_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

pub(crate) fn load_or_default(path: &Path) -> Result<(Config, ConfigSource), SafetyError> {
    let (mut cfg, source) = match read_file(path)? {
        Some(cfg) => (cfg, ConfigSource::File(path.to_path_buf())),
        None => (Config::default(), ConfigSource::Defaults),
    };
    apply_env_overrides(&mut cfg);
    Ok((cfg, source))
}

/// Parse the file at `path`.  Returns `None` if it does not exist.
pub(crate) fn read_file(path: &Path) -> Result<Option<Config>, SafetyError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        SafetyError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| SafetyError::Config(format!("failed to parse {}: {}", path.display(), e)))
}

/// Apply `SAFEGUARD_*` environment variable overrides to `cfg`.
///
/// Values that do not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `SAFEGUARD_BATTERY_THRESHOLD` | `safety.battery_threshold` |
/// | `SAFEGUARD_COLLISION_THRESHOLD` | `safety.collision_threshold` |
/// | `SAFEGUARD_ROTATION_SPEED` | `safety.rotation_angular_velocity` |
/// | `SAFEGUARD_TICK_MS` | `tick_interval_ms` |
/// | `SAFEGUARD_DIAGNOSTICS` | `diagnostics` (`true` / `false`) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(v) = env_parse::<f32>("SAFEGUARD_BATTERY_THRESHOLD") {
        cfg.safety.battery_threshold = v;
    }
    if let Some(v) = env_parse::<f32>("SAFEGUARD_COLLISION_THRESHOLD") {
        cfg.safety.collision_threshold = v;
    }
    if let Some(v) = env_parse::<f32>("SAFEGUARD_ROTATION_SPEED") {
        cfg.safety.rotation_angular_velocity = v;
    }
    if let Some(v) = env_parse::<u64>("SAFEGUARD_TICK_MS") {
        cfg.tick_interval_ms = v;
    }
    if let Some(v) = env_parse::<bool>("SAFEGUARD_DIAGNOSTICS") {
        cfg.diagnostics = v;
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
