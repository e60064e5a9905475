// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load and validate tabwalk client configuration.
// Author: Lukas Bower

//! Client configuration: TOML file, CLI overrides and `TABWALK_*` environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tabwalk_core::{WalkConfig, DEFAULT_MAX_REPETITIONS, DEFAULT_MAX_ROW_INDEX};

/// Default agent port.
pub const DEFAULT_PORT: u16 = 161;
/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
/// Default community string.
pub const DEFAULT_COMMUNITY: &str = "public";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TABWALK_CONFIG";
/// Prefix of the per-setting override variables (`TABWALK_PORT`, ...).
pub const ENV_PREFIX: &str = "TABWALK_";

/// Protocol version label forwarded to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentVersion {
    /// Version 1 agents (no bulk scans).
    V1,
    /// Community-based version 2.
    V2c,
}

impl fmt::Display for AgentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2c => write!(f, "v2c"),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Agent addressing and credentials.
    pub target: TargetConfig,
    /// Transport timing.
    pub transport: TransportConfig,
    /// Table walk tuning.
    pub walk: WalkSettings,
}

/// Agent addressing and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Hostname or address of the agent bridge.
    pub host: String,
    /// Agent port.
    pub port: u16,
    /// Community string forwarded with each request.
    pub community: String,
    /// Protocol version forwarded with each request.
    pub version: AgentVersion,
}

/// Transport timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl TransportConfig {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Table walk tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSettings {
    /// Objects requested per scan round.
    pub max_repetitions: u32,
    /// Tables walked concurrently.
    pub workers: usize,
    /// Highest row index a walk will materialise.
    pub max_row_index: usize,
}

impl WalkSettings {
    /// Walk configuration handed to the table walker.
    #[must_use]
    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig::with_max_repetitions(self.max_repetitions).with_row_limit(self.max_row_index)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig {
                host: "127.0.0.1".to_owned(),
                port: DEFAULT_PORT,
                community: DEFAULT_COMMUNITY.to_owned(),
                version: AgentVersion::V2c,
            },
            transport: TransportConfig {
                timeout_ms: DEFAULT_TIMEOUT_MS,
            },
            walk: WalkSettings {
                max_repetitions: DEFAULT_MAX_REPETITIONS,
                workers: 1,
                max_row_index: DEFAULT_MAX_ROW_INDEX,
            },
        }
    }
}

/// Optional overrides layered on top of the file configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Override the agent host.
    pub host: Option<String>,
    /// Override the agent port.
    pub port: Option<u16>,
    /// Override the community string.
    pub community: Option<String>,
    /// Override the request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Override the objects requested per scan round.
    pub max_repetitions: Option<u32>,
    /// Override the concurrent table walk bound.
    pub workers: Option<usize>,
    /// Override the row index ceiling.
    pub max_row_index: Option<usize>,
}

impl ConfigOverrides {
    /// Fill every override left unset from its `TABWALK_<SETTING>` variable.
    pub fn or_env(self) -> Result<Self> {
        self.or_lookup(env_text)
    }

    fn or_lookup(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            host: fill(self.host, "HOST", &lookup)?,
            port: fill(self.port, "PORT", &lookup)?,
            community: fill(self.community, "COMMUNITY", &lookup)?,
            timeout_ms: fill(self.timeout_ms, "TIMEOUT_MS", &lookup)?,
            max_repetitions: fill(self.max_repetitions, "MAX_REPETITIONS", &lookup)?,
            workers: fill(self.workers, "WORKERS", &lookup)?,
            max_row_index: fill(self.max_row_index, "MAX_ROW_INDEX", &lookup)?,
        })
    }
}

fn fill<T>(
    value: Option<T>,
    setting: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if value.is_some() {
        return Ok(value);
    }
    let key = format!("{ENV_PREFIX}{setting}");
    match lookup(&key) {
        None => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("invalid {key} value '{text}': {err}")),
    }
}

/// Trimmed value of an environment variable; unset, empty and non-unicode read as absent.
fn env_text(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

impl ClientConfig {
    /// Parse configuration text; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(text).context("invalid tabwalk config TOML")?;
        let mut config = Self::default();
        if let Some(target) = parsed.target {
            if let Some(host) = target.host {
                config.target.host = host;
            }
            if let Some(port) = target.port {
                config.target.port = port;
            }
            if let Some(community) = target.community {
                config.target.community = community;
            }
            if let Some(version) = target.version {
                config.target.version = version;
            }
        }
        if let Some(transport) = parsed.transport {
            if let Some(timeout_ms) = transport.timeout_ms {
                config.transport.timeout_ms = timeout_ms;
            }
        }
        if let Some(walk) = parsed.walk {
            if let Some(max_repetitions) = walk.max_repetitions {
                config.walk.max_repetitions = max_repetitions;
            }
            if let Some(workers) = walk.workers {
                config.walk.workers = workers;
            }
            if let Some(max_row_index) = walk.max_row_index {
                config.walk.max_row_index = max_row_index;
            }
        }
        validate_config(&config)?;
        Ok(config)
    }

    /// Apply overrides and return an updated configuration.
    pub fn with_overrides(self, overrides: &ConfigOverrides) -> Result<Self> {
        let mut updated = self;
        if let Some(host) = &overrides.host {
            updated.target.host = host.clone();
        }
        if let Some(port) = overrides.port {
            updated.target.port = port;
        }
        if let Some(community) = &overrides.community {
            updated.target.community = community.clone();
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            updated.transport.timeout_ms = timeout_ms;
        }
        if let Some(max_repetitions) = overrides.max_repetitions {
            updated.walk.max_repetitions = max_repetitions;
        }
        if let Some(workers) = overrides.workers {
            updated.walk.workers = workers;
        }
        if let Some(max_row_index) = overrides.max_row_index {
            updated.walk.max_row_index = max_row_index;
        }
        validate_config(&updated)?;
        Ok(updated)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    target: Option<TargetToml>,
    transport: Option<TransportToml>,
    walk: Option<WalkToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetToml {
    host: Option<String>,
    port: Option<u16>,
    community: Option<String>,
    version: Option<AgentVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransportToml {
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WalkToml {
    max_repetitions: Option<u32>,
    workers: Option<usize>,
    max_row_index: Option<usize>,
}

/// Return the configuration path to use when none was given explicitly.
///
/// `$TABWALK_CONFIG` wins, then `./tabwalk.toml` when it exists.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = env_text(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let candidate = std::env::current_dir().ok()?.join("tabwalk.toml");
    candidate.is_file().then_some(candidate)
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tabwalk config {}", path.display()))?;
    ClientConfig::from_toml(&text).with_context(|| format!("in {}", path.display()))
}

fn validate_config(config: &ClientConfig) -> Result<()> {
    if config.target.host.trim().is_empty() {
        return Err(anyhow!("tabwalk target host must not be empty"));
    }
    if config.target.port == 0 {
        return Err(anyhow!("tabwalk target port must be >= 1"));
    }
    if config.target.community.is_empty() {
        return Err(anyhow!("tabwalk target community must not be empty"));
    }
    if config.target.community.chars().any(char::is_whitespace) {
        return Err(anyhow!("tabwalk target community must not contain whitespace"));
    }
    if config.transport.timeout_ms == 0 {
        return Err(anyhow!("tabwalk transport timeout_ms must be >= 1"));
    }
    if config.walk.max_repetitions == 0 {
        return Err(anyhow!("tabwalk walk max_repetitions must be >= 1"));
    }
    if config.walk.workers == 0 {
        return Err(anyhow!("tabwalk walk workers must be >= 1"));
    }
    if config.walk.max_row_index == 0 {
        return Err(anyhow!("tabwalk walk max_row_index must be >= 1"));
    }
    Ok(())
}
