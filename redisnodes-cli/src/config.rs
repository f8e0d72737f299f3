//! Configuration file support for redisnodes
//!
//! Every setting has a default, so the tool runs without a file. A TOML file
//! passed with `--config` replaces the defaults it mentions, `--set key=value`
//! overrides are applied on top of that, and dedicated CLI flags such as
//! `--server` win over everything.
//!
//! ```toml
//! [target]
//! address = "10.0.0.1:6379"
//! connect_timeout = "2s"
//! read_timeout = "5s"
//!
//! [resolve]
//! enabled = true
//! timeout = "500ms"
//!
//! [output]
//! order = "report"
//! ```

use anyhow::{bail, Context, Result};
use redisnodes_protocols::MasterOrder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level tool configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Cluster node to query
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Server address (e.g., "127.0.0.1:6379"); ":port" means localhost
    #[serde(default = "default_address")]
    pub address: String,
    /// Upper bound for establishing the TCP connection
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// Upper bound for receiving the whole CLUSTER NODES reply
    #[serde(with = "humantime_serde", default = "default_read_timeout")]
    pub read_timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Reverse DNS for node hosts
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResolveConfig {
    #[serde(default = "default_resolve_enabled")]
    pub enabled: bool,
    /// Per-lookup upper bound
    #[serde(with = "humantime_serde", default = "default_resolve_timeout")]
    pub timeout: Duration,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { enabled: default_resolve_enabled(), timeout: default_resolve_timeout() }
    }
}

fn default_resolve_enabled() -> bool {
    true
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Tree output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Master order: report, id
    #[serde(default = "default_order")]
    pub order: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { order: default_order() }
    }
}

fn default_order() -> String {
    MasterOrder::default().to_string()
}

impl ToolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ToolConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from a TOML file with --set style overrides
    pub fn from_file_with_overrides<P: AsRef<Path>>(path: P, overrides: &[String]) -> Result<Self> {
        let config = Self::from_file(path)?.apply_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if one is given, else start from defaults, then apply overrides
    pub fn load(path: Option<&Path>, overrides: &[String]) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_overrides(overrides)
    }

    /// Apply `key.path=value` overrides and return the resulting configuration
    pub fn apply_overrides(&self, overrides: &[String]) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }

        let mut value =
            toml::Value::try_from(self).context("Failed to serialize configuration")?;

        for override_str in overrides {
            let (key, val) = parse_key_value(override_str)
                .with_context(|| format!("Invalid override format: {}", override_str))?;

            set_toml_path(&mut value, &key, &val)
                .with_context(|| format!("Failed to apply override: {}", override_str))?;
        }

        value.try_into::<ToolConfig>().context("Failed to deserialize modified configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let address = self.target.address.trim();
        if address.is_empty() {
            bail!("Target address cannot be empty");
        }
        match address.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => {}
            _ => bail!("Target address '{}' must be in host:port form", address),
        }

        if self.target.connect_timeout.is_zero() {
            bail!("target.connect_timeout must be > 0");
        }
        if self.target.read_timeout.is_zero() {
            bail!("target.read_timeout must be > 0");
        }
        if self.resolve.enabled && self.resolve.timeout.is_zero() {
            bail!("resolve.timeout must be > 0 when resolution is enabled");
        }

        self.master_order()?;
        Ok(())
    }

    pub fn master_order(&self) -> Result<MasterOrder> {
        self.output.order.parse::<MasterOrder>().map_err(anyhow::Error::msg)
    }
}

/// Parse a "key=value" string into (key, value) tuple
fn parse_key_value(override_str: &str) -> Result<(String, String)> {
    match override_str.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("Invalid override format '{}'. Expected 'key=value'", override_str),
    }
}

/// Set a value in TOML using dot-notation path
fn set_toml_path(root: &mut toml::Value, path: &str, value_str: &str) -> Result<()> {
    let parts: Vec<&str> = path.split('.').filter(|part| !part.is_empty()).collect();

    let Some((last, parents)) = parts.split_last() else {
        bail!("Empty path");
    };

    let mut current = root;
    for key in parents {
        let toml::Value::Table(table) = current else {
            bail!("Cannot navigate through non-table value at key '{}'", key);
        };
        current = table
            .entry(key.to_string())
            .or_insert_with(|| toml::Value::Table(Default::default()));
    }

    let toml::Value::Table(table) = current else {
        bail!("Cannot set key '{}' on non-table value", last);
    };
    table.insert(last.to_string(), parse_value(value_str));
    Ok(())
}

/// Parse a string value with type inference
fn parse_value(value_str: &str) -> toml::Value {
    let trimmed = value_str.trim();

    if trimmed == "true" {
        return toml::Value::Boolean(true);
    }
    if trimmed == "false" {
        return toml::Value::Boolean(false);
    }

    if let Ok(int_val) = trimmed.parse::<i64>() {
        return toml::Value::Integer(int_val);
    }

    // String (everything else, strip quotes if present)
    let string_val = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    toml::Value::String(string_val.to_string())
}
