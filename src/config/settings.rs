//! TOML-based configuration for Tessera.
//!
//! Supports a config file (tessera.toml) with environment variable expansion
//! in source file locations.
//!
//! Example configuration:
//! ```toml
//! [discovery]
//! property_db_timeout = "45s"
//! sample_size = 100
//! enterprise_version_patterns = ['^urn:adsk\.wip[a-z]*:fs\.file:vf\..+\?version=\d+$']
//!
//! [build]
//! fetch_timeout = "2m"
//!
//! [aggregation]
//! presence_attribute = "Name"
//!
//! [[sources]]
//! file = "${PROJECT_DATA}/costs.csv"
//! model_key = "Mark"
//! file_key = "Tag"
//!
//! [[calculations]]
//! name = "Total"
//! formula = "[Cost] * [Quantity]"
//!
//! [[schema]]
//! source_name = "costs.csv"
//! original_name = "Cost"
//! type = "number"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{Calculation, ExternalSource, JoinMapping, SchemaEntry};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid duration format: {0}")]
    InvalidDuration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Property discovery configuration.
    pub discovery: DiscoverySettings,

    /// Master dataset build configuration.
    pub build: BuildSettings,

    /// Aggregation configuration.
    pub aggregation: AggregationSettings,

    /// Logging configuration.
    pub logging: LoggingSettings,

    /// External tabular sources.
    pub sources: Vec<SourceSettings>,

    /// Computed columns.
    pub calculations: Vec<Calculation>,

    /// Output schema.
    pub schema: Vec<SchemaEntry>,
}

/// Property discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Budget for the structured metadata query (e.g., "30s").
    pub metadata_timeout: String,

    /// Budget for the local property-database enumeration.
    pub property_db_timeout: String,

    /// Budget for each sampling layer.
    pub sample_timeout: String,

    /// Number of leaves fetched by the sample scan.
    pub sample_size: usize,

    /// Element ids probed when no hierarchy is available.
    pub probe_ids: Vec<u64>,

    /// Version id patterns of enterprise-hosted models that support the
    /// structured metadata query.
    pub enterprise_version_patterns: Vec<String>,

    /// Persist discovered catalogs per model version.
    pub cache_enabled: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            metadata_timeout: "30s".to_string(),
            property_db_timeout: "45s".to_string(),
            sample_timeout: "30s".to_string(),
            sample_size: 100,
            probe_ids: vec![1, 2, 3, 4, 5, 10, 20, 50, 100, 200, 500],
            enterprise_version_patterns: vec![
                r"^urn:adsk\.wip[a-z]*:fs\.file:vf\..+\?version=\d+$".to_string(),
            ],
            cache_enabled: true,
        }
    }
}

impl DiscoverySettings {
    pub fn metadata_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.metadata_timeout)
    }

    pub fn property_db_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.property_db_timeout)
    }

    pub fn sample_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.sample_timeout)
    }
}

/// Master dataset build configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Budget for enumerating leaves and bulk-fetching their attributes.
    pub fetch_timeout: String,

    /// Budget for refreshing one external source.
    pub source_timeout: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: "2m".to_string(),
            source_timeout: "1m".to_string(),
        }
    }
}

impl BuildSettings {
    pub fn fetch_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.fetch_timeout)
    }

    pub fn source_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.source_timeout)
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Attribute always requested on the live path so every element is
    /// returned by backends that skip elements without requested attributes.
    pub presence_attribute: String,

    /// Budget for the live-path bulk fetch.
    pub fetch_timeout: String,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            presence_attribute: "Name".to_string(),
            fetch_timeout: "1m".to_string(),
        }
    }
}

impl AggregationSettings {
    pub fn fetch_timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.fetch_timeout)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "tessera=info".to_string(),
        }
    }
}

/// One external source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// File location (supports ${ENV_VAR} expansion).
    pub file: String,

    #[serde(default)]
    pub model_key: String,

    #[serde(default)]
    pub file_key: String,
}

impl SourceSettings {
    /// Get the file location with environment variables expanded.
    pub fn resolved_file(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.file)
    }

    /// Build an unfetched source.
    pub fn to_source(&self) -> Result<ExternalSource, SettingsError> {
        Ok(ExternalSource::new(
            self.resolved_file()?,
            JoinMapping::new(&self.model_key, &self.file_key),
        ))
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TESSERA_CONFIG`
    /// 2. `./tessera.toml`
    /// 3. `~/.tessera/tessera.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("TESSERA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("tessera.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tessera").join("tessera.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check durations and patterns up front so later stages can rely on them.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.discovery.metadata_timeout()?;
        self.discovery.property_db_timeout()?;
        self.discovery.sample_timeout()?;
        self.build.fetch_timeout()?;
        self.build.source_timeout()?;
        self.aggregation.fetch_timeout()?;

        for pattern in &self.discovery.enterprise_version_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                SettingsError::InvalidConfig(format!("bad version pattern '{}': {}", pattern, e))
            })?;
        }

        for calc in &self.calculations {
            if calc.name.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(
                    "calculation with empty name".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Build the configured external sources.
    pub fn external_sources(&self) -> Result<Vec<ExternalSource>, SettingsError> {
        self.sources.iter().map(SourceSettings::to_source).collect()
    }
}

/// Parse a duration such as `"45s"`, `"2m"`, `"1h"` or `"500ms"`.
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let s = s.trim();
    let invalid = || SettingsError::InvalidDuration(s.to_string());

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(amount)),
        "ms" => Ok(Duration::from_millis(amount)),
        "m" => amount
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(invalid),
        "h" => amount
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
