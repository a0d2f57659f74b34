//! Configuration module for Tessera.
//!
//! Handles the settings file, durations and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, parse_duration, AggregationSettings, BuildSettings, DiscoverySettings,
    LoggingSettings, Settings, SettingsError, SourceSettings,
};
