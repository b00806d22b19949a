//! Statically validated configuration for the steward bot.
//!
//! The config is loaded and validated exactly once at startup and treated as
//! an immutable snapshot afterwards. Validation is fail-fast: a missing
//! required field refuses startup instead of failing per-request later.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{LoadError, load_config, resolve_config_path},
    schema::{
        AccessConfig, DiscordConfig, MIN_UPDATE_INTERVAL_SECS, PanelConfig, StewardConfig,
        SyncConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate_config, validate_file},
};
