//! Configuration utilities.

/// TOML configuration (`sentinel.toml`) and its manager.
pub mod toml_config;
