// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the mnemos memory core.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic rendering.
//!
//! # Usage
//!
//! ```no_run
//! use mnemos_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MnemosConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics
pub fn load_and_validate() -> Result<MnemosConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<MnemosConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = load_and_validate_str("").expect("default config should validate");
        assert_eq!(config.agent.name, "mnemos");
        assert!((config.graph.merge_threshold - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_and_validate_str("[agent]\nnaem = \"oops\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let result = load_and_validate_str("[graph]\nmerge_threshold = 1.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn section_override_applies() {
        let config =
            load_and_validate_str("[router]\ncache_ttl_secs = 60\ncache_max_entries = 8\n")
                .unwrap();
        assert_eq!(config.router.cache_ttl_secs, 60);
        assert_eq!(config.router.cache_max_entries, 8);
    }
}
