// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as threshold ranges and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::MnemosConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MnemosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    let threshold = config.graph.merge_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!("graph.merge_threshold must be in (0, 1], got {threshold}"),
        });
    }

    let confidence = config.graph.default_confidence;
    if !(0.0..=1.0).contains(&confidence) {
        errors.push(ConfigError::Validation {
            message: format!(
                "graph.default_confidence must be in [0, 1], got {confidence}"
            ),
        });
    }

    if config.router.cache_max_entries == 0 {
        errors.push(ConfigError::Validation {
            message: "router.cache_max_entries must be at least 1".to_string(),
        });
    }

    if config.router.short_word_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "router.short_word_limit must be at least 1".to_string(),
        });
    }

    if config.generation.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "generation.base_url must not be empty".to_string(),
        });
    }

    if config.conversation.max_history == 0 {
        errors.push(ConfigError::Validation {
            message: "conversation.max_history must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
