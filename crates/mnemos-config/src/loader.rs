// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mnemos.toml` > `~/.config/mnemos/mnemos.toml` > `/etc/mnemos/mnemos.toml`
//! with environment variable overrides via `MNEMOS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MnemosConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mnemos/mnemos.toml` (system-wide)
/// 3. `~/.config/mnemos/mnemos.toml` (user XDG config)
/// 4. `./mnemos.toml` (local directory)
/// 5. `MNEMOS_*` environment variables
pub fn load_config() -> Result<MnemosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::file("/etc/mnemos/mnemos.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mnemos/mnemos.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mnemos.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MnemosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MnemosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `MNEMOS_ROUTER_CACHE_TTL_SECS`
/// must map to `router.cache_ttl_secs`, not `router.cache.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("MNEMOS_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MNEMOS_ROUTER_CACHE_TTL_SECS -> "router_cache_ttl_secs"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("graph_", "graph.", 1)
            .replacen("router_", "router.", 1)
            .replacen("generation_", "generation.", 1)
            .replacen("conversation_", "conversation.", 1);
        mapped.into()
    })
}
