// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the mnemos memory core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level mnemos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemosConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Snapshot storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Knowledge-graph store and postprocessor settings.
    #[serde(default)]
    pub graph: GraphConfig,

    /// Context router settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Generation-service settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Conversation history settings.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "mnemos".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding graph and memory snapshot files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// File name of the knowledge-graph snapshot inside `data_dir`.
    #[serde(default = "default_graph_file")]
    pub graph_file: String,

    /// File name of the synthetic-memory note file inside `data_dir`.
    #[serde(default = "default_memory_file")]
    pub memory_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            graph_file: default_graph_file(),
            memory_file: default_memory_file(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|d| d.join("mnemos").display().to_string())
        .unwrap_or_else(|| "mnemos-data".to_string())
}

fn default_graph_file() -> String {
    "graph.json".to_string()
}

fn default_memory_file() -> String {
    "memory.json".to_string()
}

/// Knowledge-graph store and postprocessor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Name-similarity ratio at or above which two entities are merged
    /// during postprocessing.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,

    /// Confidence assigned to entities and relations when callers provide
    /// none.
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,

    /// Raw-name -> canonical-name alias table (matched case-insensitively).
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Normalized-name -> type override table.
    #[serde(default)]
    pub type_overrides: BTreeMap<String, String>,

    /// Relation-label synonym table (matched case-insensitively).
    #[serde(default)]
    pub relation_synonyms: BTreeMap<String, String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
            default_confidence: default_confidence(),
            aliases: BTreeMap::new(),
            type_overrides: BTreeMap::new(),
            relation_synonyms: BTreeMap::new(),
        }
    }
}

fn default_merge_threshold() -> f64 {
    0.92
}

fn default_confidence() -> f64 {
    0.9
}

/// Context router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Seconds a cached context string stays fresh.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of context cache entries before oldest-first eviction.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Requests below this word count are treated as short.
    #[serde(default = "default_short_word_limit")]
    pub short_word_limit: usize,

    /// Prefixes marking an explicit memory command ("souviens-toi ...").
    #[serde(default = "default_memory_prefixes")]
    pub memory_prefixes: Vec<String>,

    /// Interrogative tokens marking a question-shaped request.
    #[serde(default = "default_question_words")]
    pub question_words: Vec<String>,

    /// Keywords gating the semantic-search enrichment source.
    #[serde(default = "default_preference_keywords")]
    pub preference_keywords: Vec<String>,

    /// Maximum entities returned by the symbolic graph lookup.
    #[serde(default = "default_max_symbolic_results")]
    pub max_symbolic_results: usize,

    /// Maximum condensed summaries pulled from synthetic memory.
    #[serde(default = "default_max_summaries")]
    pub max_summaries: usize,

    /// Maximum semantic-search hits pulled per request.
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Minimum semantic-search score to accept a hit.
    #[serde(default = "default_min_search_score")]
    pub min_search_score: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            short_word_limit: default_short_word_limit(),
            memory_prefixes: default_memory_prefixes(),
            question_words: default_question_words(),
            preference_keywords: default_preference_keywords(),
            max_symbolic_results: default_max_symbolic_results(),
            max_summaries: default_max_summaries(),
            max_search_results: default_max_search_results(),
            min_search_score: default_min_search_score(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    128
}

fn default_short_word_limit() -> usize {
    4
}

fn default_memory_prefixes() -> Vec<String> {
    ["souviens-toi", "rappelle-toi", "remember", "mémorise"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_question_words() -> Vec<String> {
    [
        "qui", "que", "quoi", "où", "quand", "comment", "pourquoi", "quel", "quelle",
        "combien", "what", "who", "where", "when", "why", "how", "which",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_preference_keywords() -> Vec<String> {
    [
        "aime", "adore", "préfère", "déteste", "favori", "favorite", "like", "love",
        "prefer", "hate",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_symbolic_results() -> usize {
    3
}

fn default_max_summaries() -> usize {
    2
}

fn default_max_search_results() -> usize {
    2
}

fn default_min_search_score() -> f32 {
    0.35
}

/// Generation-service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Base URL of the local generation endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for the low complexity tier.
    #[serde(default = "default_low_model")]
    pub low_model: String,

    /// Model used for the medium complexity tier.
    #[serde(default = "default_medium_model")]
    pub medium_model: String,

    /// Model used for the high complexity tier.
    #[serde(default = "default_high_model")]
    pub high_model: String,

    /// Number of retries after a failed generation call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between generation retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// User-safe reply returned when generation retries are exhausted.
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            low_model: default_low_model(),
            medium_model: default_medium_model(),
            high_model: default_high_model(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            apology: default_apology(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_low_model() -> String {
    "llama3.2:1b".to_string()
}

fn default_medium_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_high_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_apology() -> String {
    "Sorry, I'm having trouble answering right now. Please try again in a moment."
        .to_string()
}

/// Conversation history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Maximum retained messages per conversation before the oldest excess
    /// is summarized and dropped.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

fn default_max_history() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = MnemosConfig::default();
        assert_eq!(config.agent.name, "mnemos");
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.router.cache_ttl_secs, 300);
        assert_eq!(config.router.cache_max_entries, 128);
        assert_eq!(config.generation.max_retries, 2);
        assert_eq!(config.conversation.max_history, 20);
    }

    #[test]
    fn memory_prefixes_include_french_and_english() {
        let config = RouterConfig::default();
        assert!(config.memory_prefixes.iter().any(|p| p == "souviens-toi"));
        assert!(config.memory_prefixes.iter().any(|p| p == "remember"));
    }

    #[test]
    fn graph_tables_default_empty() {
        let config = GraphConfig::default();
        assert!(config.aliases.is_empty());
        assert!(config.type_overrides.is_empty());
        assert!(config.relation_synonyms.is_empty());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = MnemosConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: MnemosConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.agent.name, config.agent.name);
        assert_eq!(parsed.router.memory_prefixes, config.router.memory_prefixes);
    }
}
