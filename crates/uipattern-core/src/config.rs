//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SEMANTIC__ENABLED=false`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Everything the retrieval service needs at construction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub search: SearchSettings,
    pub fusion: FusionSettings,
    pub semantic: SemanticSettings,
    pub confidence: ConfidenceWeights,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.search.default_top_k == 0 {
            return Err(Error::InvalidConfig("search.default_top_k must be at least 1".into()));
        }
        if self.search.candidate_pool == 0 {
            return Err(Error::InvalidConfig("search.candidate_pool must be at least 1".into()));
        }
        if self.semantic.retry_attempts == 0 {
            return Err(Error::InvalidConfig("semantic.retry_attempts must be at least 1".into()));
        }
        if self.confidence.expected_matches == 0 {
            return Err(Error::InvalidConfig("confidence.expected_matches must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// A JSON file or a directory of JSON files.
    pub patterns_path: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { patterns_path: "data/patterns".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_top_k: usize,
    /// Candidates requested from each retriever before fusion.
    pub candidate_pool: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_top_k: 3, candidate_pool: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub lexical_weight: f32,
    pub semantic_weight: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self { lexical_weight: 0.3, semantic_weight: 0.7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Local BGE-M3 model.
    Model,
    /// Deterministic feature hashing, no model files needed.
    Hashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticSettings {
    pub enabled: bool,
    pub embedder: EmbedderKind,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub dim: usize,
    pub lancedb_uri: String,
    pub table: String,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            embedder: EmbedderKind::Model,
            model_dir: None,
            max_len: 256,
            dim: 1024,
            lancedb_uri: "data/indexes/lancedb".to_string(),
            table: "patterns".to_string(),
            retry_attempts: 3,
            retry_base_delay_ms: 100,
        }
    }
}

/// Component weights of the confidence score.
///
/// The four shares sum to 1.0 by default; they are tuning knobs, not
/// contracts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub final_score: f32,
    pub rank_agreement: f32,
    /// Credit when only one retriever ranked the pattern.
    pub single_rank: f32,
    /// Rank difference at which agreement credit reaches zero.
    pub rank_decay_window: f32,
    pub metadata_completeness: f32,
    pub match_coverage: f32,
    /// Matched features that earn full coverage credit.
    pub expected_matches: usize,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            final_score: 0.4,
            rank_agreement: 0.3,
            single_rank: 0.15,
            rank_decay_window: 10.0,
            metadata_completeness: 0.2,
            match_coverage: 0.1,
            expected_matches: 5,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
