//! Configuration for the screening aggregator

use crate::similarity::SimilarityStrategy;
use crate::types::SourceKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Aggregator configuration
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// screening call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Per-source enable flags
    pub sources: SourcesConfig,

    /// Similarity at or above which two same-source names are duplicates (0.0-1.0)
    pub fuzzy_match_threshold: f64,

    /// Classify sound-alike names as phonetic matches
    pub enable_phonetic_matching: bool,

    /// Overall score at or above which the result is "high" (0.0-1.0)
    pub medium_risk_threshold: f64,

    /// Overall score at or above which the result is "critical" (0.0-1.0)
    pub high_risk_threshold: f64,

    /// Budget for a single source call (milliseconds)
    pub source_timeout_ms: u64,

    /// Entities screened in parallel by a batch
    pub batch_concurrency: usize,

    /// Name similarity strategy
    pub similarity: SimilarityStrategy,

    /// Sanctions list files, per source
    pub lists: ListFiles,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            fuzzy_match_threshold: 0.85,
            enable_phonetic_matching: true,
            medium_risk_threshold: 0.5,
            high_risk_threshold: 0.7,
            source_timeout_ms: 5_000,
            batch_concurrency: 4,
            similarity: SimilarityStrategy::JaroWinkler,
            lists: ListFiles::default(),
        }
    }
}

/// Per-source enable flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Screen against OFAC
    pub ofac: bool,

    /// Screen against the EU list
    pub eu: bool,

    /// Screen against the UN list
    pub un: bool,

    /// Screen against UK HMT
    pub uk_hmt: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            ofac: true,
            eu: true,
            un: true,
            uk_hmt: true,
        }
    }
}

impl SourcesConfig {
    /// Whether a source kind is enabled
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Ofac => self.ofac,
            SourceKind::Eu => self.eu,
            SourceKind::Un => self.un,
            SourceKind::UkHmt => self.uk_hmt,
        }
    }

    /// Enabled kinds, in registration order
    pub fn enabled(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    fn set(&mut self, kind: SourceKind, enabled: bool) {
        match kind {
            SourceKind::Ofac => self.ofac = enabled,
            SourceKind::Eu => self.eu = enabled,
            SourceKind::Un => self.un = enabled,
            SourceKind::UkHmt => self.uk_hmt = enabled,
        }
    }
}

/// CSV files backing the list sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFiles {
    /// OFAC list
    pub ofac: Option<PathBuf>,

    /// EU list
    pub eu: Option<PathBuf>,

    /// UN list
    pub un: Option<PathBuf>,

    /// UK HMT list
    pub uk_hmt: Option<PathBuf>,
}

impl ListFiles {
    /// File configured for a source kind
    pub fn path_for(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Ofac => self.ofac.as_deref(),
            SourceKind::Eu => self.eu.as_deref(),
            SourceKind::Un => self.un.as_deref(),
            SourceKind::UkHmt => self.uk_hmt.as_deref(),
        }
    }
}

impl AggregatorConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AggregatorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = AggregatorConfig::default();

        if let Some(v) = env_parse::<f64>("SCREENING_FUZZY_THRESHOLD")? {
            config.fuzzy_match_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("SCREENING_MEDIUM_RISK_THRESHOLD")? {
            config.medium_risk_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("SCREENING_HIGH_RISK_THRESHOLD")? {
            config.high_risk_threshold = v;
        }
        if let Some(v) = env_parse::<bool>("SCREENING_PHONETIC")? {
            config.enable_phonetic_matching = v;
        }
        if let Some(v) = env_parse::<u64>("SCREENING_SOURCE_TIMEOUT_MS")? {
            config.source_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("SCREENING_BATCH_CONCURRENCY")? {
            config.batch_concurrency = v;
        }

        for kind in SourceKind::ALL {
            let key = format!("SCREENING_ENABLE_{}", kind.label());
            if let Some(enabled) = env_parse::<bool>(&key)? {
                config.sources.set(kind, enabled);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and threshold ordering
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        };

        unit("fuzzy_match_threshold", self.fuzzy_match_threshold)?;
        unit("medium_risk_threshold", self.medium_risk_threshold)?;
        unit("high_risk_threshold", self.high_risk_threshold)?;

        if self.medium_risk_threshold >= self.high_risk_threshold {
            return Err(Error::InvalidConfig(format!(
                "medium_risk_threshold ({}) must be below high_risk_threshold ({})",
                self.medium_risk_threshold, self.high_risk_threshold
            )));
        }

        if self.source_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "source_timeout_ms must be positive".to_string(),
            ));
        }

        if self.batch_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "batch_concurrency must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
