//! Overall risk scoring

use crate::config::AggregatorConfig;
use crate::types::{RiskLevel, UnifiedMatch};

/// Score floor of the "medium" overall level, independent of configuration
pub const MEDIUM_FLOOR: f64 = 0.3;

/// Outcome of scoring a deduplicated match list
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Per-match contribution (weight × match score), in input order
    pub contributions: Vec<f64>,

    /// Mean contribution, 0 for no matches
    pub overall_score: f64,

    /// Level derived from the overall score
    pub overall_level: RiskLevel,
}

/// Risk scorer
#[derive(Debug, Clone, Copy)]
pub struct RiskScorer {
    medium_threshold: f64,
    high_threshold: f64,
}

impl RiskScorer {
    /// Create new risk scorer
    pub fn new(medium_threshold: f64, high_threshold: f64) -> Self {
        Self {
            medium_threshold,
            high_threshold,
        }
    }

    /// Create from aggregator configuration
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self::new(config.medium_risk_threshold, config.high_risk_threshold)
    }

    /// Contribution of one match
    pub fn contribution(m: &UnifiedMatch) -> f64 {
        m.risk_level.weight() * m.match_score
    }

    /// Map an overall score to a level
    pub fn level_for(&self, score: f64) -> RiskLevel {
        if score >= self.high_threshold {
            RiskLevel::Critical
        } else if score >= self.medium_threshold {
            RiskLevel::High
        } else if score >= MEDIUM_FLOOR {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Score a deduplicated, cross-source match list
    pub fn assess(&self, matches: &[UnifiedMatch]) -> RiskAssessment {
        if matches.is_empty() {
            return RiskAssessment {
                contributions: Vec::new(),
                overall_score: 0.0,
                overall_level: RiskLevel::Low,
            };
        }

        let contributions: Vec<f64> = matches.iter().map(Self::contribution).collect();
        let overall_score =
            (contributions.iter().sum::<f64>() / contributions.len() as f64).clamp(0.0, 1.0);

        RiskAssessment {
            overall_level: self.level_for(overall_score),
            contributions,
            overall_score,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::from_config(&AggregatorConfig::default())
    }
}
