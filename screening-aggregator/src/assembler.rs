//! Result ordering, summary counts and packaging

use crate::scoring::RiskAssessment;
use crate::types::{
    DataQuality, RiskLevel, ScreeningResult, SourceKind, SourceResult, UnifiedMatch,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::time::Instant;
use uuid::Uuid;

/// Everything needed to package one screening
#[derive(Debug)]
pub struct Assembly {
    /// Request identifier
    pub request_id: Uuid,
    /// Queried name
    pub entity_name: String,
    /// Country hint
    pub country: String,
    /// Deduplicated, cross-source matches
    pub matches: Vec<UnifiedMatch>,
    /// Score over `matches`
    pub assessment: RiskAssessment,
    /// Registered kinds of the sources that succeeded, in registration order
    pub sources: Vec<SourceKind>,
    /// Answers of those sources, as returned
    pub raw_results: Vec<SourceResult>,
    /// When fan-out started
    pub started: Instant,
}

/// Ordering of the final match list: risk rank, then match score, both descending
pub fn compare_matches(a: &UnifiedMatch, b: &UnifiedMatch) -> Ordering {
    b.risk_level
        .rank()
        .cmp(&a.risk_level.rank())
        .then_with(|| b.match_score.total_cmp(&a.match_score))
}

/// Sort matches in place (stable)
pub fn sort_matches(matches: &mut [UnifiedMatch]) {
    matches.sort_by(compare_matches);
}

/// Best quality label among source answers, `Unknown` for none
pub fn best_data_quality(raw_results: &[SourceResult]) -> DataQuality {
    raw_results
        .iter()
        .map(|r| r.meta.data_quality)
        .max()
        .unwrap_or(DataQuality::Unknown)
}

/// Build the final result
pub fn assemble(assembly: Assembly) -> ScreeningResult {
    let Assembly {
        request_id,
        entity_name,
        country,
        mut matches,
        assessment,
        sources,
        raw_results,
        started,
    } = assembly;

    sort_matches(&mut matches);

    let (mut high, mut medium, mut low) = (0usize, 0usize, 0usize);
    for m in &matches {
        match m.risk_level {
            RiskLevel::Critical | RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
        }
    }

    let (overall_risk_score, overall_risk_level) = if matches.is_empty() {
        (0.0, RiskLevel::Low)
    } else {
        (assessment.overall_score, assessment.overall_level)
    };

    let data_quality = best_data_quality(&raw_results);

    ScreeningResult {
        request_id,
        entity_name,
        country,
        total_matches: matches.len(),
        high_risk_matches: high,
        medium_risk_matches: medium,
        low_risk_matches: low,
        matches,
        overall_risk_score,
        overall_risk_level,
        screening_time_ms: started.elapsed().as_millis() as u64,
        completed_at: Utc::now(),
        data_quality,
        sources,
        raw_results,
    }
}
