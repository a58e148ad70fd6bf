//! Projection of screening results into risk-model factors

use crate::normalizer::SANCTIONS_CATEGORY;
use crate::types::{RiskFactor, RiskLevel, ScreeningResult, SourceKind};

/// Name of the overall factor
pub const OVERALL_FACTOR_NAME: &str = "unified_sanctions_risk";

/// Weight of the overall factor
pub const OVERALL_FACTOR_WEIGHT: f64 = 0.5;

/// Weight of each per-source factor
pub const SOURCE_FACTOR_WEIGHT: f64 = 0.4;

/// Export weighted risk factors for a completed screening
///
/// Emits the overall factor first, then one factor per source that
/// contributed at least one match, in the result's source order.
pub fn export_risk_factors(result: &ScreeningResult) -> Vec<RiskFactor> {
    let mut factors = Vec::with_capacity(1 + result.sources.len());

    let overall_confidence = if result.matches.is_empty() {
        1.0
    } else {
        result.matches.iter().map(|m| m.confidence).sum::<f64>() / result.matches.len() as f64
    };

    let sources_label = result
        .sources
        .iter()
        .map(SourceKind::label)
        .collect::<Vec<_>>()
        .join(",");

    factors.push(RiskFactor {
        category: SANCTIONS_CATEGORY.to_string(),
        subcategory: "aggregate".to_string(),
        name: OVERALL_FACTOR_NAME.to_string(),
        score: result.overall_risk_score,
        weight: OVERALL_FACTOR_WEIGHT,
        description: format!(
            "Consolidated sanctions screening of '{}': {} match(es) across {} source(s), level {}",
            result.entity_name,
            result.total_matches,
            result.sources.len(),
            result.overall_risk_level
        ),
        impact: overall_impact(result),
        mitigation: overall_mitigation(result),
        source: sources_label,
        confidence: overall_confidence,
        last_updated: result.completed_at,
    });

    for source in &result.sources {
        let hits: Vec<_> = result.matches.iter().filter(|m| m.source == *source).collect();
        let Some(strongest) = hits.first() else {
            continue;
        };

        factors.push(RiskFactor {
            category: SANCTIONS_CATEGORY.to_string(),
            subcategory: source.label().to_string(),
            name: format!("{}_sanctions_match", source.label().to_lowercase()),
            score: source.severity(),
            weight: SOURCE_FACTOR_WEIGHT,
            description: format!(
                "{} match(es) on the {}; strongest '{}' ({})",
                hits.len(),
                source.list_name(),
                strongest.entity_name,
                strongest.program
            ),
            impact: format!(
                "Dealing with a party designated by {} may breach sanctions law",
                source.label()
            ),
            mitigation: "Escalate to compliance for manual review before processing".to_string(),
            source: source.label().to_string(),
            confidence: source.confidence(),
            last_updated: result.completed_at,
        });
    }

    factors
}

fn overall_impact(result: &ScreeningResult) -> String {
    if result.total_matches == 0 {
        "No sanctions exposure detected".to_string()
    } else {
        format!(
            "{} high, {} medium, {} low risk sanctions match(es)",
            result.high_risk_matches, result.medium_risk_matches, result.low_risk_matches
        )
    }
}

fn overall_mitigation(result: &ScreeningResult) -> String {
    match result.overall_risk_level {
        RiskLevel::Critical => "Block the relationship and file a report with the regulator",
        RiskLevel::High => "Hold pending enhanced due diligence",
        RiskLevel::Medium => "Review matches and document the disposition",
        RiskLevel::Low => "No action required",
    }
    .to_string()
}
