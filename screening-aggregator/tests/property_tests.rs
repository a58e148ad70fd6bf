//! Property-based tests for screening result invariants
//!
//! These tests verify properties that must hold for every match list,
//! not just specific test cases.

use chrono::Utc;
use proptest::prelude::*;
use screening_aggregator::assembler::{assemble, Assembly};
use screening_aggregator::dedup::Deduplicator;
use screening_aggregator::normalizer::MatchNormalizer;
use screening_aggregator::scoring::RiskScorer;
use screening_aggregator::similarity::JaroWinkler;
use screening_aggregator::{
    EntityType, RawMatch, RiskLevel, ScreeningResult, SourceKind, UnifiedMatch,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const NAMES: &[&str] = &[
    "Acme Corp",
    "ACME  CORP",
    "Acme",
    "Bank Melli Iran",
    "Melli Bank",
    "John Smith",
    "Jon Smith",
    "Banco Bandes",
    "VTB Bank",
    "Korea Kwangson Banking Corp",
];

fn level() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Low),
        Just(RiskLevel::Medium),
        Just(RiskLevel::High),
        Just(RiskLevel::Critical),
    ]
}

fn unified_match() -> impl Strategy<Value = UnifiedMatch> {
    (
        prop::sample::select(NAMES),
        prop::sample::select(SourceKind::ALL.to_vec()),
        level(),
        0.0f64..=1.0,
    )
        .prop_map(|(name, source, level, score)| {
            let raw = RawMatch {
                entity_id: name.to_lowercase().replace(' ', "-"),
                entity_name: name.to_string(),
                entity_type: EntityType::Entity,
                country: "XX".to_string(),
                nationality: None,
                date_of_birth: None,
                place_of_birth: None,
                passport_number: None,
                national_id: None,
                address: None,
                title: None,
                remarks: None,
                program: "TEST".to_string(),
                program_list: source.list_name().to_string(),
                match_score: score,
                risk_level: level,
                last_updated: Utc::now(),
                source_id: source.label().to_string(),
            };
            MatchNormalizer::new(true).normalize("Acme Corp", source, &raw)
        })
}

fn matches() -> impl Strategy<Value = Vec<UnifiedMatch>> {
    prop::collection::vec(unified_match(), 0..12)
}

fn deduplicator() -> Deduplicator {
    Deduplicator::new(Arc::new(JaroWinkler), 0.85)
}

fn screen(matches: Vec<UnifiedMatch>) -> ScreeningResult {
    let assessment = RiskScorer::default().assess(&matches);
    assemble(Assembly {
        request_id: Uuid::new_v4(),
        entity_name: "Acme Corp".to_string(),
        country: "XX".to_string(),
        matches,
        assessment,
        sources: vec![],
        raw_results: vec![],
        started: Instant::now(),
    })
}

// ============================================================================
// Result invariants
// ============================================================================

proptest! {
    /// Property: bucket counts add up to the total and to the match list length
    #[test]
    fn counts_sum_to_total(matches in matches()) {
        let len = matches.len();
        let result = screen(matches);

        prop_assert_eq!(
            result.high_risk_matches + result.medium_risk_matches + result.low_risk_matches,
            result.total_matches
        );
        prop_assert_eq!(result.total_matches, len);
        prop_assert_eq!(result.matches.len(), len);
    }

    /// Property: no matches means score 0 and level low
    #[test]
    fn empty_result_is_low_risk(matches in matches()) {
        let result = screen(matches);
        if result.total_matches == 0 {
            prop_assert_eq!(result.overall_risk_score, 0.0);
            prop_assert_eq!(result.overall_risk_level, RiskLevel::Low);
        }
        prop_assert!((0.0..=1.0).contains(&result.overall_risk_score));
    }

    /// Property: matches are ordered by level rank, then score, both descending
    #[test]
    fn matches_are_sorted(matches in matches()) {
        let result = screen(matches);
        for pair in result.matches.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.risk_level.rank() >= b.risk_level.rank());
            if a.risk_level.rank() == b.risk_level.rank() {
                prop_assert!(a.match_score >= b.match_score);
            }
        }
    }
}

// ============================================================================
// Deduplication invariants
// ============================================================================

proptest! {
    /// Property: deduplicating twice changes nothing
    #[test]
    fn dedup_is_idempotent(matches in matches()) {
        let dedup = deduplicator();
        let once = dedup.dedupe(matches);
        let twice = dedup.dedupe(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Property: every source keeps at least one hit and is deduplicated on its own
    #[test]
    fn dedup_never_merges_sources(matches in matches()) {
        let dedup = deduplicator();
        let out = dedup.dedupe(matches.clone());

        for source in SourceKind::ALL {
            let input: Vec<_> = matches.iter().filter(|m| m.source == source).cloned().collect();
            let kept: Vec<_> = out.iter().filter(|m| m.source == source).cloned().collect();

            prop_assert_eq!(input.is_empty(), kept.is_empty());
            prop_assert_eq!(kept, dedup.dedupe_source(input));
        }
    }

    /// Property: dedup keeps the strongest hit of each source
    #[test]
    fn dedup_keeps_best_score(matches in matches()) {
        let out = deduplicator().dedupe(matches.clone());

        for source in SourceKind::ALL {
            let best_in = matches
                .iter()
                .filter(|m| m.source == source)
                .map(|m| m.match_score)
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
            let best_out = out
                .iter()
                .filter(|m| m.source == source)
                .map(|m| m.match_score)
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
            prop_assert_eq!(best_in, best_out);
        }
    }
}
