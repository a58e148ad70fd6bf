//! Mapping of raw source records into canonical matches

use crate::similarity::{normalize_name, sounds_alike};
use crate::types::{MatchType, RawMatch, SourceKind, UnifiedMatch};
use uuid::Uuid;

/// Category assigned to every match produced by this engine
pub const SANCTIONS_CATEGORY: &str = "sanctions";

/// Stateless raw-to-canonical mapper
///
/// Output is a pure function of the inputs except for the uniqueness salt in
/// `match_id`.
#[derive(Debug, Clone, Copy)]
pub struct MatchNormalizer {
    phonetic: bool,
}

impl MatchNormalizer {
    /// Create a normalizer; `phonetic` enables sound-alike classification
    pub fn new(phonetic: bool) -> Self {
        Self { phonetic }
    }

    /// Normalize every match a source returned for `query`
    pub fn normalize_all(
        &self,
        query: &str,
        source: SourceKind,
        raw: &[RawMatch],
    ) -> Vec<UnifiedMatch> {
        let normalized_query = normalize_name(query);
        raw.iter()
            .map(|m| self.normalize_with(&normalized_query, source, m))
            .collect()
    }

    /// Normalize a single match
    pub fn normalize(&self, query: &str, source: SourceKind, raw: &RawMatch) -> UnifiedMatch {
        self.normalize_with(&normalize_name(query), source, raw)
    }

    fn normalize_with(
        &self,
        normalized_query: &str,
        source: SourceKind,
        raw: &RawMatch,
    ) -> UnifiedMatch {
        let match_type = self.classify(normalized_query, &normalize_name(&raw.entity_name));
        let match_score = clamp_unit(raw.match_score);

        let match_details = format!(
            "{} match on '{}' in {} ({}), score {:.2}",
            match_type, raw.entity_name, raw.program_list, raw.program, match_score
        );

        UnifiedMatch {
            match_id: format!("{}-{}-{}", source.label(), raw.entity_id, Uuid::new_v4().simple()),
            entity_id: raw.entity_id.clone(),
            entity_name: raw.entity_name.clone(),
            entity_type: raw.entity_type,
            country: raw.country.clone(),
            nationality: raw.nationality.clone(),
            date_of_birth: raw.date_of_birth.clone(),
            place_of_birth: raw.place_of_birth.clone(),
            passport_number: raw.passport_number.clone(),
            national_id: raw.national_id.clone(),
            address: raw.address.clone(),
            title: raw.title.clone(),
            remarks: raw.remarks.clone(),
            program: raw.program.clone(),
            program_list: raw.program_list.clone(),
            match_score,
            risk_level: raw.risk_level,
            last_updated: raw.last_updated,
            source,
            match_type,
            confidence: source.confidence(),
            category: SANCTIONS_CATEGORY.to_string(),
            subcategory: raw.program.clone(),
            match_details,
            is_active: true,
            expires_at: None,
        }
    }

    fn classify(&self, query: &str, candidate: &str) -> MatchType {
        if query == candidate {
            MatchType::Exact
        } else if !query.is_empty()
            && !candidate.is_empty()
            && (candidate.contains(query) || query.contains(candidate))
        {
            MatchType::Partial
        } else if self.phonetic && sounds_alike(query, candidate) {
            MatchType::Phonetic
        } else {
            MatchType::Fuzzy
        }
    }
}

// Out-of-range or NaN scores from a misbehaving source never leak past normalization.
fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityType, RiskLevel};
    use chrono::Utc;

    fn raw(name: &str, score: f64) -> RawMatch {
        RawMatch {
            entity_id: "SDN-1001".to_string(),
            entity_name: name.to_string(),
            entity_type: EntityType::Individual,
            country: "IR".to_string(),
            nationality: Some("IR".to_string()),
            date_of_birth: None,
            place_of_birth: None,
            passport_number: None,
            national_id: None,
            address: None,
            title: None,
            remarks: None,
            program: "IRAN".to_string(),
            program_list: "SDN".to_string(),
            match_score: score,
            risk_level: RiskLevel::High,
            last_updated: Utc::now(),
            source_id: "OFAC".to_string(),
        }
    }

    #[test]
    fn test_normalize_copies_fields_and_tags_source() {
        let normalizer = MatchNormalizer::new(true);
        let m = normalizer.normalize("John Smith", SourceKind::Ofac, &raw("John Smith", 0.95));

        assert_eq!(m.entity_name, "John Smith");
        assert_eq!(m.source, SourceKind::Ofac);
        assert_eq!(m.match_type, MatchType::Exact);
        assert_eq!(m.confidence, 0.98);
        assert_eq!(m.category, "sanctions");
        assert_eq!(m.subcategory, "IRAN");
        assert_eq!(m.nationality.as_deref(), Some("IR"));
        assert!(m.passport_number.is_none());
        assert!(m.is_active);
        assert!(m.match_id.starts_with("OFAC-SDN-1001-"));
    }

    #[test]
    fn test_match_ids_unique() {
        let normalizer = MatchNormalizer::new(false);
        let r = raw("John Smith", 0.9);
        let a = normalizer.normalize("John Smith", SourceKind::Eu, &r);
        let b = normalizer.normalize("John Smith", SourceKind::Eu, &r);
        assert_ne!(a.match_id, b.match_id);
    }

    #[test]
    fn test_classification() {
        let normalizer = MatchNormalizer::new(true);
        let kind = |query: &str, name: &str| {
            normalizer.normalize(query, SourceKind::Un, &raw(name, 0.9)).match_type
        };

        assert_eq!(kind("ACME  corp", "Acme Corp"), MatchType::Exact);
        assert_eq!(kind("Acme Corp", "Acme Corp Ltd"), MatchType::Partial);
        assert_eq!(kind("Mohammed Ali", "Muhammad Aly"), MatchType::Phonetic);
        assert_eq!(kind("John Smith", "Jon Smyth"), MatchType::Phonetic);
        assert_eq!(kind("John Smith", "Jane Doe"), MatchType::Fuzzy);

        let no_phonetic = MatchNormalizer::new(false);
        let m = no_phonetic.normalize("Mohammed Ali", SourceKind::Un, &raw("Muhammad Aly", 0.9));
        assert_eq!(m.match_type, MatchType::Fuzzy);
    }

    #[test]
    fn test_score_clamped() {
        let normalizer = MatchNormalizer::new(false);
        let over = normalizer.normalize("x", SourceKind::Ofac, &raw("y", 1.4));
        assert_eq!(over.match_score, 1.0);
        let nan = normalizer.normalize("x", SourceKind::Ofac, &raw("y", f64::NAN));
        assert_eq!(nan.match_score, 0.0);
    }
}
