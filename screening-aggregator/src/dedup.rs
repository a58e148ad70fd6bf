//! Same-source near-duplicate removal
//!
//! Within the matches one source returned for one query, records whose names
//! are equal, nested, or similar above the fuzzy threshold denote the same
//! listed party; only the highest-scoring one is kept. Matches from different
//! sources are never compared, so every authority's hit stays auditable.

use crate::similarity::{normalize_name, NameSimilarity};
use crate::types::{SourceKind, UnifiedMatch};
use std::sync::Arc;
use tracing::debug;

/// Deduplicator over canonical matches
#[derive(Clone)]
pub struct Deduplicator {
    similarity: Arc<dyn NameSimilarity>,
    threshold: f64,
}

impl std::fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Deduplicator {
    /// Create a deduplicator with an injected similarity measure
    pub fn new(similarity: Arc<dyn NameSimilarity>, threshold: f64) -> Self {
        Self {
            similarity,
            threshold,
        }
    }

    /// Whether two normalized names denote the same party
    pub fn is_duplicate(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.contains(b) || b.contains(a) || self.similarity.similarity(a, b) >= self.threshold
    }

    /// Collapse duplicates in one source's matches
    ///
    /// Survivors are returned strongest first; equal scores keep input order.
    pub fn dedupe_source(&self, mut matches: Vec<UnifiedMatch>) -> Vec<UnifiedMatch> {
        matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

        let mut kept: Vec<(String, UnifiedMatch)> = Vec::with_capacity(matches.len());
        for candidate in matches {
            let name = normalize_name(&candidate.entity_name);
            match kept.iter().find(|(kept_name, _)| self.is_duplicate(kept_name, &name)) {
                Some((_, survivor)) => {
                    debug!(
                        "Dropping duplicate {} '{}' ({:.2}), kept '{}' ({:.2})",
                        candidate.source,
                        candidate.entity_name,
                        candidate.match_score,
                        survivor.entity_name,
                        survivor.match_score
                    );
                }
                None => kept.push((name, candidate)),
            }
        }

        kept.into_iter().map(|(_, m)| m).collect()
    }

    /// Collapse duplicates in a mixed list, independently per source
    ///
    /// Sources appear in the output in order of their first match.
    pub fn dedupe(&self, matches: Vec<UnifiedMatch>) -> Vec<UnifiedMatch> {
        let mut groups: Vec<(SourceKind, Vec<UnifiedMatch>)> = Vec::new();
        for m in matches {
            match groups.iter_mut().find(|(source, _)| *source == m.source) {
                Some((_, group)) => group.push(m),
                None => groups.push((m.source, vec![m])),
            }
        }

        groups
            .into_iter()
            .flat_map(|(_, group)| self.dedupe_source(group))
            .collect()
    }
}
