//! Name normalization and similarity strategies

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pluggable name-similarity measure
///
/// Implementations return a score in `[0, 1]` where 1 means identical. Inputs
/// are expected to be normalized with [`normalize_name`].
pub trait NameSimilarity: Send + Sync {
    /// Similarity of two normalized names
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Jaro-Winkler similarity, favours shared prefixes
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl NameSimilarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

/// Levenshtein distance normalized by the longer name
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl NameSimilarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Configurable choice of similarity measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStrategy {
    /// [`JaroWinkler`]
    #[default]
    JaroWinkler,
    /// [`NormalizedLevenshtein`]
    Levenshtein,
}

impl SimilarityStrategy {
    /// Instantiate the measure
    pub fn build(&self) -> Arc<dyn NameSimilarity> {
        match self {
            SimilarityStrategy::JaroWinkler => Arc::new(JaroWinkler),
            SimilarityStrategy::Levenshtein => Arc::new(NormalizedLevenshtein),
        }
    }
}

/// Trim, case-fold and collapse internal whitespace
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// American Soundex code of a single word (letter + 3 digits)
///
/// Returns `None` for words without ASCII letters.
pub fn soundex(word: &str) -> Option<String> {
    let mut letters = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());

    let first = letters.next()?;
    let mut code = String::with_capacity(4);
    code.push(first);

    let mut last = soundex_digit(first);
    for c in letters {
        let digit = soundex_digit(c);
        match digit {
            Some(d) if last != Some(d) => {
                code.push(d);
                if code.len() == 4 {
                    break;
                }
            }
            _ => {}
        }
        // H and W do not separate letters with the same code, vowels do
        if c != 'H' && c != 'W' {
            last = digit;
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    Some(code)
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Whether two names sound alike token by token
pub fn sounds_alike(a: &str, b: &str) -> bool {
    let codes =
        |name: &str| -> Vec<String> { name.split_whitespace().filter_map(soundex).collect() };
    let (ca, cb) = (codes(a), codes(b));
    !ca.is_empty() && ca == cb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalization() {
        assert_eq!(normalize_name("  ACME   CORP "), "acme corp");
        assert_eq!(normalize_name("Acme Corp"), "acme corp");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_jaro_winkler_tolerates_transposition() {
        let jw = JaroWinkler;
        assert_eq!(jw.similarity("john smith", "john smith"), 1.0);
        assert!(jw.similarity("john smith", "jonh smith") > 0.9);
        assert!(jw.similarity("john smith", "jane doe") < 0.7);
    }

    #[test]
    fn test_levenshtein_tolerates_padding() {
        let lev = NormalizedLevenshtein;
        assert!(lev.similarity("acme corp", "acme corp ltd") > 0.6);
        assert!(lev.similarity("kitten", "sitting") < 0.6);
    }

    #[test]
    fn test_soundex() {
        assert_eq!(soundex("Robert").as_deref(), Some("R163"));
        assert_eq!(soundex("Rupert").as_deref(), Some("R163"));
        assert_eq!(soundex("Ashcraft").as_deref(), Some("A261"));
        assert_eq!(soundex("Tymczak").as_deref(), Some("T522"));
        assert_eq!(soundex("Lee").as_deref(), Some("L000"));
        assert_eq!(soundex("123"), None);
    }

    #[test]
    fn test_sounds_alike() {
        assert!(sounds_alike("mohammed ali", "muhammad aly"));
        assert!(!sounds_alike("john smith", "jane doe"));
        assert!(!sounds_alike("", ""));
    }

    #[test]
    fn test_strategy_build() {
        let sim = SimilarityStrategy::Levenshtein.build();
        assert_eq!(sim.similarity("abc", "abc"), 1.0);
    }
}
