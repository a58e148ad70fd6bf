//! Core types for the screening aggregator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of listed party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Natural person
    Individual,
    /// Company, bank or other organization
    Entity,
    /// Ship
    Vessel,
    /// Aircraft
    Aircraft,
}

/// Discrete risk severity
///
/// Variant order is severity order, so `Ord` compares by risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
    /// Critical risk
    Critical,
}

impl RiskLevel {
    /// Sort rank (critical=4 .. low=1)
    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::Critical => 4,
            RiskLevel::High => 3,
            RiskLevel::Medium => 2,
            RiskLevel::Low => 1,
        }
    }

    /// Weight of a single match at this level in the overall score
    pub fn weight(&self) -> f64 {
        match self {
            RiskLevel::Critical | RiskLevel::High => 0.9,
            RiskLevel::Medium => 0.6,
            RiskLevel::Low => 0.3,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a candidate's name relates to the queried name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Names identical after normalization
    Exact,
    /// One name contains the other
    Partial,
    /// Similarity-threshold match
    Fuzzy,
    /// Names sound alike
    Phonetic,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchType::Exact => "exact",
            MatchType::Partial => "partial",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Phonetic => "phonetic",
        };
        f.write_str(s)
    }
}

/// Coarse reliability label of a source contribution
///
/// Variant order is quality order (`Unknown` lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// No source reported
    Unknown,
    /// Stale or partial data
    Average,
    /// Recently refreshed
    Good,
    /// Refreshed within the last week
    Excellent,
}

/// Sanctions list families the engine can screen against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// US Office of Foreign Assets Control
    #[serde(rename = "OFAC")]
    Ofac,
    /// European Union consolidated list
    #[serde(rename = "EU")]
    Eu,
    /// United Nations Security Council consolidated list
    #[serde(rename = "UN")]
    Un,
    /// UK His Majesty's Treasury
    #[serde(rename = "UK_HMT")]
    UkHmt,
}

impl SourceKind {
    /// All known source kinds, in registration order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Ofac,
        SourceKind::Eu,
        SourceKind::Un,
        SourceKind::UkHmt,
    ];

    /// Short label used in results and logs
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Ofac => "OFAC",
            SourceKind::Eu => "EU",
            SourceKind::Un => "UN",
            SourceKind::UkHmt => "UK_HMT",
        }
    }

    /// Name of the published list
    pub fn list_name(&self) -> &'static str {
        match self {
            SourceKind::Ofac => "Specially Designated Nationals and Blocked Persons",
            SourceKind::Eu => "EU Consolidated Financial Sanctions List",
            SourceKind::Un => "UN Security Council Consolidated List",
            SourceKind::UkHmt => "UK Consolidated List of Financial Sanctions Targets",
        }
    }

    /// Trust in the authority's data, independent of any single match
    pub fn confidence(&self) -> f64 {
        match self {
            SourceKind::Ofac => 0.98,
            SourceKind::Un => 0.97,
            SourceKind::Eu => 0.95,
            SourceKind::UkHmt => 0.95,
        }
    }

    /// Consequence level of a hit on this authority's list
    pub fn severity(&self) -> f64 {
        match self {
            SourceKind::Ofac => 0.95,
            SourceKind::Eu | SourceKind::Un | SourceKind::UkHmt => 0.9,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Candidate record as returned by a screening source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    /// Identifier within the issuing list
    pub entity_id: String,

    /// Listed name
    pub entity_name: String,

    /// Kind of listed party
    pub entity_type: EntityType,

    /// Country associated with the listing
    pub country: String,

    /// Nationality
    pub nationality: Option<String>,

    /// Date of birth, as published
    pub date_of_birth: Option<String>,

    /// Place of birth
    pub place_of_birth: Option<String>,

    /// Passport number
    pub passport_number: Option<String>,

    /// National identification number
    pub national_id: Option<String>,

    /// Address
    pub address: Option<String>,

    /// Title or position
    pub title: Option<String>,

    /// Free-text remarks
    pub remarks: Option<String>,

    /// Sanctions program name
    pub program: String,

    /// Program list name
    pub program_list: String,

    /// Name match score (0.0-1.0)
    pub match_score: f64,

    /// Risk level assigned by the source
    pub risk_level: RiskLevel,

    /// When the listing was last updated
    pub last_updated: DateTime<Utc>,

    /// Issuing source identifier
    pub source_id: String,
}

/// Metadata describing one source call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Source that answered
    pub source: SourceKind,

    /// Time spent in the source
    pub elapsed_ms: u64,

    /// Data-quality estimate
    pub data_quality: DataQuality,

    /// Number of list entries consulted
    pub entries_checked: usize,
}

/// Untouched answer of one source, kept for the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    /// Raw matches
    pub matches: Vec<RawMatch>,

    /// Call metadata
    pub meta: SourceMeta,
}

/// Canonical match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedMatch {
    /// Synthesized identifier, unique within one screening
    pub match_id: String,

    /// Identifier within the issuing list
    pub entity_id: String,

    /// Listed name
    pub entity_name: String,

    /// Kind of listed party
    pub entity_type: EntityType,

    /// Country associated with the listing
    pub country: String,

    /// Nationality
    pub nationality: Option<String>,

    /// Date of birth, as published
    pub date_of_birth: Option<String>,

    /// Place of birth
    pub place_of_birth: Option<String>,

    /// Passport number
    pub passport_number: Option<String>,

    /// National identification number
    pub national_id: Option<String>,

    /// Address
    pub address: Option<String>,

    /// Title or position
    pub title: Option<String>,

    /// Free-text remarks
    pub remarks: Option<String>,

    /// Sanctions program name
    pub program: String,

    /// Program list name
    pub program_list: String,

    /// Name match score (0.0-1.0)
    pub match_score: f64,

    /// Risk level assigned by the source
    pub risk_level: RiskLevel,

    /// When the listing was last updated
    pub last_updated: DateTime<Utc>,

    /// Source that produced the match
    pub source: SourceKind,

    /// Match classification
    pub match_type: MatchType,

    /// Trust in the source (0.0-1.0)
    pub confidence: f64,

    /// Category, always "sanctions" here
    pub category: String,

    /// Subcategory (the program name)
    pub subcategory: String,

    /// Human-readable explanation
    pub match_details: String,

    /// Whether the listing is active
    pub is_active: bool,

    /// Listing expiry, when published
    pub expires_at: Option<DateTime<Utc>>,
}

/// Consolidated verdict of one screening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Request identifier
    pub request_id: Uuid,

    /// Queried name
    pub entity_name: String,

    /// Country hint
    pub country: String,

    /// Number of matches
    pub total_matches: usize,

    /// Matches at high or critical level
    pub high_risk_matches: usize,

    /// Matches at medium level
    pub medium_risk_matches: usize,

    /// Matches at low level
    pub low_risk_matches: usize,

    /// Matches ordered by risk then score
    pub matches: Vec<UnifiedMatch>,

    /// Overall risk score (0.0-1.0)
    pub overall_risk_score: f64,

    /// Overall risk level
    pub overall_risk_level: RiskLevel,

    /// End-to-end screening time
    pub screening_time_ms: u64,

    /// Completion timestamp
    pub completed_at: DateTime<Utc>,

    /// Best data quality among contributing sources
    pub data_quality: DataQuality,

    /// Sources that answered
    pub sources: Vec<SourceKind>,

    /// Untouched per-source answers
    pub raw_results: Vec<SourceResult>,
}

/// Weighted risk factor consumed by the downstream risk model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor category
    pub category: String,

    /// Factor subcategory
    pub subcategory: String,

    /// Factor name
    pub name: String,

    /// Score (0.0-1.0)
    pub score: f64,

    /// Weight in the risk model
    pub weight: f64,

    /// What the factor measures
    pub description: String,

    /// Business impact
    pub impact: String,

    /// Recommended mitigation
    pub mitigation: String,

    /// Source label
    pub source: String,

    /// Confidence (0.0-1.0)
    pub confidence: f64,

    /// When the underlying data was produced
    pub last_updated: DateTime<Utc>,
}
