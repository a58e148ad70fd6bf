//! DelTran Screening Aggregator
//!
//! Screens a party against several sanctions lists (OFAC, EU, UN, UK HMT) at
//! once and folds the answers into one ranked, scored result.
//!
//! # Pipeline
//!
//! - **Fan-out**: one task per enabled source, each bound to the caller's
//!   cancellation token, deadline and a per-source timeout
//! - **Normalize**: provider answers become canonical [`UnifiedMatch`]es
//! - **Deduplicate**: near-identical hits from the same source collapse to the
//!   strongest one; hits from different sources are always kept
//! - **Score**: mean of level weight × match score, mapped to a [`RiskLevel`]
//! - **Assemble**: sort, count, attach source answers
//!
//! # Invariants
//!
//! - high + medium + low == total == number of matches
//! - No matches means score 0.0 and level low
//! - Matches sorted by level, then score, both descending

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod aggregator;
pub mod assembler;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod export;
pub mod metrics;
pub mod normalizer;
pub mod scoring;
pub mod similarity;
pub mod source;
pub mod types;

pub use aggregator::{SanctionsAggregator, ScreeningPhase};
pub use config::AggregatorConfig;
pub use context::ScreeningContext;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use similarity::{NameSimilarity, SimilarityStrategy};
pub use source::{ListEntry, ListSource, ScreeningSource};
pub use types::{
    DataQuality, EntityType, MatchType, RawMatch, RiskFactor, RiskLevel, ScreeningResult,
    SourceKind, SourceMeta, SourceResult, UnifiedMatch,
};
