//! Screening source contract
//!
//! Every list provider (OFAC, EU, UN, UK HMT, ...) sits behind
//! [`ScreeningSource`]. Sources return their own [`SourceResult`]; the
//! aggregator normalizes it, so provider-specific shapes never leak further.

pub mod list;

pub use list::{ListEntry, ListSource};

use crate::context::ScreeningContext;
use crate::types::{SourceKind, SourceResult};
use crate::Result;
use async_trait::async_trait;

/// A watchlist provider
///
/// Implementations must be safe to call concurrently, must return promptly
/// once `ctx` is cancelled or past its deadline, and must treat "no match" as
/// an empty result rather than an error.
#[async_trait]
pub trait ScreeningSource: Send + Sync {
    /// Which list family this source serves
    fn kind(&self) -> SourceKind;

    /// Search the list for `entity_name`, with `country` as a hint
    async fn search(
        &self,
        entity_name: &str,
        country: &str,
        ctx: &ScreeningContext,
    ) -> Result<SourceResult>;

    /// Report liveness without a full search
    async fn health_check(&self, ctx: &ScreeningContext) -> Result<()>;
}
