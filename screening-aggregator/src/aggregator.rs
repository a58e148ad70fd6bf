//! Sanctions aggregator
//!
//! Fans one screening request out to every enabled list source in parallel,
//! then normalizes, deduplicates, scores and packages whatever came back.
//! A source that fails or runs out of time only removes its own answer; the
//! request fails only when no enabled source answered.

use crate::assembler::{assemble, Assembly};
use crate::config::AggregatorConfig;
use crate::context::ScreeningContext;
use crate::dedup::Deduplicator;
use crate::export;
use crate::metrics::Metrics;
use crate::normalizer::MatchNormalizer;
use crate::scoring::RiskScorer;
use crate::similarity::NameSimilarity;
use crate::source::ScreeningSource;
use crate::types::{RiskFactor, ScreeningResult, SourceKind, SourceResult};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stage of a single screening call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningPhase {
    /// Querying sources
    FanOut,
    /// Converting source answers to canonical matches
    Normalize,
    /// Removing same-source duplicates
    Deduplicate,
    /// Computing the overall score
    Score,
    /// Sorting, counting, packaging
    Assemble,
}

impl fmt::Display for ScreeningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            ScreeningPhase::FanOut => "fan_out",
            ScreeningPhase::Normalize => "normalize",
            ScreeningPhase::Deduplicate => "deduplicate",
            ScreeningPhase::Score => "score",
            ScreeningPhase::Assemble => "assemble",
        };
        f.write_str(phase)
    }
}

/// Concurrent multi-list sanctions screening
pub struct SanctionsAggregator {
    config: Arc<AggregatorConfig>,
    sources: Vec<Arc<dyn ScreeningSource>>,
    normalizer: MatchNormalizer,
    deduplicator: Deduplicator,
    scorer: RiskScorer,
    metrics: Metrics,
}

impl fmt::Debug for SanctionsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<SourceKind> = self.sources.iter().map(|s| s.kind()).collect();
        f.debug_struct("SanctionsAggregator")
            .field("config", &self.config)
            .field("sources", &kinds)
            .finish_non_exhaustive()
    }
}

impl SanctionsAggregator {
    /// Create an aggregator using the configured similarity strategy
    ///
    /// Sources are consulted in the order given here. Sources whose kind is
    /// disabled in `config` are kept but never called.
    pub fn new(config: AggregatorConfig, sources: Vec<Arc<dyn ScreeningSource>>) -> Result<Self> {
        let similarity = config.similarity.build();
        Self::with_similarity(config, sources, similarity)
    }

    /// Create an aggregator with an injected similarity measure
    pub fn with_similarity(
        config: AggregatorConfig,
        sources: Vec<Arc<dyn ScreeningSource>>,
        similarity: Arc<dyn NameSimilarity>,
    ) -> Result<Self> {
        config.validate()?;

        let mut registered: Vec<SourceKind> = Vec::with_capacity(sources.len());
        for source in &sources {
            let kind = source.kind();
            if registered.contains(&kind) {
                return Err(Error::InvalidConfig(format!(
                    "source {kind} registered more than once"
                )));
            }
            registered.push(kind);
        }

        let normalizer = MatchNormalizer::new(config.enable_phonetic_matching);
        let deduplicator = Deduplicator::new(similarity, config.fuzzy_match_threshold);
        let scorer = RiskScorer::from_config(&config);
        let metrics = Metrics::new()?;

        info!(
            "Sanctions aggregator ready with {} source(s), {} enabled",
            sources.len(),
            config.sources.enabled().len()
        );

        Ok(Self {
            config: Arc::new(config),
            sources,
            normalizer,
            deduplicator,
            scorer,
            metrics,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn enabled_sources(&self) -> Vec<Arc<dyn ScreeningSource>> {
        self.sources
            .iter()
            .filter(|s| self.config.sources.is_enabled(s.kind()))
            .cloned()
            .collect()
    }

    fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.config.source_timeout_ms)
    }

    /// Screen one entity against every enabled source
    pub async fn screen_entity(
        &self,
        entity_name: &str,
        country: &str,
        ctx: &ScreeningContext,
    ) -> Result<ScreeningResult> {
        let started = Instant::now();
        self.metrics.requests_total.inc();

        let outcome = self.run_screening(entity_name, country, ctx, started).await;

        let elapsed = started.elapsed().as_secs_f64();
        match &outcome {
            Ok(result) => self.metrics.record_success(result.total_matches, elapsed),
            Err(e) => {
                warn!("Screening of '{}' failed: {}", entity_name, e);
                self.metrics.record_failure(elapsed);
            }
        }
        outcome
    }

    async fn run_screening(
        &self,
        entity_name: &str,
        country: &str,
        ctx: &ScreeningContext,
        started: Instant,
    ) -> Result<ScreeningResult> {
        if entity_name.trim().is_empty() {
            return Err(Error::InvalidInput("entity name is empty".to_string()));
        }

        let sources = self.enabled_sources();
        if sources.is_empty() {
            return Err(Error::NoSourcesEnabled);
        }

        let request_id = Uuid::now_v7();
        debug!(
            %request_id,
            phase = %ScreeningPhase::FanOut,
            sources = sources.len(),
            remaining = ?ctx.remaining(),
            "Screening phase"
        );

        let outcomes = self.fan_out(&sources, entity_name, country, ctx).await?;

        let mut answered: Vec<SourceKind> = Vec::with_capacity(sources.len());
        let mut raw_results: Vec<SourceResult> = Vec::with_capacity(sources.len());
        let mut failed: Vec<String> = Vec::new();
        for (source, outcome) in sources.iter().zip(outcomes) {
            let kind = source.kind();
            match outcome {
                Some(Ok(result)) => {
                    if result.meta.source != kind {
                        warn!(
                            "Screening source {} labelled its answer {}, using {}",
                            kind, result.meta.source, kind
                        );
                    }
                    answered.push(kind);
                    raw_results.push(result);
                }
                Some(Err(e)) => {
                    warn!("Screening source {} failed: {}", kind, e);
                    self.metrics.record_source_failure(kind);
                    failed.push(kind.label().to_string());
                }
                None => {
                    warn!("Screening source {} task did not complete", kind);
                    self.metrics.record_source_failure(kind);
                    failed.push(kind.label().to_string());
                }
            }
        }

        if answered.is_empty() {
            if ctx.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if ctx.is_expired() {
                return Err(Error::DeadlineExceeded);
            }
            return Err(Error::AllSourcesFailed { failed });
        }

        debug!(
            %request_id,
            phase = %ScreeningPhase::Normalize,
            answered = answered.len(),
            "Screening phase"
        );
        // Registered kind is authoritative, raw answers stay as returned
        let normalized: Vec<_> = answered
            .iter()
            .zip(&raw_results)
            .map(|(kind, r)| self.normalizer.normalize_all(entity_name, *kind, &r.matches))
            .collect();

        debug!(%request_id, phase = %ScreeningPhase::Deduplicate, "Screening phase");
        let matches: Vec<_> = normalized
            .into_iter()
            .flat_map(|per_source| self.deduplicator.dedupe_source(per_source))
            .collect();

        debug!(
            %request_id,
            phase = %ScreeningPhase::Score,
            matches = matches.len(),
            "Screening phase"
        );
        let assessment = self.scorer.assess(&matches);

        debug!(%request_id, phase = %ScreeningPhase::Assemble, "Screening phase");
        let result = assemble(Assembly {
            request_id,
            entity_name: entity_name.to_string(),
            country: country.to_string(),
            matches,
            assessment,
            sources: answered,
            raw_results,
            started,
        });

        info!(
            "Screened '{}' against {} source(s): {} match(es), risk {} ({:.3}) in {}ms",
            result.entity_name,
            result.sources.len(),
            result.total_matches,
            result.overall_risk_level,
            result.overall_risk_score,
            result.screening_time_ms
        );

        Ok(result)
    }

    /// Query every source concurrently; outcomes are indexed like `sources`
    ///
    /// `None` marks a task that panicked.
    async fn fan_out(
        &self,
        sources: &[Arc<dyn ScreeningSource>],
        entity_name: &str,
        country: &str,
        ctx: &ScreeningContext,
    ) -> Result<Vec<Option<Result<SourceResult>>>> {
        let timeout = self.source_timeout();
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().enumerate() {
            let source = Arc::clone(source);
            let name = entity_name.to_string();
            let country = country.to_string();
            let source_ctx = ctx.child().with_timeout(timeout);

            tasks.spawn(async move {
                let kind = source.kind();
                let outcome = source_ctx
                    .run(source.search(&name, &country, &source_ctx))
                    .await
                    .map_err(|e| match e {
                        Error::DeadlineExceeded => Error::SourceTimeout(kind.label().to_string()),
                        other => other,
                    });
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Result<SourceResult>>> =
            sources.iter().map(|_| None).collect();

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => outcomes[index] = Some(outcome),
                    Some(Err(join_error)) => warn!("Screening source task failed: {}", join_error),
                    None => break,
                },
            }
        }

        Ok(outcomes)
    }

    /// Screen many entities with bounded parallelism
    ///
    /// Results keep input order. Entities whose screening fails are logged
    /// and left out.
    pub async fn screen_batch<S>(
        &self,
        entity_names: &[S],
        country: &str,
        ctx: &ScreeningContext,
    ) -> Vec<ScreeningResult>
    where
        S: AsRef<str> + Sync,
    {
        let concurrency = self.config.batch_concurrency.max(1);

        stream::iter(entity_names)
            .map(|name| async move {
                let name = name.as_ref();
                (name, self.screen_entity(name, country, ctx).await)
            })
            .buffered(concurrency)
            .filter_map(|(name, outcome)| async move {
                match outcome {
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!("Batch screening dropped '{}': {}", name, e);
                        None
                    }
                }
            })
            .collect()
            .await
    }

    /// Check every enabled source concurrently
    ///
    /// Fails with one error naming every unhealthy source.
    pub async fn is_healthy(&self, ctx: &ScreeningContext) -> Result<()> {
        let sources = self.enabled_sources();
        if sources.is_empty() {
            return Err(Error::NoSourcesEnabled);
        }

        let timeout = self.source_timeout();
        let checks = sources.iter().map(|source| async move {
            let source_ctx = ctx.child().with_timeout(timeout);
            let outcome = source_ctx.run(source.health_check(&source_ctx)).await;
            (source.kind(), outcome)
        });

        let mut unhealthy = Vec::new();
        let mut details = Vec::new();
        for (kind, outcome) in futures::future::join_all(checks).await {
            if let Err(e) = outcome {
                warn!("Screening source {} unhealthy: {}", kind, e);
                unhealthy.push(kind.label().to_string());
                details.push(format!("{}: {}", kind.label(), e));
            }
        }

        if unhealthy.is_empty() {
            Ok(())
        } else {
            Err(Error::Unhealthy {
                sources: unhealthy,
                details,
            })
        }
    }

    /// Weighted risk factors for a completed screening
    pub fn export_risk_factors(&self, result: &ScreeningResult) -> Vec<RiskFactor> {
        export::export_risk_factors(result)
    }
}
