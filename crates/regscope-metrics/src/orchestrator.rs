use crate::complexity::ComplexityAggregator;
use crate::history::HistoricalSeriesBuilder;
use crate::sampling::{Measured, SampleContext};
use crate::synthetic::SyntheticGenerator;
use crate::word_count::WordCountAggregator;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use regscope_core::{
    AgencyWordCount, AggregateSummary, ComplexityScore, DateRange, RegScopeConfig, Result,
};
use regscope_gateway::{EcfrGateway, SourceGateway};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type AgencyMeasurement = (usize, Measured<AgencyWordCount>, Measured<ComplexityScore>);

/// Builds the aggregate summary from live sources, substituting synthetic
/// values at the finest granularity that failed.
///
/// Never returns an error: total upstream failure yields a fully synthetic,
/// `degraded` summary.
pub struct AggregateOrchestrator {
    gateway: Arc<dyn SourceGateway>,
    word_counts: WordCountAggregator,
    complexity: ComplexityAggregator,
    history: HistoricalSeriesBuilder,
    synthetic: SyntheticGenerator,
    rng: Mutex<fastrand::Rng>,
    limiter: Semaphore,
    max_concurrent_agencies: usize,
    trailing_years: u32,
}

impl AggregateOrchestrator {
    pub fn new(gateway: Arc<dyn SourceGateway>, config: &RegScopeConfig) -> Self {
        let sampling = &config.sampling;
        Self {
            gateway,
            word_counts: WordCountAggregator::new(sampling.word_count_titles),
            complexity: ComplexityAggregator::new(sampling.complexity_titles),
            history: HistoricalSeriesBuilder::new(config.history.clone()),
            synthetic: SyntheticGenerator::new(config.history.clone()),
            rng: Mutex::new(fastrand::Rng::new()),
            limiter: Semaphore::new(sampling.max_concurrent_requests.max(1)),
            max_concurrent_agencies: sampling.max_concurrent_agencies.max(1),
            trailing_years: config.history.trailing_years,
        }
    }

    /// Orchestrator backed by the live eCFR service.
    pub fn from_config(config: &RegScopeConfig) -> Result<Self> {
        let gateway = EcfrGateway::new(config.gateway.clone())?;
        Ok(Self::new(Arc::new(gateway), config))
    }

    /// Seed every random draw, for reproducible summaries.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(fastrand::Rng::with_seed(seed));
        self.synthetic = SyntheticGenerator::with_seed(
            self.history.config().clone(),
            seed.wrapping_add(1),
        );
        self
    }

    pub fn gateway(&self) -> &Arc<dyn SourceGateway> {
        &self.gateway
    }

    /// Summary over the configured trailing window ending today.
    pub async fn build_summary(&self) -> AggregateSummary {
        let range = DateRange::trailing_years(today(), self.trailing_years);
        self.build_summary_for(range).await
    }

    pub async fn build_summary_for(&self, range: DateRange) -> AggregateSummary {
        let gateway = self.gateway.as_ref();
        let (agencies, titles) =
            match tokio::try_join!(gateway.list_agencies(), gateway.list_titles()) {
                Ok(lists) => lists,
                Err(e) => {
                    warn!(
                        gateway = gateway.gateway_name(),
                        "Top-level fetch failed, using synthetic summary: {}", e
                    );
                    return self.synthetic.summary(&range);
                }
            };

        if agencies.is_empty() {
            info!("No agencies returned, using synthetic summary");
            return self.synthetic.summary(&range);
        }

        let (historical_changes, history_synthetic) = if titles.is_empty() {
            debug!("No titles returned, using synthetic history");
            (self.synthetic.history(&range), true)
        } else {
            let mut rng = self.rng.lock();
            (self.history.build(&titles, &range, &mut rng), false)
        };

        let ctx = SampleContext::new(gateway, &self.limiter, today());
        let ctx = &ctx;
        let titles = titles.as_slice();

        let mut measured: Vec<AgencyMeasurement> = stream::iter(agencies.iter().enumerate())
            .map(|(index, agency)| async move {
                let name = agency.name.as_str();
                let (words, complexity) = tokio::join!(
                    self.word_counts.measure(ctx, name, titles, &self.synthetic),
                    self.complexity.measure(ctx, name, titles, &self.synthetic),
                );
                (index, words, complexity)
            })
            .buffer_unordered(self.max_concurrent_agencies)
            .collect()
            .await;
        measured.sort_by_key(|(index, ..)| *index);

        let mut degraded = history_synthetic;
        let mut word_counts = Vec::with_capacity(measured.len());
        let mut complexity_scores = Vec::with_capacity(measured.len());
        let mut substituted = 0usize;
        for (_, words, complexity) in measured {
            if words.synthetic || complexity.synthetic {
                substituted += 1;
                degraded = true;
            }
            word_counts.push(words.value);
            complexity_scores.push(complexity.value);
        }

        let summary =
            AggregateSummary::assemble(word_counts, historical_changes, complexity_scores, degraded);
        info!(
            agencies = summary.total_agencies,
            words = summary.total_words,
            regulations = summary.total_regulations,
            substituted,
            "Built aggregate summary"
        );
        summary
    }

    /// Like [`build_summary_for`](Self::build_summary_for), but yields `None`
    /// once `token` is cancelled. In-flight agency work is dropped.
    pub async fn build_summary_cancellable(
        &self,
        range: DateRange,
        token: CancellationToken,
    ) -> Option<AggregateSummary> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Summary build cancelled");
                None
            }
            summary = self.build_summary_for(range) => Some(summary),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
