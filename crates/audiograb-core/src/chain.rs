//! Ordered fallback over media sources.
//!
//! The chain replaces the original hand-nested per-stage recovery blocks with
//! a state machine over an ordered adapter list: strictly forward on failure,
//! terminal on first usable success or after the last stage fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::adapters::{ConverterAdapter, DirectAdapter, InnertubeAdapter, YtdlpAdapter};
use crate::media_source::{AudioPayload, FetchRequest, MediaSource, SourceError};
use crate::{FetchConfig, ProviderId};

/// One failed stage, recorded in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub message: String,
}

impl ProviderFailure {
    fn from_error(provider: ProviderId, error: &SourceError) -> Self {
        Self {
            provider,
            message: error.message().to_owned(),
        }
    }
}

/// Successful chain run.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub payload: AudioPayload,
    pub selected_source: ProviderId,
    /// Sources attempted, selected one included, in order.
    pub source_chain: Vec<ProviderId>,
    /// Failures of the stages tried before the selected one.
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

/// Chain run that exhausted every stage.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub source_chain: Vec<ProviderId>,
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

impl FetchFailure {
    /// Human-readable message aggregating every stage's failure in the order
    /// it was attempted.
    pub fn consolidated_message(&self) -> String {
        let stages = self
            .failures
            .iter()
            .map(|failure| format!("{} failed: {}", failure.provider, failure.message))
            .collect::<Vec<_>>()
            .join("; ");
        format!("all sources failed: {stages}")
    }
}

pub type FetchOutcome = Result<FetchSuccess, FetchFailure>;

/// Fixed-priority fallback chain.
///
/// Order is significant: the cheapest source runs first, the subprocess-based
/// one last. Stages never run speculatively or in parallel, so worst-case
/// latency is the sum of only the attempted stages.
pub struct FallbackChain {
    sources: Vec<Arc<dyn MediaSource>>,
    stage_timeout: Duration,
}

impl FallbackChain {
    pub fn new(sources: Vec<Arc<dyn MediaSource>>, stage_timeout: Duration) -> Self {
        Self {
            sources,
            stage_timeout,
        }
    }

    /// Standard production chain: innertube, direct, converter, ytdlp.
    pub fn standard(config: &FetchConfig) -> Self {
        Self::new(
            vec![
                Arc::new(InnertubeAdapter::new(config)),
                Arc::new(DirectAdapter::new(config)),
                Arc::new(ConverterAdapter::new(config)),
                Arc::new(YtdlpAdapter::new(config)),
            ],
            config.source_timeout,
        )
    }

    pub fn planned_sources(&self) -> Vec<ProviderId> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    /// Runs the chain to the first usable payload.
    ///
    /// Each stage's error is caught, recorded, and the chain advances; only
    /// exhaustion of every stage produces a [`FetchFailure`]. A stage that
    /// overruns the timeout or returns an empty payload counts as failed.
    pub async fn run(&self, req: &FetchRequest) -> FetchOutcome {
        let started = Instant::now();
        let mut source_chain = Vec::with_capacity(self.sources.len());
        let mut failures = Vec::new();

        for source in &self.sources {
            let provider = source.id();
            source_chain.push(provider);
            log::info!("[{}] trying source '{provider}'", req.request_id);

            let result = match tokio::time::timeout(self.stage_timeout, source.fetch(req)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::timeout(self.stage_timeout)),
            };

            let error = match result {
                Ok(payload) if payload.is_empty() => SourceError::empty_payload(),
                Ok(payload) => {
                    log::info!(
                        "[{}] source '{provider}' succeeded with {} bytes ({})",
                        req.request_id,
                        payload.len(),
                        payload.media_type,
                    );
                    return Ok(FetchSuccess {
                        payload,
                        selected_source: provider,
                        source_chain,
                        failures,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => error,
            };

            log::warn!("[{}] source '{provider}' failed: {error}", req.request_id);
            failures.push(ProviderFailure::from_error(provider, &error));
        }

        Err(FetchFailure {
            source_chain,
            failures,
            latency_ms: elapsed_ms(started),
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
