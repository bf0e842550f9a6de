use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    FeedItem, Resolution, ResolutionReport, StageAttempt, StageKind, StageOutcome,
};
use crate::errors::FeedImageResult;
use crate::http::{HostPolicyRegistry, HttpTransport, ImageFetcher};
use crate::images::{TitleCleaner, UrlBlocklist};
use crate::providers::{
    PexelsProvider, QuotaLimitedProvider, StockPhotoProvider, UnsplashProvider,
};
use crate::stages::{
    DefaultImageStage, ImageStage, MediaTagStage, OpenGraphStage, StageToolkit, StockPhotoStage,
};

pub const TELEMETRY_TARGET: &str = "feedimage::telemetry";

/// Runs stages in order and keeps the first success.
pub struct WaterfallResolver {
    stages: Vec<Box<dyn ImageStage>>,
}

impl WaterfallResolver {
    pub fn new(stages: Vec<Box<dyn ImageStage>>) -> Self {
        Self { stages }
    }

    /// Stages in `config.stage_order`, with the registry and cleaner loaded
    /// from the configured files.
    pub fn from_config(config: &Config, transport: Arc<dyn HttpTransport>) -> FeedImageResult<Self> {
        let hosts = config.host_registry()?;
        let cleaner = config.title_cleaner()?;
        Ok(Self::with_components(config, hosts, cleaner, transport))
    }

    pub fn with_components(
        config: &Config,
        hosts: HostPolicyRegistry,
        cleaner: TitleCleaner,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let validator = config.validator();
        let toolkit = StageToolkit::new(
            ImageFetcher::new(transport.clone(), config.fetch.max_image_bytes),
            validator.clone(),
            Arc::new(hosts),
            Arc::new(UrlBlocklist::standard()),
        );

        let stages = config
            .stage_order
            .iter()
            .map(|kind| -> Box<dyn ImageStage> {
                match kind {
                    StageKind::Default => Box::new(DefaultImageStage::new(
                        config.asset_dir.clone(),
                        validator.clone(),
                    )),
                    StageKind::MediaTag => Box::new(MediaTagStage::new(
                        toolkit.clone(),
                        config.fetch.image_timeout,
                    )),
                    StageKind::OpenGraph => Box::new(OpenGraphStage::new(
                        toolkit.clone(),
                        config.fetch.page_timeout,
                        config.fetch.image_timeout,
                        config.fetch.max_page_bytes,
                    )),
                    StageKind::StockPhoto => Box::new(
                        StockPhotoStage::new(
                            stock_providers(config, &transport),
                            cleaner.clone(),
                            toolkit.clone(),
                            config.fetch.image_timeout,
                        )
                        .with_fallback_query(config.stock.fallback_query.clone())
                        .with_min_result_width(config.stock.min_result_width),
                    ),
                }
            })
            .collect();

        Self::new(stages)
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn resolve(&self, item: &FeedItem) -> Resolution {
        self.resolve_with_report(item).resolution
    }

    /// Resolve `item` and keep a record of every stage consulted. Emits one
    /// telemetry event per stage.
    pub fn resolve_with_report(&self, item: &FeedItem) -> ResolutionReport {
        let mut attempts = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let started = Instant::now();
            let outcome = match stage.applicable(item) {
                Ok(()) => stage.attempt(item),
                Err(reason) => StageOutcome::Skipped(reason),
            };
            let elapsed = started.elapsed();

            let attempt = StageAttempt {
                stage: stage.kind(),
                outcome: outcome.label(),
                elapsed,
                http_status: outcome.http_status(),
                reason: outcome.reason(),
            };
            info!(
                target: TELEMETRY_TARGET,
                item = %item.url,
                stage = %attempt.stage,
                outcome = attempt.outcome,
                elapsed_ms = elapsed.as_millis() as u64,
                http_status = ?attempt.http_status,
                reason = ?attempt.reason,
                "stage attempt"
            );
            attempts.push(attempt);

            if let StageOutcome::Success(image) = outcome {
                debug!(item = %item.url, source = %image.source_url, "image resolved");
                return ResolutionReport {
                    item_url: item.url.clone(),
                    resolution: Resolution::Found(image),
                    attempts,
                };
            }
        }

        debug!(item = %item.url, "no image found");
        ResolutionReport {
            item_url: item.url.clone(),
            resolution: Resolution::NotFound,
            attempts,
        }
    }
}

/// Pexels first, then Unsplash, each behind its hourly budget.
fn stock_providers(config: &Config, transport: &Arc<dyn HttpTransport>) -> Vec<QuotaLimitedProvider> {
    let stock = &config.stock;
    if !stock.has_credentials() {
        debug!("no stock photo credentials configured");
        return Vec::new();
    }
    let timeout = config.fetch.api_timeout;
    let mut providers = Vec::new();

    if let Some(key) = &stock.pexels_api_key {
        let provider = Box::new(PexelsProvider::new(
            transport.clone(),
            key.clone(),
            stock.results_per_query,
            timeout,
        ));
        providers.push(limited(provider, stock.pexels_hourly_quota));
    }
    if let Some(key) = &stock.unsplash_access_key {
        let provider = Box::new(UnsplashProvider::new(
            transport.clone(),
            key.clone(),
            stock.results_per_query,
            timeout,
        ));
        providers.push(limited(provider, stock.unsplash_hourly_quota));
    }

    providers
}

fn limited(provider: Box<dyn StockPhotoProvider>, hourly_quota: u32) -> QuotaLimitedProvider {
    match NonZeroU32::new(hourly_quota) {
        Some(quota) => QuotaLimitedProvider::hourly(provider, quota),
        None => QuotaLimitedProvider::unlimited(provider),
    }
}
