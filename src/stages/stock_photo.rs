use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{FeedItem, SkipReason, StageFailure, StageKind, StageOutcome};
use crate::images::TitleCleaner;
use crate::providers::{QuotaLimitedProvider, StockPhoto};
use crate::stages::traits::{ImageStage, StageToolkit};

pub const DEFAULT_FALLBACK_QUERY: &str = "college sports athletics";

/// Last resort: search stock photo providers with the cleaned title.
pub struct StockPhotoStage {
    providers: Vec<QuotaLimitedProvider>,
    cleaner: TitleCleaner,
    fallback_query: String,
    min_result_width: Option<u32>,
    toolkit: StageToolkit,
    image_timeout: Duration,
}

impl StockPhotoStage {
    /// `providers` are queried in the order given.
    pub fn new(
        providers: Vec<QuotaLimitedProvider>,
        cleaner: TitleCleaner,
        toolkit: StageToolkit,
        image_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cleaner,
            fallback_query: DEFAULT_FALLBACK_QUERY.to_string(),
            min_result_width: None,
            toolkit,
            image_timeout,
        }
    }

    pub fn with_fallback_query(mut self, query: impl Into<String>) -> Self {
        self.fallback_query = query.into();
        self
    }

    pub fn with_min_result_width(mut self, width: Option<u32>) -> Self {
        self.min_result_width = width;
        self
    }

    pub fn query_for(&self, title: &str) -> String {
        let cleaned = self.cleaner.clean(title);
        if cleaned.is_empty() {
            self.fallback_query.clone()
        } else {
            cleaned
        }
    }

    /// First hit in provider order, optionally gated on width.
    fn pick<'a>(&self, photos: &'a [StockPhoto]) -> Option<&'a StockPhoto> {
        photos.iter().find(|photo| {
            !photo.image_url.trim().is_empty()
                && self.min_result_width.map_or(true, |min| photo.width >= min)
        })
    }
}

impl ImageStage for StockPhotoStage {
    fn kind(&self) -> StageKind {
        StageKind::StockPhoto
    }

    fn applicable(&self, _item: &FeedItem) -> Result<(), SkipReason> {
        if self.providers.is_empty() {
            Err(SkipReason::NoStockCredentials)
        } else {
            Ok(())
        }
    }

    fn attempt(&self, item: &FeedItem) -> StageOutcome {
        let query = self.query_for(&item.title);
        let mut queried = false;
        let mut last_error = None;

        for slot in &self.providers {
            if !slot.try_acquire() {
                warn!(provider = slot.name(), "stock photo quota exhausted");
                continue;
            }
            queried = true;

            let photos = match slot.provider().search(&query) {
                Ok(photos) => photos,
                Err(error) => {
                    debug!(provider = slot.name(), %error, "stock search failed");
                    last_error = Some(StageFailure::Provider {
                        provider: slot.name(),
                        error,
                    });
                    continue;
                }
            };

            let Some(photo) = self.pick(&photos) else {
                debug!(provider = slot.name(), query = %query, "no stock results");
                continue;
            };

            debug!(provider = slot.name(), id = %photo.id, "selected stock photo");
            return match self.toolkit.fetch_validated(
                StageKind::StockPhoto,
                photo.image_url.trim(),
                self.toolkit.hosts.default_profile(),
                self.image_timeout,
            ) {
                StageOutcome::Success(mut image) => {
                    image.attribution = Some(photo.attribution());
                    StageOutcome::Success(image)
                }
                other => other,
            };
        }

        if !queried {
            return StageOutcome::Skipped(SkipReason::QuotaExhausted);
        }
        last_error
            .unwrap_or(StageFailure::NoStockResults(query))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use super::*;
    use crate::errors::{FetchError, ProviderError};
    use crate::http::traits::MockHttpTransport;
    use crate::http::{HostPolicyRegistry, HttpResponse, ImageFetcher};
    use crate::images::{ImageValidator, UrlBlocklist};
    use crate::providers::traits::MockStockPhotoProvider;
    use crate::test_support::jpeg_bytes;

    fn toolkit(mock: MockHttpTransport) -> StageToolkit {
        StageToolkit::new(
            ImageFetcher::new(Arc::new(mock), 5 * 1024 * 1024),
            ImageValidator::default(),
            Arc::new(HostPolicyRegistry::builtin()),
            Arc::new(UrlBlocklist::standard()),
        )
    }

    fn photo(provider: &'static str, url: &str, width: u32) -> StockPhoto {
        StockPhoto {
            id: "42".to_string(),
            image_url: url.to_string(),
            width,
            height: 800,
            photographer: Some("Ana Ruiz".to_string()),
            alt_text: None,
            provider,
        }
    }

    fn provider(name: &'static str) -> MockStockPhotoProvider {
        let mut mock = MockStockPhotoProvider::new();
        mock.expect_name().return_const(name);
        mock
    }

    fn stage(providers: Vec<QuotaLimitedProvider>, transport: MockHttpTransport) -> StockPhotoStage {
        StockPhotoStage::new(
            providers,
            TitleCleaner::standard().unwrap(),
            toolkit(transport),
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_skipped_without_providers() {
        let stage = stage(Vec::new(), MockHttpTransport::new());
        assert_eq!(
            stage.applicable(&FeedItem::new("u", "Anything")),
            Err(SkipReason::NoStockCredentials)
        );
    }

    #[test]
    fn test_query_uses_cleaned_title_or_fallback() {
        let stage = stage(Vec::new(), MockHttpTransport::new()).with_fallback_query("stadium");
        assert_eq!(
            stage.query_for("Jones Tigers Win Men's Basketball Game"),
            "Jones Tigers Win Game"
        );
        assert_eq!(stage.query_for("Box Score"), "stadium");
    }

    #[test]
    fn test_first_result_fetched_with_attribution() {
        let jpeg = jpeg_bytes(640, 480);
        let mut pexels = provider("Pexels");
        pexels
            .expect_search()
            .withf(|q| q == "Jones Tigers Win Game")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    photo("Pexels", "https://images.pexels.example/1.jpg", 1200),
                    photo("Pexels", "https://images.pexels.example/2.jpg", 1200),
                ])
            });
        let mut unsplash = provider("Unsplash");
        unsplash.expect_search().never();

        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|req| req.url == "https://images.pexels.example/1.jpg")
            .times(1)
            .returning(move |req| {
                Ok(HttpResponse::new(200, req.url.clone(), jpeg.clone())
                    .with_content_type("image/jpeg"))
            });

        let stage = stage(
            vec![
                QuotaLimitedProvider::unlimited(Box::new(pexels)),
                QuotaLimitedProvider::unlimited(Box::new(unsplash)),
            ],
            transport,
        );

        match stage.attempt(&FeedItem::new("u", "Jones Tigers Win Men's Basketball Game")) {
            StageOutcome::Success(image) => {
                assert_eq!(image.source_stage, StageKind::StockPhoto);
                assert_eq!(image.attribution.as_deref(), Some("Photo by Ana Ruiz on Pexels"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_secondary_used_when_primary_empty() {
        let jpeg = jpeg_bytes(640, 480);
        let mut pexels = provider("Pexels");
        pexels.expect_search().times(1).returning(|_| Ok(Vec::new()));
        let mut unsplash = provider("Unsplash");
        unsplash
            .expect_search()
            .times(1)
            .returning(|_| Ok(vec![photo("Unsplash", "https://images.unsplash.example/a.jpg", 1080)]));

        let mut transport = MockHttpTransport::new();
        transport.expect_get().times(1).returning(move |req| {
            Ok(HttpResponse::new(200, req.url.clone(), jpeg.clone()).with_content_type("image/jpeg"))
        });

        let stage = stage(
            vec![
                QuotaLimitedProvider::unlimited(Box::new(pexels)),
                QuotaLimitedProvider::unlimited(Box::new(unsplash)),
            ],
            transport,
        );

        let outcome = stage.attempt(&FeedItem::new("u", "Volleyball sweeps rival"));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_min_width_filters_results() {
        let mut pexels = provider("Pexels");
        pexels
            .expect_search()
            .times(1)
            .returning(|_| Ok(vec![photo("Pexels", "https://images.pexels.example/1.jpg", 300)]));

        let mut transport = MockHttpTransport::new();
        transport.expect_get().never();

        let stage = stage(
            vec![QuotaLimitedProvider::unlimited(Box::new(pexels))],
            transport,
        )
        .with_min_result_width(Some(1000));

        assert!(matches!(
            stage.attempt(&FeedItem::new("u", "Soccer wins")),
            StageOutcome::Failed(StageFailure::NoStockResults(_))
        ));
    }

    #[test]
    fn test_provider_error_reported_when_no_result() {
        let mut pexels = provider("Pexels");
        pexels
            .expect_search()
            .times(1)
            .returning(|_| Err(ProviderError::Fetch(FetchError::Status(401))));

        let stage = stage(
            vec![QuotaLimitedProvider::unlimited(Box::new(pexels))],
            MockHttpTransport::new(),
        );

        let outcome = stage.attempt(&FeedItem::new("u", "Soccer wins"));
        assert_eq!(outcome.http_status(), Some(401));
        assert!(matches!(
            outcome,
            StageOutcome::Failed(StageFailure::Provider { provider: "Pexels", .. })
        ));
    }

    #[test]
    fn test_exhausted_quota_skips_without_search() {
        let mut pexels = provider("Pexels");
        pexels.expect_search().times(1).returning(|_| Ok(Vec::new()));

        let stage = stage(
            vec![QuotaLimitedProvider::hourly(
                Box::new(pexels),
                NonZeroU32::new(1).unwrap(),
            )],
            MockHttpTransport::new(),
        );

        let item = FeedItem::new("u", "Soccer wins");
        assert!(matches!(
            stage.attempt(&item),
            StageOutcome::Failed(StageFailure::NoStockResults(_))
        ));
        assert_eq!(
            stage.attempt(&item),
            StageOutcome::Skipped(SkipReason::QuotaExhausted)
        );
    }
}
