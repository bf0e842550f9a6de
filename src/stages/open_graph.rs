use std::time::Duration;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::{FeedItem, SkipReason, StageFailure, StageKind, StageOutcome};
use crate::http::{get_checked, parse_http_url};
use crate::stages::traits::{ImageStage, StageToolkit};

const OG_IMAGE_SELECTOR: &str = r#"meta[property="og:image"], meta[name="og:image"]"#;

/// Find the Open Graph image of a page and resolve it against `base`.
pub fn extract_og_image(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(OG_IMAGE_SELECTOR).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .filter_map(|content| base.join(content).ok())
        .find(|url| matches!(url.scheme(), "http" | "https"))
}

/// Scrapes the article page for its `og:image`. Two round trips.
pub struct OpenGraphStage {
    toolkit: StageToolkit,
    page_timeout: Duration,
    image_timeout: Duration,
    max_page_bytes: u64,
}

impl OpenGraphStage {
    pub fn new(
        toolkit: StageToolkit,
        page_timeout: Duration,
        image_timeout: Duration,
        max_page_bytes: u64,
    ) -> Self {
        Self {
            toolkit,
            page_timeout,
            image_timeout,
            max_page_bytes,
        }
    }
}

impl ImageStage for OpenGraphStage {
    fn kind(&self) -> StageKind {
        StageKind::OpenGraph
    }

    fn applicable(&self, item: &FeedItem) -> Result<(), SkipReason> {
        match item.link.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => Ok(()),
            _ => Err(SkipReason::NoLink),
        }
    }

    fn attempt(&self, item: &FeedItem) -> StageOutcome {
        let link = item.link.as_deref().unwrap_or_default();
        let page_url = match parse_http_url(link) {
            Ok(url) => url,
            Err(e) => return StageFailure::Fetch(e).into(),
        };

        let page_profile = self.toolkit.hosts.lookup_url(&page_url);
        let page = match get_checked(
            self.toolkit.fetcher.transport(),
            &page_url,
            page_profile.headers_for(&page_url),
            self.page_timeout,
            self.max_page_bytes,
        ) {
            Ok(page) => page,
            Err(e) => return StageFailure::Fetch(e).into(),
        };

        let base = Url::parse(&page.final_url).unwrap_or(page_url);
        let html = String::from_utf8_lossy(&page.body);
        let Some(image_url) = extract_og_image(&html, &base) else {
            return StageFailure::NoOpenGraphImage.into();
        };

        if let Some(rule) = self.toolkit.blocklist.blocked_by(&image_url) {
            debug!(url = %image_url, rule, "og:image is blocked");
            return StageFailure::BlockedUrl(image_url.to_string()).into();
        }

        let image_profile = self.toolkit.hosts.lookup_url(&image_url);
        self.toolkit.fetch_validated(
            StageKind::OpenGraph,
            image_url.as_str(),
            image_profile,
            self.image_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::errors::FetchError;
    use crate::http::traits::MockHttpTransport;
    use crate::http::{HostPolicyRegistry, HttpResponse, ImageFetcher};
    use crate::images::{ImageValidator, UrlBlocklist};
    use crate::test_support::png_bytes;

    fn stage(mock: MockHttpTransport) -> OpenGraphStage {
        let toolkit = StageToolkit::new(
            ImageFetcher::new(Arc::new(mock), 5 * 1024 * 1024),
            ImageValidator::default(),
            Arc::new(HostPolicyRegistry::builtin()),
            Arc::new(UrlBlocklist::standard()),
        );
        OpenGraphStage::new(
            toolkit,
            Duration::from_secs(30),
            Duration::from_secs(20),
            2 * 1024 * 1024,
        )
    }

    fn html_with(meta: &str) -> String {
        format!(
            "<html><head><title>Story</title>{}</head><body><p>Body</p></body></html>",
            meta
        )
    }

    #[test]
    fn test_extract_absolute_og_image() {
        let base = Url::parse("https://news.example/story").unwrap();
        let html = html_with(r#"<meta property="og:image" content="https://site.example/pic.png">"#);
        assert_eq!(
            extract_og_image(&html, &base).unwrap().as_str(),
            "https://site.example/pic.png"
        );
    }

    #[test]
    fn test_extract_relative_og_image() {
        let base = Url::parse("https://news.example/2024/story.html").unwrap();
        let html = html_with(r#"<meta name="og:image" content=" /images/hero.jpg ">"#);
        assert_eq!(
            extract_og_image(&html, &base).unwrap().as_str(),
            "https://news.example/images/hero.jpg"
        );
    }

    #[test]
    fn test_extract_ignores_empty_and_twitter_tags() {
        let base = Url::parse("https://news.example/").unwrap();
        let html = html_with(
            r#"<meta property="og:image" content=""><meta name="twitter:image" content="https://news.example/t.jpg">"#,
        );
        assert_eq!(extract_og_image(&html, &base), None);
    }

    #[test]
    fn test_skipped_without_link() {
        let stage = stage(MockHttpTransport::new());
        assert_eq!(
            stage.applicable(&FeedItem::new("u", "t")),
            Err(SkipReason::NoLink)
        );
        assert_eq!(
            stage.applicable(&FeedItem::new("u", "t").with_link(Some("  ".to_string()))),
            Err(SkipReason::NoLink)
        );
    }

    #[test]
    fn test_page_without_og_image_fails() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get().times(1).returning(|req| {
            Ok(HttpResponse::new(200, req.url.clone(), html_with("").into_bytes())
                .with_content_type("text/html"))
        });

        let stage = stage(mock);
        let item = FeedItem::new("u", "t").with_link(Some("https://news.example/a".to_string()));
        let outcome = stage.attempt(&item);

        assert_eq!(outcome, StageOutcome::Failed(StageFailure::NoOpenGraphImage));
        assert_eq!(outcome.reason().as_deref(), Some("no og:image"));
    }

    #[test]
    fn test_relative_og_image_resolved_against_final_url() {
        let png = png_bytes(300, 200);
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|req| req.url == "https://news.example/a" && req.max_bytes == 2 * 1024 * 1024)
            .times(1)
            .returning(|_| {
                let html = html_with(r#"<meta property="og:image" content="img/hero.png">"#);
                Ok(HttpResponse::new(200, "https://www.news.example/2024/a/", html.into_bytes()))
            });
        mock.expect_get()
            .withf(|req| req.url == "https://www.news.example/2024/a/img/hero.png")
            .times(1)
            .returning(move |req| {
                Ok(HttpResponse::new(200, req.url.clone(), png.clone()).with_content_type("image/png"))
            });

        let stage = stage(mock);
        let item = FeedItem::new("u", "t").with_link(Some("https://news.example/a".to_string()));

        match stage.attempt(&item) {
            StageOutcome::Success(image) => {
                assert_eq!(image.source_stage, StageKind::OpenGraph);
                assert_eq!(image.source_url, "https://www.news.example/2024/a/img/hero.png");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_blocked_og_image_not_fetched() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get().times(1).returning(|req| {
            let html = html_with(
                r#"<meta property="og:image" content="https://www.facebook.com/tr/pic.jpg">"#,
            );
            Ok(HttpResponse::new(200, req.url.clone(), html.into_bytes()))
        });

        let stage = stage(mock);
        let item = FeedItem::new("u", "t").with_link(Some("https://news.example/a".to_string()));
        assert!(matches!(
            stage.attempt(&item),
            StageOutcome::Failed(StageFailure::BlockedUrl(_))
        ));
    }

    #[test]
    fn test_page_error_is_failed_with_status() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .times(1)
            .returning(|req| Ok(HttpResponse::new(503, req.url.clone(), Vec::new())));

        let stage = stage(mock);
        let item = FeedItem::new("u", "t").with_link(Some("https://news.example/a".to_string()));
        let outcome = stage.attempt(&item);
        assert_eq!(
            outcome,
            StageOutcome::Failed(StageFailure::Fetch(FetchError::Status(503)))
        );
        assert_eq!(outcome.http_status(), Some(503));
    }
}
