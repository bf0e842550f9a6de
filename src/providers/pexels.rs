use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::errors::{FetchError, ProviderError};
use crate::http::{get_checked, HttpTransport};
use crate::providers::traits::{StockPhoto, StockPhotoProvider};

pub const PEXELS_API_BASE: &str = "https://api.pexels.com/v1";

/// Cap for search response bodies
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    width: u32,
    height: u32,
    photographer: Option<String>,
    alt: Option<String>,
    src: PhotoSource,
}

#[derive(Debug, Deserialize)]
struct PhotoSource {
    original: Option<String>,
    large2x: Option<String>,
    large: Option<String>,
}

pub struct PexelsProvider {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    base_url: String,
    per_page: u32,
    timeout: Duration,
}

impl PexelsProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_key: impl Into<String>,
        per_page: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            base_url: PEXELS_API_BASE.to_string(),
            per_page,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, ProviderError> {
        let endpoint = format!("{}/search", self.base_url);
        let per_page = self.per_page.to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ],
        )
        .map_err(|_| ProviderError::Fetch(FetchError::InvalidUrl(endpoint)))
    }
}

impl StockPhotoProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "Pexels"
    }

    fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError> {
        let url = self.search_url(query)?;
        let headers = vec![
            ("Authorization".to_string(), self.api_key.clone()),
            (
                "User-Agent".to_string(),
                concat!("feedimage/", env!("CARGO_PKG_VERSION")).to_string(),
            ),
        ];

        let response = get_checked(
            self.transport.as_ref(),
            &url,
            headers,
            self.timeout,
            MAX_RESPONSE_BYTES,
        )?;

        let parsed: SearchResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(parsed
            .photos
            .into_iter()
            .filter_map(|photo| {
                let image_url = photo
                    .src
                    .large2x
                    .or(photo.src.large)
                    .or(photo.src.original)?;
                Some(StockPhoto {
                    id: photo.id.to_string(),
                    image_url,
                    width: photo.width,
                    height: photo.height,
                    photographer: photo.photographer,
                    alt_text: photo.alt.filter(|a| !a.is_empty()),
                    provider: "Pexels",
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::traits::MockHttpTransport;
    use crate::http::HttpResponse;

    const RESPONSE: &str = r#"{
        "page": 1,
        "per_page": 2,
        "photos": [
            {
                "id": 1001,
                "width": 4000,
                "height": 2600,
                "photographer": "Jane Doe",
                "alt": "Basketball on a court",
                "src": {
                    "original": "https://images.pexels.com/photos/1001/original.jpeg",
                    "large2x": "https://images.pexels.com/photos/1001/large2x.jpeg",
                    "large": "https://images.pexels.com/photos/1001/large.jpeg"
                }
            },
            {
                "id": 1002,
                "width": 800,
                "height": 600,
                "photographer": null,
                "alt": "",
                "src": { "large": "https://images.pexels.com/photos/1002/large.jpeg" }
            }
        ]
    }"#;

    #[test]
    fn test_search_sends_key_and_query() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|req| {
                req.url.starts_with("https://api.pexels.com/v1/search?")
                    && req.url.contains("query=Jones+Tigers+Win+Game")
                    && req.url.contains("per_page=2")
                    && req.url.contains("orientation=landscape")
                    && req.header("Authorization") == Some("pexels-key")
            })
            .times(1)
            .returning(|req| {
                Ok(HttpResponse::new(200, req.url.clone(), RESPONSE.as_bytes().to_vec())
                    .with_content_type("application/json"))
            });

        let provider = PexelsProvider::new(Arc::new(mock), "pexels-key", 2, Duration::from_secs(5));
        let photos = provider.search("Jones Tigers Win Game").unwrap();

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, "1001");
        assert_eq!(
            photos[0].image_url,
            "https://images.pexels.com/photos/1001/large2x.jpeg"
        );
        assert_eq!(photos[0].attribution(), "Photo by Jane Doe on Pexels");
        assert_eq!(photos[1].image_url, "https://images.pexels.com/photos/1002/large.jpeg");
        assert_eq!(photos[1].alt_text, None);
        assert_eq!(photos[1].attribution(), "Photo from Pexels");
    }

    #[test]
    fn test_rate_limited_response_is_fetch_error() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .returning(|req| Ok(HttpResponse::new(429, req.url.clone(), Vec::new())));

        let provider = PexelsProvider::new(Arc::new(mock), "k", 5, Duration::from_secs(5));
        let err = provider.search("tigers").unwrap_err();
        assert_eq!(err.http_status(), Some(429));
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .returning(|req| Ok(HttpResponse::new(200, req.url.clone(), b"<html>".to_vec())));

        let provider = PexelsProvider::new(Arc::new(mock), "k", 5, Duration::from_secs(5))
            .with_base_url("https://pexels.test/v1/");
        assert!(matches!(
            provider.search("tigers"),
            Err(ProviderError::Decode(_))
        ));
    }
}
