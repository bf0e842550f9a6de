use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::errors::{FetchError, ProviderError};
use crate::http::{get_checked, HttpTransport};
use crate::providers::traits::{StockPhoto, StockPhotoProvider};

pub const UNSPLASH_API_BASE: &str = "https://api.unsplash.com";

const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: String,
    width: u32,
    height: u32,
    description: Option<String>,
    alt_description: Option<String>,
    urls: PhotoUrls,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    raw: Option<String>,
    full: Option<String>,
    regular: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    name: Option<String>,
}

pub struct UnsplashProvider {
    transport: Arc<dyn HttpTransport>,
    access_key: String,
    base_url: String,
    per_page: u32,
    timeout: Duration,
}

impl UnsplashProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        access_key: impl Into<String>,
        per_page: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            access_key: access_key.into(),
            base_url: UNSPLASH_API_BASE.to_string(),
            per_page,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

impl StockPhotoProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "Unsplash"
    }

    fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError> {
        let endpoint = format!("{}/search/photos", self.base_url);
        let per_page = self.per_page.to_string();
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ],
        )
        .map_err(|_| ProviderError::Fetch(FetchError::InvalidUrl(endpoint.clone())))?;

        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Client-ID {}", self.access_key),
            ),
            ("Accept-Version".to_string(), "v1".to_string()),
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
            .results
            .into_iter()
            .filter_map(|photo| {
                let image_url = photo.urls.regular.or(photo.urls.full).or(photo.urls.raw)?;
                Some(StockPhoto {
                    id: photo.id,
                    image_url,
                    width: photo.width,
                    height: photo.height,
                    photographer: photo.user.and_then(|u| u.name),
                    alt_text: photo.alt_description.or(photo.description),
                    provider: "Unsplash",
                })
            })
            .collect())
    }
}
