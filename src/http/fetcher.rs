use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::domain::ImageContentType;
use crate::errors::FetchError;
use crate::http::host_policy::HeaderProfile;
use crate::http::traits::{HttpRequest, HttpResponse, HttpTransport};

/// Parse `raw` and require an http(s) scheme.
pub fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(FetchError::InvalidUrl(raw.to_string())),
    }
}

/// One GET with the status and size checks every network call shares.
pub fn get_checked(
    transport: &dyn HttpTransport,
    url: &Url,
    headers: Vec<(String, String)>,
    timeout: Duration,
    max_bytes: u64,
) -> Result<HttpResponse, FetchError> {
    let request = HttpRequest::new(url.as_str(), timeout, max_bytes).with_headers(headers);
    let response = transport.get(&request)?;

    debug!(url = %url, status = response.status, "GET");

    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    let declared_too_large = response.content_length.map_or(false, |len| len > max_bytes);
    if declared_too_large || response.body.len() as u64 > max_bytes {
        return Err(FetchError::TooLarge { limit: max_bytes });
    }

    Ok(response)
}

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: ImageContentType,
    pub status: u16,
}

/// Bounded image download restricted to jpeg/png/webp/gif.
#[derive(Clone)]
pub struct ImageFetcher {
    transport: Arc<dyn HttpTransport>,
    max_bytes: u64,
}

impl ImageFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, max_bytes: u64) -> Self {
        Self {
            transport,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub fn fetch(
        &self,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> Result<FetchedImage, FetchError> {
        let parsed = parse_http_url(url)?;
        let response = get_checked(
            self.transport.as_ref(),
            &parsed,
            profile.headers_for(&parsed),
            timeout,
            self.max_bytes,
        )?;

        let content_type = Self::content_type_of(&response)?;

        Ok(FetchedImage {
            url: url.to_string(),
            bytes: response.body,
            content_type,
            status: response.status,
        })
    }

    /// Use the declared type when it is allowed. Missing or generic binary
    /// types fall back to the magic bytes.
    fn content_type_of(response: &HttpResponse) -> Result<ImageContentType, FetchError> {
        let declared = response
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty());

        match declared {
            Some(ct) => {
                if let Some(allowed) = ImageContentType::from_mime(ct) {
                    return Ok(allowed);
                }
                let essence = ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase();
                let generic = matches!(
                    essence.as_str(),
                    "application/octet-stream" | "binary/octet-stream"
                );
                if !generic {
                    return Err(FetchError::DisallowedContentType(ct.to_string()));
                }
                ImageContentType::sniff(&response.body)
                    .ok_or_else(|| FetchError::DisallowedContentType(ct.to_string()))
            }
            None => ImageContentType::sniff(&response.body)
                .ok_or_else(|| FetchError::DisallowedContentType("unknown".to_string())),
        }
    }
}
