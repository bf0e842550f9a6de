use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;

use crate::errors::{FeedImageResult, TransportError};
use crate::http::traits::{HttpRequest, HttpResponse, HttpTransport};

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, max_redirects: usize) -> FeedImageResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(Policy::limited(max_redirects))
            .build()?;

        Ok(Self { client })
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_redirect() {
            TransportError::Redirect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().map_err(Self::classify)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        // Skip the body for error statuses and for declared lengths over the cap
        let mut body = Vec::new();
        let within_cap = content_length.map_or(true, |len| len <= request.max_bytes);
        if response.status().is_success() && within_cap {
            response
                .take(request.max_bytes.saturating_add(1))
                .read_to_end(&mut body)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::TimedOut => TransportError::Timeout,
                    _ => TransportError::Body(e.to_string()),
                })?;
        }

        Ok(HttpResponse {
            status,
            final_url,
            content_type,
            content_length,
            body,
        })
    }
}
