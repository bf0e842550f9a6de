use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    FeedItem, ResolvedImage, SkipReason, StageFailure, StageKind, StageOutcome,
};
use crate::http::{HeaderProfile, HostPolicyRegistry, ImageFetcher};
use crate::images::{ImageValidator, UrlBlocklist};

/// One strategy for acquiring an image.
pub trait ImageStage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Cheap check that never touches the network.
    fn applicable(&self, item: &FeedItem) -> Result<(), SkipReason>;

    /// Single-shot attempt. Only called when `applicable` succeeded.
    fn attempt(&self, item: &FeedItem) -> StageOutcome;
}

/// Collaborators shared by the network stages.
#[derive(Clone)]
pub struct StageToolkit {
    pub fetcher: ImageFetcher,
    pub validator: ImageValidator,
    pub hosts: Arc<HostPolicyRegistry>,
    pub blocklist: Arc<UrlBlocklist>,
}

impl StageToolkit {
    pub fn new(
        fetcher: ImageFetcher,
        validator: ImageValidator,
        hosts: Arc<HostPolicyRegistry>,
        blocklist: Arc<UrlBlocklist>,
    ) -> Self {
        Self {
            fetcher,
            validator,
            hosts,
            blocklist,
        }
    }

    /// Fetch `url` with `profile` and validate the bytes.
    pub fn fetch_validated(
        &self,
        stage: StageKind,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> StageOutcome {
        let fetched = match self.fetcher.fetch(url, profile, timeout) {
            Ok(fetched) => fetched,
            Err(e) => return StageFailure::Fetch(e).into(),
        };

        match self.validator.validate(&fetched.bytes, fetched.content_type) {
            Ok(dims) => StageOutcome::Success(ResolvedImage {
                bytes: fetched.bytes,
                source_stage: stage,
                source_url: fetched.url,
                content_type: fetched.content_type,
                width: dims.width,
                height: dims.height,
                http_status: Some(fetched.status),
                attribution: None,
            }),
            Err(e) => StageFailure::Validation(e).into(),
        }
    }
}
