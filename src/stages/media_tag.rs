use std::time::Duration;

use tracing::debug;

use crate::domain::{FeedItem, MediaRef, SkipReason, StageFailure, StageKind, StageOutcome};
use crate::http::parse_http_url;
use crate::stages::traits::{ImageStage, StageToolkit};

/// Image references embedded in the feed entry itself.
pub struct MediaTagStage {
    toolkit: StageToolkit,
    timeout: Duration,
}

impl MediaTagStage {
    pub fn new(toolkit: StageToolkit, timeout: Duration) -> Self {
        Self { toolkit, timeout }
    }

    fn is_usable(&self, media: &MediaRef) -> bool {
        if media.has_non_image_hint() {
            debug!(url = %media.url, hint = ?media.mime_hint, "skipping non-image media ref");
            return false;
        }
        if media
            .declared_size
            .map_or(false, |size| size > self.toolkit.fetcher.max_bytes())
        {
            debug!(url = %media.url, size = ?media.declared_size, "skipping oversized media ref");
            return false;
        }
        match parse_http_url(&media.url) {
            Ok(url) => match self.toolkit.blocklist.blocked_by(&url) {
                Some(rule) => {
                    debug!(url = %media.url, rule, "skipping blocked media ref");
                    false
                }
                None => true,
            },
            Err(_) => false,
        }
    }

    /// Best kind first; within that kind the first ref with an `image/*`
    /// hint, else the first ref.
    pub fn select<'a>(&self, refs: &'a [MediaRef]) -> Option<&'a MediaRef> {
        let usable: Vec<&MediaRef> = refs.iter().filter(|r| self.is_usable(r)).collect();
        let best_rank = usable.iter().map(|r| r.kind.rank()).min()?;
        let same_kind: Vec<&MediaRef> = usable
            .into_iter()
            .filter(|r| r.kind.rank() == best_rank)
            .collect();

        same_kind
            .iter()
            .find(|r| r.has_image_hint())
            .or_else(|| same_kind.first())
            .copied()
    }
}

impl ImageStage for MediaTagStage {
    fn kind(&self) -> StageKind {
        StageKind::MediaTag
    }

    fn applicable(&self, item: &FeedItem) -> Result<(), SkipReason> {
        if item.raw_media_refs.is_empty() {
            Err(SkipReason::NoMediaRefs)
        } else {
            Ok(())
        }
    }

    fn attempt(&self, item: &FeedItem) -> StageOutcome {
        let Some(chosen) = self.select(&item.raw_media_refs) else {
            return StageFailure::NoUsableMediaRef.into();
        };

        let url = chosen.url.trim();
        let profile = match parse_http_url(url) {
            Ok(parsed) => self.toolkit.hosts.lookup_url(&parsed),
            Err(e) => return StageFailure::Fetch(e).into(),
        };

        debug!(url, kind = %chosen.kind, profile = %profile.name, "fetching media ref");
        self.toolkit
            .fetch_validated(StageKind::MediaTag, url, profile, self.timeout)
    }
}
