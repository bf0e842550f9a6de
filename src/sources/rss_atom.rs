use std::path::PathBuf;
use std::time::Duration;

use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::{FeedItem, MediaRef, MediaRefKind};
use crate::errors::{FeedImageError, FeedImageResult};
use crate::images::UrlBlocklist;

/// Inline images whose src contains one of these are decoration.
const INLINE_SKIP_MARKERS: &[&str] = &["avatar", "blank"];

/// Fetches RSS/Atom feeds and maps entries to `FeedItem`s.
pub struct RssFeedSource {
    client: Client,
}

impl RssFeedSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(concat!("feedimage/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn fetch_items(
        &self,
        feed_url: &str,
        default_image: Option<PathBuf>,
    ) -> FeedImageResult<Vec<FeedItem>> {
        url::Url::parse(feed_url).map_err(|e| FeedImageError::InvalidUrl(e.to_string()))?;

        let response = self.client.get(feed_url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        let items = Self::items_from_bytes(&bytes, default_image)?;
        debug!(feed = feed_url, items = items.len(), "parsed feed");
        Ok(items)
    }

    pub fn items_from_bytes(
        bytes: &[u8],
        default_image: Option<PathBuf>,
    ) -> FeedImageResult<Vec<FeedItem>> {
        let parsed = parser::parse(bytes).map_err(|e| FeedImageError::FeedParse(e.to_string()))?;

        Ok(parsed
            .entries
            .into_iter()
            .map(|entry| Self::item_from_entry(entry, default_image.clone()))
            .collect())
    }

    fn item_from_entry(entry: Entry, default_image: Option<PathBuf>) -> FeedItem {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        let link = entry
            .links
            .iter()
            .find(|l| is_article_link(l))
            .map(|l| l.href.clone());

        let url = link.clone().unwrap_or_else(|| entry.id.clone());
        let media_refs = Self::media_refs(&entry, link.as_deref());

        FeedItem::new(url, title)
            .with_link(link)
            .with_media_refs(media_refs)
            .with_default_image(default_image)
    }

    /// Media RSS content and thumbnails, Atom enclosures, `image/*` links
    /// and finally the first inline `<img>` of the body or summary.
    /// feed-rs folds RSS `<enclosure>` into media content.
    fn media_refs(entry: &Entry, article_link: Option<&str>) -> Vec<MediaRef> {
        let mut refs = Vec::new();

        for object in &entry.media {
            for content in &object.content {
                if let Some(url) = &content.url {
                    refs.push(
                        MediaRef::new(MediaRefKind::MediaContent, url.as_str())
                            .with_mime_hint(content.content_type.as_ref().map(|m| m.to_string()))
                            .with_declared_size(content.size),
                    );
                }
            }
            for thumbnail in &object.thumbnails {
                refs.push(MediaRef::new(MediaRefKind::Thumbnail, thumbnail.image.uri.as_str()));
            }
        }

        for link in &entry.links {
            let kind = if link.rel.as_deref() == Some("enclosure") {
                MediaRefKind::Enclosure
            } else if is_image_link(link) {
                MediaRefKind::Link
            } else {
                continue;
            };
            refs.push(
                MediaRef::new(kind, link.href.as_str())
                    .with_mime_hint(link.media_type.clone())
                    .with_declared_size(link.length),
            );
        }

        let html = entry
            .content
            .as_ref()
            .and_then(|c| c.body.as_deref())
            .into_iter()
            .chain(entry.summary.as_ref().map(|s| s.content.as_str()));
        if let Some(src) = html.filter_map(|h| first_inline_image(h, article_link)).next() {
            refs.push(MediaRef::new(MediaRefKind::InlineImage, src));
        }

        refs
    }
}

/// The first usable `<img src>` in an HTML fragment, absolutized against
/// the article link.
fn first_inline_image(html: &str, article_link: Option<&str>) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img[src]").ok()?;
    let base = article_link.and_then(|l| Url::parse(l).ok());
    let blocklist = UrlBlocklist::standard();

    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| {
            let lower = src.to_ascii_lowercase();
            !INLINE_SKIP_MARKERS.iter().any(|m| lower.contains(m))
        })
        .filter_map(|src| match &base {
            Some(base) => base.join(src).ok(),
            None => Url::parse(src).ok(),
        })
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .find(|url| !blocklist.is_blocked(url))
        .map(String::from)
}

fn is_image_link(link: &Link) -> bool {
    link.media_type
        .as_deref()
        .map(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

fn is_article_link(link: &Link) -> bool {
    matches!(link.rel.as_deref(), None | Some("alternate")) && !is_image_link(link)
}
