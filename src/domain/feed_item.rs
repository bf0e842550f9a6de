use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a feed advertised an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaRefKind {
    MediaContent,
    Thumbnail,
    Enclosure,
    /// A link whose declared type is `image/*`.
    Link,
    /// The first `<img>` in the entry body or summary.
    InlineImage,
}

impl MediaRefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaRefKind::MediaContent => "media-content",
            MediaRefKind::Thumbnail => "thumbnail",
            MediaRefKind::Enclosure => "enclosure",
            MediaRefKind::Link => "link",
            MediaRefKind::InlineImage => "inline-image",
        }
    }

    /// Lower ranks are tried first.
    pub fn rank(&self) -> u8 {
        match self {
            MediaRefKind::MediaContent => 0,
            MediaRefKind::Thumbnail => 1,
            MediaRefKind::Enclosure => 2,
            MediaRefKind::Link => 3,
            MediaRefKind::InlineImage => 4,
        }
    }
}

impl std::fmt::Display for MediaRefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaRefKind,
    pub url: String,
    pub declared_size: Option<u64>,
    pub mime_hint: Option<String>,
}

impl MediaRef {
    pub fn new(kind: MediaRefKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            declared_size: None,
            mime_hint: None,
        }
    }

    pub fn with_mime_hint(mut self, mime_hint: Option<String>) -> Self {
        self.mime_hint = mime_hint;
        self
    }

    pub fn with_declared_size(mut self, declared_size: Option<u64>) -> Self {
        self.declared_size = declared_size;
        self
    }

    pub fn has_image_hint(&self) -> bool {
        self.mime_hint
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    /// True when a hint is present and names something other than an image.
    pub fn has_non_image_hint(&self) -> bool {
        match self.mime_hint.as_deref().map(str::trim) {
            Some(hint) if !hint.is_empty() => !self.has_image_hint(),
            _ => false,
        }
    }
}

/// A normalized feed entry as handed over by the feed parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub url: String,
    pub title: String,
    pub link: Option<String>,
    pub raw_media_refs: Vec<MediaRef>,
    pub feed_default_image_path: Option<PathBuf>,
}

impl FeedItem {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            link: None,
            raw_media_refs: Vec::new(),
            feed_default_image_path: None,
        }
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn with_media_refs(mut self, refs: Vec<MediaRef>) -> Self {
        self.raw_media_refs = refs;
        self
    }

    pub fn with_default_image(mut self, path: Option<PathBuf>) -> Self {
        self.feed_default_image_path = path;
        self
    }
}
