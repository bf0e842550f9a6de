use image::ImageFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::StageKind;

/// Content types the fetcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageContentType {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageContentType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageContentType::Jpeg => "image/jpeg",
            ImageContentType::Png => "image/png",
            ImageContentType::Webp => "image/webp",
            ImageContentType::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageContentType::Jpeg => "jpg",
            ImageContentType::Png => "png",
            ImageContentType::Webp => "webp",
            ImageContentType::Gif => "gif",
        }
    }

    /// Parse a Content-Type header value, ignoring parameters such as charset.
    pub fn from_mime(value: &str) -> Option<Self> {
        let essence = value.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageContentType::Jpeg),
            "image/png" | "image/x-png" => Some(ImageContentType::Png),
            "image/webp" => Some(ImageContentType::Webp),
            "image/gif" => Some(ImageContentType::Gif),
            _ => None,
        }
    }

    pub fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageContentType::Jpeg),
            ImageFormat::Png => Some(ImageContentType::Png),
            ImageFormat::WebP => Some(ImageContentType::Webp),
            ImageFormat::Gif => Some(ImageContentType::Gif),
            _ => None,
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ImageContentType::Jpeg => ImageFormat::Jpeg,
            ImageContentType::Png => ImageFormat::Png,
            ImageContentType::Webp => ImageFormat::WebP,
            ImageContentType::Gif => ImageFormat::Gif,
        }
    }

    /// Detect the type from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        image::guess_format(bytes).ok().and_then(Self::from_format)
    }
}

impl std::fmt::Display for ImageContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_mime())
    }
}

/// A fetched and validated image, ready for the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub source_stage: StageKind,
    pub source_url: String,
    pub content_type: ImageContentType,
    pub width: u32,
    pub height: u32,
    pub http_status: Option<u16>,
    pub attribution: Option<String>,
}

impl ResolvedImage {
    /// Stable file name derived from the source URL.
    pub fn file_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_url.as_bytes());
        let digest = hasher.finalize();
        format!(
            "featured-image-{}.{}",
            hex::encode(&digest[..6]),
            self.content_type.extension()
        )
    }
}
