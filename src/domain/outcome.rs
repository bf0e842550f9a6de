use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ResolvedImage;
use crate::errors::{FetchError, ProviderError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Default,
    MediaTag,
    OpenGraph,
    StockPhoto,
}

impl StageKind {
    pub const STANDARD_ORDER: [StageKind; 4] = [
        StageKind::Default,
        StageKind::MediaTag,
        StageKind::OpenGraph,
        StageKind::StockPhoto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Default => "default",
            StageKind::MediaTag => "media_tag",
            StageKind::OpenGraph => "open_graph",
            StageKind::StockPhoto => "stock_photo",
        }
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(StageKind::Default),
            "media_tag" | "media" => Ok(StageKind::MediaTag),
            "open_graph" | "og" => Ok(StageKind::OpenGraph),
            "stock_photo" | "stock" => Ok(StageKind::StockPhoto),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a stage did not apply. No network call was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no default image configured")]
    NoDefaultImage,

    #[error("default image {0} is missing")]
    DefaultAssetMissing(PathBuf),

    #[error("no media references")]
    NoMediaRefs,

    #[error("no article link")]
    NoLink,

    #[error("no stock photo credentials")]
    NoStockCredentials,

    #[error("stock photo quota exhausted")]
    QuotaExhausted,
}

/// Why an attempted stage did not produce a valid image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("reading {path} failed: {message}")]
    Asset { path: PathBuf, message: String },

    #[error("no usable media reference")]
    NoUsableMediaRef,

    #[error("no og:image")]
    NoOpenGraphImage,

    #[error("blocked image url {0}")]
    BlockedUrl(String),

    #[error("stock provider {provider} failed: {error}")]
    Provider {
        provider: &'static str,
        error: ProviderError,
    },

    #[error("no stock results for \"{0}\"")]
    NoStockResults(String),
}

impl StageFailure {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StageFailure::Fetch(e) => e.http_status(),
            StageFailure::Provider { error, .. } => error.http_status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success(ResolvedImage),
    Skipped(SkipReason),
    Failed(StageFailure),
}

impl StageOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Success(_) => "success",
            StageOutcome::Skipped(_) => "skipped",
            StageOutcome::Failed(_) => "failed",
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            StageOutcome::Success(image) => image.http_status,
            StageOutcome::Skipped(_) => None,
            StageOutcome::Failed(failure) => failure.http_status(),
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            StageOutcome::Success(_) => None,
            StageOutcome::Skipped(reason) => Some(reason.to_string()),
            StageOutcome::Failed(failure) => Some(failure.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }
}

impl From<StageFailure> for StageOutcome {
    fn from(failure: StageFailure) -> Self {
        StageOutcome::Failed(failure)
    }
}
