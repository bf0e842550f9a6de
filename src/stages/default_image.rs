use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{
    FeedItem, ImageContentType, ResolvedImage, SkipReason, StageFailure, StageKind, StageOutcome,
};
use crate::errors::ValidationError;
use crate::images::ImageValidator;
use crate::stages::traits::ImageStage;

/// Per-feed local asset. Never touches the network.
pub struct DefaultImageStage {
    asset_dir: Option<PathBuf>,
    validator: ImageValidator,
}

impl DefaultImageStage {
    pub fn new(asset_dir: Option<PathBuf>, validator: ImageValidator) -> Self {
        Self {
            asset_dir,
            validator,
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.asset_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageStage for DefaultImageStage {
    fn kind(&self) -> StageKind {
        StageKind::Default
    }

    fn applicable(&self, item: &FeedItem) -> Result<(), SkipReason> {
        match &item.feed_default_image_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(()),
            _ => Err(SkipReason::NoDefaultImage),
        }
    }

    fn attempt(&self, item: &FeedItem) -> StageOutcome {
        let Some(configured) = &item.feed_default_image_path else {
            return StageOutcome::Skipped(SkipReason::NoDefaultImage);
        };
        let path = self.resolve_path(configured);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "default image asset is missing");
                return StageOutcome::Skipped(SkipReason::DefaultAssetMissing(path));
            }
            Err(e) => {
                return StageFailure::Asset {
                    path,
                    message: e.to_string(),
                }
                .into()
            }
        };

        let Some(content_type) = ImageContentType::sniff(&bytes) else {
            let err = if bytes.is_empty() {
                ValidationError::Empty
            } else {
                ValidationError::UnrecognizedSignature
            };
            return StageFailure::Validation(err).into();
        };

        match self.validator.validate(&bytes, content_type) {
            Ok(dims) => StageOutcome::Success(ResolvedImage {
                bytes,
                source_stage: StageKind::Default,
                source_url: configured.display().to_string(),
                content_type,
                width: dims.width,
                height: dims.height,
                http_status: None,
                attribution: None,
            }),
            Err(e) => StageFailure::Validation(e).into(),
        }
    }
}
