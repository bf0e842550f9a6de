use std::io::Cursor;

use image::ImageReader;

use crate::domain::ImageContentType;
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Rejects empty, mislabelled, corrupt and tracking-pixel sized payloads.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    min_bytes: usize,
    min_width: u32,
    min_height: u32,
}

impl ImageValidator {
    pub fn new(min_bytes: usize, min_width: u32, min_height: u32) -> Self {
        Self {
            // zero-length payloads are never valid
            min_bytes: min_bytes.max(1),
            min_width,
            min_height,
        }
    }

    pub fn validate(
        &self,
        bytes: &[u8],
        declared: ImageContentType,
    ) -> Result<Dimensions, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }
        if bytes.len() < self.min_bytes {
            return Err(ValidationError::TooFewBytes {
                len: bytes.len(),
                min: self.min_bytes,
            });
        }

        let guessed =
            image::guess_format(bytes).map_err(|_| ValidationError::UnrecognizedSignature)?;
        let detected = ImageContentType::from_format(guessed)
            .ok_or_else(|| ValidationError::UnsupportedFormat(format!("{:?}", guessed)))?;

        if detected != declared {
            return Err(ValidationError::SignatureMismatch {
                declared: declared.to_string(),
                detected: detected.to_string(),
            });
        }

        let format = detected.image_format();
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| ValidationError::Undecodable(e.to_string()))?;

        if width < self.min_width || height < self.min_height {
            return Err(ValidationError::TooSmall {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }

        // headers can be intact while the pixel data is cut short
        ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(|e| ValidationError::Undecodable(e.to_string()))?;

        Ok(Dimensions { width, height })
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(512, 100, 100)
    }
}
