pub mod feed_item;
pub mod resolved_image;
pub mod outcome;
pub mod resolution;

pub use feed_item::{FeedItem, MediaRef, MediaRefKind};
pub use resolved_image::{ImageContentType, ResolvedImage};
pub use outcome::{SkipReason, StageFailure, StageKind, StageOutcome};
pub use resolution::{Resolution, ResolutionReport, StageAttempt};
