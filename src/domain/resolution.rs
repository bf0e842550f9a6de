use std::time::Duration;

use super::{FeedItem, ResolvedImage, StageKind};

/// Result handed to the publisher. `NotFound` is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedImage),
    NotFound,
}

impl Resolution {
    pub fn image(&self) -> Option<&ResolvedImage> {
        match self {
            Resolution::Found(image) => Some(image),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Telemetry record for one stage attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttempt {
    pub stage: StageKind,
    pub outcome: &'static str,
    pub elapsed: Duration,
    pub http_status: Option<u16>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub item_url: String,
    pub resolution: Resolution,
    pub attempts: Vec<StageAttempt>,
}

impl ResolutionReport {
    pub fn not_found(item: &FeedItem) -> Self {
        Self {
            item_url: item.url.clone(),
            resolution: Resolution::NotFound,
            attempts: Vec::new(),
        }
    }

    pub fn attempted_stages(&self) -> Vec<StageKind> {
        self.attempts.iter().map(|a| a.stage).collect()
    }
}
