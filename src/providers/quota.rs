use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::providers::traits::StockPhotoProvider;

/// A provider paired with the request budget shared by every resolution.
pub struct QuotaLimitedProvider {
    provider: Box<dyn StockPhotoProvider>,
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl QuotaLimitedProvider {
    pub fn unlimited(provider: Box<dyn StockPhotoProvider>) -> Self {
        Self {
            provider,
            limiter: None,
        }
    }

    pub fn hourly(provider: Box<dyn StockPhotoProvider>, requests_per_hour: NonZeroU32) -> Self {
        Self {
            provider,
            limiter: Some(RateLimiter::direct(Quota::per_hour(requests_per_hour))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn provider(&self) -> &dyn StockPhotoProvider {
        self.provider.as_ref()
    }

    /// Take one request from the budget. False means the quota is spent.
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}
