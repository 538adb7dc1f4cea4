//! Delivery budget for the notification endpoint.

use crate::error::ApiError;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use tracing::warn;

/// Caps how many notifications reach the group per minute. Only requests
/// that would actually be delivered spend the budget.
pub struct NotificationQuota {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    per_minute: NonZeroU32,
}

impl NotificationQuota {
    /// `None` when `per_minute` is zero, which turns the limit off.
    pub fn per_minute(per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(per_minute)?;
        Some(Self {
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            per_minute,
        })
    }

    /// Seconds until the budget refills by one notification.
    pub fn retry_after_secs(&self) -> u64 {
        let per_minute = u64::from(self.per_minute.get());
        60u64.div_ceil(per_minute).max(1)
    }

    /// Spend one notification, or explain when to come back.
    pub fn acquire(&self, group_id: &str) -> Result<(), ApiError> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }
        warn!(group = %group_id, per_minute = self.per_minute.get(), "Notification quota spent");
        Err(ApiError::RateLimitExceeded {
            retry_after_secs: self.retry_after_secs(),
        })
    }
}
