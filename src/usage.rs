//! Usage gating for segmentation requests

use async_trait::async_trait;
use instant::Instant;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(60);

/// Outcome of a usage check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl UsageDecision {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn deny<S: Into<String>>(reason: S) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Subscription/usage collaborator consulted before each segmentation
#[async_trait]
pub trait UsageLimiter: Send + Sync {
    async fn can_use_segmentation(&self) -> UsageDecision;

    async fn increment_segmentation_count(&self);
}

/// Allows every request
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedUsage;

#[async_trait]
impl UsageLimiter for UnlimitedUsage {
    async fn can_use_segmentation(&self) -> UsageDecision {
        UsageDecision::allow()
    }

    async fn increment_segmentation_count(&self) {}
}

/// Allows at most `max_per_minute` recorded uses in any sixty-second window
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_per_minute: usize,
    uses: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(max_per_minute: usize) -> Self {
        Self {
            max_per_minute,
            uses: Mutex::new(VecDeque::new()),
        }
    }

    fn recent_uses(&self, now: Instant) -> usize {
        let mut uses = self.uses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while uses
            .front()
            .is_some_and(|used| now.duration_since(*used) >= WINDOW)
        {
            uses.pop_front();
        }
        uses.len()
    }
}

#[async_trait]
impl UsageLimiter for SlidingWindowLimiter {
    async fn can_use_segmentation(&self) -> UsageDecision {
        let recent = self.recent_uses(Instant::now());
        if recent < self.max_per_minute {
            UsageDecision::allow()
        } else {
            UsageDecision::deny(format!(
                "segmentation limit of {} per minute reached",
                self.max_per_minute
            ))
        }
    }

    async fn increment_segmentation_count(&self) {
        let mut uses = self.uses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        uses.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_always_allows() {
        let limiter = UnlimitedUsage;
        for _ in 0..100 {
            limiter.increment_segmentation_count().await;
        }
        assert!(limiter.can_use_segmentation().await.allowed);
    }

    #[tokio::test]
    async fn test_sliding_window_denies_after_limit() {
        let limiter = SlidingWindowLimiter::new(2);
        assert!(limiter.can_use_segmentation().await.allowed);

        limiter.increment_segmentation_count().await;
        limiter.increment_segmentation_count().await;

        let decision = limiter.can_use_segmentation().await;
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("2 per minute"));
    }

    #[test]
    fn test_old_uses_leave_the_window() {
        let limiter = SlidingWindowLimiter::new(1);
        let start = Instant::now();
        limiter.uses.lock().unwrap().push_back(start);

        assert_eq!(limiter.recent_uses(start + Duration::from_secs(30)), 1);
        assert_eq!(limiter.recent_uses(start + Duration::from_secs(61)), 0);
    }
}
