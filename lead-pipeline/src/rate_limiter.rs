use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::Clock;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Seconds until the next submission is allowed, rounded up.
    Blocked { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Cooldown between accepted submissions of one session.
///
/// Holds a single "last accepted" instant. This is a UX throttle: a client
/// can always reset it by starting a new session.
pub struct RateLimiter {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    last_accepted: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            last_accepted: Mutex::new(None),
        }
    }

    /// Does not consume the window: only `record_accepted` does. A block
    /// lifts on its own once the remaining time has passed.
    pub fn check_and_maybe_block(&self) -> RateDecision {
        let last = *self.last_accepted.lock().unwrap_or_else(|e| e.into_inner());
        let Some(last) = last else {
            return RateDecision::Allowed;
        };

        // A clock stepping backwards counts as no time elapsed.
        let elapsed_ms = (self.clock.now() - last).num_milliseconds().max(0) as u128;
        let cooldown_ms = self.cooldown.as_millis();

        if elapsed_ms >= cooldown_ms {
            RateDecision::Allowed
        } else {
            let remaining_ms = cooldown_ms - elapsed_ms;
            RateDecision::Blocked {
                retry_after_secs: remaining_ms.div_ceil(1000) as u64,
            }
        }
    }

    pub fn record_accepted(&self) {
        let now = self.clock.now();
        *self.last_accepted.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
    }

    pub fn last_accepted(&self) -> Option<DateTime<Utc>> {
        *self.last_accepted.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(DEFAULT_COOLDOWN, clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_allows_before_any_submission() {
        let (_, limiter) = limiter();
        assert_eq!(limiter.check_and_maybe_block(), RateDecision::Allowed);
        assert!(limiter.last_accepted().is_none());
    }

    #[test]
    fn test_checks_do_not_consume_window() {
        let (_, limiter) = limiter();
        for _ in 0..5 {
            assert!(limiter.check_and_maybe_block().is_allowed());
        }
    }

    #[test]
    fn test_blocks_inside_window_with_rounded_up_wait() {
        let (clock, limiter) = limiter();
        limiter.record_accepted();

        assert_eq!(
            limiter.check_and_maybe_block(),
            RateDecision::Blocked { retry_after_secs: 30 }
        );

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(
            limiter.check_and_maybe_block(),
            RateDecision::Blocked { retry_after_secs: 30 }
        );

        clock.advance(chrono::Duration::milliseconds(9_999));
        assert_eq!(
            limiter.check_and_maybe_block(),
            RateDecision::Blocked { retry_after_secs: 20 }
        );

        clock.advance(chrono::Duration::milliseconds(19_500));
        assert_eq!(
            limiter.check_and_maybe_block(),
            RateDecision::Blocked { retry_after_secs: 1 }
        );
    }

    #[test]
    fn test_allows_at_exactly_cooldown() {
        let (clock, limiter) = limiter();
        limiter.record_accepted();

        clock.advance(chrono::Duration::milliseconds(29_999));
        assert!(!limiter.check_and_maybe_block().is_allowed());

        clock.advance(chrono::Duration::milliseconds(1));
        assert!(limiter.check_and_maybe_block().is_allowed());

        clock.advance(chrono::Duration::seconds(60));
        assert!(limiter.check_and_maybe_block().is_allowed());
    }

    #[test]
    fn test_clock_going_backwards_keeps_blocking() {
        let (clock, limiter) = limiter();
        limiter.record_accepted();
        clock.advance(chrono::Duration::seconds(-5));

        assert_eq!(
            limiter.check_and_maybe_block(),
            RateDecision::Blocked { retry_after_secs: 30 }
        );
    }
}
