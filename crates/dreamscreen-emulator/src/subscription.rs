//! Sector-data subscription lifetime
//!
//! A subscription stays alive only while the controller keeps re-sending
//! `SubscribeToSectorData`. Expiry is polled from the update tick, not
//! driven by a timer interrupt.

use std::time::{Duration, Instant};

/// Liveness window for a sector subscription
pub const SECTOR_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Elapsed-time measurement against a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionTimer {
    started: Instant,
    timeout: Duration,
}

impl SubscriptionTimer {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            started: now,
            timeout,
        }
    }

    /// Restart the measurement at `now`
    pub fn reset(&mut self, now: Instant) {
        self.started = now;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) > self.timeout
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Observable subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
}

/// The `(active, clock)` pair kept by an endpoint
#[derive(Debug, Clone)]
pub struct SectorSubscription {
    active: bool,
    timer: SubscriptionTimer,
}

impl SectorSubscription {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            active: false,
            timer: SubscriptionTimer::new(timeout, now),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> SubscriptionState {
        if self.active {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Unsubscribed
        }
    }

    /// Mark active. Returns `true` on the `Unsubscribed -> Subscribed` edge.
    pub fn activate(&mut self) -> bool {
        let was_active = self.active;
        self.active = true;
        !was_active
    }

    /// Extend the liveness window from `now`
    pub fn refresh(&mut self, now: Instant) {
        self.timer.reset(now);
    }

    /// Clear the subscription if it lapsed. Returns `true` only on the
    /// `Subscribed -> Unsubscribed` edge, so repeated ticks are idempotent.
    pub fn expire_if_lapsed(&mut self, now: Instant) -> bool {
        if self.active && self.timer.is_expired(now) {
            self.active = false;
            return true;
        }
        false
    }

    pub fn timer(&self) -> &SubscriptionTimer {
        &self.timer
    }
}
