use std::time::Duration;

use crate::core::PeerId;
use crate::util::elapsed_between;

/// A peer's local belief about who holds the ring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingState {
    current_holder: Option<PeerId>,
    last_updated: Option<u64>,
}

impl RingState {
    /// Creates a state with no known holder
    pub fn new() -> Self {
        RingState::default()
    }

    /// Currently believed ring-holder, if any
    pub fn holder(&self) -> Option<&PeerId> {
        self.current_holder.as_ref()
    }

    /// Unix time of the last update, if any
    pub fn last_updated(&self) -> Option<u64> {
        self.last_updated
    }

    /// Whether `peer` is the believed holder
    pub fn is_held_by(&self, peer: &PeerId) -> bool {
        self.current_holder.as_ref() == Some(peer)
    }

    /// Records `holder` as of `timestamp`, returning whether the holder changed
    pub fn record(&mut self, holder: PeerId, timestamp: u64) -> bool {
        self.last_updated = Some(timestamp);
        if self.is_held_by(&holder) {
            return false;
        }
        self.current_holder = Some(holder);
        true
    }

    /// True when a holder is known but has not been refreshed within `ttl`
    pub fn is_stale(&self, ttl: Duration, now: u64) -> bool {
        match (&self.current_holder, self.last_updated) {
            (Some(_), Some(updated)) => elapsed_between(updated, now) > ttl,
            _ => false,
        }
    }

    /// Forgets the holder, returning the one that was known
    pub fn clear(&mut self) -> Option<PeerId> {
        self.last_updated = None;
        self.current_holder.take()
    }
}
