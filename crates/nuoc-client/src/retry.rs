//! Single-slot cancellable retry timer bookkeeping.
//!
//! The slot only tracks identities; the driver owns the actual sleep. A timer
//! that elapses after being replaced or cancelled no longer matches the slot
//! and is ignored.

use std::fmt;

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "retry#{}", self.0)
    }
}

/// Holds at most one pending retry.
#[derive(Debug, Default)]
pub struct RetrySlot {
    pending: Option<TimerId>,
    next: u64,
}

impl RetrySlot {
    /// Arm a new timer. Returns it along with the timer it replaced, if any.
    pub fn arm(&mut self) -> (TimerId, Option<TimerId>) {
        self.next += 1;
        let id = TimerId(self.next);
        (id, self.pending.replace(id))
    }

    /// Disarm the pending timer, returning it.
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.pending.take()
    }

    /// Consume an elapsed timer. True only if `id` is the pending one.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_replaces_pending() {
        let mut slot = RetrySlot::default();
        let (first, replaced) = slot.arm();
        assert_eq!(replaced, None);
        let (second, replaced) = slot.arm();
        assert_eq!(replaced, Some(first));
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        assert_eq!(slot.pending(), None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut slot = RetrySlot::default();
        let (id, _) = slot.arm();
        assert_eq!(slot.cancel(), Some(id));
        assert!(!slot.fire(id));
    }

    #[test]
    fn fires_once() {
        let mut slot = RetrySlot::default();
        let (id, _) = slot.arm();
        assert!(slot.fire(id));
        assert!(!slot.fire(id));
    }
}
