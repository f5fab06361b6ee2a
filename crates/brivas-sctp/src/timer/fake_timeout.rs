//! Timeouts driven by a caller-controlled clock

use crate::socket::{DelayPrecision, Timeout};
use crate::types::{TimeMs, TimeoutId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type NowFn = Rc<dyn Fn() -> TimeMs>;

#[derive(Debug)]
struct Slot {
    timeout_id: TimeoutId,
    expiry: Option<TimeMs>,
}

/// A timeout that only records when it should fire
pub struct FakeTimeout {
    now: NowFn,
    precision: DelayPrecision,
    slot: Rc<RefCell<Slot>>,
}

impl FakeTimeout {
    pub fn precision(&self) -> DelayPrecision {
        self.precision
    }
}

impl Timeout for FakeTimeout {
    fn start(&mut self, duration: Duration, timeout_id: TimeoutId) {
        let mut slot = self.slot.borrow_mut();
        debug_assert!(slot.expiry.is_none(), "timeout started twice");
        slot.timeout_id = timeout_id;
        slot.expiry = Some((self.now)() + duration);
    }

    fn stop(&mut self) {
        self.slot.borrow_mut().expiry = None;
    }
}

/// Hands out [`FakeTimeout`]s and reports which of them have expired.
///
/// Embedders without a real timer facility, and tests, advance their own
/// clock and then drain [`get_next_expired_timeout`](Self::get_next_expired_timeout)
/// into `TimerManager::handle_timeout`.
pub struct FakeTimeoutManager {
    now: NowFn,
    timeouts: RefCell<Vec<Weak<RefCell<Slot>>>>,
}

impl FakeTimeoutManager {
    pub fn new(now: NowFn) -> Self {
        Self {
            now,
            timeouts: RefCell::new(Vec::new()),
        }
    }

    pub fn create_timeout(&self, precision: DelayPrecision) -> Box<dyn Timeout> {
        let slot = Rc::new(RefCell::new(Slot {
            timeout_id: TimeoutId(0),
            expiry: None,
        }));
        let mut timeouts = self.timeouts.borrow_mut();
        timeouts.retain(|t| t.strong_count() > 0);
        timeouts.push(Rc::downgrade(&slot));
        Box::new(FakeTimeout {
            now: self.now.clone(),
            precision,
            slot,
        })
    }

    /// Return one expired timeout, marking it as no longer running. Call
    /// repeatedly until `None`, since handling a timeout may start others.
    pub fn get_next_expired_timeout(&self) -> Option<TimeoutId> {
        let now = (self.now)();
        for timeout in self.timeouts.borrow().iter() {
            let Some(slot) = timeout.upgrade() else {
                continue;
            };
            let mut slot = slot.borrow_mut();
            if matches!(slot.expiry, Some(expiry) if expiry <= now) {
                slot.expiry = None;
                return Some(slot.timeout_id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_expires_once_at_deadline() {
        let now = Rc::new(Cell::new(TimeMs(1000)));
        let clock = now.clone();
        let manager = FakeTimeoutManager::new(Rc::new(move || clock.get()));

        let mut timeout = manager.create_timeout(DelayPrecision::High);
        timeout.start(Duration::from_millis(500), TimeoutId(42));
        now.set(TimeMs(1499));
        assert_eq!(manager.get_next_expired_timeout(), None);
        now.set(TimeMs(1500));
        assert_eq!(manager.get_next_expired_timeout(), Some(TimeoutId(42)));
        assert_eq!(manager.get_next_expired_timeout(), None);

        timeout.start(Duration::from_millis(10), TimeoutId(43));
        timeout.stop();
        now.set(TimeMs(2000));
        assert_eq!(manager.get_next_expired_timeout(), None);

        // Dropped timeouts are forgotten
        timeout.start(Duration::from_millis(10), TimeoutId(44));
        drop(timeout);
        now.set(TimeMs(3000));
        assert_eq!(manager.get_next_expired_timeout(), None);
    }
}
