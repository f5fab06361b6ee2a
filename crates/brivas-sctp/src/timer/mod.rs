//! Socket timers (T1-init, T3-rtx, heartbeat, ...)
//!
//! A [`Timer`] does not sleep by itself. It owns a [`Timeout`] created by the
//! embedder and starts it with a [`TimeoutId`] that encodes the timer's id and
//! a generation counter. When the embedder reports that timeout back through
//! [`TimerManager::handle_timeout`], expirations for an older generation
//! (a timeout that raced with a stop or restart) are ignored.

mod fake_timeout;

pub use fake_timeout::{FakeTimeout, FakeTimeoutManager, NowFn};

use crate::socket::{DelayPrecision, Timeout};
use crate::types::TimeoutId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, instrument};

/// Longest duration a timer may run for
pub const MAX_TIMER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Creates the timeout backing a new timer
pub type TimeoutFactory = Box<dyn Fn(DelayPrecision) -> Box<dyn Timeout>>;

/// Called on expiry. May return a new base duration for the timer.
pub type OnExpired = Box<dyn FnMut() -> Option<Duration>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerBackoffAlgorithm {
    /// Same duration after every expiry
    Fixed,
    /// Duration doubles after every expiry
    #[default]
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerOptions {
    pub duration: Duration,
    pub backoff_algorithm: TimerBackoffAlgorithm,
    /// Restarts after expiry; `None` restarts forever
    pub max_restarts: Option<u32>,
    /// Cap on the backed-off duration; [`MAX_TIMER_DURATION`] when unset
    pub max_backoff_duration: Option<Duration>,
    pub precision: DelayPrecision,
}

impl TimerOptions {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            backoff_algorithm: TimerBackoffAlgorithm::default(),
            max_restarts: None,
            max_backoff_duration: None,
            precision: DelayPrecision::default(),
        }
    }

    pub fn with_backoff(mut self, backoff_algorithm: TimerBackoffAlgorithm) -> Self {
        self.backoff_algorithm = backoff_algorithm;
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = Some(max_restarts);
        self
    }

    pub fn with_max_backoff_duration(mut self, max_backoff_duration: Option<Duration>) -> Self {
        self.max_backoff_duration = max_backoff_duration;
        self
    }

    pub fn with_precision(mut self, precision: DelayPrecision) -> Self {
        self.precision = precision;
        self
    }
}

struct TimerState {
    id: u32,
    name: String,
    options: TimerOptions,
    duration: Duration,
    timeout: Box<dyn Timeout>,
    on_expired: Option<OnExpired>,
    is_running: bool,
    generation: u32,
    expiration_count: u32,
}

impl TimerState {
    fn timeout_id(&self) -> TimeoutId {
        TimeoutId((u64::from(self.id) << 32) | u64::from(self.generation))
    }

    fn backoff_duration(&self) -> Duration {
        match self.options.backoff_algorithm {
            TimerBackoffAlgorithm::Fixed => self.duration,
            TimerBackoffAlgorithm::Exponential => {
                let cap = self
                    .options
                    .max_backoff_duration
                    .map_or(MAX_TIMER_DURATION, |d| d.min(MAX_TIMER_DURATION));
                let mut duration = self.duration;
                for _ in 0..self.expiration_count {
                    duration = duration.saturating_mul(2);
                    if duration >= cap {
                        return cap;
                    }
                }
                duration.min(cap)
            }
        }
    }

    /// Start the timeout for a fresh generation, stopping the current one.
    fn restart(&mut self, duration: Duration) {
        self.timeout.stop();
        self.is_running = true;
        self.generation = self.generation.wrapping_add(1);
        let timeout_id = self.timeout_id();
        self.timeout.start(duration, timeout_id);
    }
}

type TimerRegistry = RefCell<HashMap<u32, Weak<RefCell<TimerState>>>>;

/// Expire a timer, if `generation` is still current.
fn trigger(state: &RefCell<TimerState>, generation: u32) {
    let mut on_expired = {
        let mut timer = state.borrow_mut();
        if !timer.is_running || timer.generation != generation {
            return;
        }
        timer.expiration_count += 1;
        timer.is_running = false;
        debug!(
            "Timer {} expired ({} times)",
            timer.name, timer.expiration_count
        );

        let restart = timer
            .options
            .max_restarts
            .map_or(true, |max| timer.expiration_count <= max);
        if restart {
            let duration = timer.backoff_duration();
            timer.restart(duration);
        }

        let on_expired = timer.on_expired.take();
        match on_expired {
            Some(on_expired) => on_expired,
            None => return,
        }
    };

    // The handler may start or stop this timer, so it runs unborrowed
    let new_duration = on_expired();

    let mut timer = state.borrow_mut();
    timer.on_expired = Some(on_expired);
    if let Some(new_duration) = new_duration {
        let new_duration = new_duration.min(MAX_TIMER_DURATION);
        if !new_duration.is_zero() && new_duration != timer.duration {
            timer.duration = new_duration;
            if timer.is_running {
                let duration = timer.backoff_duration();
                timer.restart(duration);
            }
        }
    }
}

/// A named timer. Stops itself when dropped.
pub struct Timer {
    state: Rc<RefCell<TimerState>>,
    registry: Weak<TimerRegistry>,
}

impl Timer {
    pub fn id(&self) -> u32 {
        self.state.borrow().id
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub fn options(&self) -> TimerOptions {
        self.state.borrow().options.clone()
    }

    /// Start the timer, restarting it if running. Resets the expiration count.
    pub fn start(&self) {
        let mut timer = self.state.borrow_mut();
        timer.expiration_count = 0;
        let duration = timer.duration;
        timer.restart(duration);
    }

    pub fn stop(&self) {
        let mut timer = self.state.borrow_mut();
        if timer.is_running {
            timer.timeout.stop();
            timer.expiration_count = 0;
            timer.is_running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    /// Expirations since the timer was last started
    pub fn expiration_count(&self) -> u32 {
        self.state.borrow().expiration_count
    }

    /// Base duration, before backoff
    pub fn duration(&self) -> Duration {
        self.state.borrow().duration
    }

    /// Takes effect the next time the timer is (re)started.
    pub fn set_duration(&self, duration: Duration) {
        self.state.borrow_mut().duration = duration.min(MAX_TIMER_DURATION);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let id = match self.state.try_borrow_mut() {
            Ok(mut timer) => {
                if timer.is_running {
                    timer.timeout.stop();
                    timer.is_running = false;
                }
                timer.id
            }
            Err(_) => return,
        };
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&id);
        }
    }
}

/// Creates timers and routes expired timeouts back to them
pub struct TimerManager {
    create_timeout: TimeoutFactory,
    next_id: Cell<u32>,
    timers: Rc<TimerRegistry>,
}

impl TimerManager {
    pub fn new(create_timeout: impl Fn(DelayPrecision) -> Box<dyn Timeout> + 'static) -> Self {
        Self {
            create_timeout: Box::new(create_timeout),
            next_id: Cell::new(1),
            timers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn create_timer(
        &self,
        name: impl Into<String>,
        on_expired: impl FnMut() -> Option<Duration> + 'static,
        options: TimerOptions,
    ) -> Timer {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));

        let timeout = (self.create_timeout)(options.precision);
        let state = Rc::new(RefCell::new(TimerState {
            id,
            name: name.into(),
            duration: options.duration.min(MAX_TIMER_DURATION),
            options,
            timeout,
            on_expired: Some(Box::new(on_expired)),
            is_running: false,
            generation: 0,
            expiration_count: 0,
        }));
        self.timers.borrow_mut().insert(id, Rc::downgrade(&state));

        Timer {
            state,
            registry: Rc::downgrade(&self.timers),
        }
    }

    /// Route an expired timeout to its timer. Unknown ids and stale
    /// generations are ignored.
    #[instrument(skip(self))]
    pub fn handle_timeout(&self, timeout_id: TimeoutId) {
        let timer_id = (timeout_id.0 >> 32) as u32;
        let generation = timeout_id.0 as u32;
        let timer = self.timers.borrow().get(&timer_id).and_then(Weak::upgrade);
        match timer {
            Some(state) => trigger(&state, generation),
            None => debug!("Timeout for unknown timer {}", timer_id),
        }
    }
}
