//! Turn clock contract.
//!
//! Wall-clock delivery belongs to the host. The engine only needs a countdown
//! it can start, pause, resume and stop, whose timeout callback fires at most
//! once per `start` and never after `stop`.

use log::debug;

/// Callback invoked when a started countdown reaches zero.
pub type TimeoutCallback = Box<dyn FnOnce() + Send + 'static>;

/// Countdown service used to bound a turn.
pub trait TurnTimer {
    /// Arm a countdown of `seconds`, replacing any countdown in flight.
    fn start(&mut self, seconds: u32, on_timeout: TimeoutCallback);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Disarm the countdown, discarding its pending callback.
    fn stop(&mut self);

    /// Seconds left on the current countdown.
    fn remaining(&self) -> u32;

    fn is_paused(&self) -> bool;

    /// Whether a countdown is armed and has not yet fired or been stopped.
    fn is_running(&self) -> bool;

    /// Shift the remaining time by `delta` seconds, flooring at zero. A shift to
    /// zero does not fire the callback until the next `advance`.
    fn adjust(&mut self, delta: i64);
}

/// Deterministic countdown driven by explicit `advance` calls.
///
/// Hosts feed it elapsed seconds from their own clock; tests and the headless
/// tester drive it directly.
#[derive(Default)]
pub struct ManualTimer {
    remaining: u32,
    paused: bool,
    on_timeout: Option<TimeoutCallback>,
}

impl std::fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTimer")
            .field("remaining", &self.remaining)
            .field("paused", &self.paused)
            .field("armed", &self.on_timeout.is_some())
            .finish()
    }
}

impl ManualTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `seconds` pass. Returns `true` if this call fired the timeout.
    pub fn advance(&mut self, seconds: u32) -> bool {
        if self.paused || self.on_timeout.is_none() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(seconds);
        if self.remaining > 0 {
            return false;
        }
        if let Some(callback) = self.on_timeout.take() {
            debug!("turn timer expired");
            callback();
            return true;
        }
        false
    }
}

impl TurnTimer for ManualTimer {
    fn start(&mut self, seconds: u32, on_timeout: TimeoutCallback) {
        self.remaining = seconds;
        self.paused = false;
        self.on_timeout = Some(on_timeout);
    }

    fn pause(&mut self) {
        if self.on_timeout.is_some() {
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.on_timeout = None;
        self.paused = false;
    }

    fn remaining(&self) -> u32 {
        self.remaining
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_running(&self) -> bool {
        self.on_timeout.is_some()
    }

    fn adjust(&mut self, delta: i64) {
        self.remaining = crate::numbers::apply_delta(self.remaining, delta);
    }
}
