//! Wake timer driver
//!
//! Owns the independent free-running counter whose one-shot compare match
//! resumes the CPU during a suppressed sleep, while the tick timer is
//! stopped. Elapsed time is always computed with modular subtraction so
//! counter wraparound never corrupts the accounting.

use tickless_core::{TlResult, WakeTimerState};

use crate::hw::WakeTimerHw;

/// Driver for the free-running wake timer
pub struct WakeTimerDriver<H: WakeTimerHw> {
    hw: H,
    state: WakeTimerState,
    /// Sequence number of the most recent arming
    generation: u32,
    /// Generation still awaiting its wake, None once disarmed
    armed_generation: Option<u32>,
}

impl<H: WakeTimerHw> WakeTimerDriver<H> {
    /// Derive the wake timer constants and take ownership of the hardware
    pub fn init(hw: H, clock_hz: u32, tick_rate_hz: u32) -> TlResult<Self> {
        let state = WakeTimerState::derive(clock_hz, tick_rate_hz)?;
        Ok(Self {
            hw,
            state,
            generation: 0,
            armed_generation: None,
        })
    }

    /// Derived constants for this timer
    pub fn state(&self) -> WakeTimerState {
        self.state
    }

    /// Schedule a one-shot wake `delta_counts` counts after the current
    /// free-running value
    ///
    /// Any stale pending request from an earlier cycle is cleared before
    /// the new compare value is programmed.
    pub fn arm_delta_wake(&mut self, delta_counts: u32) {
        self.hw.clear_pending();
        self.generation = self.generation.wrapping_add(1);
        self.armed_generation = Some(self.generation);
        self.hw.set_compare_delta(delta_counts);
        self.hw.enable_compare();
    }

    /// Disable the wake interrupt and clear pending status
    ///
    /// Idempotent: disarming an already disarmed timer is safe.
    pub fn disarm(&mut self) {
        self.hw.disable_compare();
        self.hw.clear_pending();
        self.armed_generation = None;
    }

    /// Raw free-running counter value (wraps at 32 bits)
    pub fn current_count(&self) -> u32 {
        self.hw.counter()
    }

    /// Counts elapsed since `start_count`, wraparound-safe
    pub fn elapsed_since(&self, start_count: u32) -> u32 {
        self.hw.counter().wrapping_sub(start_count)
    }

    /// Acknowledge a wake interrupt from the ISR path
    ///
    /// Returns true when the wake belongs to the currently armed request.
    /// A wake that arrives after `disarm` already ran is a benign race;
    /// its pending flag is cleared and false is returned so the caller can
    /// discard it.
    pub fn acknowledge_wake(&mut self) -> bool {
        let genuine = self.armed_generation.take().is_some();
        self.hw.clear_pending();
        genuine
    }
}
