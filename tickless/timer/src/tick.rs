//! Tick timer driver
//!
//! Owns the periodic countdown timer that, left running, issues one
//! interrupt per scheduling tick. The sleep scheduler stops it for the
//! duration of a suppressed sleep and restarts it with a phase-correcting
//! first period afterwards.

use tickless_core::{TickTimerState, TlResult};

use crate::hw::TickTimerHw;

/// Driver for the periodic tick timer
pub struct TickTimerDriver<H: TickTimerHw> {
    hw: H,
    state: TickTimerState,
    running: bool,
}

impl<H: TickTimerHw> TickTimerDriver<H> {
    /// Derive the timer constants and take ownership of the hardware
    ///
    /// Fails if the rates cannot produce a nonzero counts-per-tick; that
    /// is an init-time programming error, not a runtime condition.
    pub fn init(hw: H, tick_rate_hz: u32, timer_clock_hz: u32) -> TlResult<Self> {
        let state = TickTimerState::derive(tick_rate_hz, timer_clock_hz)?;
        Ok(Self {
            hw,
            state,
            running: false,
        })
    }

    /// Derived constants for this timer
    pub fn state(&self) -> TickTimerState {
        self.state
    }

    /// Start counting
    pub fn start(&mut self) {
        self.hw.set_enabled(true);
        self.running = true;
    }

    /// Stop counting, freezing the current value so the elapsed part of
    /// the period remains measurable
    pub fn stop(&mut self) {
        self.hw.set_enabled(false);
        self.running = false;
    }

    /// Whether the timer is currently counting
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Counts remaining until the next tick interrupt
    ///
    /// A raw hardware value of 0 means a full period remains: the
    /// interrupt fires on the 1 -> 0 transition, so 0 is the parked value
    /// right after a reload, not an imminent interrupt.
    pub fn current_remaining(&self) -> u32 {
        match self.hw.current() {
            0 => self.state.counts_per_tick,
            counts => counts,
        }
    }

    /// Program the reload register
    pub fn set_reload(&mut self, value: u32) {
        self.hw.set_reload(value);
    }

    /// Force the counter back to the reload value
    pub fn reset_counter(&mut self) {
        self.hw.reset_counter();
    }

    /// Whether a tick interrupt is pending and unserviced
    pub fn pending_interrupt(&self) -> bool {
        self.hw.pending()
    }

    /// Clear a pending tick interrupt
    pub fn clear_pending_interrupt(&mut self) {
        self.hw.clear_pending();
    }

    /// Restart periodic ticking with a corrected first period
    ///
    /// The first period runs for `first_period_counts`, landing the next
    /// interrupt on the proper tick-grid boundary; every period after that
    /// uses the standard reload again.
    pub fn restart(&mut self, first_period_counts: u32) {
        self.hw.set_reload(first_period_counts);
        self.hw.reset_counter();
        self.start();
        self.hw.set_reload(self.state.standard_reload());
    }

    /// Ordinary per-tick servicing
    ///
    /// Returns true when a tick interrupt was pending (and is now
    /// cleared), i.e. one tick period elapsed.
    pub fn service_tick(&mut self) -> bool {
        if self.hw.pending() {
            self.hw.clear_pending();
            true
        } else {
            false
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::{MockTickTimer, SimBus};

    fn driver(bus: &SimBus) -> TickTimerDriver<MockTickTimer<'_>> {
        TickTimerDriver::init(MockTickTimer::new(bus), 1000, 3_000_000).unwrap()
    }

    #[test]
    fn test_zero_reads_as_full_period() {
        let bus = SimBus::new();
        let drv = driver(&bus);
        bus.force_tick_current(0);
        assert_eq!(drv.current_remaining(), 3000);
    }

    #[test]
    fn test_nonzero_reads_verbatim() {
        let bus = SimBus::new();
        let drv = driver(&bus);
        bus.force_tick_current(1234);
        assert_eq!(drv.current_remaining(), 1234);
    }

    #[test]
    fn test_stop_freezes_count() {
        let bus = SimBus::new();
        let mut drv = driver(&bus);
        drv.set_reload(2999);
        drv.reset_counter();
        drv.start();
        bus.advance_tick_counts(1000);
        drv.stop();
        let frozen = drv.current_remaining();
        bus.advance_tick_counts(500);
        assert_eq!(drv.current_remaining(), frozen);
        assert!(!drv.is_running());
    }

    #[test]
    fn test_restart_restores_standard_reload() {
        let bus = SimBus::new();
        let mut drv = driver(&bus);
        drv.restart(1500);
        assert!(drv.is_running());
        assert_eq!(drv.current_remaining(), 1500);
        // The partial period fires after 1500 counts; one count later the
        // standard reload is in effect again.
        bus.advance_tick_counts(1501);
        assert!(drv.service_tick());
        assert_eq!(drv.current_remaining(), 2999);
    }

    #[test]
    fn test_service_tick_without_pending() {
        let bus = SimBus::new();
        let mut drv = driver(&bus);
        assert!(!drv.service_tick());
    }
}
