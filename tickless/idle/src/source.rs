//! Wake sources
//!
//! A suppressed sleep needs something to wake the CPU once the planned
//! idle time has passed. Two strategies exist: reuse the (stopped) tick
//! timer itself with a long reload, or arm an independent free-running
//! wake timer that keeps counting in a clock domain the sleep mode leaves
//! alive. The sleep scheduler depends only on the [`WakeSource`] trait;
//! the strategy is picked once at configuration time.

use tickless_core::{ClockDomainConverter, TickTimerState, TlResult};
use tickless_timer::{TickTimerHw, WakeTimerDriver, WakeTimerHw};

/// One-shot wake scheduling for the suppressed-sleep window
///
/// `arm` takes the planned window in tick-timer counts and returns the
/// planned delta in the source's native units; `elapsed_since_arm` and
/// `to_tick_counts` let the scheduler reconcile in whichever unit is
/// exact for the strategy.
pub trait WakeSource {
    /// Upper bound on ticks this source can span in one arming
    fn max_suppressed_ticks(&self) -> u32;

    /// Schedule a one-shot wake `tick_counts` tick-timer counts from now
    ///
    /// Returns the planned delta in native units. Implementations must
    /// clear any stale pending wake before arming and must never schedule
    /// a zero-length wake.
    fn arm(&mut self, tick_counts: u32) -> u32;

    /// Native-unit counts elapsed since the last `arm`, wraparound-safe
    fn elapsed_since_arm(&mut self) -> u32;

    /// Convert native units to tick-timer counts, rounding down
    fn to_tick_counts(&self, native_counts: u32) -> u32;

    /// Disable the wake and clear pending status (idempotent)
    fn disarm(&mut self);

    /// Acknowledge a wake interrupt; false means the wake was stale
    /// (raised after `disarm`) and has been discarded
    fn acknowledge_wake(&mut self) -> bool;
}

/// Wake source backed by the independent free-running wake timer
///
/// Native units are wake-clock counts. The free-running counter is
/// snapshotted at arm time so elapsed time survives wraparound via
/// modular subtraction.
pub struct SecondaryTimerWakeSource<W: WakeTimerHw> {
    driver: WakeTimerDriver<W>,
    converter: ClockDomainConverter,
    wake_at_sleep: u32,
}

impl<W: WakeTimerHw> SecondaryTimerWakeSource<W> {
    /// Derive the wake-domain constants and take the hardware
    pub fn new(
        hw: W,
        wake_clock_hz: u32,
        tick_timer_clock_hz: u32,
        tick_rate_hz: u32,
    ) -> TlResult<Self> {
        let driver = WakeTimerDriver::init(hw, wake_clock_hz, tick_rate_hz)?;
        let converter = ClockDomainConverter::new(tick_timer_clock_hz, wake_clock_hz)?;
        Ok(Self {
            driver,
            converter,
            wake_at_sleep: 0,
        })
    }
}

impl<W: WakeTimerHw> WakeSource for SecondaryTimerWakeSource<W> {
    fn max_suppressed_ticks(&self) -> u32 {
        self.driver.state().max_suppressed_ticks
    }

    fn arm(&mut self, tick_counts: u32) -> u32 {
        let delta = self
            .converter
            .tick_counts_to_wake_counts(tick_counts)
            .max(1);
        self.wake_at_sleep = self.driver.current_count();
        self.driver.arm_delta_wake(delta);
        delta
    }

    fn elapsed_since_arm(&mut self) -> u32 {
        self.driver.elapsed_since(self.wake_at_sleep)
    }

    fn to_tick_counts(&self, native_counts: u32) -> u32 {
        self.converter.wake_counts_to_tick_counts(native_counts)
    }

    fn disarm(&mut self) {
        self.driver.disarm();
    }

    fn acknowledge_wake(&mut self) -> bool {
        self.driver.acknowledge_wake()
    }
}

/// Wake source that reuses the tick timer with a long reload
///
/// The tick timer is already stopped when `arm` runs; this strategy
/// restarts it spanning the whole planned window, so no second timer and
/// no clock-domain conversion are involved. Native units are tick-timer
/// counts and `to_tick_counts` is the identity.
pub struct SameTimerWakeSource<T: TickTimerHw> {
    hw: T,
    state: TickTimerState,
    armed_counts: u32,
    armed: bool,
}

impl<T: TickTimerHw> SameTimerWakeSource<T> {
    /// Derive the timer constants and take a handle to the tick timer
    ///
    /// The handle aliases the hardware owned by the tick driver; that is
    /// legal on a single core because the scheduler only uses one of the
    /// two while a suppression attempt is in flight.
    pub fn new(hw: T, tick_rate_hz: u32, timer_clock_hz: u32) -> TlResult<Self> {
        let state = TickTimerState::derive(tick_rate_hz, timer_clock_hz)?;
        Ok(Self {
            hw,
            state,
            armed_counts: 0,
            armed: false,
        })
    }
}

impl<T: TickTimerHw> WakeSource for SameTimerWakeSource<T> {
    fn max_suppressed_ticks(&self) -> u32 {
        self.state.max_suppressed_ticks
    }

    fn arm(&mut self, tick_counts: u32) -> u32 {
        let counts = tick_counts.max(1);
        self.hw.clear_pending();
        self.hw.set_reload(counts);
        self.hw.reset_counter();
        self.hw.set_enabled(true);
        self.armed_counts = counts;
        self.armed = true;
        counts
    }

    fn elapsed_since_arm(&mut self) -> u32 {
        // Freeze before reading so an in-flight decrement cannot slip in
        // between the pending check and the value read.
        self.hw.set_enabled(false);
        let current = self.hw.current();
        if self.hw.pending() {
            // The long reload expired; the counter restarted from the
            // armed value and has consumed the reload cycle plus however
            // far it got since.
            let exceeded = if current == 0 {
                0
            } else {
                1 + (self.armed_counts - current)
            };
            self.armed_counts + exceeded
        } else {
            // Something else ended the sleep. A raw zero here means the
            // counter never loaded, so the whole window still remains.
            let remaining = if current == 0 {
                self.armed_counts
            } else {
                current
            };
            self.armed_counts - remaining
        }
    }

    fn to_tick_counts(&self, native_counts: u32) -> u32 {
        native_counts
    }

    fn disarm(&mut self) {
        self.hw.clear_pending();
        self.armed = false;
    }

    fn acknowledge_wake(&mut self) -> bool {
        let genuine = self.armed;
        self.armed = false;
        self.hw.clear_pending();
        genuine
    }
}
