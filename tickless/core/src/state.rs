//! Derived timer constants
//!
//! The tick timer and the wake timer each get a small value struct holding
//! the constants derived from their clock rates. Both are computed once
//! during configuration and are read-only for the rest of the process
//! lifetime; there is no global mutable state behind them.

use core::fmt;
use crate::{TlError, TlResult};

/// Margin subtracted from the raw counter headroom when deriving the
/// maximum suppressible tick count, leaving room to arm the compare
/// channel before the counter catches up to it.
const SUPPRESSION_HEADROOM_TICKS: u32 = 4;

/// Constants derived for the periodic tick timer
///
/// `counts_per_tick` is the number of timer counts that make up one tick
/// period. `max_suppressed_ticks` bounds a single suppression attempt so
/// the reload arithmetic cannot overflow the 32-bit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTimerState {
    /// Timer counts per tick period (always > 0)
    pub counts_per_tick: u32,
    /// Upper bound on ticks suppressed in one attempt
    pub max_suppressed_ticks: u32,
}

impl TickTimerState {
    /// Derive the tick timer constants from the tick rate and the timer's
    /// input clock
    ///
    /// Fails if either rate is zero or the timer clock is slower than the
    /// tick rate, since one tick would then span zero counts.
    pub fn derive(tick_rate_hz: u32, timer_clock_hz: u32) -> TlResult<Self> {
        if tick_rate_hz == 0 || timer_clock_hz == 0 {
            return Err(TlError::ZeroClockRate);
        }
        let counts_per_tick = timer_clock_hz / tick_rate_hz;
        if counts_per_tick == 0 {
            return Err(TlError::ClockRatioTooSmall);
        }
        Ok(Self {
            counts_per_tick,
            max_suppressed_ticks: (u32::MAX / counts_per_tick)
                .saturating_sub(SUPPRESSION_HEADROOM_TICKS),
        })
    }

    /// Build a state without validation (const fn)
    pub const fn new_unchecked(counts_per_tick: u32, max_suppressed_ticks: u32) -> Self {
        Self {
            counts_per_tick,
            max_suppressed_ticks,
        }
    }

    /// The reload value programmed for ordinary per-period ticking
    ///
    /// The counter interrupts on the 1 -> 0 transition, so a full period of
    /// `counts_per_tick` counts is a reload of `counts_per_tick - 1`.
    pub const fn standard_reload(&self) -> u32 {
        self.counts_per_tick - 1
    }
}

impl fmt::Display for TickTimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TickTimerState({} counts/tick, max {} ticks)",
            self.counts_per_tick, self.max_suppressed_ticks
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TickTimerState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "TickTimerState({} counts/tick, max {} ticks)",
            self.counts_per_tick,
            self.max_suppressed_ticks
        );
    }
}

/// Constants derived for the free-running wake timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeTimerState {
    /// Input clock of the wake counter (always > 0)
    pub clock_hz: u32,
    /// Upper bound on ticks suppressed in one attempt, expressed in the
    /// wake clock domain's resolution
    pub max_suppressed_ticks: u32,
}

impl WakeTimerState {
    /// Derive the wake timer constants
    ///
    /// The suppressible maximum depends on how many wake counts one tick
    /// spans, so the tick rate is needed alongside the wake clock.
    pub fn derive(clock_hz: u32, tick_rate_hz: u32) -> TlResult<Self> {
        if clock_hz == 0 || tick_rate_hz == 0 {
            return Err(TlError::ZeroClockRate);
        }
        let counts_per_tick = clock_hz / tick_rate_hz;
        if counts_per_tick == 0 {
            return Err(TlError::ClockRatioTooSmall);
        }
        Ok(Self {
            clock_hz,
            max_suppressed_ticks: (u32::MAX / counts_per_tick)
                .saturating_sub(SUPPRESSION_HEADROOM_TICKS),
        })
    }

    /// Build a state without validation (const fn)
    pub const fn new_unchecked(clock_hz: u32, max_suppressed_ticks: u32) -> Self {
        Self {
            clock_hz,
            max_suppressed_ticks,
        }
    }
}

impl fmt::Display for WakeTimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WakeTimerState({} Hz, max {} ticks)",
            self.clock_hz, self.max_suppressed_ticks
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WakeTimerState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "WakeTimerState({} Hz, max {} ticks)",
            self.clock_hz,
            self.max_suppressed_ticks
        );
    }
}
