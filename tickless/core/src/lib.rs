#![no_std]
#![forbid(unsafe_code)]

//! # Tickless Core
//!
//! Core types and clock-domain arithmetic for the tickless idle subsystem.
//! This crate provides the derived timer constants and the conversion math
//! shared by the timer drivers and the sleep scheduler. It is pure
//! arithmetic: no hardware access and no interrupt-state manipulation
//! happens here.

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod convert;
pub mod state;

pub use convert::*;
pub use state::*;

/// Tickless subsystem version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the tickless subsystem
pub type TlResult<T> = Result<T, TlError>;

/// Error types for tickless subsystem configuration
///
/// All variants are init-time programming errors. Conditions detected while
/// a suppression attempt is in flight are fatal and halt via assertion
/// instead, because correcting them ad hoc would desynchronize the tick
/// grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlError {
    /// A clock or tick rate of zero was configured
    ZeroClockRate,
    /// The timer clock is slower than the tick rate, so one tick would
    /// span zero timer counts
    ClockRatioTooSmall,
}

impl fmt::Display for TlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlError::ZeroClockRate => write!(f, "clock rate of zero configured"),
            TlError::ClockRatioTooSmall => write!(f, "timer clock slower than the tick rate"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TlError {}

#[cfg(feature = "defmt")]
impl defmt::Format for TlError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TlError::ZeroClockRate => defmt::write!(fmt, "ZeroClockRate"),
            TlError::ClockRatioTooSmall => defmt::write!(fmt, "ClockRatioTooSmall"),
        }
    }
}
