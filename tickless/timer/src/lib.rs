#![no_std]
#![forbid(unsafe_code)]

//! # Tickless Timer Drivers
//!
//! Drivers for the two timers the tickless idle subsystem owns: the
//! periodic countdown tick timer and the free-running wake timer with its
//! one-shot compare-match channel. Hardware access goes through the
//! register-contract traits in [`hw`], so the drivers carry no vendor
//! register names and can run against the simulation doubles in [`mock`].

pub mod hw;
pub mod tick;
pub mod wake;

#[cfg(feature = "mock")]
pub mod mock;

pub use hw::*;
pub use tick::TickTimerDriver;
pub use wake::WakeTimerDriver;
