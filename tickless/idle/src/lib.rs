#![no_std]

//! # Tickless Idle
//!
//! The sleep scheduler for the kernel's idle path. When no task is ready,
//! the idle task asks this subsystem to suppress the periodic tick
//! interrupt: the tick timer is stopped, a one-shot wake is armed for the
//! whole idle window, the CPU blocks on the wait-for-interrupt primitive,
//! and on resume the kernel's tick counter is stepped by exactly the
//! number of whole tick periods that passed, wherever the wakeup came
//! from.
//!
//! Everything architecture-specific (interrupt masking, the wait
//! instruction, low-power mode selection) lives behind the [`Platform`]
//! trait; the choice between reusing the tick timer and arming an
//! independent wake timer lives behind [`WakeSource`].

pub mod isr;
pub mod platform;
pub mod scheduler;
pub mod source;

pub use isr::{clear_wake_handler, dispatch_wake_interrupt, register_wake_handler, WakeHandler};
pub use platform::{InterruptGuard, Platform};
pub use scheduler::{
    SleepConfig, SleepOutcome, SleepRequest, SleepScheduler, SleepState, TaskScheduler,
};
pub use source::{SameTimerWakeSource, SecondaryTimerWakeSource, WakeSource};

#[cfg(target_arch = "arm")]
pub use platform::CortexM;
