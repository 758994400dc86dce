//! Wake interrupt registration
//!
//! The wake timer's interrupt vector is wired up by an explicit
//! registration call instead of weak/aliased linker symbols. The actual
//! vector entry calls [`dispatch_wake_interrupt`]; whatever the
//! application registered runs from there. Registration storage sits
//! behind a critical section because registration happens in thread
//! context while dispatch runs from the ISR.

use core::cell::Cell;

use critical_section::Mutex;

/// Handler invoked from the wake interrupt vector
pub type WakeHandler = fn();

static WAKE_HANDLER: Mutex<Cell<Option<WakeHandler>>> = Mutex::new(Cell::new(None));

/// Register the function to run when the wake interrupt fires
///
/// Replaces any previously registered handler.
pub fn register_wake_handler(handler: WakeHandler) {
    critical_section::with(|cs| WAKE_HANDLER.borrow(cs).set(Some(handler)));
}

/// Remove the registered wake handler
pub fn clear_wake_handler() {
    critical_section::with(|cs| WAKE_HANDLER.borrow(cs).set(None));
}

/// Entry point for the wake interrupt vector
///
/// Safe to call with nothing registered; the interrupt is then simply
/// ignored.
pub fn dispatch_wake_interrupt() {
    let handler = critical_section::with(|cs| WAKE_HANDLER.borrow(cs).get());
    if let Some(handler) = handler {
        handler();
    }
}
