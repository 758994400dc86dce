//! Platform layer
//!
//! The sleep scheduler contains no architecture-specific instructions.
//! Interrupt masking and the wait-for-interrupt primitive come from a
//! [`Platform`] implementation, and critical sections are expressed as a
//! scoped [`InterruptGuard`] that restores the prior mask on every exit
//! path. The guard is also the only way to reach the wait instruction,
//! which keeps the single legal suspension point inside a critical
//! section by construction.

/// Architecture services consumed by the sleep scheduler
///
/// Implementations must pick a low-power state in `wait_for_interrupt`
/// that keeps the wake timer's clock domain alive; that selection is a
/// platform precondition, not something the scheduler computes.
pub trait Platform {
    /// Mask interrupts, returning whether they were previously enabled
    fn disable_interrupts(&mut self) -> bool;

    /// Restore the interrupt mask captured by `disable_interrupts`
    fn restore_interrupts(&mut self, was_enabled: bool);

    /// Block until any enabled interrupt is requested
    ///
    /// With interrupts masked this returns once an interrupt becomes
    /// pending without running its handler, which is exactly what the
    /// reconciliation sequence relies on.
    fn wait_for_interrupt(&mut self);
}

/// Scoped critical section over a [`Platform`]
///
/// Acquiring the guard masks interrupts; dropping it restores the prior
/// mask. Nesting is safe because the prior state travels with each guard.
pub struct InterruptGuard<'a, P: Platform> {
    platform: &'a mut P,
    was_enabled: bool,
}

impl<'a, P: Platform> InterruptGuard<'a, P> {
    /// Mask interrupts and capture the prior state
    pub fn acquire(platform: &'a mut P) -> Self {
        let was_enabled = platform.disable_interrupts();
        Self {
            platform,
            was_enabled,
        }
    }

    /// Execute the wait-for-interrupt primitive while masked
    pub fn wait_for_interrupt(&mut self) {
        self.platform.wait_for_interrupt();
    }
}

impl<P: Platform> Drop for InterruptGuard<'_, P> {
    fn drop(&mut self) {
        self.platform.restore_interrupts(self.was_enabled);
    }
}

/// Cortex-M implementation over PRIMASK and `wfi`
#[cfg(target_arch = "arm")]
pub struct CortexM;

#[cfg(target_arch = "arm")]
impl Platform for CortexM {
    fn disable_interrupts(&mut self) -> bool {
        let was_enabled = cortex_m::register::primask::read().is_active();
        cortex_m::interrupt::disable();
        was_enabled
    }

    fn restore_interrupts(&mut self, was_enabled: bool) {
        if was_enabled {
            // Safety: only re-enables what disable_interrupts masked.
            unsafe { cortex_m::interrupt::enable() };
        }
    }

    fn wait_for_interrupt(&mut self) {
        cortex_m::asm::wfi();
    }
}
