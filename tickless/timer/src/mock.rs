//! Simulation doubles for the timer hardware
//!
//! `SimBus` models the register file of both timers with interior
//! mutability, so a test can hold several handles to the same simulated
//! hardware the way real zero-sized register handles alias a peripheral.
//! Time only moves when a test calls one of the `advance_*` methods,
//! which makes every scenario deterministic.

use core::cell::{Cell, RefCell};

use crate::hw::{TickTimerHw, WakeTimerHw};

/// Hardware accesses recorded by the bus, for assertions on driver
/// behavior rather than just end state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    TickEnabled(bool),
    TickReload(u32),
    TickReset,
    TickPendingCleared,
    WakeCompareDelta(u32),
    WakeCompareEnabled(bool),
    WakePendingCleared,
}

/// Simulated register file shared by the mock timer handles
pub struct SimBus {
    tick_enabled: Cell<bool>,
    tick_current: Cell<u32>,
    tick_reload: Cell<u32>,
    tick_pending: Cell<bool>,
    wake_counter: Cell<u32>,
    wake_compare_target: Cell<u32>,
    wake_compare_enabled: Cell<bool>,
    wake_pending: Cell<bool>,
    ops: RefCell<heapless::Vec<BusOp, 64>>,
}

impl SimBus {
    pub const fn new() -> Self {
        Self {
            tick_enabled: Cell::new(false),
            tick_current: Cell::new(0),
            tick_reload: Cell::new(0),
            tick_pending: Cell::new(false),
            wake_counter: Cell::new(0),
            wake_compare_target: Cell::new(0),
            wake_compare_enabled: Cell::new(false),
            wake_pending: Cell::new(false),
            ops: RefCell::new(heapless::Vec::new()),
        }
    }

    fn record(&self, op: BusOp) {
        // Saturating: records past the capacity are dropped.
        let _ = self.ops.borrow_mut().push(op);
    }

    /// Snapshot of the recorded hardware accesses
    pub fn ops(&self) -> heapless::Vec<BusOp, 64> {
        self.ops.borrow().clone()
    }

    /// Advance the tick timer's clock by `counts`
    ///
    /// Models the countdown-and-reload behavior: the pending flag is
    /// raised on the 1 -> 0 transition, the value parks at 0 for one
    /// count, and the next count loads the reload register. A full
    /// period of a timer reloading `n` therefore spans `n + 1` counts.
    /// A disabled timer is frozen.
    pub fn advance_tick_counts(&self, mut counts: u32) {
        if !self.tick_enabled.get() {
            return;
        }
        let mut current = self.tick_current.get();
        while counts > 0 {
            if current == 0 {
                current = self.tick_reload.get();
                counts -= 1;
            } else if counts < current {
                current -= counts;
                counts = 0;
            } else {
                counts -= current;
                current = 0;
                self.tick_pending.set(true);
            }
        }
        self.tick_current.set(current);
    }

    /// Advance the wake timer's clock by `counts`
    ///
    /// The free-running counter wraps at 32 bits; an enabled compare
    /// channel raises the pending flag once when the counter crosses the
    /// programmed target.
    pub fn advance_wake_counts(&self, counts: u32) {
        let counter = self.wake_counter.get();
        if self.wake_compare_enabled.get() {
            let until_match = self.wake_compare_target.get().wrapping_sub(counter);
            if until_match != 0 && counts >= until_match {
                self.wake_pending.set(true);
                self.wake_compare_enabled.set(false);
            }
        }
        self.wake_counter.set(counter.wrapping_add(counts));
    }

    /// Wake counts remaining until the armed compare match
    pub fn wake_counts_until_match(&self) -> u32 {
        if self.wake_compare_enabled.get() {
            self.wake_compare_target
                .get()
                .wrapping_sub(self.wake_counter.get())
        } else {
            0
        }
    }

    /// Current tick-timer counter value
    pub fn tick_current(&self) -> u32 {
        self.tick_current.get()
    }

    /// Whether the tick timer is enabled
    pub fn tick_enabled(&self) -> bool {
        self.tick_enabled.get()
    }

    /// Whether a tick interrupt is pending
    pub fn tick_pending(&self) -> bool {
        self.tick_pending.get()
    }

    /// Current wake counter value
    pub fn wake_counter(&self) -> u32 {
        self.wake_counter.get()
    }

    /// Whether a wake compare match is pending
    pub fn wake_pending(&self) -> bool {
        self.wake_pending.get()
    }

    /// Whether the wake compare channel is armed
    pub fn wake_compare_enabled(&self) -> bool {
        self.wake_compare_enabled.get()
    }

    /// Force the tick counter to a raw value (edge-case setup)
    pub fn force_tick_current(&self, value: u32) {
        self.tick_current.set(value);
    }

    /// Raise the tick pending flag directly (edge-case setup)
    pub fn force_tick_pending(&self) {
        self.tick_pending.set(true);
    }

    /// Force the wake counter to a raw value (edge-case setup)
    pub fn force_wake_counter(&self, value: u32) {
        self.wake_counter.set(value);
    }

    /// Raise the wake pending flag directly (edge-case setup)
    pub fn force_wake_pending(&self) {
        self.wake_pending.set(true);
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock handle implementing the tick timer register contract
pub struct MockTickTimer<'a> {
    bus: &'a SimBus,
}

impl<'a> MockTickTimer<'a> {
    pub fn new(bus: &'a SimBus) -> Self {
        Self { bus }
    }
}

impl TickTimerHw for MockTickTimer<'_> {
    fn set_enabled(&mut self, enabled: bool) {
        self.bus.tick_enabled.set(enabled);
        self.bus.record(BusOp::TickEnabled(enabled));
    }

    fn current(&self) -> u32 {
        self.bus.tick_current.get()
    }

    fn set_reload(&mut self, value: u32) {
        self.bus.tick_reload.set(value);
        self.bus.record(BusOp::TickReload(value));
    }

    fn reset_counter(&mut self) {
        self.bus.tick_current.set(self.bus.tick_reload.get());
        self.bus.record(BusOp::TickReset);
    }

    fn pending(&self) -> bool {
        self.bus.tick_pending.get()
    }

    fn clear_pending(&mut self) {
        self.bus.tick_pending.set(false);
        self.bus.record(BusOp::TickPendingCleared);
    }
}

/// Mock handle implementing the wake timer register contract
pub struct MockWakeTimer<'a> {
    bus: &'a SimBus,
}

impl<'a> MockWakeTimer<'a> {
    pub fn new(bus: &'a SimBus) -> Self {
        Self { bus }
    }
}

impl WakeTimerHw for MockWakeTimer<'_> {
    fn counter(&self) -> u32 {
        self.bus.wake_counter.get()
    }

    fn set_compare_delta(&mut self, delta: u32) {
        let target = self.bus.wake_counter.get().wrapping_add(delta);
        self.bus.wake_compare_target.set(target);
        self.bus.record(BusOp::WakeCompareDelta(delta));
    }

    fn enable_compare(&mut self) {
        self.bus.wake_compare_enabled.set(true);
        self.bus.record(BusOp::WakeCompareEnabled(true));
    }

    fn disable_compare(&mut self) {
        self.bus.wake_compare_enabled.set(false);
        self.bus.record(BusOp::WakeCompareEnabled(false));
    }

    fn pending(&self) -> bool {
        self.bus.wake_pending.get()
    }

    fn clear_pending(&mut self) {
        self.bus.wake_pending.set(false);
        self.bus.record(BusOp::WakePendingCleared);
    }
}
