//! Sleep scheduler
//!
//! The core of the tickless idle path: decides how long the CPU may
//! sleep, arms the wake source, blocks, and reconciles the kernel's tick
//! counter afterwards. The whole body runs with interrupts masked except
//! for the wait instruction itself and a brief window right after resume
//! in which the waking ISR is allowed to execute.
//!
//! Mutual exclusion with the ordinary per-tick interrupt is structural:
//! the tick timer is fully stopped before any bookkeeping happens and
//! normal ticking does not resume until the corrected reload is
//! committed, so for any interval the tick counter is advanced from
//! exactly one of the two paths.

use core::fmt;

use tickless_core::TlResult;
use tickless_timer::{TickTimerDriver, TickTimerHw};

use crate::platform::{InterruptGuard, Platform};
use crate::source::WakeSource;

/// Smallest reload ever scheduled; a zero-length period would park the
/// timer without a coming interrupt
const MIN_RELOAD_COUNTS: u32 = 1;

/// Services the sleep scheduler consumes from the task scheduler
///
/// The kernel tick counter stays exclusively owned by the implementor;
/// this subsystem only ever advances it through `step_tick_count`.
pub trait TaskScheduler {
    /// Ticks until the next task needs the CPU, queried once per idle
    /// cycle
    fn idle_time_available_ticks(&self) -> u32;

    /// Re-check inside the critical section that sleeping is still
    /// permitted (no context switch became pending)
    fn confirm_sleep_permitted(&self) -> bool;

    /// Advance the kernel tick counter by `n` elapsed ticks
    fn step_tick_count(&mut self, n: u32);

    /// Application hook before the wait instruction
    ///
    /// May reduce the planned sleep, including to zero to skip the wait
    /// instruction entirely for this cycle. Increases are ignored.
    fn pre_sleep_hook(&mut self, _planned_ticks: &mut u32) {}

    /// Application hook after resume, given the originally planned sleep
    fn post_sleep_hook(&mut self, _planned_ticks: u32) {}
}

/// Lifecycle of one suppression attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    /// Normal ticking; no attempt in flight
    Running,
    /// Critical section entered, timers being reprogrammed
    EnteringSleep,
    /// Blocked on the wait instruction
    Asleep,
    /// Awake again, elapsed ticks being accounted
    Reconciling,
}

impl fmt::Display for SleepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepState::Running => write!(f, "Running"),
            SleepState::EnteringSleep => write!(f, "EnteringSleep"),
            SleepState::Asleep => write!(f, "Asleep"),
            SleepState::Reconciling => write!(f, "Reconciling"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SleepState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SleepState::Running => defmt::write!(fmt, "Running"),
            SleepState::EnteringSleep => defmt::write!(fmt, "EnteringSleep"),
            SleepState::Asleep => defmt::write!(fmt, "Asleep"),
            SleepState::Reconciling => defmt::write!(fmt, "Reconciling"),
        }
    }
}

/// One idle task request to suppress ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    /// Ticks the idle task would like to sleep
    pub requested_ticks: u32,
}

impl SleepRequest {
    /// Create a request for `requested_ticks` ticks
    pub const fn new(requested_ticks: u32) -> Self {
        Self { requested_ticks }
    }

    /// Clamp the request to a domain's suppressible maximum
    pub fn clamped(self, max_suppressed_ticks: u32) -> Self {
        Self {
            requested_ticks: self.requested_ticks.min(max_suppressed_ticks),
        }
    }
}

/// Result of one suppression attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepOutcome {
    /// Whole ticks that elapsed and were credited to the kernel counter
    pub actual_ticks_elapsed: u32,
    /// True when the attempt ended before any suppression happened
    pub aborted: bool,
}

impl SleepOutcome {
    const fn aborted() -> Self {
        Self {
            actual_ticks_elapsed: 0,
            aborted: true,
        }
    }

    const fn completed(actual_ticks_elapsed: u32) -> Self {
        Self {
            actual_ticks_elapsed,
            aborted: false,
        }
    }
}

impl fmt::Display for SleepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.aborted {
            write!(f, "aborted")
        } else {
            write!(f, "{} ticks elapsed", self.actual_ticks_elapsed)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SleepOutcome {
    fn format(&self, fmt: defmt::Formatter) {
        if self.aborted {
            defmt::write!(fmt, "aborted");
        } else {
            defmt::write!(fmt, "{} ticks elapsed", self.actual_ticks_elapsed);
        }
    }
}

/// Configuration for the sleep scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepConfig {
    /// Kernel tick rate in Hz
    pub tick_rate_hz: u32,
    /// Input clock of the tick timer in Hz
    pub tick_timer_clock_hz: u32,
    /// Calibrated count of tick-timer cycles consumed by this routine
    /// while the timer is stopped
    ///
    /// Empirically tuned per platform and clock setup; there is no
    /// derivable formula, which is why it is a configuration parameter.
    pub stopped_timer_compensation: u32,
}

impl SleepConfig {
    /// Configuration with no stopped-timer compensation
    pub const fn new(tick_rate_hz: u32, tick_timer_clock_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            tick_timer_clock_hz,
            stopped_timer_compensation: 0,
        }
    }

    /// Apply a calibrated stopped-timer compensation
    pub const fn with_stopped_timer_compensation(mut self, counts: u32) -> Self {
        self.stopped_timer_compensation = counts;
        self
    }
}

/// The tickless idle sleep scheduler
///
/// Owns the tick timer, the wake source and the platform services for the
/// process lifetime; the derived clock constants live in the drivers, not
/// in globals.
pub struct SleepScheduler<T: TickTimerHw, W: WakeSource, P: Platform> {
    tick: TickTimerDriver<T>,
    wake: W,
    platform: P,
    config: SleepConfig,
    state: SleepState,
}

impl<T: TickTimerHw, W: WakeSource, P: Platform> SleepScheduler<T, W, P> {
    /// One-time timer setup
    ///
    /// Derives the clock constants, programs the tick timer for ordinary
    /// per-period ticking and starts it. Must run before any suppression
    /// attempt.
    pub fn configure(tick_hw: T, wake: W, config: SleepConfig, platform: P) -> TlResult<Self> {
        let mut tick = TickTimerDriver::init(tick_hw, config.tick_rate_hz, config.tick_timer_clock_hz)?;
        tick.restart(tick.state().standard_reload());

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "tickless configured: {} counts/tick, max {} ticks",
            tick.state().counts_per_tick,
            tick.state().max_suppressed_ticks
        );

        Ok(Self {
            tick,
            wake,
            platform,
            config,
            state: SleepState::Running,
        })
    }

    /// Current lifecycle state of the subsystem
    pub fn state(&self) -> SleepState {
        self.state
    }

    /// Whether the tick timer is currently counting
    pub fn tick_timer_running(&self) -> bool {
        self.tick.is_running()
    }

    /// Run one idle cycle: query the available idle time once and attempt
    /// to suppress ticks for it
    pub fn run_idle_cycle(&mut self, sched: &mut dyn TaskScheduler) -> SleepOutcome {
        let available = sched.idle_time_available_ticks();
        self.attempt_suppressed_sleep(sched, available)
    }

    /// Ordinary per-tick servicing
    ///
    /// Advances the kernel tick counter for a pending tick interrupt.
    /// While a suppression attempt is in flight the tick timer is stopped
    /// and this path does nothing, so the counter is only ever advanced
    /// from one place for a given interval.
    pub fn service_tick(&mut self, sched: &mut dyn TaskScheduler) {
        if self.state != SleepState::Running {
            return;
        }
        if self.tick.service_tick() {
            sched.step_tick_count(1);
        }
    }

    /// Acknowledge the wake interrupt from the ISR path
    ///
    /// Returns false for a wake that fired after `disarm` already ran;
    /// such a wake is a benign race and is discarded.
    pub fn handle_wake_interrupt(&mut self) -> bool {
        let genuine = self.wake.acknowledge_wake();

        #[cfg(feature = "defmt")]
        if !genuine {
            defmt::trace!("stale wake discarded");
        }

        genuine
    }

    /// Attempt to sleep for `requested_ticks` tick periods with the
    /// periodic tick interrupt suppressed
    ///
    /// Returns how many whole ticks actually elapsed and were credited to
    /// the kernel counter. Aborts without touching the timers when the
    /// request is too short to be worth the overhead or when the task
    /// scheduler withdraws permission inside the critical section.
    pub fn attempt_suppressed_sleep(
        &mut self,
        sched: &mut dyn TaskScheduler,
        requested_ticks: u32,
    ) -> SleepOutcome {
        // One tick or less is not worth the reprogramming overhead; the
        // ordinary tick path handles it.
        if requested_ticks < 2 {
            return SleepOutcome::aborted();
        }

        let request = SleepRequest::new(requested_ticks)
            .clamped(self.tick.state().max_suppressed_ticks)
            .clamped(self.wake.max_suppressed_ticks());
        let requested = request.requested_ticks;
        let counts_per_tick = self.tick.state().counts_per_tick;

        self.state = SleepState::EnteringSleep;

        // The permission re-check and the commitment to sleep must be one
        // atomic step, otherwise a wakeup posted in between is lost.
        let mut guard = InterruptGuard::acquire(&mut self.platform);

        if !sched.confirm_sleep_permitted() {
            self.state = SleepState::Running;
            drop(guard);

            #[cfg(feature = "defmt")]
            defmt::trace!("sleep abandoned: context switch pending");

            return SleepOutcome::aborted();
        }

        self.tick.stop();
        let leftover_counts = self.tick.current_remaining();

        // The window spans the rest of the current period plus the
        // requested full periods beyond it.
        let mut reload_counts = leftover_counts + counts_per_tick * (requested - 1);
        if self.tick.pending_interrupt() {
            // The current period already ended unserviced; fold that tick
            // into the plan instead of counting it twice.
            self.tick.clear_pending_interrupt();
            reload_counts -= counts_per_tick;
        }
        reload_counts = reload_counts
            .saturating_sub(self.config.stopped_timer_compensation)
            .max(MIN_RELOAD_COUNTS);

        let planned_delta = self.wake.arm(reload_counts);

        self.state = SleepState::Asleep;

        let mut planned_wait = requested;
        sched.pre_sleep_hook(&mut planned_wait);
        if planned_wait.min(requested) > 0 {
            guard.wait_for_interrupt();
        }
        sched.post_sleep_hook(requested);

        // Open the mask briefly so the interrupt that ended the sleep can
        // run its handler, then close it again for reconciliation.
        drop(guard);
        let guard = InterruptGuard::acquire(&mut self.platform);

        self.state = SleepState::Reconciling;

        let wake_elapsed = self.wake.elapsed_since_arm();

        let (actual_ticks, next_reload) = if wake_elapsed >= planned_delta {
            // The planned wake ended the sleep (or more time passed than
            // planned). Whatever the resume path overran eats into the
            // next period.
            let exceeded_counts = self.wake.to_tick_counts(wake_elapsed - planned_delta);
            assert!(
                exceeded_counts < counts_per_tick,
                "wake/resume path overran a full tick period"
            );

            let mut calculated = (counts_per_tick - 1) - exceeded_counts;
            if calculated <= self.config.stopped_timer_compensation
                || calculated > counts_per_tick
            {
                calculated = counts_per_tick - 1;
            }
            (requested, calculated)
        } else {
            // Something else woke the CPU first. Round the sleep down to
            // whole tick periods and land the next interrupt on the
            // boundary of the partially elapsed one.
            let native_left = planned_delta - wake_elapsed;
            let counts_left = self.wake.to_tick_counts(native_left);
            let completed_counts = requested * counts_per_tick - counts_left;
            let completed_ticks = completed_counts / counts_per_tick;
            let partial = (completed_ticks + 1) * counts_per_tick - completed_counts;
            (completed_ticks, partial.max(MIN_RELOAD_COUNTS))
        };

        // A stale pending wake must never survive into the next cycle.
        self.wake.disarm();

        self.tick.restart(next_reload);
        sched.step_tick_count(actual_ticks);

        self.state = SleepState::Running;
        drop(guard);

        SleepOutcome::completed(actual_ticks)
    }
}
