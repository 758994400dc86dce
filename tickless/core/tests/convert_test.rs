//! Clock conversion tests for tickless-core

use tickless_core::{ClockDomainConverter, TickTimerState, WakeTimerState};

#[test]
fn test_conversion_floor_policy() {
    let conv = ClockDomainConverter::new(3_000_000, 32_768).unwrap();
    // 2999 * 32768 / 3000000 = 32.757... -> floor
    assert_eq!(conv.tick_counts_to_wake_counts(2999), 32);
}

#[test]
fn test_symmetric_inverse_within_one_unit() {
    let conv = ClockDomainConverter::new(3_000_000, 6_000_000).unwrap();
    for counts in [1u32, 2999, 3000, 14_999, 1_000_000] {
        let there = conv.tick_counts_to_wake_counts(counts);
        let back = conv.wake_counts_to_tick_counts(there);
        assert!(back <= counts);
        assert!(counts - back <= 1);
    }
}

#[test]
fn test_clamp_bound_keeps_reload_in_32_bits() {
    // Scenario C arithmetic: a huge request clamped to the derived maximum
    // must leave the reload product representable in 32 bits.
    let state = TickTimerState::derive(1000, 3_000_000).unwrap();
    let requested = 10_000_000u32.min(state.max_suppressed_ticks).min(50_000);
    assert_eq!(requested, 50_000);
    let reload = state
        .counts_per_tick
        .checked_mul(requested - 1)
        .and_then(|v| v.checked_add(state.counts_per_tick));
    assert!(reload.is_some());
}

#[test]
fn test_derived_maximum_has_headroom() {
    let state = TickTimerState::derive(1000, 3_000_000).unwrap();
    // Even at the maximum, one more full period of counts still fits.
    let worst = u64::from(state.counts_per_tick) * u64::from(state.max_suppressed_ticks)
        + u64::from(state.counts_per_tick);
    assert!(worst <= u64::from(u32::MAX));

    let wake = WakeTimerState::derive(6_000_000, 1000).unwrap();
    let worst = u64::from(6_000_000u32 / 1000) * u64::from(wake.max_suppressed_ticks);
    assert!(worst <= u64::from(u32::MAX));
}
