#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Lightweight atomics keep the ranging counters so the reading task can
//! surface a [`RangingStats`] snapshot without sharing the resolver's state.

use portable_atomic::{AtomicU32, Ordering};
use ranging_core::{CycleOutcome, CycleReport, RangingStats};

/// Resolver iterations, including missed cycles.
static CYCLES: AtomicU32 = AtomicU32::new(0);
static MEASURED: AtomicU32 = AtomicU32::new(0);
static OUT_OF_RANGE: AtomicU32 = AtomicU32::new(0);
static ECHO_TIMEOUTS: AtomicU32 = AtomicU32::new(0);
static MISSED_CYCLES: AtomicU32 = AtomicU32::new(0);
/// Mirror of the edge-capture drop counter (the ISR owns the source value).
static DROPPED_TIMINGS: AtomicU32 = AtomicU32::new(0);
static DROPPED_READINGS: AtomicU32 = AtomicU32::new(0);

/// Number of cycles between periodic status reports.
pub const STATUS_REPORT_EVERY: u32 = 50;

/// Folds one resolver iteration into the counters.
///
/// Returns the updated cycle count.
pub fn record(report: &CycleReport) -> u32 {
    let counter = match report.outcome {
        CycleOutcome::Measured { .. } => &MEASURED,
        CycleOutcome::OutOfRange { .. } => &OUT_OF_RANGE,
        CycleOutcome::EchoTimeout => &ECHO_TIMEOUTS,
        CycleOutcome::CycleMissed => &MISSED_CYCLES,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    if report.reading_dropped() {
        DROPPED_READINGS.fetch_add(1, Ordering::Relaxed);
    }
    CYCLES.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Stores the latest dropped-timing total reported by edge capture.
pub fn record_dropped_timings(total: u32) {
    DROPPED_TIMINGS.store(total, Ordering::Relaxed);
}

/// Whether a summary is due after `cycles` resolver iterations.
pub const fn report_due(cycles: u32) -> bool {
    cycles != 0 && cycles % STATUS_REPORT_EVERY == 0
}

/// Builds a [`RangingStats`] using the stored counters.
pub fn snapshot() -> RangingStats {
    RangingStats {
        cycles: CYCLES.load(Ordering::Relaxed),
        measured: MEASURED.load(Ordering::Relaxed),
        out_of_range: OUT_OF_RANGE.load(Ordering::Relaxed),
        echo_timeouts: ECHO_TIMEOUTS.load(Ordering::Relaxed),
        missed_cycles: MISSED_CYCLES.load(Ordering::Relaxed),
        dropped_timings: DROPPED_TIMINGS.load(Ordering::Relaxed),
        dropped_readings: DROPPED_READINGS.load(Ordering::Relaxed),
    }
}
