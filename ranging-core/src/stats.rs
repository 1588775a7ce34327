//! Cycle counters surfaced by status reports.
//!
//! Only counts are kept; individual readings are never retained.

use core::fmt;

use crate::reading::CycleOutcome;
use crate::resolver::CycleReport;

/// Running totals for the ranging pipeline.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RangingStats {
    /// Resolver iterations, including missed cycles.
    pub cycles: u32,
    pub measured: u32,
    pub out_of_range: u32,
    pub echo_timeouts: u32,
    pub missed_cycles: u32,
    /// Echo widths discarded by edge capture because the timing queue was full.
    pub dropped_timings: u32,
    /// Readings discarded because the reading queue stayed full.
    pub dropped_readings: u32,
}

impl RangingStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cycles: 0,
            measured: 0,
            out_of_range: 0,
            echo_timeouts: 0,
            missed_cycles: 0,
            dropped_timings: 0,
            dropped_readings: 0,
        }
    }

    /// Folds one resolver iteration into the totals.
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles = self.cycles.wrapping_add(1);
        let counter = match report.outcome {
            CycleOutcome::Measured { .. } => &mut self.measured,
            CycleOutcome::OutOfRange { .. } => &mut self.out_of_range,
            CycleOutcome::EchoTimeout => &mut self.echo_timeouts,
            CycleOutcome::CycleMissed => &mut self.missed_cycles,
        };
        *counter = counter.wrapping_add(1);
        if report.reading_dropped() {
            self.dropped_readings = self.dropped_readings.wrapping_add(1);
        }
    }
}

impl fmt::Display for RangingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles={} measured={} out-of-range={} echo-timeouts={} missed={} dropped-timings={} dropped-readings={}",
            self.cycles,
            self.measured,
            self.out_of_range,
            self.echo_timeouts,
            self.missed_cycles,
            self.dropped_timings,
            self.dropped_readings,
        )
    }
}
