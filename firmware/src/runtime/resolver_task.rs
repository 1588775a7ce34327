use embassy_stm32::gpio::Input;
use ranging_core::{DistanceResolver, RangingConfig};

use super::{CYCLE_SIGNAL, READING_QUEUE, TIMING_QUEUE, echo_isr};
use crate::ranging::{ChannelReadings, ChannelTimings, SignalCycles};
use crate::{status, telemetry};

/// Turns echo widths into readings, one per observed cycle.
///
/// Owns the echo input so the pin stays configured for the EXTI line.
#[embassy_executor::task]
pub async fn run(_echo: Input<'static>, config: RangingConfig) -> ! {
    let mut resolver = DistanceResolver::new(
        SignalCycles::new(&CYCLE_SIGNAL),
        ChannelTimings::new(TIMING_QUEUE.receiver()),
        ChannelReadings::new(READING_QUEUE.sender()),
        config,
    );

    loop {
        let report = resolver.resolve_cycle().await;
        let cycle = status::record(&report);
        status::record_dropped_timings(echo_isr::dropped_timings());
        telemetry::log_cycle(cycle, &report);
        if status::report_due(cycle) {
            telemetry::log_status(&status::snapshot());
        }
    }
}
