//! EXTI handler timestamping echo edges.
//!
//! Runs in interrupt context: no logging, no waiting. Each edge is stamped
//! with the monotonic clock as soon as the handler starts, and completed
//! widths go to the timing queue through the non-blocking sink.

use embassy_stm32::interrupt;
use embassy_time::Instant;
use ranging_core::EdgeCapture;

use super::TIMING_QUEUE;
use crate::hw;
use crate::ranging::IsrTimingSink;

static ECHO_CAPTURE: EdgeCapture = EdgeCapture::new();

/// Widths discarded because the timing queue was full.
pub fn dropped_timings() -> u32 {
    ECHO_CAPTURE.dropped()
}

#[interrupt]
#[allow(non_snake_case)]
fn EXTI4_15() {
    let now_us = i64::try_from(Instant::now().as_micros()).unwrap_or(i64::MAX);
    let sink = IsrTimingSink::new(TIMING_QUEUE.sender());
    for edge in hw::take_pending_edges().into_iter().flatten() {
        ECHO_CAPTURE.on_edge(edge, now_us, &sink);
    }
}
