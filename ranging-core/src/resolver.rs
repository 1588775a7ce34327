//! Distance resolver: turns cycle signals and echo widths into readings.
//!
//! Each call to [`DistanceResolver::resolve_cycle`] performs one iteration of
//! the resolver loop:
//!
//! 1. wait for the cycle-start signal (bounded by `cycle_timeout`); on timeout
//!    the iteration ends with [`CycleOutcome::CycleMissed`] and nothing is
//!    published,
//! 2. wait for an echo width (bounded by `echo_timeout`),
//! 3. classify the width and publish exactly one reading, the `-1` sentinel
//!    standing in for a missing or out-of-band echo.
//!
//! Cycle signals and echo widths arrive through independent channels and are
//! not correlated; a width left over from an earlier cycle is consumed by the
//! next one in FIFO order.
//!
//! The waits are expressed through the [`CycleSource`], [`TimingSource`], and
//! [`ReadingSink`] traits so the same loop runs on Embassy primitives in the
//! firmware and on stepped host queues in the emulator.

use core::fmt;
use core::time::Duration;

use crate::capture::TimingResult;
use crate::config::RangingConfig;
use crate::reading::{CycleOutcome, DistanceReading};

/// Source of cycle-start notifications.
#[allow(async_fn_in_trait)]
pub trait CycleSource {
    /// Waits up to `timeout` for the cycle signal, consuming it.
    ///
    /// Returns `false` when the wait timed out.
    async fn wait_cycle(&mut self, timeout: Duration) -> bool;
}

/// Source of echo widths produced by edge capture.
#[allow(async_fn_in_trait)]
pub trait TimingSource {
    /// Waits up to `timeout` for the oldest pending width.
    async fn next_timing(&mut self, timeout: Duration) -> Option<TimingResult>;
}

/// Error surfaced when a reading could not be delivered to the consumer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadingPublishError {
    /// The reading queue stayed full for the whole publish window.
    TimedOut,
}

impl fmt::Display for ReadingPublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingPublishError::TimedOut => f.write_str("reading queue full until timeout"),
        }
    }
}

/// Destination for resolved readings.
#[allow(async_fn_in_trait)]
pub trait ReadingSink {
    /// Sends `reading`, waiting at most `timeout` for queue space.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingPublishError::TimedOut`] when no space freed up in time.
    async fn publish(
        &mut self,
        reading: DistanceReading,
        timeout: Duration,
    ) -> Result<(), ReadingPublishError>;
}

/// Summary of one resolver iteration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Reading handed to the consumer, if one was produced and delivered.
    pub delivered: Option<DistanceReading>,
}

impl CycleReport {
    /// Returns `true` when a reading was produced but the sink rejected it.
    #[must_use]
    pub const fn reading_dropped(&self) -> bool {
        self.outcome.reading().is_some() && self.delivered.is_none()
    }
}

/// Waits for cycles and echo widths and publishes validated readings.
pub struct DistanceResolver<C, T, R> {
    cycles: C,
    timings: T,
    readings: R,
    config: RangingConfig,
}

impl<C, T, R> DistanceResolver<C, T, R>
where
    C: CycleSource,
    T: TimingSource,
    R: ReadingSink,
{
    #[must_use]
    pub fn new(cycles: C, timings: T, readings: R, config: RangingConfig) -> Self {
        Self {
            cycles,
            timings,
            readings,
            config,
        }
    }

    /// Runs one iteration of the resolver loop.
    pub async fn resolve_cycle(&mut self) -> CycleReport {
        if !self.cycles.wait_cycle(self.config.cycle_timeout).await {
            return CycleReport {
                outcome: CycleOutcome::CycleMissed,
                delivered: None,
            };
        }

        let outcome = match self.timings.next_timing(self.config.echo_timeout).await {
            Some(echo) => CycleOutcome::classify(echo, &self.config),
            None => CycleOutcome::EchoTimeout,
        };

        let delivered = match outcome.reading() {
            Some(reading) => self
                .readings
                .publish(reading, self.config.publish_timeout)
                .await
                .ok()
                .map(|()| reading),
            None => None,
        };

        CycleReport { outcome, delivered }
    }
}
