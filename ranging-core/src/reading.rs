//! Distance readings and the per-cycle outcome classification.
//!
//! A [`DistanceReading`] is what the consumer sees: a centimetre value inside
//! the configured band or the `-1` sentinel. [`CycleOutcome`] keeps the reason
//! behind each reading so runtime crates can count and log it, then collapses
//! to the public domain through [`CycleOutcome::reading`].

use core::fmt;

use crate::capture::TimingResult;
use crate::config::RangingConfig;

/// Raw value published when a cycle produced no valid distance.
pub const NO_READING_SENTINEL: i32 = -1;

/// Reading delivered to the consumer once per resolved cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DistanceReading {
    /// Validated distance in whole centimetres.
    Centimeters(i32),
    /// Missing echo or echo outside the measurable band.
    NoReading,
}

impl DistanceReading {
    /// Encodes the reading into the integer domain used on the result channel.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            DistanceReading::Centimeters(cm) => cm,
            DistanceReading::NoReading => NO_READING_SENTINEL,
        }
    }
}

impl fmt::Display for DistanceReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceReading::Centimeters(cm) => write!(f, "{cm} cm"),
            DistanceReading::NoReading => f.write_str("no reading"),
        }
    }
}

/// Converts an echo width into whole centimetres, truncating toward zero.
///
/// Saturates at the `i32` bounds for absurd widths (for example a falling edge
/// measured against a scratch timestamp that was never written).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn echo_to_centimeters(echo: TimingResult, cm_per_microsecond: f64) -> i32 {
    (echo.as_micros() as f64 * cm_per_microsecond) as i32
}

/// Result of one resolver iteration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CycleOutcome {
    /// Echo converted to a distance inside the accepted band.
    Measured { echo: TimingResult, distance_cm: i32 },
    /// Echo converted to a distance outside the accepted band.
    OutOfRange { echo: TimingResult, distance_cm: i32 },
    /// The cycle started but no echo width arrived in time.
    EchoTimeout,
    /// No cycle-start signal arrived in time.
    CycleMissed,
}

impl CycleOutcome {
    /// Classifies an echo width against the configured scale and band.
    #[must_use]
    pub fn classify(echo: TimingResult, config: &RangingConfig) -> Self {
        let distance_cm = echo_to_centimeters(echo, config.cm_per_microsecond);
        if config.in_range(distance_cm) {
            CycleOutcome::Measured { echo, distance_cm }
        } else {
            CycleOutcome::OutOfRange { echo, distance_cm }
        }
    }

    /// Reading to publish for this outcome, or `None` when the cycle is skipped.
    #[must_use]
    pub const fn reading(self) -> Option<DistanceReading> {
        match self {
            CycleOutcome::Measured { distance_cm, .. } => {
                Some(DistanceReading::Centimeters(distance_cm))
            }
            CycleOutcome::OutOfRange { .. } | CycleOutcome::EchoTimeout => {
                Some(DistanceReading::NoReading)
            }
            CycleOutcome::CycleMissed => None,
        }
    }

    /// Short label used by log lines and transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            CycleOutcome::Measured { .. } => "measured",
            CycleOutcome::OutOfRange { .. } => "out-of-range",
            CycleOutcome::EchoTimeout => "echo-timeout",
            CycleOutcome::CycleMissed => "cycle-missed",
        }
    }
}
