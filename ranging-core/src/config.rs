//! Timing and conversion parameters for the ranging pipeline.
//!
//! Every constant that shapes a measurement cycle lives here as a named field
//! of [`RangingConfig`]. The values are fixed at build time; the firmware
//! validates the chosen configuration once during start-up.

use core::fmt;
use core::time::Duration;

/// Depth of the queue carrying echo widths from interrupt context to the resolver.
pub const TIMING_QUEUE_DEPTH: usize = 32;

/// Depth of the queue carrying distance readings to the consumer.
pub const READING_QUEUE_DEPTH: usize = 32;

/// Interval between trigger pulses.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);
/// Width of the trigger pulse required by HC-SR04 class sensors.
pub const DEFAULT_TRIGGER_PULSE: Duration = Duration::from_micros(10);
/// How long the resolver waits for a cycle-start signal.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_millis(100);
/// How long the resolver waits for an echo width after a cycle started.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_millis(100);
/// How long the resolver waits for room in the reading queue.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_millis(100);
/// Half the speed of sound expressed in centimetres per microsecond.
pub const DEFAULT_CM_PER_MICROSECOND: f64 = 0.017_15;
/// Shortest distance the sensor resolves reliably.
pub const DEFAULT_MIN_DISTANCE_CM: i32 = 2;
/// Longest distance the sensor resolves reliably.
pub const DEFAULT_MAX_DISTANCE_CM: i32 = 400;

/// Parameters governing one measurement cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangingConfig {
    pub period: Duration,
    pub trigger_pulse: Duration,
    pub cycle_timeout: Duration,
    pub echo_timeout: Duration,
    pub publish_timeout: Duration,
    pub cm_per_microsecond: f64,
    pub min_distance_cm: i32,
    pub max_distance_cm: i32,
}

impl RangingConfig {
    /// Configuration matching the HC-SR04 operating envelope.
    pub const DEFAULT: Self = Self {
        period: DEFAULT_PERIOD,
        trigger_pulse: DEFAULT_TRIGGER_PULSE,
        cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        echo_timeout: DEFAULT_ECHO_TIMEOUT,
        publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        cm_per_microsecond: DEFAULT_CM_PER_MICROSECOND,
        min_distance_cm: DEFAULT_MIN_DISTANCE_CM,
        max_distance_cm: DEFAULT_MAX_DISTANCE_CM,
    };

    #[must_use]
    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub const fn with_trigger_pulse(mut self, width: Duration) -> Self {
        self.trigger_pulse = width;
        self
    }

    #[must_use]
    pub const fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_echo_timeout(mut self, timeout: Duration) -> Self {
        self.echo_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_cm_per_microsecond(mut self, scale: f64) -> Self {
        self.cm_per_microsecond = scale;
        self
    }

    /// Replaces the accepted distance band (inclusive on both ends).
    #[must_use]
    pub const fn with_range(mut self, min_cm: i32, max_cm: i32) -> Self {
        self.min_distance_cm = min_cm;
        self.max_distance_cm = max_cm;
        self
    }

    /// Returns `true` when `distance_cm` sits inside the accepted band.
    #[must_use]
    pub const fn in_range(&self, distance_cm: i32) -> bool {
        distance_cm >= self.min_distance_cm && distance_cm <= self.max_distance_cm
    }

    /// Checks the parameters for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.trigger_pulse.is_zero() || self.trigger_pulse >= self.period {
            return Err(ConfigError::TriggerPulse);
        }
        if self.cycle_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout(TimeoutKind::Cycle));
        }
        if self.echo_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout(TimeoutKind::Echo));
        }
        if self.publish_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout(TimeoutKind::Publish));
        }
        if !self.cm_per_microsecond.is_finite() || self.cm_per_microsecond <= 0.0 {
            return Err(ConfigError::Scale);
        }
        if self.min_distance_cm < 0 || self.min_distance_cm > self.max_distance_cm {
            return Err(ConfigError::Range {
                min_cm: self.min_distance_cm,
                max_cm: self.max_distance_cm,
            });
        }
        Ok(self)
    }
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Identifies which bounded wait a [`ConfigError::ZeroTimeout`] refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeoutKind {
    Cycle,
    Echo,
    Publish,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeoutKind::Cycle => "cycle",
            TimeoutKind::Echo => "echo",
            TimeoutKind::Publish => "publish",
        })
    }
}

/// Reasons a [`RangingConfig`] is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The emitter period is zero.
    ZeroPeriod,
    /// The trigger pulse is zero or does not fit inside one period.
    TriggerPulse,
    /// A bounded wait was configured as zero.
    ZeroTimeout(TimeoutKind),
    /// The duration-to-distance scale is not a positive finite number.
    Scale,
    /// The accepted distance band is empty or negative.
    Range { min_cm: i32, max_cm: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPeriod => f.write_str("emitter period must be non-zero"),
            ConfigError::TriggerPulse => {
                f.write_str("trigger pulse must be non-zero and shorter than the period")
            }
            ConfigError::ZeroTimeout(kind) => write!(f, "{kind} timeout must be non-zero"),
            ConfigError::Scale => f.write_str("cm-per-microsecond scale must be positive"),
            ConfigError::Range { min_cm, max_cm } => {
                write!(f, "invalid distance band [{min_cm}, {max_cm}] cm")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = RangingConfig::DEFAULT.validate().expect("default config");
        assert_eq!(config.period, Duration::from_millis(100));
        assert_eq!(config.trigger_pulse, Duration::from_micros(10));
        assert_eq!(config.min_distance_cm, 2);
        assert_eq!(config.max_distance_cm, 400);
    }

    #[test]
    fn trigger_pulse_must_fit_in_period() {
        let config = RangingConfig::DEFAULT
            .with_period(Duration::from_micros(10))
            .with_trigger_pulse(Duration::from_micros(10));
        assert_eq!(config.validate(), Err(ConfigError::TriggerPulse));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = RangingConfig::DEFAULT.with_echo_timeout(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTimeout(TimeoutKind::Echo))
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = RangingConfig::DEFAULT.with_range(400, 2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Range {
                min_cm: 400,
                max_cm: 2
            })
        );
    }

    #[test]
    fn non_finite_scale_is_rejected() {
        let config = RangingConfig::DEFAULT.with_cm_per_microsecond(f64::NAN);
        assert_eq!(config.validate(), Err(ConfigError::Scale));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let config = RangingConfig::DEFAULT;
        assert!(config.in_range(2));
        assert!(config.in_range(400));
        assert!(!config.in_range(1));
        assert!(!config.in_range(401));
    }
}
