//! Logging helpers for the ranging tasks.
//!
//! Every helper has a defmt implementation for the MCU and a `println!` twin
//! for host builds so the same call sites work in both. Nothing here is called
//! from interrupt context.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::time::Duration;

use ranging_core::{CycleOutcome, CycleReport, DistanceReading, RangingConfig, RangingStats};

/// Log level picked for a resolver outcome.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Debug,
    Warn,
}

/// Valid readings are routine; every other outcome deserves attention.
pub const fn severity(outcome: CycleOutcome) -> Severity {
    match outcome {
        CycleOutcome::Measured { .. } => Severity::Debug,
        CycleOutcome::OutOfRange { .. }
        | CycleOutcome::EchoTimeout
        | CycleOutcome::CycleMissed => Severity::Warn,
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Echo width and raw distance carried by an outcome, when it has one.
fn echo_fields(outcome: CycleOutcome) -> Option<(i64, i32)> {
    match outcome {
        CycleOutcome::Measured { echo, distance_cm }
        | CycleOutcome::OutOfRange { echo, distance_cm } => {
            Some((echo.as_micros(), distance_cm))
        }
        CycleOutcome::EchoTimeout | CycleOutcome::CycleMissed => None,
    }
}

/// Configuration values as they appear in the boot log.
#[derive(Copy, Clone, Debug, PartialEq)]
struct StartupFields {
    period_us: u64,
    pulse_us: u64,
    cycle_timeout_us: u64,
    echo_timeout_us: u64,
    publish_timeout_us: u64,
    cm_per_us: f64,
    min_cm: i32,
    max_cm: i32,
}

impl StartupFields {
    fn from_config(config: &RangingConfig) -> Self {
        Self {
            period_us: micros(config.period),
            pulse_us: micros(config.trigger_pulse),
            cycle_timeout_us: micros(config.cycle_timeout),
            echo_timeout_us: micros(config.echo_timeout),
            publish_timeout_us: micros(config.publish_timeout),
            cm_per_us: config.cm_per_microsecond,
            min_cm: config.min_distance_cm,
            max_cm: config.max_distance_cm,
        }
    }
}

/// Logs the validated configuration once at boot.
pub fn log_startup(config: &RangingConfig) {
    emit_startup(&StartupFields::from_config(config));
}

/// Logs one resolver iteration.
pub fn log_cycle(cycle: u32, report: &CycleReport) {
    let outcome = report.outcome;
    emit_cycle(
        severity(outcome),
        cycle,
        outcome.label(),
        echo_fields(outcome),
    );
    if report.reading_dropped() {
        emit_dropped_reading(cycle);
    }
}

/// Logs a reading pulled from the reading queue.
pub fn log_reading(reading: DistanceReading) {
    emit_reading(reading.to_raw());
}

/// Logs the periodic counter summary.
pub fn log_status(stats: &RangingStats) {
    emit_status(stats);
}

#[cfg(target_os = "none")]
fn emit_startup(fields: &StartupFields) {
    defmt::info!(
        "ranging: start period={}us pulse={}us cycle-timeout={}us echo-timeout={}us publish-timeout={}us scale={}cm/us band={}..={}cm",
        fields.period_us,
        fields.pulse_us,
        fields.cycle_timeout_us,
        fields.echo_timeout_us,
        fields.publish_timeout_us,
        fields.cm_per_us,
        fields.min_cm,
        fields.max_cm
    );
}

#[cfg(not(target_os = "none"))]
fn emit_startup(fields: &StartupFields) {
    let StartupFields {
        period_us,
        pulse_us,
        cycle_timeout_us,
        echo_timeout_us,
        publish_timeout_us,
        cm_per_us,
        min_cm,
        max_cm,
    } = *fields;
    println!(
        "ranging: start period={period_us}us pulse={pulse_us}us cycle-timeout={cycle_timeout_us}us echo-timeout={echo_timeout_us}us publish-timeout={publish_timeout_us}us scale={cm_per_us}cm/us band={min_cm}..={max_cm}cm"
    );
}

#[cfg(target_os = "none")]
fn emit_cycle(severity: Severity, cycle: u32, label: &'static str, echo: Option<(i64, i32)>) {
    match (severity, echo) {
        (Severity::Debug, Some((width, cm))) => {
            defmt::debug!("ranging: #{} {} echo={}us distance={}cm", cycle, label, width, cm);
        }
        (Severity::Debug, None) => defmt::debug!("ranging: #{} {}", cycle, label),
        (Severity::Warn, Some((width, cm))) => {
            defmt::warn!("ranging: #{} {} echo={}us distance={}cm", cycle, label, width, cm);
        }
        (Severity::Warn, None) => defmt::warn!("ranging: #{} {}", cycle, label),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_cycle(severity: Severity, cycle: u32, label: &'static str, echo: Option<(i64, i32)>) {
    let level = match severity {
        Severity::Debug => "debug",
        Severity::Warn => "warn",
    };
    match echo {
        Some((width, cm)) => {
            println!("[{level}] ranging: #{cycle} {label} echo={width}us distance={cm}cm");
        }
        None => println!("[{level}] ranging: #{cycle} {label}"),
    }
}

#[cfg(target_os = "none")]
fn emit_dropped_reading(cycle: u32) {
    defmt::warn!("ranging: #{} reading queue full, reading dropped", cycle);
}

#[cfg(not(target_os = "none"))]
fn emit_dropped_reading(cycle: u32) {
    println!("[warn] ranging: #{cycle} reading queue full, reading dropped");
}

#[cfg(target_os = "none")]
fn emit_reading(raw: i32) {
    defmt::info!("reading: {}", raw);
}

#[cfg(not(target_os = "none"))]
fn emit_reading(raw: i32) {
    println!("reading: {raw}");
}

#[cfg(target_os = "none")]
fn emit_status(stats: &RangingStats) {
    defmt::info!(
        "status: cycles={} measured={} out-of-range={} echo-timeouts={} missed={} dropped-timings={} dropped-readings={}",
        stats.cycles,
        stats.measured,
        stats.out_of_range,
        stats.echo_timeouts,
        stats.missed_cycles,
        stats.dropped_timings,
        stats.dropped_readings
    );
}

#[cfg(not(target_os = "none"))]
fn emit_status(stats: &RangingStats) {
    println!("status: {stats}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranging_core::TimingResult;

    #[test]
    fn only_valid_readings_log_at_debug() {
        let echo = TimingResult::from_micros(1_000);
        assert_eq!(
            severity(CycleOutcome::Measured {
                echo,
                distance_cm: 17
            }),
            Severity::Debug
        );
        assert_eq!(
            severity(CycleOutcome::OutOfRange {
                echo,
                distance_cm: 857
            }),
            Severity::Warn
        );
        assert_eq!(severity(CycleOutcome::EchoTimeout), Severity::Warn);
        assert_eq!(severity(CycleOutcome::CycleMissed), Severity::Warn);
    }

    #[test]
    fn echo_fields_only_exist_for_classified_widths() {
        let outcome = CycleOutcome::OutOfRange {
            echo: TimingResult::from_micros(50_000),
            distance_cm: 857,
        };
        assert_eq!(echo_fields(outcome), Some((50_000, 857)));
        assert_eq!(echo_fields(CycleOutcome::EchoTimeout), None);
    }

    #[test]
    fn startup_durations_are_reported_in_micros() {
        assert_eq!(micros(RangingConfig::DEFAULT.period), 100_000);
        assert_eq!(micros(RangingConfig::DEFAULT.trigger_pulse), 10);
    }

    #[test]
    fn startup_log_carries_every_parameter() {
        let config = RangingConfig::DEFAULT
            .with_cycle_timeout(Duration::from_millis(150))
            .with_publish_timeout(Duration::from_millis(20))
            .with_cm_per_microsecond(0.0172);
        assert_eq!(
            StartupFields::from_config(&config),
            StartupFields {
                period_us: 100_000,
                pulse_us: 10,
                cycle_timeout_us: 150_000,
                echo_timeout_us: 100_000,
                publish_timeout_us: 20_000,
                cm_per_us: 0.0172,
                min_cm: 2,
                max_cm: 400,
            }
        );
    }
}
