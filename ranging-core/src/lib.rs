#![no_std]

// Shared logic for the ultrasonic ranging pipeline.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Runtime crates supply the channel, signal, and pin
// adapters through the traits exposed here.

pub mod capture;
pub mod config;
pub mod emitter;
pub mod reading;
pub mod resolver;
pub mod stats;

pub use capture::{Edge, EdgeCapture, PublishError, TimingResult, TimingSink};
pub use config::{ConfigError, READING_QUEUE_DEPTH, RangingConfig, TIMING_QUEUE_DEPTH};
pub use emitter::{CycleNotifier, PulseEmitter, TriggerDriver, TriggerLevel};
pub use reading::{CycleOutcome, DistanceReading, NO_READING_SENTINEL};
pub use resolver::{
    CycleReport, CycleSource, DistanceResolver, ReadingPublishError, ReadingSink, TimingSource,
};
pub use stats::RangingStats;
