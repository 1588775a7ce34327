//! Trigger pulse generation.
//!
//! [`PulseEmitter::fire`] produces one trigger pulse and announces the start
//! of a measurement cycle. The periodic sleep between pulses belongs to the
//! runtime (an Embassy `Ticker` on the MCU, a stepped clock in the emulator).

use core::time::Duration;

use crate::config::RangingConfig;

/// Logical level applied to the trigger output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TriggerLevel {
    Low,
    High,
}

/// Abstraction over the hardware trigger line.
pub trait TriggerDriver {
    /// Drives the trigger output to `level`.
    fn drive(&mut self, level: TriggerLevel);

    /// Busy-waits for `width` while the line holds its level.
    fn hold(&mut self, width: Duration);
}

/// Raises the binary cycle-start signal.
///
/// Raising an already raised signal must be a no-op.
pub trait CycleNotifier {
    fn notify(&self);
}

impl<T> CycleNotifier for &T
where
    T: CycleNotifier + ?Sized,
{
    fn notify(&self) {
        (**self).notify();
    }
}

/// Emits fixed-width trigger pulses and raises the cycle signal after each one.
pub struct PulseEmitter<D, N> {
    driver: D,
    notifier: N,
    pulse_width: Duration,
    pulses: u32,
}

impl<D, N> PulseEmitter<D, N>
where
    D: TriggerDriver,
    N: CycleNotifier,
{
    /// Creates an emitter and parks the trigger line low.
    pub fn new(mut driver: D, notifier: N, config: &RangingConfig) -> Self {
        driver.drive(TriggerLevel::Low);
        Self {
            driver,
            notifier,
            pulse_width: config.trigger_pulse,
            pulses: 0,
        }
    }

    /// Emits one trigger pulse and signals the start of a measurement cycle.
    ///
    /// Returns the running pulse count (wrapping).
    pub fn fire(&mut self) -> u32 {
        self.driver.drive(TriggerLevel::High);
        self.driver.hold(self.pulse_width);
        self.driver.drive(TriggerLevel::Low);
        self.notifier.notify();
        self.pulses = self.pulses.wrapping_add(1);
        self.pulses
    }

    #[must_use]
    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use heapless::Vec;

    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    enum Step {
        Drive(TriggerLevel),
        Hold(Duration),
    }

    #[derive(Default)]
    struct RecordingDriver {
        steps: Vec<Step, 16>,
    }

    impl TriggerDriver for RecordingDriver {
        fn drive(&mut self, level: TriggerLevel) {
            self.steps.push(Step::Drive(level)).expect("step capacity");
        }

        fn hold(&mut self, width: Duration) {
            self.steps.push(Step::Hold(width)).expect("step capacity");
        }
    }

    #[derive(Default)]
    struct CountingNotifier(Cell<u32>);

    impl CycleNotifier for CountingNotifier {
        fn notify(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn pulse_is_high_for_configured_width_then_signals() {
        let notifier = CountingNotifier::default();
        let mut emitter =
            PulseEmitter::new(RecordingDriver::default(), &notifier, &RangingConfig::DEFAULT);

        assert_eq!(emitter.fire(), 1);
        assert_eq!(
            emitter.driver().steps.as_slice(),
            &[
                Step::Drive(TriggerLevel::Low),
                Step::Drive(TriggerLevel::High),
                Step::Hold(Duration::from_micros(10)),
                Step::Drive(TriggerLevel::Low),
            ]
        );
        assert_eq!(notifier.0.get(), 1);
    }

    #[test]
    fn each_pulse_notifies_exactly_once() {
        let notifier = CountingNotifier::default();
        let mut emitter =
            PulseEmitter::new(RecordingDriver::default(), &notifier, &RangingConfig::DEFAULT);

        emitter.fire();
        emitter.fire();
        emitter.fire();
        assert_eq!(emitter.pulses(), 3);
        assert_eq!(notifier.0.get(), 3);
    }
}
