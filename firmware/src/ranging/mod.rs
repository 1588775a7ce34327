#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Embassy adapters for the `ranging-core` pipeline traits.
//!
//! The binary cycle signal is an `embassy_sync` [`Signal`]: raising it while
//! it is still set overwrites the unit payload, so pending notifications never
//! accumulate. Echo widths and readings travel over bounded [`Channel`]s. The
//! timing queue is fed from the EXTI handler, so on the MCU both queues use a
//! critical-section mutex; host builds fall back to `NoopRawMutex` for tests.

use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};
use ranging_core::{
    CycleNotifier, CycleSource, DistanceReading, PublishError, READING_QUEUE_DEPTH,
    ReadingPublishError, ReadingSink, TIMING_QUEUE_DEPTH, TimingResult, TimingSink, TimingSource,
};

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

#[cfg(target_os = "none")]
type RangingMutex = CriticalSectionRawMutex;
#[cfg(not(target_os = "none"))]
type RangingMutex = NoopRawMutex;

/// Binary signal raised by the emitter after every trigger pulse.
pub type CycleSignal = Signal<RangingMutex, ()>;

/// Queue carrying echo widths from the EXTI handler to the resolver.
pub type TimingQueue = Channel<RangingMutex, TimingResult, TIMING_QUEUE_DEPTH>;

/// Sender half of the timing queue.
pub type TimingSender<'a> = Sender<'a, RangingMutex, TimingResult, TIMING_QUEUE_DEPTH>;

/// Receiver half of the timing queue.
pub type TimingReceiver<'a> = Receiver<'a, RangingMutex, TimingResult, TIMING_QUEUE_DEPTH>;

/// Queue carrying resolved readings to the consumer.
pub type ReadingQueue = Channel<RangingMutex, DistanceReading, READING_QUEUE_DEPTH>;

/// Sender half of the reading queue.
pub type ReadingSender<'a> = Sender<'a, RangingMutex, DistanceReading, READING_QUEUE_DEPTH>;

/// Receiver half of the reading queue.
pub type ReadingReceiver<'a> = Receiver<'a, RangingMutex, DistanceReading, READING_QUEUE_DEPTH>;

pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Raises the cycle signal on behalf of the pulse emitter.
pub struct SignalNotifier<'a> {
    signal: &'a CycleSignal,
}

impl<'a> SignalNotifier<'a> {
    pub fn new(signal: &'a CycleSignal) -> Self {
        Self { signal }
    }
}

impl CycleNotifier for SignalNotifier<'_> {
    fn notify(&self) {
        self.signal.signal(());
    }
}

/// Resolver-side view of the cycle signal.
pub struct SignalCycles<'a> {
    signal: &'a CycleSignal,
}

impl<'a> SignalCycles<'a> {
    pub fn new(signal: &'a CycleSignal) -> Self {
        Self { signal }
    }
}

impl CycleSource for SignalCycles<'_> {
    async fn wait_cycle(&mut self, timeout: core::time::Duration) -> bool {
        with_timeout(core_duration_to_embassy(timeout), self.signal.wait())
            .await
            .is_ok()
    }
}

/// Non-blocking timing producer used from interrupt context.
pub struct IsrTimingSink<'a> {
    sender: TimingSender<'a>,
}

impl<'a> IsrTimingSink<'a> {
    pub fn new(sender: TimingSender<'a>) -> Self {
        Self { sender }
    }
}

impl TimingSink for IsrTimingSink<'_> {
    fn try_publish(&self, result: TimingResult) -> Result<(), PublishError> {
        self.sender
            .try_send(result)
            .map_err(|TrySendError::Full(_)| PublishError::QueueFull)
    }
}

/// Resolver-side view of the timing queue.
pub struct ChannelTimings<'a> {
    receiver: TimingReceiver<'a>,
}

impl<'a> ChannelTimings<'a> {
    pub fn new(receiver: TimingReceiver<'a>) -> Self {
        Self { receiver }
    }
}

impl TimingSource for ChannelTimings<'_> {
    async fn next_timing(&mut self, timeout: core::time::Duration) -> Option<TimingResult> {
        with_timeout(core_duration_to_embassy(timeout), self.receiver.receive())
            .await
            .ok()
    }
}

/// Resolver-side producer for the reading queue.
pub struct ChannelReadings<'a> {
    sender: ReadingSender<'a>,
}

impl<'a> ChannelReadings<'a> {
    pub fn new(sender: ReadingSender<'a>) -> Self {
        Self { sender }
    }
}

impl ReadingSink for ChannelReadings<'_> {
    async fn publish(
        &mut self,
        reading: DistanceReading,
        timeout: core::time::Duration,
    ) -> Result<(), ReadingPublishError> {
        if self.sender.try_send(reading).is_ok() {
            return Ok(());
        }
        with_timeout(core_duration_to_embassy(timeout), self.sender.send(reading))
            .await
            .map_err(|_| ReadingPublishError::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::pin::pin;
    use core::task::{Context, Poll, Waker};
    use embassy_time::MockDriver;
    use ranging_core::{Edge, EdgeCapture};

    const WAIT: core::time::Duration = core::time::Duration::from_millis(100);

    #[test]
    fn raising_signal_twice_leaves_one_pending_cycle() {
        let signal = CycleSignal::new();
        let notifier = SignalNotifier::new(&signal);

        notifier.notify();
        notifier.notify();

        assert!(signal.try_take().is_some());
        assert!(signal.try_take().is_none());
    }

    #[test]
    fn isr_sink_reports_full_queue() {
        let queue = TimingQueue::new();
        let sink = IsrTimingSink::new(queue.sender());

        for micros in 0..TIMING_QUEUE_DEPTH as i64 {
            sink.try_publish(TimingResult::from_micros(micros))
                .expect("queue has room");
        }
        assert_eq!(
            sink.try_publish(TimingResult::from_micros(-1)),
            Err(PublishError::QueueFull)
        );
    }

    #[test]
    fn edge_capture_feeds_channel_in_fifo_order() {
        let queue = TimingQueue::new();
        let sink = IsrTimingSink::new(queue.sender());
        let capture = EdgeCapture::new();

        capture.on_edge(Edge::Rising, 0, &sink);
        capture.on_edge(Edge::Falling, 1_000, &sink);
        capture.on_edge(Edge::Rising, 100_000, &sink);
        capture.on_edge(Edge::Falling, 102_000, &sink);

        let receiver = queue.receiver();
        assert_eq!(receiver.try_receive(), Ok(TimingResult::from_micros(1_000)));
        assert_eq!(receiver.try_receive(), Ok(TimingResult::from_micros(2_000)));
        assert!(receiver.try_receive().is_err());
    }

    #[test]
    fn core_durations_convert_to_embassy_ticks() {
        let converted = core_duration_to_embassy(core::time::Duration::from_micros(10));
        assert_eq!(converted.as_micros(), 10);
    }

    // The mock time driver is process-wide, so every test that waits on it
    // lives here and runs its steps in sequence.
    #[test]
    fn waits_give_up_once_the_timeout_elapses() {
        let driver = MockDriver::get();
        driver.reset();
        let mut cx = Context::from_waker(Waker::noop());

        // No echo arrives: the timing wait ends empty.
        let timings = TimingQueue::new();
        let mut source = ChannelTimings::new(timings.receiver());
        {
            let mut wait = pin!(source.next_timing(WAIT));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
            driver.advance(Duration::from_millis(99));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
            driver.advance(Duration::from_millis(1));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(None));
        }

        // A width already queued is returned without waiting.
        timings
            .try_send(TimingResult::from_micros(1_000))
            .expect("queue has room");
        {
            let mut wait = pin!(source.next_timing(WAIT));
            assert_eq!(
                wait.as_mut().poll(&mut cx),
                Poll::Ready(Some(TimingResult::from_micros(1_000)))
            );
        }

        // The emitter never fires: the cycle wait reports a miss.
        let signal = CycleSignal::new();
        let mut cycles = SignalCycles::new(&signal);
        {
            let mut wait = pin!(cycles.wait_cycle(WAIT));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
            driver.advance(Duration::from_millis(100));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(false));
        }

        // A raise that lands before the deadline completes the wait.
        {
            let mut wait = pin!(cycles.wait_cycle(WAIT));
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
            SignalNotifier::new(&signal).notify();
            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(true));
        }

        // Nobody drains the reading queue: the publish times out.
        let readings = ReadingQueue::new();
        for cm in 0..READING_QUEUE_DEPTH as i32 {
            readings
                .try_send(DistanceReading::Centimeters(cm))
                .expect("queue has room");
        }
        let mut sink = ChannelReadings::new(readings.sender());
        {
            let mut publish = pin!(sink.publish(DistanceReading::NoReading, WAIT));
            assert_eq!(publish.as_mut().poll(&mut cx), Poll::Pending);
            driver.advance(Duration::from_millis(100));
            assert_eq!(
                publish.as_mut().poll(&mut cx),
                Poll::Ready(Err(ReadingPublishError::TimedOut))
            );
        }

        // A slot freed before the deadline lets the reading through.
        {
            let mut publish = pin!(sink.publish(DistanceReading::Centimeters(17), WAIT));
            assert_eq!(publish.as_mut().poll(&mut cx), Poll::Pending);
            assert_eq!(
                readings.try_receive(),
                Ok(DistanceReading::Centimeters(0))
            );
            driver.advance(Duration::from_millis(50));
            assert_eq!(publish.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        }
    }
}
