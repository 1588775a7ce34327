use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_futures::block_on;
use ranging_core::config::RangingConfig;
use ranging_core::{
    CycleNotifier, CycleOutcome, CycleReport, CycleSource, DistanceReading, DistanceResolver,
    ReadingPublishError, ReadingSink, TimingResult, TimingSource,
};

/// Binary cycle signal: raising it while already raised changes nothing.
#[derive(Clone, Default)]
struct BinarySignal {
    raised: Rc<Cell<bool>>,
    waits: Rc<RefCell<Vec<Duration>>>,
}

impl CycleNotifier for BinarySignal {
    fn notify(&self) {
        self.raised.set(true);
    }
}

impl CycleSource for BinarySignal {
    async fn wait_cycle(&mut self, timeout: Duration) -> bool {
        self.waits.borrow_mut().push(timeout);
        self.raised.replace(false)
    }
}

#[derive(Clone, Default)]
struct TimingQueue {
    pending: Rc<RefCell<VecDeque<TimingResult>>>,
    waits: Rc<RefCell<Vec<Duration>>>,
}

impl TimingQueue {
    fn push(&self, micros: i64) {
        self.pending
            .borrow_mut()
            .push_back(TimingResult::from_micros(micros));
    }

    fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl TimingSource for TimingQueue {
    async fn next_timing(&mut self, timeout: Duration) -> Option<TimingResult> {
        self.waits.borrow_mut().push(timeout);
        self.pending.borrow_mut().pop_front()
    }
}

#[derive(Clone)]
struct ReadingLog {
    published: Rc<RefCell<Vec<DistanceReading>>>,
    capacity: usize,
}

impl ReadingLog {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            published: Rc::default(),
            capacity,
        }
    }

    fn raw(&self) -> Vec<i32> {
        self.published
            .borrow()
            .iter()
            .map(|reading| reading.to_raw())
            .collect()
    }
}

impl ReadingSink for ReadingLog {
    async fn publish(
        &mut self,
        reading: DistanceReading,
        _: Duration,
    ) -> Result<(), ReadingPublishError> {
        let mut published = self.published.borrow_mut();
        if published.len() >= self.capacity {
            return Err(ReadingPublishError::TimedOut);
        }
        published.push(reading);
        Ok(())
    }
}

struct Harness {
    signal: BinarySignal,
    timings: TimingQueue,
    readings: ReadingLog,
    resolver: DistanceResolver<BinarySignal, TimingQueue, ReadingLog>,
}

impl Harness {
    fn new() -> Self {
        Self::with_reading_capacity(32)
    }

    fn with_reading_capacity(capacity: usize) -> Self {
        let signal = BinarySignal::default();
        let timings = TimingQueue::default();
        let readings = ReadingLog::with_capacity(capacity);
        let resolver = DistanceResolver::new(
            signal.clone(),
            timings.clone(),
            readings.clone(),
            RangingConfig::DEFAULT,
        );
        Self {
            signal,
            timings,
            readings,
            resolver,
        }
    }

    fn cycle(&mut self) -> CycleReport {
        block_on(self.resolver.resolve_cycle())
    }
}

#[test]
fn valid_echo_publishes_distance() {
    let mut harness = Harness::new();
    harness.signal.notify();
    harness.timings.push(1_000);

    let report = harness.cycle();
    assert_eq!(
        report.outcome,
        CycleOutcome::Measured {
            echo: TimingResult::from_micros(1_000),
            distance_cm: 17,
        }
    );
    assert_eq!(report.delivered, Some(DistanceReading::Centimeters(17)));
    assert_eq!(harness.readings.raw(), vec![17]);
}

#[test]
fn out_of_range_echo_publishes_sentinel() {
    let mut harness = Harness::new();
    for micros in [50_000, 100] {
        harness.signal.notify();
        harness.timings.push(micros);
        let report = harness.cycle();
        assert!(matches!(report.outcome, CycleOutcome::OutOfRange { .. }));
    }
    assert_eq!(harness.readings.raw(), vec![-1, -1]);
}

#[test]
fn missing_echo_publishes_exactly_one_sentinel() {
    let mut harness = Harness::new();
    harness.signal.notify();

    let report = harness.cycle();
    assert_eq!(report.outcome, CycleOutcome::EchoTimeout);
    assert_eq!(harness.readings.raw(), vec![-1]);
}

#[test]
fn missed_cycle_publishes_nothing() {
    let mut harness = Harness::new();
    harness.timings.push(1_000);

    let report = harness.cycle();
    assert_eq!(report.outcome, CycleOutcome::CycleMissed);
    assert_eq!(report.delivered, None);
    assert!(harness.readings.raw().is_empty());
    assert_eq!(
        harness.timings.len(),
        1,
        "a missed cycle must not consume a pending echo width"
    );
}

#[test]
fn raising_cycle_signal_twice_counts_once() {
    let mut harness = Harness::new();
    harness.signal.notify();
    harness.signal.notify();
    harness.timings.push(1_000);
    harness.timings.push(2_000);

    assert!(matches!(
        harness.cycle().outcome,
        CycleOutcome::Measured { distance_cm: 17, .. }
    ));
    assert_eq!(harness.cycle().outcome, CycleOutcome::CycleMissed);
    assert_eq!(harness.readings.raw(), vec![17]);
}

#[test]
fn waits_use_configured_timeouts() {
    let mut harness = Harness::new();
    harness.signal.notify();
    harness.cycle();

    assert_eq!(
        harness.signal.waits.borrow().as_slice(),
        &[Duration::from_millis(100)]
    );
    assert_eq!(
        harness.timings.waits.borrow().as_slice(),
        &[Duration::from_millis(100)]
    );
}

#[test]
fn stale_width_is_consumed_by_next_cycle_in_fifo_order() {
    let mut harness = Harness::new();
    // Two widths land before the resolver runs; they are not tied to cycles.
    harness.timings.push(1_000);
    harness.timings.push(2_000);

    harness.signal.notify();
    harness.cycle();
    harness.signal.notify();
    harness.cycle();

    assert_eq!(harness.readings.raw(), vec![17, 34]);
}

#[test]
fn full_reading_queue_drops_reading_and_keeps_running() {
    let mut harness = Harness::with_reading_capacity(1);

    harness.signal.notify();
    harness.timings.push(1_000);
    let first = harness.cycle();
    assert!(!first.reading_dropped());

    harness.signal.notify();
    harness.timings.push(2_000);
    let second = harness.cycle();
    assert!(second.reading_dropped());
    assert_eq!(second.delivered, None);
    assert_eq!(harness.readings.raw(), vec![17]);
}
