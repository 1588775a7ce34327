//! Echo edge capture executed from interrupt context.
//!
//! [`EdgeCapture`] owns the rising-edge scratch timestamp. Runtime crates keep
//! one instance private to their echo interrupt handler and feed it every
//! transition together with the monotonic time read inside the handler. Falling
//! edges produce a [`TimingResult`] which is pushed to a [`TimingSink`] without
//! blocking; a full sink drops the value and bumps a counter.
//!
//! Nothing here logs, allocates, waits, or touches floating point, so the
//! handler stays bounded.

use portable_atomic::{AtomicI64, AtomicU32, Ordering};

/// Echo high-time for one cycle, in microseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimingResult(i64);

impl TimingResult {
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0
    }
}

/// Transition observed on the echo line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Error surfaced when a timing result cannot be handed off.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PublishError {
    /// Queue has reached its maximum capacity.
    QueueFull,
}

/// Interrupt-safe, non-blocking destination for timing results.
pub trait TimingSink {
    /// Attempts to enqueue a timing result without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::QueueFull`] when the queue has no free slot.
    fn try_publish(&self, result: TimingResult) -> Result<(), PublishError>;
}

/// Rising/falling edge timer for the echo line.
pub struct EdgeCapture {
    // Written on every rising edge, read on every falling edge. Zero until the
    // first rising edge; never reset between cycles.
    rising_at_us: AtomicI64,
    dropped: AtomicU32,
}

impl EdgeCapture {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rising_at_us: AtomicI64::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Handles one echo transition observed at `now_us`.
    ///
    /// Returns the measured width on a falling edge, whether or not the sink
    /// accepted it.
    pub fn on_edge<S>(&self, edge: Edge, now_us: i64, sink: &S) -> Option<TimingResult>
    where
        S: TimingSink + ?Sized,
    {
        match edge {
            Edge::Rising => {
                self.rising_at_us.store(now_us, Ordering::Relaxed);
                None
            }
            Edge::Falling => {
                let started = self.rising_at_us.load(Ordering::Relaxed);
                let width = TimingResult::from_micros(now_us.saturating_sub(started));
                if sink.try_publish(width).is_err() {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                Some(width)
            }
        }
    }

    /// Number of widths discarded because the sink rejected them.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}
