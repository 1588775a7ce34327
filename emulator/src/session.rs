use std::cell::{Cell, RefCell};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use embassy_futures::block_on;
use heapless::Deque;
use ranging_core::{
    CycleNotifier, CycleOutcome, CycleReport, CycleSource, DistanceReading, DistanceResolver,
    Edge, EdgeCapture, PublishError, PulseEmitter, READING_QUEUE_DEPTH, RangingConfig,
    RangingStats, ReadingPublishError, ReadingSink, TIMING_QUEUE_DEPTH, TimingResult, TimingSink,
    TimingSource, TriggerDriver, TriggerLevel,
};

/// Cycles between periodic status lines in a transcript.
pub const STATUS_EVERY: u32 = 50;

/// Offset from the start of a cycle to the echo's rising edge.
const ECHO_DELAY_US: i64 = 300;
/// Offset of the spurious echo injected by the noise profile.
const SPURIOUS_DELAY_US: i64 = 50;
const SPURIOUS_WIDTH_US: i64 = 200;

/// Scripted echo scenario replayed through the pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScenarioProfile {
    /// Target parked at 17 cm.
    Steady,
    /// Target sweeping through and past the accepted band.
    Sweep,
    /// Every fourth echo rises but never falls.
    Dropout,
    /// Pseudo-random widths with occasional spurious extra echoes.
    Noise,
    /// Every fifth trigger pulse is skipped.
    Stall,
}

impl ScenarioProfile {
    pub const ALL: [Self; 5] = [
        Self::Steady,
        Self::Sweep,
        Self::Dropout,
        Self::Noise,
        Self::Stall,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ScenarioProfile::Steady => "steady",
            ScenarioProfile::Sweep => "sweep",
            ScenarioProfile::Dropout => "dropout",
            ScenarioProfile::Noise => "noise",
            ScenarioProfile::Stall => "stall",
        }
    }

    pub fn log_path(self) -> String {
        format!("transcripts/emulator-{}.log", self.tag())
    }

    pub fn header(self) -> &'static str {
        match self {
            ScenarioProfile::Steady => "Ranging emulator steady-target transcript",
            ScenarioProfile::Sweep => "Ranging emulator sweep transcript",
            ScenarioProfile::Dropout => "Ranging emulator echo dropout transcript",
            ScenarioProfile::Noise => "Ranging emulator noisy echo transcript",
            ScenarioProfile::Stall => "Ranging emulator stalled trigger transcript",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown scenario profile `{tag}`"))
    }
}

/// What the sensor does during one cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Echo {
    /// Full echo of the given width.
    Pulse(i64),
    /// Rising edge only.
    Unterminated,
    /// No edges at all.
    Silent,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct CycleScript {
    fires: bool,
    spurious: bool,
    echo: Echo,
}

/// Deterministic per-profile script generator.
struct Script {
    profile: ScenarioProfile,
    noise_state: u32,
}

impl Script {
    fn new(profile: ScenarioProfile) -> Self {
        Self {
            profile,
            noise_state: 0x2545_f491,
        }
    }

    fn next_noise(&mut self) -> u32 {
        self.noise_state = self
            .noise_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.noise_state >> 8
    }

    fn cycle(&mut self, index: u32) -> CycleScript {
        let steady = |width| CycleScript {
            fires: true,
            spurious: false,
            echo: Echo::Pulse(width),
        };
        match self.profile {
            ScenarioProfile::Steady => steady(1_000),
            ScenarioProfile::Sweep => steady(100 + i64::from(index) * 1_500 % 26_000),
            ScenarioProfile::Dropout if index % 4 == 3 => CycleScript {
                fires: true,
                spurious: false,
                echo: Echo::Unterminated,
            },
            ScenarioProfile::Dropout => steady(5_800),
            ScenarioProfile::Noise => {
                let sample = self.next_noise();
                CycleScript {
                    fires: true,
                    spurious: sample % 7 == 0,
                    echo: Echo::Pulse(600 + i64::from(sample % 20_000)),
                }
            }
            ScenarioProfile::Stall if index % 5 == 4 => CycleScript {
                fires: false,
                spurious: false,
                echo: Echo::Silent,
            },
            ScenarioProfile::Stall => steady(2_000),
        }
    }
}

/// Virtual monotonic clock in microseconds.
#[derive(Clone, Default)]
struct HostClock(Rc<Cell<i64>>);

impl HostClock {
    fn now_us(&self) -> i64 {
        self.0.get()
    }

    fn set_us(&self, micros: i64) {
        self.0.set(micros);
    }

    fn advance(&self, duration: Duration) {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        self.0.set(self.0.get().saturating_add(micros));
    }
}

/// Trigger line that busy-holds by advancing the virtual clock.
struct HostTrigger {
    clock: HostClock,
    level: TriggerLevel,
}

impl TriggerDriver for HostTrigger {
    fn drive(&mut self, level: TriggerLevel) {
        self.level = level;
    }

    fn hold(&mut self, width: Duration) {
        self.clock.advance(width);
    }
}

/// Binary cycle signal; a wait with nothing raised times out immediately.
#[derive(Clone, Default)]
struct HostSignal(Rc<Cell<bool>>);

impl CycleNotifier for HostSignal {
    fn notify(&self) {
        self.0.set(true);
    }
}

impl CycleSource for HostSignal {
    async fn wait_cycle(&mut self, _: Duration) -> bool {
        self.0.replace(false)
    }
}

#[derive(Clone, Default)]
struct HostTimings(Rc<RefCell<Deque<TimingResult, TIMING_QUEUE_DEPTH>>>);

impl HostTimings {
    fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

impl TimingSink for HostTimings {
    fn try_publish(&self, result: TimingResult) -> Result<(), PublishError> {
        self.0
            .borrow_mut()
            .push_back(result)
            .map_err(|_| PublishError::QueueFull)
    }
}

impl TimingSource for HostTimings {
    async fn next_timing(&mut self, _: Duration) -> Option<TimingResult> {
        self.0.borrow_mut().pop_front()
    }
}

#[derive(Clone, Default)]
struct HostReadings(Rc<RefCell<Deque<DistanceReading, READING_QUEUE_DEPTH>>>);

impl HostReadings {
    fn pop_front(&self) -> Option<DistanceReading> {
        self.0.borrow_mut().pop_front()
    }
}

impl ReadingSink for HostReadings {
    async fn publish(
        &mut self,
        reading: DistanceReading,
        _: Duration,
    ) -> Result<(), ReadingPublishError> {
        self.0
            .borrow_mut()
            .push_back(reading)
            .map_err(|_| ReadingPublishError::TimedOut)
    }
}

/// One emulated cycle as it appears in the transcript.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CycleRecord {
    pub cycle: u32,
    pub started_at_us: i64,
    pub report: CycleReport,
    /// Reading drained from the reading queue by the stand-in consumer.
    pub consumed: Option<DistanceReading>,
}

/// Replays a scenario through the emitter, edge capture, and resolver.
pub struct Session<W: Write> {
    profile: ScenarioProfile,
    config: RangingConfig,
    script: Script,
    clock: HostClock,
    emitter: PulseEmitter<HostTrigger, HostSignal>,
    capture: EdgeCapture,
    timings: HostTimings,
    readings: HostReadings,
    resolver: DistanceResolver<HostSignal, HostTimings, HostReadings>,
    stats: RangingStats,
    writer: W,
}

impl<W: Write> Session<W> {
    pub fn new(profile: ScenarioProfile, mut writer: W) -> io::Result<Self> {
        let config = RangingConfig::DEFAULT
            .validate()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

        let clock = HostClock::default();
        let signal = HostSignal::default();
        let timings = HostTimings::default();
        let readings = HostReadings::default();
        let trigger = HostTrigger {
            clock: clock.clone(),
            level: TriggerLevel::High,
        };
        let emitter = PulseEmitter::new(trigger, signal.clone(), &config);
        let resolver = DistanceResolver::new(signal, timings.clone(), readings.clone(), config);

        writeln!(writer, "# {}", profile.header())?;
        writeln!(writer, "# Timestamps are milliseconds of virtual time")?;
        writeln!(writer)?;

        Ok(Self {
            profile,
            config,
            script: Script::new(profile),
            clock,
            emitter,
            capture: EdgeCapture::new(),
            timings,
            readings,
            resolver,
            stats: RangingStats::new(),
            writer,
        })
    }

    pub fn profile(&self) -> ScenarioProfile {
        self.profile
    }

    pub fn stats(&self) -> RangingStats {
        self.stats
    }

    pub fn trigger_level(&self) -> TriggerLevel {
        self.emitter.driver().level
    }

    /// Widths still waiting in the timing queue.
    pub fn pending_timings(&self) -> usize {
        self.timings.len()
    }

    pub fn run(&mut self, cycles: u32) -> io::Result<Vec<CycleRecord>> {
        let mut records = Vec::with_capacity(usize::try_from(cycles).unwrap_or_default());
        for _ in 0..cycles {
            records.push(self.step()?);
        }
        self.finish()?;
        Ok(records)
    }

    /// Emulates one trigger period and writes its transcript line.
    pub fn step(&mut self) -> io::Result<CycleRecord> {
        let started_at_us = self.clock.now_us();
        let script = self.script.cycle(self.stats.cycles);

        if script.fires {
            self.emitter.fire();
        }
        if script.spurious {
            self.echo(started_at_us + SPURIOUS_DELAY_US, Echo::Pulse(SPURIOUS_WIDTH_US));
        }
        self.echo(started_at_us + ECHO_DELAY_US, script.echo);

        let report = block_on(self.resolver.resolve_cycle());
        self.stats.record(&report);
        self.stats.dropped_timings = self.capture.dropped();
        let consumed = self.readings.pop_front();

        let record = CycleRecord {
            cycle: self.stats.cycles,
            started_at_us,
            report,
            consumed,
        };
        self.write_record(&record)?;
        if self.stats.cycles % STATUS_EVERY == 0 {
            writeln!(self.writer, "status: {}", self.stats)?;
        }

        self.clock.set_us(started_at_us);
        self.clock.advance(self.config.period);
        Ok(record)
    }

    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "summary: {}", self.stats)?;
        self.writer.flush()
    }

    fn echo(&self, rising_at_us: i64, echo: Echo) {
        match echo {
            Echo::Pulse(width) => {
                self.capture
                    .on_edge(Edge::Rising, rising_at_us, &self.timings);
                self.capture
                    .on_edge(Edge::Falling, rising_at_us + width, &self.timings);
            }
            Echo::Unterminated => {
                self.capture
                    .on_edge(Edge::Rising, rising_at_us, &self.timings);
            }
            Echo::Silent => {}
        }
    }

    fn write_record(&mut self, record: &CycleRecord) -> io::Result<()> {
        let outcome = record.report.outcome;
        let echo = match outcome {
            CycleOutcome::Measured { echo, .. } | CycleOutcome::OutOfRange { echo, .. } => {
                format!("{}us", echo.as_micros())
            }
            CycleOutcome::EchoTimeout | CycleOutcome::CycleMissed => "-".to_string(),
        };
        let reading = record
            .consumed
            .map_or_else(|| "-".to_string(), |reading| reading.to_raw().to_string());
        writeln!(
            self.writer,
            "[+{:>6} ms] #{:<4} {:<12} echo={:<8} reading={}",
            record.started_at_us / 1_000,
            record.cycle,
            outcome.label(),
            echo,
            reading
        )
    }
}

/// Opens (and truncates) the transcript file for `profile`.
pub fn open_transcript(profile: ScenarioProfile) -> io::Result<BufWriter<fs::File>> {
    let path_name = profile.log_path();
    let path = Path::new(&path_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file))
}
