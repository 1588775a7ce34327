//! Board wiring for the HC-SR04 trigger and echo lines.
//!
//! `TRIG` is PA6 driven push-pull. `ECHO` is PB7, routed to EXTI line 7 with
//! both edges enabled; the handler itself lives in `runtime::echo_isr`.

use core::time::Duration;

use embassy_stm32::gpio::Output;
use embassy_stm32::interrupt::{self, InterruptExt};
use embassy_stm32::pac;
use embassy_stm32::pac::exti::regs::Lines;
use ranging_core::{Edge, TriggerDriver, TriggerLevel};

use crate::ranging::core_duration_to_embassy;

/// EXTI line (and pin number) carrying the echo signal.
pub const ECHO_LINE: usize = 7;
/// `EXTICR` port index selecting GPIOB.
const ECHO_PORT: u8 = 1;

/// Trigger output driven by the pulse emitter.
pub struct HardwareTrigger<'d> {
    output: Output<'d>,
}

impl<'d> HardwareTrigger<'d> {
    pub fn new(output: Output<'d>) -> Self {
        Self { output }
    }
}

impl TriggerDriver for HardwareTrigger<'_> {
    fn drive(&mut self, level: TriggerLevel) {
        match level {
            TriggerLevel::Low => self.output.set_low(),
            TriggerLevel::High => self.output.set_high(),
        }
    }

    fn hold(&mut self, width: Duration) {
        embassy_time::block_for(core_duration_to_embassy(width));
    }
}

/// Routes the echo pin to its EXTI line, enables both edges, and unmasks the
/// line and its NVIC vector.
///
/// The echo pin must already be configured as an input.
pub fn enable_echo_interrupt() {
    let exti = pac::EXTI;
    exti.exticr(ECHO_LINE / 4)
        .modify(|w| w.set_exti(ECHO_LINE % 4, ECHO_PORT));
    exti.rtsr(0).modify(|w| w.set_line(ECHO_LINE, true));
    exti.ftsr(0).modify(|w| w.set_line(ECHO_LINE, true));
    clear_pending(true, true);
    exti.imr(0).modify(|w| w.set_line(ECHO_LINE, true));

    interrupt::EXTI4_15.unpend();
    // SAFETY: the handler for EXTI4_15 is defined in `runtime::echo_isr` and
    // only touches interrupt-safe state.
    unsafe { interrupt::EXTI4_15.enable() };
}

/// Reads and acknowledges the pending echo edges, oldest first.
///
/// Returns `[rising, falling]` flags; when both fired before the handler ran,
/// the rising edge is the one that happened first.
///
/// Both edges taken in one call share the handler-entry timestamp, so a pulse
/// shorter than the interrupt latency yields a zero width. That width still
/// classifies below the measurable band and surfaces as a `-1` reading.
pub fn take_pending_edges() -> [Option<Edge>; 2] {
    let exti = pac::EXTI;
    let rising = exti.rpr(0).read().line(ECHO_LINE);
    let falling = exti.fpr(0).read().line(ECHO_LINE);
    clear_pending(rising, falling);
    [
        rising.then_some(Edge::Rising),
        falling.then_some(Edge::Falling),
    ]
}

fn clear_pending(rising: bool, falling: bool) {
    let exti = pac::EXTI;
    let mut mask = Lines(0);
    mask.set_line(ECHO_LINE, true);
    if rising {
        exti.rpr(0).write_value(mask);
    }
    if falling {
        exti.fpr(0).write_value(mask);
    }
}
