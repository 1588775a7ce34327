use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use ranging_core::RangingConfig;

use crate::hw::{self, HardwareTrigger};
use crate::ranging::{CycleSignal, ReadingQueue, TimingQueue};
use crate::telemetry;

mod echo_isr;
mod emitter_task;
mod reading_task;
mod resolver_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static CYCLE_SIGNAL: CycleSignal = CycleSignal::new();
pub(super) static TIMING_QUEUE: TimingQueue = TimingQueue::new();
pub(super) static READING_QUEUE: ReadingQueue = ReadingQueue::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = RangingConfig::DEFAULT
        .validate()
        .expect("ranging configuration rejected");

    let hal::Peripherals { PA6, PB7, .. } = hal::init(hal::Config::default());

    let trigger = HardwareTrigger::new(Output::new(PA6, Level::Low, Speed::VeryHigh));
    // The pin is configured before the EXTI line is unmasked so no edge fires
    // against a floating input.
    let echo = Input::new(PB7, Pull::Up);
    hw::enable_echo_interrupt();

    telemetry::log_startup(&config);

    spawner
        .spawn(reading_task::run(READING_QUEUE.receiver()))
        .expect("failed to spawn reading task");
    spawner
        .spawn(resolver_task::run(echo, config))
        .expect("failed to spawn resolver task");
    spawner
        .spawn(emitter_task::run(trigger, config))
        .expect("failed to spawn emitter task");

    core::future::pending::<()>().await;
}
