use embassy_time::Ticker;
use ranging_core::{PulseEmitter, RangingConfig};

use super::CYCLE_SIGNAL;
use crate::hw::HardwareTrigger;
use crate::ranging::{SignalNotifier, core_duration_to_embassy};

/// Fires one trigger pulse per period and raises the cycle signal after each.
#[embassy_executor::task]
pub async fn run(trigger: HardwareTrigger<'static>, config: RangingConfig) -> ! {
    let mut emitter = PulseEmitter::new(trigger, SignalNotifier::new(&CYCLE_SIGNAL), &config);
    let mut ticker = Ticker::every(core_duration_to_embassy(config.period));

    loop {
        emitter.fire();
        ticker.next().await;
    }
}
