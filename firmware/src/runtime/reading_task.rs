use crate::ranging::ReadingReceiver;
use crate::telemetry;

/// Stand-in consumer: drains the reading queue and logs each reading.
#[embassy_executor::task]
pub async fn run(readings: ReadingReceiver<'static>) -> ! {
    loop {
        telemetry::log_reading(readings.receive().await);
    }
}
