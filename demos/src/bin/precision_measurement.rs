//! # Precision Measurement with Proximity Indicator
//! This example fires the sensor five times per reading and averages the samples that agree with
//! the median, which filters out the odd stray reflection. The onboard LED lights up whenever an
//! object is closer than `PROXIMITY_CM`.
//!
//! The blocking API spins on the echo pin while ranging. That is fine here because nothing else
//! runs on the executor; a task sharing the core with others should use the `*_async` methods.
//!
//! ## Note
//!
//! The echo pin must be connected to the controller through a voltage divider when the sensor is
//! operated at 5V. See the `async_measurement` example.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Duration, Instant, Timer};
use sonar_ranging::{ActiveLevel, Config, Indicator, MeasureUnit, Now, RangeFinder};
use {defmt_rtt as _, panic_probe as _};

/// Samples per reading
const PRECISION_REPEATS: usize = 5;

/// Light the LED for anything closer than this
const PROXIMITY_CM: f64 = 20.0;

/// Pause between two readings
const READING_INTERVAL: Duration = Duration::from_millis(200);

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let trigger = Output::new(p.PIN_13, Level::Low);
    let echo = Input::new(p.PIN_28, Pull::None);
    let led = Output::new(p.PIN_25, Level::Low);

    let config = Config::new()
        .with_unit(MeasureUnit::Centimeters)
        .with_accuracy_error_mm(50.0);

    // Create clock function that returns microseconds
    struct EmbassyClock;

    impl Now for EmbassyClock {
        fn now_micros(&self) -> u64 {
            Instant::now().as_micros()
        }
    }

    let mut sensor = RangeFinder::new(trigger, echo, config, EmbassyClock, Delay);
    let mut indicator = unwrap!(Indicator::new(led, ActiveLevel::High));

    // Blink once so a dead LED is noticed at power-up
    unwrap!(indicator.on());
    Timer::after(Duration::from_secs(1)).await;
    unwrap!(indicator.off());

    loop {
        match sensor.measure_with_precision(PRECISION_REPEATS) {
            Ok(Some(distance)) => {
                info!("Distance: {} {}", distance, config.unit.symbol());
                unwrap!(indicator.show_proximity(Some(distance), PROXIMITY_CM));
            }
            Ok(None) => {
                info!("No target in range");
                unwrap!(indicator.show_proximity(None, PROXIMITY_CM));
            }
            Err(e) => {
                warn!("Measurement error: {:?}", e);
            }
        }
        Timer::after(READING_INTERVAL).await;
    }
}
