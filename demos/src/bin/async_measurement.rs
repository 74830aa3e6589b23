//! # Async Single-Shot Measurement
//! This example takes one raw sample every 100 ms, awaiting the echo edges instead of spinning
//! on the echo pin. The core is free for other tasks while the sensor is ranging.
//!
//! ## Note
//!
//! Most of the hc-sr04 sensors are rated for 5V. The Raspberry Pi Pico is a 3.3V device. While some hc-sr04 tolerate to be operated on 3.3V, it is not recommended to do so. At best the sensor will have a reduced precision.
//! When operating the sensor at 5V with a 3.3V controller like the Pi Pico, the following considerations must be taken into account:
//!
//! - The trigger pin can be directly connected to the controller. 3.3V should be enough to trigger the sensor.
//! - The echo pin must be connected to the controller through a voltage divider to reduce the voltage from 5V to 3.3V. The echo pin on the hc-sr04 will output 5V when the sensor is operated at 5V and that will then damage the controller.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Duration, Instant, Timer};
use sonar_ranging::{Config, Now, RangeFinder, SpeedOfSound, TemperatureUnit};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let trigger = Output::new(p.PIN_13, Level::Low);
    let echo = Input::new(p.PIN_28, Pull::None);

    // The temperature of the environment, if known, can be used to adjust the speed of sound.
    // If unknown, the fixed default speed is used.
    let config = Config::new().with_speed_of_sound(SpeedOfSound::AirTemperature {
        temperature: 24.0,
        unit: TemperatureUnit::Celsius,
    });

    // Create clock function that returns microseconds
    struct EmbassyClock;

    impl Now for EmbassyClock {
        fn now_micros(&self) -> u64 {
            Instant::now().as_micros()
        }
    }

    let mut sensor = RangeFinder::new(trigger, echo, config, EmbassyClock, Delay);

    loop {
        match sensor.measure_once_async().await {
            Ok(distance) => {
                info!("Distance: {} mm", distance);
            }
            Err(e) => {
                info!("Error: {:?}", e);
            }
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}
