//! # sonar-ranging
//!
//! This crate provides a driver for HC-SR04 style ultrasonic distance sensors that trades a
//! little time for a lot of stability: a precision measurement fires the sensor several
//! times, takes the median-ranked sample as reference, drops every sample further than a
//! configurable accuracy error from it and averages the rest.
//!
//! Distances are measured in millimeters and reported in the [`MeasureUnit`] of the
//! [`Config`]. A batch in which no sample saw an echo is reported as `None` rather than as
//! a distance of zero, so a missing target never looks like an object touching the sensor.
//!
//! A precision measurement keeps its samples on the stack. A [`RangeFinder`] holds up to
//! [`DEFAULT_BATCH_CAPACITY`] of them unless built with [`RangeFinder::with_capacity`].
//! The [`Config`] is checked before every measurement; an impossible setting is
//! reported as [`Error::InvalidConfig`].
//!
//! Both echo waits are bounded by [`Config::echo_timeout_us`]. The blocking API spins on the
//! echo pin and can be aborted through a [`CancelToken`]; the `*_async` API awaits the echo
//! edges through `embedded-hal-async`'s `Wait`.
//!
//! ## Features
//!
//! - `blocking_trigger`: (Default) This feature enables blocking behavior for the trigger pulse
//!   of the async API, ensuring more accurate timing. For 10us async is not very accurate, because
//!   it introduces a few microseconds of management. The blocking API always blocks.
//! - `defmt`: log through `defmt` and derive `defmt::Format` for the public types.
//! - `log`: log through the `log` facade.
//!
//! # Example
//!
//! ```rust, ignore
//! #![no_std]
//! #![no_main]
//!
//! use defmt::*;
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Input, Level, Output, Pull};
//! use embassy_time::{Delay, Duration, Instant, Timer};
//! use sonar_ranging::{ActiveLevel, Config, Indicator, MeasureUnit, Now, RangeFinder};
//! use {defmt_rtt as _, panic_probe as _};
//!
//! #[embassy_executor::main]
//! async fn main(_spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!
//!     let trigger = Output::new(p.PIN_13, Level::Low);
//!     let echo = Input::new(p.PIN_28, Pull::None);
//!     let led = Output::new(p.PIN_25, Level::Low);
//!
//!     let config = Config::new()
//!         .with_unit(MeasureUnit::Centimeters)
//!         .with_accuracy_error_mm(50.0);
//!
//!     // Create clock function that returns microseconds
//!     struct EmbassyClock;
//!
//!     impl Now for EmbassyClock {
//!         fn now_micros(&self) -> u64 {
//!             Instant::now().as_micros()
//!         }
//!     }
//!
//!     let mut sensor = RangeFinder::new(trigger, echo, config, EmbassyClock, Delay);
//!     let mut indicator = unwrap!(Indicator::new(led, ActiveLevel::High));
//!
//!     loop {
//!         match sensor.measure_with_precision(5) {
//!             Ok(reading) => {
//!                 info!("Distance: {:?} cm", reading);
//!                 // Light the LED for anything closer than 20 cm
//!                 unwrap!(indicator.show_proximity(reading, 20.0));
//!             }
//!             Err(e) => info!("Error: {:?}", e),
//!         }
//!         Timer::after(Duration::from_millis(100)).await;
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod asynch;
mod cancel;
mod clock;
mod config;
mod error;
pub mod filter;
mod indicator;
mod sensor;
mod unit;

#[cfg(test)]
mod mocks;

pub use cancel::CancelToken;
pub use clock::{Deadline, Now, Stopwatch};
pub use config::{Config, SpeedOfSound, TemperatureUnit};
pub use error::{EchoEdge, Error, Setting};
pub use indicator::{ActiveLevel, Indicator};
pub use sensor::{RangeFinder, DEFAULT_BATCH_CAPACITY};
pub use unit::{convert, MeasureUnit};
