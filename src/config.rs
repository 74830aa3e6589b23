use libm::sqrt;

use crate::{
    error::{Error, Setting},
    unit::MeasureUnit,
};

/// The temperature unit used by [`SpeedOfSound::AirTemperature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// How fast the ultrasonic burst travels.
///
/// Sensor families and mounting differ enough that there is no single right value, so
/// the speed is part of the configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedOfSound {
    /// A fixed speed in meters per second.
    Fixed { meters_per_second: f64 },
    /// Derive the speed from the air temperature.
    AirTemperature { temperature: f64, unit: TemperatureUnit },
}

impl SpeedOfSound {
    /// 343.3 m/s, dry air at roughly 20 °C.
    pub const DEFAULT: SpeedOfSound = SpeedOfSound::Fixed {
        meters_per_second: 343.3,
    };

    /// Speed of sound in meters per second.
    pub fn meters_per_second(&self) -> f64 {
        match *self {
            SpeedOfSound::Fixed { meters_per_second } => meters_per_second,
            SpeedOfSound::AirTemperature { temperature, unit } => {
                let celsius = match unit {
                    TemperatureUnit::Celsius => temperature,
                    TemperatureUnit::Fahrenheit => (temperature - 32.0) * 5.0 / 9.0,
                };
                331.5 * sqrt(1.0 + (celsius / 273.15))
            }
        }
    }

    /// Speed of sound in millimeters per microsecond, the unit echo pulses are timed in.
    pub fn millimeters_per_micro(&self) -> f64 {
        self.meters_per_second() / 1000.0
    }
}

impl Default for SpeedOfSound {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The configuration for a [`RangeFinder`](crate::RangeFinder).
///
/// Set once at construction; measurements never change it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Unit of precision measurement results.
    pub unit: MeasureUnit,
    pub speed_of_sound: SpeedOfSound,
    /// Samples further than this from the batch median are discarded as noise.
    pub accuracy_error_mm: f64,
    /// Upper bound for each of the two echo waits.
    pub echo_timeout_us: u64,
    /// How long the trigger is held low before the pulse, for a clean rising edge.
    pub trigger_settle_us: u32,
    pub trigger_pulse_us: u32,
    /// Minimum time between two trigger pulses. Triggering sooner picks up the
    /// previous burst's late reflections.
    pub measurement_cycle_us: u64,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            unit: MeasureUnit::Millimeters,
            speed_of_sound: SpeedOfSound::DEFAULT,
            accuracy_error_mm: 50.0,
            // The HC-SR04 holds echo high for about 38 ms when nothing reflects.
            echo_timeout_us: 40_000,
            trigger_settle_us: 2,
            trigger_pulse_us: 10,
            measurement_cycle_us: 60_000,
        }
    }

    pub const fn with_unit(mut self, unit: MeasureUnit) -> Self {
        self.unit = unit;
        self
    }

    pub const fn with_speed_of_sound(mut self, speed_of_sound: SpeedOfSound) -> Self {
        self.speed_of_sound = speed_of_sound;
        self
    }

    pub const fn with_accuracy_error_mm(mut self, accuracy_error_mm: f64) -> Self {
        self.accuracy_error_mm = accuracy_error_mm;
        self
    }

    pub const fn with_echo_timeout_us(mut self, echo_timeout_us: u64) -> Self {
        self.echo_timeout_us = echo_timeout_us;
        self
    }

    pub const fn with_trigger_pulse_us(mut self, trigger_pulse_us: u32) -> Self {
        self.trigger_pulse_us = trigger_pulse_us;
        self
    }

    pub const fn with_measurement_cycle_us(mut self, measurement_cycle_us: u64) -> Self {
        self.measurement_cycle_us = measurement_cycle_us;
        self
    }

    /// Check that the configuration yields finite, non-negative distances.
    ///
    /// Measurements run this before touching any pin.
    pub fn validate(&self) -> Result<(), Error> {
        let accuracy = self.accuracy_error_mm;
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(Error::InvalidConfig(Setting::AccuracyError));
        }
        let speed = self.speed_of_sound.meters_per_second();
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidConfig(Setting::SpeedOfSound));
        }
        Ok(())
    }

    /// One-way distance in millimeters for an echo pulse of `pulse_us`.
    pub fn distance_mm(&self, pulse_us: u64) -> f64 {
        pulse_us as f64 * self.speed_of_sound.millimeters_per_micro() / 2.0
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
