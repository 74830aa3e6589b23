//! This module defines the error type returned by ranging operations.

use embedded_hal::digital::ErrorKind;

/// The echo transition a measurement was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoEdge {
    /// Echo pin going high, the sensor acknowledging the trigger.
    Rising,
    /// Echo pin going low, the reflected burst arriving.
    Falling,
}

/// The configuration setting that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
    /// `accuracy_error_mm` is negative or not finite.
    AccuracyError,
    /// The speed of sound is not a finite positive number, e.g. an air
    /// temperature below absolute zero.
    SpeedOfSound,
}

/// Error type for ranging operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Reading or writing one of the sensor pins failed.
    Pin(ErrorKind),
    /// The echo pin was already high before the trigger pulse.
    /// Usually the previous echo never finished.
    EchoAlreadyHigh,
    /// The echo pin did not make the transition within the echo timeout.
    NoEcho(EchoEdge),
    /// The measurement was aborted through its [`CancelToken`](crate::CancelToken).
    Cancelled,
    /// A precision measurement asked for zero samples.
    InvalidRepeats(usize),
    /// A precision measurement asked for more samples than the batch of the
    /// [`RangeFinder`](crate::RangeFinder) holds.
    BatchCapacity { repeats: usize, capacity: usize },
    /// The [`Config`](crate::Config) cannot produce a meaningful distance.
    InvalidConfig(Setting),
}

impl Error {
    pub(crate) fn pin<E: embedded_hal::digital::Error>(e: E) -> Self {
        Error::Pin(e.kind())
    }

    /// Whether this error only spoils the current sample.
    ///
    /// Inside a precision measurement such samples count as zero and are left to the
    /// outlier rejection; every other error aborts the batch.
    pub fn is_sample_failure(&self) -> bool {
        matches!(self, Error::NoEcho(_) | Error::EchoAlreadyHigh)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Pin(kind) => write!(f, "Sensor pin error: {:?}", kind),
            Error::EchoAlreadyHigh => write!(f, "Echo pin is already high"),
            Error::NoEcho(EchoEdge::Rising) => write!(f, "Timeout waiting for echo pin to go high"),
            Error::NoEcho(EchoEdge::Falling) => write!(f, "Timeout waiting for echo pin to go low"),
            Error::Cancelled => write!(f, "Measurement cancelled"),
            Error::InvalidRepeats(repeats) => {
                write!(f, "Invalid number of precision repeats: {}", repeats)
            }
            Error::BatchCapacity { repeats, capacity } => write!(
                f,
                "{} precision repeats exceed the batch capacity of {}",
                repeats, capacity
            ),
            Error::InvalidConfig(Setting::AccuracyError) => {
                write!(f, "Accuracy error must be a finite, non-negative distance")
            }
            Error::InvalidConfig(Setting::SpeedOfSound) => {
                write!(f, "Speed of sound must be finite and positive")
            }
        }
    }
}

impl core::error::Error for Error {}
