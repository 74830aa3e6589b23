//! Measurements for HALs with interrupt-driven edge detection.
//!
//! Instead of spinning on the echo pin, these await `Wait::wait_for_high` and
//! `Wait::wait_for_low`, each raced against the echo timeout. There is no cancel
//! token here: dropping the future cancels the measurement.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_hal_async::{delay::DelayNs as DelayNsAsync, digital::Wait};
use futures::{select_biased, FutureExt};

use crate::{
    clock::{Now, Stopwatch},
    error::{EchoEdge, Error},
    sensor::{sample_or_zero, RangeFinder},
};

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, const N: usize> RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY, N>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin + Wait,
    CLOCK: Now,
    DELAY: DelayNs + DelayNsAsync,
{
    /// Measure `repeats` times and average the samples that agree with the median.
    /// Returns the distance in the unit specified in the config, or `None` when no
    /// sample saw a target.
    pub async fn measure_with_precision_async(
        &mut self,
        repeats: usize,
    ) -> Result<Option<f64>, Error> {
        let repeats = self.check_request(repeats)?;
        let mut batch = [0.0; N];
        for sample in batch[..repeats].iter_mut() {
            *sample = sample_or_zero(self.measure_once_async().await)?;
        }
        Ok(self.settle(&mut batch[..repeats]))
    }

    /// Take a single raw sample. Returns the distance in millimeters.
    pub async fn measure_once_async(&mut self) -> Result<f64, Error> {
        self.config.validate()?;

        let remaining = self.cycle_remaining_us();
        if remaining > 0 {
            DelayNsAsync::delay_us(&mut self.delay, remaining).await;
        }

        self.ensure_echo_low()?;

        // Send the trigger pulse
        self.trigger.set_low().map_err(Error::pin)?;
        DelayNs::delay_us(&mut self.delay, self.config.trigger_settle_us);
        self.mark_triggered();
        self.trigger.set_high().map_err(Error::pin)?;

        // Either block for or wait for the pulse width, depending on active feature flag
        #[cfg(feature = "blocking_trigger")]
        DelayNs::delay_us(&mut self.delay, self.config.trigger_pulse_us);
        #[cfg(not(feature = "blocking_trigger"))]
        DelayNsAsync::delay_us(&mut self.delay, self.config.trigger_pulse_us).await;

        self.trigger.set_low().map_err(Error::pin)?;

        let timeout_us = self.echo_timeout_us();

        let mut stopwatch = select_biased! {
            res = self.echo.wait_for_high().fuse() => {
                res.map_err(Error::pin)?;
                Stopwatch::start(&self.clock)
            }
            _ = DelayNsAsync::delay_us(&mut self.delay, timeout_us).fuse() => {
                debug!("Timeout waiting for echo pin to go high");
                return Err(Error::NoEcho(EchoEdge::Rising));
            }
        };

        let pulse_us = select_biased! {
            res = self.echo.wait_for_low().fuse() => {
                res.map_err(Error::pin)?;
                stopwatch.stop(&self.clock)
            }
            _ = DelayNsAsync::delay_us(&mut self.delay, timeout_us).fuse() => {
                debug!("Timeout waiting for echo pin to go low");
                return Err(Error::NoEcho(EchoEdge::Falling));
            }
        };

        let distance = self.config.distance_mm(pulse_us);
        trace!("Echo pulse {} us, {} mm", pulse_us, distance);
        Ok(distance)
    }
}
