use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    cancel::CancelToken,
    clock::{Deadline, Now, Stopwatch},
    config::Config,
    error::{EchoEdge, Error},
    filter,
    unit::convert,
};

/// Batch capacity of a [`RangeFinder`] built with [`RangeFinder::new`].
pub const DEFAULT_BATCH_CAPACITY: usize = 32;

/// Ultrasonic range finder driver for HC-SR04 style sensors.
///
/// The driver owns its trigger and echo pins for as long as it lives; use
/// [`RangeFinder::release`] to get them back. Measurements take `&mut self`, so sensors
/// sharing one GPIO controller have to be serialized by the caller.
///
/// # Note
///
/// Every wait on the echo pin is bounded by [`Config::echo_timeout_us`]. A sensor that
/// never answers produces [`Error::NoEcho`] instead of hanging.
///
/// `N` is the number of samples a precision measurement can hold. The batch lives on the
/// stack for the duration of one measurement, so `N` trades stack space for the largest
/// usable `repeats`.
pub struct RangeFinder<
    TRIGPIN,
    ECHOPIN,
    CLOCK,
    DELAY,
    const N: usize = DEFAULT_BATCH_CAPACITY,
> {
    pub(crate) trigger: TRIGPIN,
    pub(crate) echo: ECHOPIN,
    pub(crate) config: Config,
    pub(crate) clock: CLOCK,
    pub(crate) delay: DELAY,
    last_trigger_at: Option<u64>,
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY> RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY> {
    /// Initialize a new sensor.
    /// Requires trigger pin and an echo pin, measurements are taken on the echo pin.
    /// Requires a config.
    /// Requires a clock that will provide the time in microseconds via the `Now` trait.
    /// Requires a delay that implements DelayNs.
    ///
    /// Precision measurements hold up to [`DEFAULT_BATCH_CAPACITY`] samples; use
    /// [`RangeFinder::with_capacity`] for more.
    pub fn new(
        trigger: TRIGPIN,
        echo: ECHOPIN,
        config: Config,
        clock: CLOCK,
        delay: DELAY,
    ) -> Self {
        Self::with_capacity(trigger, echo, config, clock, delay)
    }
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, const N: usize>
    RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY, N>
{
    /// Initialize a new sensor whose precision measurements hold up to `N` samples.
    ///
    /// ```rust, ignore
    /// let mut sensor: RangeFinder<_, _, _, _, 100> =
    ///     RangeFinder::with_capacity(trigger, echo, config, clock, delay);
    /// ```
    pub fn with_capacity(
        trigger: TRIGPIN,
        echo: ECHOPIN,
        config: Config,
        clock: CLOCK,
        delay: DELAY,
    ) -> Self {
        Self {
            trigger,
            echo,
            config,
            clock,
            delay,
            last_trigger_at: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The largest `repeats` a precision measurement accepts.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Give back the trigger and echo pins.
    pub fn release(self) -> (TRIGPIN, ECHOPIN) {
        (self.trigger, self.echo)
    }

    /// Validate a precision request before any pin is touched.
    pub(crate) fn check_request(&self, repeats: usize) -> Result<usize, Error> {
        self.config.validate()?;
        if repeats == 0 {
            error!("Invalid number of precision repeats: {}", repeats);
            return Err(Error::InvalidRepeats(repeats));
        }
        if repeats > N {
            error!("{} precision repeats exceed the batch capacity of {}", repeats, N);
            return Err(Error::BatchCapacity {
                repeats,
                capacity: N,
            });
        }
        Ok(repeats)
    }

    /// Reduce a finished batch to a distance in the configured unit.
    pub(crate) fn settle(&self, batch: &mut [f64]) -> Option<f64> {
        match filter::average_excluding_outliers(batch, self.config.accuracy_error_mm) {
            Some(millimeters) => {
                debug!("Averaged {} samples to {} mm", batch.len(), millimeters);
                Some(convert(millimeters, self.config.unit))
            }
            None => {
                info!("No target detected in {} samples", batch.len());
                None
            }
        }
    }
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, const N: usize> RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY, N>
where
    CLOCK: Now,
{
    /// Microseconds left until the sensor may be triggered again.
    pub(crate) fn cycle_remaining_us(&self) -> u32 {
        let Some(last) = self.last_trigger_at else {
            return 0;
        };
        let since_last = self.clock.now_micros().saturating_sub(last);
        let remaining = self.config.measurement_cycle_us.saturating_sub(since_last);
        u32::try_from(remaining).unwrap_or(u32::MAX)
    }

    pub(crate) fn mark_triggered(&mut self) {
        self.last_trigger_at = Some(self.clock.now_micros());
    }

    pub(crate) fn echo_timeout_us(&self) -> u32 {
        u32::try_from(self.config.echo_timeout_us).unwrap_or(u32::MAX)
    }
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, const N: usize> RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY, N>
where
    ECHOPIN: InputPin,
{
    /// A high echo before the trigger means the previous echo never finished.
    pub(crate) fn ensure_echo_low(&mut self) -> Result<(), Error> {
        if self.echo.is_high().map_err(Error::pin)? {
            warn!("Echo pin is already high, skipping trigger");
            return Err(Error::EchoAlreadyHigh);
        }
        Ok(())
    }
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, const N: usize> RangeFinder<TRIGPIN, ECHOPIN, CLOCK, DELAY, N>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
    CLOCK: Now,
    DELAY: DelayNs,
{
    /// Measure the distance once, in the unit specified in the config.
    ///
    /// Returns `None` when no echo came back.
    pub fn measure(&mut self) -> Result<Option<f64>, Error> {
        self.measure_with_precision(1)
    }

    /// Measure `repeats` times and average the samples that agree with the median.
    /// Returns the distance in the unit specified in the config, or `None` when no
    /// sample saw a target.
    pub fn measure_with_precision(&mut self, repeats: usize) -> Result<Option<f64>, Error> {
        self.measure_with_precision_cancellable(repeats, &CancelToken::new())
    }

    /// Like [`RangeFinder::measure_with_precision`], aborting with [`Error::Cancelled`]
    /// as soon as `cancel` is set.
    pub fn measure_with_precision_cancellable(
        &mut self,
        repeats: usize,
        cancel: &CancelToken,
    ) -> Result<Option<f64>, Error> {
        let repeats = self.check_request(repeats)?;
        let mut batch = [0.0; N];
        for sample in batch[..repeats].iter_mut() {
            *sample = sample_or_zero(self.measure_once_cancellable(cancel))?;
        }
        Ok(self.settle(&mut batch[..repeats]))
    }

    /// Take a single raw sample. Returns the distance in millimeters.
    pub fn measure_once(&mut self) -> Result<f64, Error> {
        self.measure_once_cancellable(&CancelToken::new())
    }

    /// Take a single raw sample, aborting with [`Error::Cancelled`] as soon as `cancel`
    /// is set. Returns the distance in millimeters.
    pub fn measure_once_cancellable(&mut self, cancel: &CancelToken) -> Result<f64, Error> {
        self.config.validate()?;

        let remaining = self.cycle_remaining_us();
        if remaining > 0 {
            self.delay.delay_us(remaining);
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.ensure_echo_low()?;
        self.send_trigger_pulse()?;

        self.wait_for_echo(EchoEdge::Rising, cancel)?;
        let mut stopwatch = Stopwatch::start(&self.clock);
        self.wait_for_echo(EchoEdge::Falling, cancel)?;
        let pulse_us = stopwatch.stop(&self.clock);

        let distance = self.config.distance_mm(pulse_us);
        trace!("Echo pulse {} us, {} mm", pulse_us, distance);
        Ok(distance)
    }

    fn send_trigger_pulse(&mut self) -> Result<(), Error> {
        self.trigger.set_low().map_err(Error::pin)?;
        self.delay.delay_us(self.config.trigger_settle_us);

        self.mark_triggered();
        self.trigger.set_high().map_err(Error::pin)?;
        self.delay.delay_us(self.config.trigger_pulse_us);
        self.trigger.set_low().map_err(Error::pin)
    }

    /// Spin on the echo pin until it shows `edge`.
    fn wait_for_echo(&mut self, edge: EchoEdge, cancel: &CancelToken) -> Result<(), Error> {
        let target_high = edge == EchoEdge::Rising;
        let deadline = Deadline::after(&self.clock, self.config.echo_timeout_us);
        loop {
            if self.echo.is_high().map_err(Error::pin)? == target_high {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if deadline.has_expired(&self.clock) {
                debug!("Timeout waiting for echo edge {:?}", edge);
                return Err(Error::NoEcho(edge));
            }
        }
    }
}

/// Failed samples enter the batch as zero and are left to the outlier rejection.
pub(crate) fn sample_or_zero(sample: Result<f64, Error>) -> Result<f64, Error> {
    match sample {
        Ok(distance) => Ok(distance),
        Err(e) if e.is_sample_failure() => {
            debug!("Sample failed: {:?}", e);
            Ok(0.0)
        }
        Err(e) => Err(e),
    }
}
