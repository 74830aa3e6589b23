use embedded_hal::digital::{OutputPin, PinState};

/// The pin level that lights the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    High,
    /// LED wired between the supply and the pin.
    Low,
}

impl ActiveLevel {
    fn pin_state(self, on: bool) -> PinState {
        match self {
            ActiveLevel::High => PinState::from(on),
            ActiveLevel::Low => PinState::from(!on),
        }
    }
}

/// A binary indicator, typically an LED, on a single output pin.
pub struct Indicator<PIN> {
    pin: PIN,
    active: ActiveLevel,
    on: bool,
}

impl<PIN: OutputPin> Indicator<PIN> {
    /// Take the pin and switch the indicator off.
    pub fn new(pin: PIN, active: ActiveLevel) -> Result<Self, PIN::Error> {
        let mut indicator = Self {
            pin,
            active,
            on: false,
        };
        indicator.off()?;
        Ok(indicator)
    }

    pub fn on(&mut self) -> Result<(), PIN::Error> {
        self.set(true)
    }

    pub fn off(&mut self) -> Result<(), PIN::Error> {
        self.set(false)
    }

    pub fn set(&mut self, on: bool) -> Result<(), PIN::Error> {
        self.pin.set_state(self.active.pin_state(on))?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Light the indicator when a target is known to be within `threshold`.
    ///
    /// `reading` and `threshold` are in the same unit, usually straight from
    /// [`RangeFinder::measure_with_precision`](crate::RangeFinder::measure_with_precision).
    /// An unknown distance switches the indicator off. Returns the new state.
    pub fn show_proximity(
        &mut self,
        reading: Option<f64>,
        threshold: f64,
    ) -> Result<bool, PIN::Error> {
        let near = reading.is_some_and(|distance| distance <= threshold);
        if near != self.on {
            trace!("Indicator {}", if near { "on" } else { "off" });
        }
        self.set(near)?;
        Ok(near)
    }

    pub fn release(self) -> PIN {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    #[derive(Default)]
    struct OutputPinMock {
        writes: Vec<PinState>,
        fail: bool,
    }

    impl ErrorType for OutputPinMock {
        type Error = ErrorKind;
    }

    impl OutputPin for OutputPinMock {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.set_state(PinState::Low)
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.set_state(PinState::High)
        }
        fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            self.writes.push(state);
            Ok(())
        }
    }

    #[test]
    fn starts_switched_off() {
        let indicator = Indicator::new(OutputPinMock::default(), ActiveLevel::High).unwrap();
        assert!(!indicator.is_on());
        assert_eq!(indicator.release().writes, vec![PinState::Low]);
    }

    #[test]
    fn active_low_inverts_the_pin() {
        let mut indicator = Indicator::new(OutputPinMock::default(), ActiveLevel::Low).unwrap();
        indicator.on().unwrap();
        assert!(indicator.is_on());
        indicator.off().unwrap();
        assert_eq!(
            indicator.release().writes,
            vec![PinState::High, PinState::Low, PinState::High]
        );
    }

    #[test]
    fn proximity_lights_within_threshold() {
        let mut indicator = Indicator::new(OutputPinMock::default(), ActiveLevel::High).unwrap();
        assert_eq!(indicator.show_proximity(Some(15.0), 20.0), Ok(true));
        assert_eq!(indicator.show_proximity(Some(20.0), 20.0), Ok(true));
        assert_eq!(indicator.show_proximity(Some(20.5), 20.0), Ok(false));
        assert!(!indicator.is_on());
    }

    #[test]
    fn unknown_distance_switches_off() {
        let mut indicator = Indicator::new(OutputPinMock::default(), ActiveLevel::High).unwrap();
        indicator.on().unwrap();
        assert_eq!(indicator.show_proximity(None, 20.0), Ok(false));
        assert!(!indicator.is_on());
    }

    #[test]
    fn failing_pin_is_reported() {
        let pin = OutputPinMock {
            fail: true,
            ..Default::default()
        };
        assert!(Indicator::new(pin, ActiveLevel::Low).is_err());
    }
}
