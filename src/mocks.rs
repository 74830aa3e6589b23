//! A simulated HC-SR04 on a virtual microsecond clock.
//!
//! Every clock read advances time by one microsecond, so spin loops make progress,
//! and delays jump the clock forward. Async delays yield once first. Each falling
//! edge of the trigger pulse schedules the next scripted echo.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorKind, ErrorType, InputPin, OutputPin},
};
use embassy_futures::yield_now;
use embedded_hal_async::{delay::DelayNs as DelayNsAsync, digital::Wait};
use libm::round;

use crate::{cancel::CancelToken, clock::Now, config::Config};

/// Time between the end of the trigger pulse and the echo going high.
pub const ECHO_LATENCY_US: u64 = 450;

/// What the sensor does after one trigger pulse.
#[derive(Debug, Clone, Copy)]
pub enum Echo {
    /// Echo high for this many microseconds.
    Pulse(u64),
    /// Echo never goes high.
    Silent,
    /// Echo goes high and stays there.
    NeverFalls,
}

impl Echo {
    /// The echo pulse a target at `millimeters` produces under `config`.
    pub fn at_distance(millimeters: f64, config: &Config) -> Self {
        let round_trip_us = millimeters * 2.0 / config.speed_of_sound.millimeters_per_micro();
        Echo::Pulse(round(round_trip_us) as u64)
    }
}

#[derive(Default)]
struct RigState {
    now: u64,
    echoes: VecDeque<Echo>,
    /// Rising and falling edge of the current echo.
    pulse: Option<(u64, u64)>,
    trigger_high_since: Option<u64>,
    /// Start and width of every trigger pulse.
    trigger_pulses: Vec<(u64, u64)>,
    fail_trigger: bool,
    cancel_at: Option<(u64, Rc<CancelToken>)>,
}

impl RigState {
    fn advance(&mut self, us: u64) {
        self.now += us;
        if let Some((at, token)) = &self.cancel_at {
            if self.now >= *at {
                token.cancel();
            }
        }
    }

    fn echo_is_high(&self) -> bool {
        self.pulse
            .is_some_and(|(rise, fall)| self.now >= rise && self.now < fall)
    }

    fn schedule_echo(&mut self) {
        let start = self.now + ECHO_LATENCY_US;
        self.pulse = match self.echoes.pop_front().unwrap_or(Echo::Silent) {
            Echo::Pulse(width) => Some((start, start + width)),
            Echo::Silent => None,
            Echo::NeverFalls => Some((start, u64::MAX)),
        };
    }
}

#[derive(Clone)]
pub struct Rig(Rc<RefCell<RigState>>);

impl Rig {
    pub fn new(echoes: impl IntoIterator<Item = Echo>) -> Self {
        Rig(Rc::new(RefCell::new(RigState {
            echoes: echoes.into_iter().collect(),
            ..Default::default()
        })))
    }

    /// Current virtual time, without advancing it.
    pub fn now(&self) -> u64 {
        self.0.borrow().now
    }

    pub fn trigger_widths(&self) -> Vec<u64> {
        self.0.borrow().trigger_pulses.iter().map(|&(_, width)| width).collect()
    }

    pub fn trigger_starts(&self) -> Vec<u64> {
        self.0.borrow().trigger_pulses.iter().map(|&(start, _)| start).collect()
    }

    /// Make every trigger pin write fail.
    pub fn fail_trigger(&self) {
        self.0.borrow_mut().fail_trigger = true;
    }

    /// Cancel `token` once virtual time reaches `at`.
    pub fn cancel_at(&self, at: u64, token: Rc<CancelToken>) {
        self.0.borrow_mut().cancel_at = Some((at, token));
    }

    pub fn trigger(&self) -> TriggerPin {
        TriggerPin(self.clone())
    }

    pub fn echo(&self) -> EchoPin {
        EchoPin(self.clone())
    }

    pub fn clock(&self) -> Clock {
        Clock(self.clone())
    }

    pub fn delay(&self) -> Delay {
        Delay(self.clone())
    }

    fn advance_to(&self, at: u64) {
        let mut state = self.0.borrow_mut();
        let now = state.now;
        if at > now {
            state.advance(at - now);
        }
    }
}

pub struct TriggerPin(Rig);

impl ErrorType for TriggerPin {
    type Error = ErrorKind;
}

impl OutputPin for TriggerPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0 .0.borrow_mut();
        if state.fail_trigger {
            return Err(ErrorKind::Other);
        }
        if let Some(since) = state.trigger_high_since.take() {
            let width = state.now - since;
            state.trigger_pulses.push((since, width));
            state.schedule_echo();
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0 .0.borrow_mut();
        if state.fail_trigger {
            return Err(ErrorKind::Other);
        }
        if state.trigger_high_since.is_none() {
            state.trigger_high_since = Some(state.now);
        }
        Ok(())
    }
}

pub struct EchoPin(Rig);

impl ErrorType for EchoPin {
    type Error = ErrorKind;
}

impl InputPin for EchoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0 .0.borrow().echo_is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0 .0.borrow().echo_is_high())
    }
}

impl Wait for EchoPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        let rise = {
            let state = self.0 .0.borrow();
            match state.pulse {
                Some((rise, fall)) if fall > state.now => Some(rise.max(state.now)),
                _ => None,
            }
        };
        match rise {
            Some(at) => {
                self.0.advance_to(at);
                Ok(())
            }
            None => core::future::pending().await,
        }
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        let fall = {
            let state = self.0 .0.borrow();
            match state.pulse {
                Some((_, u64::MAX)) => None,
                Some((_, fall)) => Some(fall.max(state.now)),
                None => Some(state.now),
            }
        };
        match fall {
            Some(at) => {
                self.0.advance_to(at);
                Ok(())
            }
            None => core::future::pending().await,
        }
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_high().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_low().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }
}

pub struct Clock(Rig);

impl Now for Clock {
    fn now_micros(&self) -> u64 {
        let mut state = self.0 .0.borrow_mut();
        let now = state.now;
        state.advance(1);
        now
    }
}

pub struct Delay(Rig);

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.0 .0.borrow_mut().advance(u64::from(ns.div_ceil(1000)));
    }
}

impl DelayNsAsync for Delay {
    /// Suspends once before the time passes, so a measurement can be dropped mid-wait.
    async fn delay_ns(&mut self, ns: u32) {
        yield_now().await;
        self.0 .0.borrow_mut().advance(u64::from(ns.div_ceil(1000)));
    }
}
