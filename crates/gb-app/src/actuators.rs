//! Actuator bundle driven by the profile.

use std::cell::RefCell;
use std::rc::Rc;

use gb_controls::{Actuation, ActuationError, Command};
use gb_devices::{DeviceError, FanBank, Lights, Mister};

/// The mister, fans and lights of one growbox, each optional.
///
/// The same handles are registered with the loop as devices, so `begin()`
/// and telemetry see the state the profile leaves them in.
#[derive(Debug, Default)]
pub struct Actuators {
    mister: Option<Rc<RefCell<Mister>>>,
    fans: Option<Rc<RefCell<FanBank>>>,
    lights: Option<Rc<RefCell<Lights>>>,
}

fn present<T>(
    slot: &Option<Rc<RefCell<T>>>,
    command: Command,
) -> Result<&Rc<RefCell<T>>, ActuationError> {
    slot.as_ref().ok_or(ActuationError::Unavailable(command))
}

impl Actuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mister(mut self, mister: Rc<RefCell<Mister>>) -> Self {
        self.mister = Some(mister);
        self
    }

    pub fn with_fans(mut self, fans: Rc<RefCell<FanBank>>) -> Self {
        self.fans = Some(fans);
        self
    }

    pub fn with_lights(mut self, lights: Rc<RefCell<Lights>>) -> Self {
        self.lights = Some(lights);
        self
    }

    pub fn mister(&self) -> Option<&Rc<RefCell<Mister>>> {
        self.mister.as_ref()
    }

    pub fn fans(&self) -> Option<&Rc<RefCell<FanBank>>> {
        self.fans.as_ref()
    }

    pub fn lights(&self) -> Option<&Rc<RefCell<Lights>>> {
        self.lights.as_ref()
    }

    fn drive(&self, command: Command) -> Result<Result<(), DeviceError>, ActuationError> {
        Ok(match command {
            Command::Humidify => present(&self.mister, command)?.borrow_mut().humidify(),
            Command::MisterOn => present(&self.mister, command)?.borrow_mut().on(),
            Command::MisterOff => present(&self.mister, command)?.borrow_mut().off(),
            Command::FanExchange => present(&self.fans, command)?.borrow_mut().exchange(),
            Command::FansStop => present(&self.fans, command)?.borrow_mut().stop(),
            Command::LightsBrighter => present(&self.lights, command)?.borrow_mut().brighten(),
            Command::LightsDarker => present(&self.lights, command)?.borrow_mut().darken(),
        })
    }
}

impl Actuation for Actuators {
    fn actuate(&mut self, command: Command) -> Result<(), ActuationError> {
        tracing::info!(%command, "actuating");
        self.drive(command)?
            .map_err(|err| ActuationError::Failed {
                command,
                reason: err.to_string(),
            })
    }

    fn supports(&self, command: Command) -> bool {
        match command {
            Command::Humidify | Command::MisterOn | Command::MisterOff => self.mister.is_some(),
            Command::FanExchange | Command::FansStop => self.fans.is_some(),
            Command::LightsBrighter | Command::LightsDarker => self.lights.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_core::TrackingSleeper;
    use gb_devices::{SimSwitch, Switch, handle};
    use std::time::Duration;

    fn boxed(switch: &SimSwitch) -> Box<dyn Switch> {
        Box::new(switch.clone())
    }

    #[test]
    fn humidify_runs_the_mister_for_its_hold() {
        let sleeper = TrackingSleeper::new();
        let valve = SimSwitch::new("valve");
        let mister = handle(
            Mister::new("mister", boxed(&valve), Rc::new(sleeper.clone()))
                .with_humidify(Duration::from_secs(4)),
        );
        let mut actuators = Actuators::new().with_mister(mister.clone());

        actuators.actuate(Command::Humidify).unwrap();
        assert_eq!(valve.history(), vec![true, false]);
        assert_eq!(sleeper.calls(), vec![Duration::from_secs(4)]);
        assert!(!mister.borrow().is_on());
    }

    #[test]
    fn exchange_spins_both_banks() {
        let sleeper = TrackingSleeper::new();
        let upper = SimSwitch::new("upper");
        let lower = SimSwitch::new("lower");
        let fans = FanBank::new(
            "fans",
            vec![boxed(&upper)],
            vec![boxed(&lower)],
            Rc::new(sleeper.clone()),
        )
        .unwrap()
        .with_exchange(Duration::from_secs(5));
        let mut actuators = Actuators::new().with_fans(handle(fans));

        actuators.actuate(Command::FanExchange).unwrap();
        assert_eq!(upper.history(), vec![true, false]);
        assert_eq!(lower.history(), vec![true, false]);
        assert_eq!(sleeper.total(), Duration::from_secs(5));
    }

    #[test]
    fn missing_actuator_is_unavailable() {
        let mut actuators = Actuators::new();
        assert!(!actuators.supports(Command::LightsBrighter));
        assert_eq!(
            actuators.actuate(Command::LightsBrighter),
            Err(ActuationError::Unavailable(Command::LightsBrighter))
        );
    }

    #[test]
    fn lights_follow_brighter_and_darker() {
        let switch = SimSwitch::new("lamp");
        let lights = handle(Lights::new("lights", boxed(&switch)));
        let mut actuators = Actuators::new().with_lights(lights.clone());
        actuators.actuate(Command::LightsBrighter).unwrap();
        assert!(lights.borrow().is_on());
        actuators.actuate(Command::LightsDarker).unwrap();
        assert!(!lights.borrow().is_on());
    }
}
