//! Growing profile: the checks run against every reading.
//!
//! Evaluation order is fixed and every check runs every cycle:
//!
//! 1. lux: below range brightens the lights, above range darkens them
//! 2. humidity: below range humidifies, above range exchanges air
//! 3. co2: any violation exchanges air
//! 4. air exchange timer: when due, stops the mister and exchanges air
//!
//! Unset entries take defaults when the profile is configured: humidity must
//! stay inside (95, 100) %, CO2 above 2000 ppm is the alert band, and air is
//! exchanged every 20 minutes. Lux has no default.

use std::str::FromStr;

use gb_core::{FieldKind, Reading};
use serde::{Deserialize, Serialize};

use crate::actuation::{Actuation, Command};
use crate::error::{ControlError, ControlResult};
use crate::periodic::PeriodicAction;
use crate::threshold::{Polarity, Threshold, ThresholdSpec, Verdict};

/// Fields a profile can check, in evaluation order.
pub const MONITORED: [FieldKind; 3] = [FieldKind::Lux, FieldKind::Humidity, FieldKind::Co2];

pub const DEFAULT_AIR_EXCHANGE_S: f64 = 20.0 * 60.0;

pub fn default_humidity() -> ThresholdSpec {
    ThresholdSpec::inside(Some(95.0), Some(100.0))
}

pub fn default_co2() -> ThresholdSpec {
    ThresholdSpec::outside(Some(2000.0), None)
}

/// Profile configuration before defaults are applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lux: Option<ThresholdSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<ThresholdSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<ThresholdSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_exchange_s: Option<f64>,
}

impl ProfileConfig {
    /// Builds a config from a variable name → threshold mapping.
    pub fn from_thresholds<'a>(
        thresholds: impl IntoIterator<Item = (&'a str, &'a ThresholdSpec)>,
        air_exchange_s: Option<f64>,
    ) -> ControlResult<Self> {
        let mut config = Self {
            air_exchange_s,
            ..Self::default()
        };
        for (name, spec) in thresholds {
            let field = FieldKind::from_str(name).map_err(|e| ControlError::Configuration {
                what: format!("profile variable: {e}"),
            })?;
            let slot = config
                .slot_mut(field)
                .ok_or_else(|| ControlError::Configuration {
                    what: format!("profile variable '{name}' is not monitored (expected lux, humidity or co2)"),
                })?;
            *slot = Some(*spec);
        }
        Ok(config)
    }

    fn slot_mut(&mut self, field: FieldKind) -> Option<&mut Option<ThresholdSpec>> {
        match field {
            FieldKind::Lux => Some(&mut self.lux),
            FieldKind::Humidity => Some(&mut self.humidity),
            FieldKind::Co2 => Some(&mut self.co2),
            _ => None,
        }
    }

    pub fn threshold(&self, field: FieldKind) -> Option<&ThresholdSpec> {
        match field {
            FieldKind::Lux => self.lux.as_ref(),
            FieldKind::Humidity => self.humidity.as_ref(),
            FieldKind::Co2 => self.co2.as_ref(),
            _ => None,
        }
    }

    /// Copy with every unset entry replaced by its default.
    pub fn with_defaults(&self) -> Self {
        Self {
            lux: self.lux,
            humidity: Some(self.humidity.unwrap_or_else(default_humidity)),
            co2: Some(self.co2.unwrap_or_else(default_co2)),
            air_exchange_s: Some(self.air_exchange_s.unwrap_or(DEFAULT_AIR_EXCHANGE_S)),
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        for field in MONITORED {
            let Some(spec) = self.threshold(field) else {
                continue;
            };
            spec.validate().map_err(|e| ControlError::Configuration {
                what: format!("{field}: {e}"),
            })?;
            // Lights and mister each correct toward one side only.
            if field != FieldKind::Co2 && spec.polarity == Polarity::Outside {
                return Err(ControlError::Configuration {
                    what: format!("{field} threshold must use inside polarity"),
                });
            }
        }
        if let Some(period) = self.air_exchange_s {
            if !(period.is_finite() && period > 0.0) {
                return Err(ControlError::Configuration {
                    what: format!("air_exchange_s must be positive, got {period}"),
                });
            }
        }
        Ok(())
    }
}

/// Verdict of one threshold in one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub field: FieldKind,
    pub value: f64,
    pub verdict: Verdict,
}

/// Everything one evaluation decided, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Evaluation {
    pub checks: Vec<CheckOutcome>,
    pub air_exchange: bool,
    pub commands: Vec<Command>,
}

impl Evaluation {
    pub fn verdict(&self, field: FieldKind) -> Option<Verdict> {
        self.checks.iter().find(|c| c.field == field).map(|c| c.verdict)
    }

    pub fn fired(&self) -> bool {
        !self.commands.is_empty()
    }
}

#[derive(Debug)]
pub struct Profile {
    config: ProfileConfig,
    lux: Option<Threshold>,
    humidity: Option<Threshold>,
    co2: Option<Threshold>,
    air_exchange: PeriodicAction,
}

fn build(field: FieldKind, spec: Option<ThresholdSpec>) -> ControlResult<Option<Threshold>> {
    spec.map(|s| s.build().map(|t| t.with_label(field.as_str())))
        .transpose()
}

fn numeric(reading: &Reading, field: FieldKind) -> ControlResult<f64> {
    let name = field.as_str();
    let value = reading.get(name).ok_or_else(|| ControlError::MissingField {
        field: name.to_string(),
    })?;
    value
        .as_f64()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| ControlError::NonNumeric {
            field: name.to_string(),
            value: value.clone(),
        })
}

impl Profile {
    /// Applies defaults for unset entries and builds the checks.
    /// The air exchange timer is first due one period after `now_s`.
    pub fn configure(config: &ProfileConfig, now_s: f64) -> ControlResult<Self> {
        let config = config.with_defaults();
        config.validate()?;
        let period = config.air_exchange_s.unwrap_or(DEFAULT_AIR_EXCHANGE_S);
        let profile = Self {
            lux: build(FieldKind::Lux, config.lux)?,
            humidity: build(FieldKind::Humidity, config.humidity)?,
            co2: build(FieldKind::Co2, config.co2)?,
            air_exchange: PeriodicAction::new(period, now_s)?.with_label("air_exchange"),
            config,
        };
        tracing::debug!(?profile, "profile configured");
        Ok(profile)
    }

    /// Effective configuration, defaults included.
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn air_exchange(&self) -> &PeriodicAction {
        &self.air_exchange
    }

    /// Fields the configured checks read, in evaluation order.
    pub fn required_fields(&self) -> Vec<FieldKind> {
        MONITORED
            .into_iter()
            .filter(|f| self.config.threshold(*f).is_some())
            .collect()
    }

    /// Commands this profile may issue.
    pub fn required_commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.lux.is_some() {
            commands.extend([Command::LightsBrighter, Command::LightsDarker]);
        }
        if self.humidity.is_some() {
            commands.extend([Command::Humidify, Command::FanExchange]);
        }
        if self.co2.is_some() {
            commands.push(Command::FanExchange);
        }
        commands.extend([Command::MisterOff, Command::FanExchange]);
        let mut unique = Vec::new();
        for c in commands {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        unique
    }

    /// Runs every check against `reading` and issues corrective commands.
    ///
    /// All referenced fields are resolved before anything is actuated, so a
    /// missing or non-numeric field leaves the devices untouched.
    pub fn evaluate(
        &mut self,
        reading: &Reading,
        now_s: f64,
        actuation: &mut dyn Actuation,
    ) -> ControlResult<Evaluation> {
        let mut values = [None; MONITORED.len()];
        for (slot, field) in values.iter_mut().zip(MONITORED) {
            if self.config.threshold(field).is_some() {
                *slot = Some(numeric(reading, field)?);
            }
        }
        let [lux, humidity, co2] = values;

        let mut eval = Evaluation::default();

        if let Some(verdict) = judge(&mut self.lux, FieldKind::Lux, lux, &mut eval) {
            match verdict {
                Verdict::Below => issue(actuation, Command::LightsBrighter, &mut eval)?,
                Verdict::Above => issue(actuation, Command::LightsDarker, &mut eval)?,
                _ => {}
            }
        }

        if let Some(verdict) = judge(&mut self.humidity, FieldKind::Humidity, humidity, &mut eval) {
            match verdict {
                Verdict::Below => issue(actuation, Command::Humidify, &mut eval)?,
                Verdict::Above => issue(actuation, Command::FanExchange, &mut eval)?,
                _ => {}
            }
        }

        if let Some(verdict) = judge(&mut self.co2, FieldKind::Co2, co2, &mut eval) {
            if verdict.is_violation() {
                issue(actuation, Command::FanExchange, &mut eval)?;
            }
        }

        if self.air_exchange.poll(now_s) {
            eval.air_exchange = true;
            issue(actuation, Command::MisterOff, &mut eval)?;
            issue(actuation, Command::FanExchange, &mut eval)?;
        }

        Ok(eval)
    }
}

fn judge(
    threshold: &mut Option<Threshold>,
    field: FieldKind,
    value: Option<f64>,
    eval: &mut Evaluation,
) -> Option<Verdict> {
    let (threshold, value) = (threshold.as_mut()?, value?);
    let verdict = threshold.evaluate(value);
    threshold.check(value);
    eval.checks.push(CheckOutcome {
        field,
        value,
        verdict,
    });
    Some(verdict)
}

fn issue(
    actuation: &mut dyn Actuation,
    command: Command,
    eval: &mut Evaluation,
) -> ControlResult<()> {
    tracing::debug!(%command, "actuating");
    actuation.actuate(command)?;
    eval.commands.push(command);
    Ok(())
}
