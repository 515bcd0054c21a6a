//! Project validation logic.

use std::collections::HashSet;

use crate::schema::{
    BusKind, ChannelDef, DeviceKind, FieldDef, LogDef, Project, RELAY_CHANNELS, ThresholdDef,
};

/// Variables a profile may put thresholds on.
pub const PROFILE_VARIABLES: [&str; 3] = ["lux", "humidity", "co2"];

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if !(project.cadence_s.is_finite() && project.cadence_s > 0.0) {
        return Err(invalid("cadence_s", project.cadence_s, "must be positive"));
    }

    if project.retry_attempts == 0 {
        return Err(invalid("retry_attempts", 0, "at least one attempt is required"));
    }

    if let Some(log) = &project.log {
        validate_log(log)?;
    }

    let mut device_ids = HashSet::new();
    for device in &project.devices {
        if !device_ids.insert(device.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: device.id.clone(),
                context: "devices".to_string(),
            });
        }
        if let DeviceKind::QuadRelay { address, bus, .. } = &device.kind {
            if *address == 0 || *address > 0x7F {
                return Err(invalid(
                    format!("devices.{}.address", device.id),
                    format!("0x{address:02X}"),
                    "must be a nonzero 7-bit address",
                ));
            }
            match bus.kind() {
                BusKind::Emulated { name } if name.is_empty() => {
                    return Err(invalid(format!("devices.{}.bus", device.id), "", "bus name is empty"));
                }
                BusKind::I2c { path } if path.as_os_str().is_empty() => {
                    return Err(invalid(format!("devices.{}.bus.path", device.id), "", "path is empty"));
                }
                _ => {}
            }
        }
    }

    let mut columns = HashSet::new();
    let mut keys = HashSet::new();
    for field in &project.fields {
        if !device_ids.contains(field.device.as_str()) {
            return Err(ValidationError::MissingReference {
                id: field.device.clone(),
                context: format!("field {}", field.column()),
            });
        }
        if !columns.insert(field.column()) {
            return Err(ValidationError::DuplicateId {
                id: field.column().to_string(),
                context: "fields".to_string(),
            });
        }
        for key in reading_keys(project, field) {
            if !keys.insert(key.clone()) {
                return Err(ValidationError::DuplicateId {
                    id: key,
                    context: format!("reading keys (field {})", field.column()),
                });
            }
        }
    }

    validate_actuators(project)?;

    for (name, threshold) in &project.profile.thresholds {
        if !PROFILE_VARIABLES.contains(&name.as_str()) {
            return Err(ValidationError::Unsupported {
                feature: format!("profile variable '{name}'"),
                reason: format!("expected one of {}", PROFILE_VARIABLES.join(", ")),
            });
        }
        validate_threshold(name, threshold)?;
        if !columns.contains(name.as_str()) {
            return Err(ValidationError::MissingReference {
                id: name.clone(),
                context: "profile thresholds (no such field)".to_string(),
            });
        }
    }

    if let Some(period) = project.profile.air_exchange_s {
        if !(period.is_finite() && period > 0.0) {
            return Err(invalid("profile.air_exchange_s", period, "must be positive"));
        }
    }

    let sup = &project.supervisor;
    if !(sup.restart_delay_s.is_finite() && sup.restart_delay_s >= 0.0) {
        return Err(invalid(
            "supervisor.restart_delay_s",
            sup.restart_delay_s,
            "must be zero or positive",
        ));
    }

    Ok(())
}

/// Keys `field` contributes to every reading.
///
/// A relay board's status expands to one key per channel, prefixed with the
/// column when the field was renamed.
pub fn reading_keys(project: &Project, field: &FieldDef) -> Vec<String> {
    let is_relay = matches!(
        project.device(&field.device).map(|d| &d.kind),
        Some(DeviceKind::QuadRelay { .. })
    );
    if !(is_relay && field.field.is_grouped()) {
        return vec![field.column().to_string()];
    }
    (1..=RELAY_CHANNELS)
        .map(|i| {
            if field.is_default_column() {
                format!("relay{i}")
            } else {
                format!("{}.relay{i}", field.column())
            }
        })
        .collect()
}

fn validate_log(log: &LogDef) -> Result<(), ValidationError> {
    if log.path.as_os_str().is_empty() {
        return Err(invalid("log.path", "", "path is empty"));
    }
    Ok(())
}

fn validate_channel(
    project: &Project,
    owner: &str,
    channel: &ChannelDef,
) -> Result<(), ValidationError> {
    let device = project
        .device(&channel.relay)
        .ok_or_else(|| ValidationError::MissingReference {
            id: channel.relay.clone(),
            context: format!("actuator {owner}"),
        })?;
    if !matches!(device.kind, DeviceKind::QuadRelay { .. }) {
        return Err(invalid(
            format!("actuators.{owner}.relay"),
            &channel.relay,
            "must name a quad_relay device",
        ));
    }
    if !(1..=RELAY_CHANNELS).contains(&channel.channel) {
        return Err(invalid(
            format!("actuators.{owner}.channel"),
            channel.channel,
            "relay channels are numbered 1 to 4",
        ));
    }
    Ok(())
}

fn validate_actuators(project: &Project) -> Result<(), ValidationError> {
    let actuators = &project.actuators;
    let mut used = HashSet::new();
    for (owner, channel) in actuators.channels() {
        validate_channel(project, owner, &channel)?;
        if !used.insert((channel.relay.clone(), channel.channel)) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}:{}", channel.relay, channel.channel),
                context: "actuator relay channels".to_string(),
            });
        }
    }
    if let Some(mister) = &actuators.mister {
        if !(mister.humidify_s.is_finite() && mister.humidify_s > 0.0) {
            return Err(invalid("actuators.mister.humidify_s", mister.humidify_s, "must be positive"));
        }
    }
    if let Some(fans) = &actuators.fans {
        if fans.upper.is_none() && fans.lower.is_none() {
            return Err(invalid("actuators.fans", "{}", "needs an upper or lower channel"));
        }
        if !(fans.exchange_s.is_finite() && fans.exchange_s >= 0.0) {
            return Err(invalid("actuators.fans.exchange_s", fans.exchange_s, "must be zero or positive"));
        }
    }
    Ok(())
}

fn validate_threshold(name: &str, threshold: &ThresholdDef) -> Result<(), ValidationError> {
    let field = format!("profile.thresholds.{name}");
    let bounds = [threshold.minval, threshold.maxval];
    if bounds.iter().all(Option::is_none) {
        return Err(invalid(field, "{}", "needs minval, maxval or both"));
    }
    if bounds.iter().flatten().any(|v| v.is_nan()) {
        return Err(invalid(field, "NaN", "bounds must be numbers"));
    }
    if let (Some(lo), Some(hi)) = (threshold.minval, threshold.maxval) {
        if lo >= hi {
            return Err(invalid(field, format!("({lo}, {hi})"), "minval must be below maxval"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeviceDef, FieldDef};
    use gb_core::FieldKind;

    fn project() -> Project {
        Project {
            version: 1,
            name: "test".to_string(),
            cadence_s: 10.0,
            log: None,
            retry_attempts: 3,
            devices: vec![DeviceDef {
                id: "env".to_string(),
                kind: DeviceKind::SimulatedSensor {
                    values: Default::default(),
                },
            }],
            fields: vec![FieldDef {
                field: FieldKind::Humidity,
                device: "env".to_string(),
                name: None,
            }],
            actuators: Default::default(),
            profile: Default::default(),
            supervisor: Default::default(),
        }
    }

    #[test]
    fn minimal_project_is_valid() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn zero_cadence_rejected() {
        let mut p = project();
        p.cadence_s = 0.0;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut p = project();
        p.version = 7;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { version: 7 })
        ));
    }

    #[test]
    fn renamed_field_frees_the_default_column() {
        let mut p = project();
        p.fields.push(FieldDef {
            field: FieldKind::Humidity,
            device: "env".to_string(),
            name: Some("humidity_top".to_string()),
        });
        validate_project(&p).unwrap();
        p.fields[1].name = None;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }
}
