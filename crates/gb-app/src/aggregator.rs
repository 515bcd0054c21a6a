//! Builds one reading per cycle from the configured fields.

use std::collections::HashSet;
use std::fmt;

use gb_core::{FieldKind, Reading, Value};
use gb_devices::{DeviceHandle, Sample};

use crate::error::{AppError, AppResult};

/// A named telemetry field and the device it is read from.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub device: DeviceHandle,
}

impl FieldSpec {
    /// Field stored under the kind's own name.
    pub fn new(kind: FieldKind, device: DeviceHandle) -> Self {
        Self::named(kind.as_str(), kind, device)
    }

    pub fn named(name: impl Into<String>, kind: FieldKind, device: DeviceHandle) -> Self {
        Self {
            name: name.into(),
            kind,
            device,
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("device", &self.device.borrow().name())
            .finish()
    }
}

#[derive(Debug)]
pub struct SampleAggregator {
    fields: Vec<FieldSpec>,
}

impl SampleAggregator {
    /// Checks that names are unique and every device reports its field.
    pub fn new(fields: Vec<FieldSpec>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for spec in &fields {
            if !seen.insert(spec.name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "field '{}' declared twice",
                    spec.name
                )));
            }
            let device = spec.device.borrow();
            if !device.supports(spec.kind) {
                return Err(AppError::Configuration(format!(
                    "device '{}' does not report {} (field '{}')",
                    device.name(),
                    spec.kind,
                    spec.name
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in declaration order. Grouped fields appear under their
    /// own name here and only expand once sampled.
    ///
    /// A grouped field keeps its devices' keys (`relay1`) when it uses the
    /// kind's own name and prefixes them (`relays_b.relay1`) otherwise.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Whether `name` will be a key of every sampled reading.
    pub fn provides(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == name && !f.kind.is_grouped())
    }

    /// Reads every field in declaration order. The first failure aborts the sample.
    ///
    /// Two fields writing the same key is a configuration error; no value
    /// is ever silently replaced.
    pub fn sample(&self) -> AppResult<Reading> {
        let mut reading = Reading::new();
        for spec in &self.fields {
            let sample = spec.device.borrow_mut().read(spec.kind)?;
            match sample {
                Sample::Scalar(value) => insert_once(&mut reading, spec, spec.name.clone(), value)?,
                Sample::Group(entries) => {
                    let prefixed = spec.name != spec.kind.as_str();
                    for (key, value) in entries {
                        let key = if prefixed {
                            format!("{}.{key}", spec.name)
                        } else {
                            key
                        };
                        insert_once(&mut reading, spec, key, value)?;
                    }
                }
            }
        }
        tracing::trace!(?reading, "sampled");
        Ok(reading)
    }
}

fn insert_once(reading: &mut Reading, spec: &FieldSpec, key: String, value: Value) -> AppResult<()> {
    if reading.contains_key(&key) {
        return Err(AppError::Configuration(format!(
            "field '{}' writes '{key}', which an earlier field already set",
            spec.name
        )));
    }
    reading.insert(key, value);
    Ok(())
}
