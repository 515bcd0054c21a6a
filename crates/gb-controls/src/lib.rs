//! Evaluation primitives for the growbox control loop.
//!
//! A reading produced by the loop is judged by a [`Profile`]: a fixed set of
//! [`Threshold`]s (lux, humidity, CO2) and a [`PeriodicAction`] for air
//! exchange. Corrective actions are issued as [`Command`]s through the
//! [`Actuation`] trait, so the profile never holds a reference to the loop
//! or to any device.
//!
//! # Design Principles
//!
//! - **Fixed order**: lux, humidity, CO2, air exchange; every check runs every cycle
//! - **Fail fast**: missing or non-numeric fields are errors, never skipped
//! - **Injected time**: every operation takes `now_s` from the caller's clock

pub mod actuation;
pub mod error;
pub mod periodic;
pub mod profile;
pub mod threshold;

pub use actuation::{Actuation, ActuationError, Command, RecordingActuation};
pub use error::{ControlError, ControlResult};
pub use periodic::PeriodicAction;
pub use profile::{CheckOutcome, Evaluation, Profile, ProfileConfig};
pub use threshold::{Polarity, Threshold, ThresholdSpec, Verdict};
