//! gb-core: shared vocabulary for growbox.
//!
//! Contains:
//! - value (scalar telemetry values)
//! - reading (ordered field -> value snapshot built every cycle)
//! - field (telemetry field kinds known to the control core)
//! - clock / sleep (injectable time source and blocking sleeper)

pub mod clock;
pub mod field;
pub mod reading;
pub mod sleep;
pub mod value;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use field::{FieldKind, UnknownField};
pub use reading::Reading;
pub use sleep::{Sleeper, ThreadSleeper, TrackingSleeper};
pub use value::Value;
