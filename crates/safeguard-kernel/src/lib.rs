//! `safeguard-kernel` – Hazard Rules
//!
//! The stateless half of the supervisor. It does not hold state or talk to
//! hardware; it only decides.
//!
//! # Modules
//!
//! - [`hazard`] – [`HazardEvaluator`][hazard::HazardEvaluator]:
//!   maps the latest battery and proximity samples to a
//!   [`HazardClassification`][safeguard_types::HazardClassification] with a
//!   fixed precedence (collision before low battery).
//! - [`sample_validator`] – [`SampleValidator`][sample_validator::SampleValidator]:
//!   a rule engine that rejects structurally malformed
//!   [`SensorSample`][safeguard_types::SensorSample]s before they can
//!   replace the last good value of their stream.

pub mod hazard;
pub mod sample_validator;

pub use hazard::HazardEvaluator;
pub use sample_validator::{BatteryRangeRule, SampleRule, SampleValidator, ScanRangeRule};
