//! [`SampleValidator`] – structural checks on incoming sensor samples.
//!
//! Before a [`SensorSample`] replaces the latest value of its stream, pass it
//! through [`SampleValidator::validate`].  Every registered [`SampleRule`] is
//! evaluated in order; the first violation returns a
//! [`SafetyError::MalformedSample`] and the sample is **not** stored.
//!
//! Two built-in rules are provided:
//! - [`BatteryRangeRule`] – rejects negative or NaN battery percentages.
//! - [`ScanRangeRule`] – rejects scans containing negative or NaN readings.
//!
//! An empty scan is not malformed; it simply carries no information.

use safeguard_types::{SafetyError, SensorSample, SensorStream};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single structural invariant a sample must satisfy.
pub trait SampleRule: Send + Sync {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Return `Ok(())` when the sample is well formed, or
    /// [`SafetyError::MalformedSample`] when it is not.
    fn check(&self, sample: &SensorSample) -> Result<(), SafetyError>;
}

// ────────────────────────────────────────────────────────────────────────────
// SampleValidator
// ────────────────────────────────────────────────────────────────────────────

/// Rule engine run on every sample at intake.
///
/// # Example
///
/// ```
/// use safeguard_kernel::sample_validator::SampleValidator;
/// use safeguard_types::{BatteryLevel, SensorSample};
///
/// let validator = SampleValidator::with_default_rules();
///
/// let good = SensorSample::Battery(BatteryLevel::now(50.0));
/// assert!(validator.validate(&good).is_ok());
///
/// let bad = SensorSample::Battery(BatteryLevel::now(-5.0));
/// assert!(validator.validate(&bad).is_err());
/// ```
#[derive(Default)]
pub struct SampleValidator {
    rules: Vec<Box<dyn SampleRule>>,
}

impl SampleValidator {
    /// Create an empty validator that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator pre-loaded with [`BatteryRangeRule`] and [`ScanRangeRule`].
    pub fn with_default_rules() -> Self {
        let mut v = Self::new();
        v.add_rule(Box::new(BatteryRangeRule));
        v.add_rule(Box::new(ScanRangeRule));
        v
    }

    /// Register a new [`SampleRule`].  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn SampleRule>) {
        self.rules.push(rule);
    }

    /// Validate `sample` against every registered rule, stopping at the
    /// first failure.
    pub fn validate(&self, sample: &SensorSample) -> Result<(), SafetyError> {
        for rule in &self.rules {
            if let Err(e) = rule.check(sample) {
                debug!(rule = rule.name(), error = %e, "sample failed validation");
                return Err(e);
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

/// Rejects battery samples whose percentage is negative or NaN.
///
/// Values above 100 are accepted; some packs report overcharge.
pub struct BatteryRangeRule;

impl SampleRule for BatteryRangeRule {
    fn name(&self) -> &str {
        "battery_range"
    }

    fn check(&self, sample: &SensorSample) -> Result<(), SafetyError> {
        if let SensorSample::Battery(level) = sample {
            if level.percent.is_nan() {
                return Err(malformed(SensorStream::Battery, "percent is NaN".to_string()));
            }
            if level.percent < 0.0 {
                return Err(malformed(
                    SensorStream::Battery,
                    format!("negative percent {}", level.percent),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects scans containing a negative or NaN reading.
///
/// `+inf` is the conventional "no return" value and passes.
pub struct ScanRangeRule;

impl SampleRule for ScanRangeRule {
    fn name(&self) -> &str {
        "scan_range"
    }

    fn check(&self, sample: &SensorSample) -> Result<(), SafetyError> {
        if let SensorSample::Proximity(scan) = sample
            && let Some((index, range)) = scan
                .ranges
                .iter()
                .enumerate()
                .find(|(_, r)| r.is_nan() || **r < 0.0)
        {
            return Err(malformed(
                SensorStream::Proximity,
                format!("invalid range {range} at index {index}"),
            ));
        }
        Ok(())
    }
}

fn malformed(stream: SensorStream, reason: String) -> SafetyError {
    SafetyError::MalformedSample { stream, reason }
}
