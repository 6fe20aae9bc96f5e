//! [`SensorIntake`] – the sensor callback surface.
//!
//! Sensor drivers call [`SensorIntake::submit`] (or one of the shorthand
//! methods) from whatever task receives their messages.  The intake never
//! evaluates anything itself: it validates the sample, overwrites the latest
//! slot of its stream, and returns.  Writing the slot is what wakes the
//! supervisor.
//!
//! A malformed sample is logged, reported on the diagnostic bus, and dropped.
//! The slot keeps its previous value.

use std::sync::Arc;

use safeguard_kernel::SampleValidator;
use safeguard_middleware::{EventBus, SampleSlots};
use safeguard_types::{
    BatteryLevel, DiagnosticEvent, DiagnosticKind, ProximityScan, SafetyError, SensorSample,
};
use tracing::{debug, warn};

const SOURCE: &str = "safeguard-runtime::intake";

/// Cloneable handle for feeding samples into the supervisor's slots.
#[derive(Clone)]
pub struct SensorIntake {
    slots: SampleSlots,
    validator: Arc<SampleValidator>,
    bus: EventBus,
}

impl SensorIntake {
    /// Intake using [`SampleValidator::with_default_rules`].
    pub fn new(slots: SampleSlots, bus: EventBus) -> Self {
        Self {
            slots,
            validator: Arc::new(SampleValidator::with_default_rules()),
            bus,
        }
    }

    /// Validate `sample` and make it the latest value of its stream.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::MalformedSample`] when validation fails.  The
    /// error is already logged; callers may ignore it.
    pub fn submit(&self, sample: SensorSample) -> Result<(), SafetyError> {
        if let Err(e) = self.validator.validate(&sample) {
            let stream = sample.stream();
            warn!(stream = %stream, error = %e, "discarding malformed sample");
            let reason = match &e {
                SafetyError::MalformedSample { reason, .. } => reason.clone(),
                other => other.to_string(),
            };
            // Best-effort publish – no subscribers is not an error.
            let _ = self.bus.publish(DiagnosticEvent::new(
                SOURCE,
                DiagnosticKind::SampleRejected { stream, reason },
            ));
            return Err(e);
        }

        match sample {
            SensorSample::Battery(level) => {
                debug!(percent = level.percent, "battery sample");
                self.slots.battery.store(level);
            }
            SensorSample::Proximity(scan) => {
                debug!(beams = scan.ranges.len(), "proximity scan");
                self.slots.proximity.store(scan);
            }
        }
        Ok(())
    }

    /// Submit a battery reading stamped now.
    pub fn submit_battery(&self, percent: f32) -> Result<(), SafetyError> {
        self.submit(SensorSample::Battery(BatteryLevel::now(percent)))
    }

    /// Submit a scan stamped now.
    pub fn submit_scan(&self, ranges: Vec<f32>) -> Result<(), SafetyError> {
        self.submit(SensorSample::Proximity(ProximityScan::now(ranges)))
    }
}
