//! [`HazardEvaluator`] – pure hazard classification.
//!
//! Given the latest sample of each stream (either may be missing), returns a
//! single [`HazardClassification`]:
//!
//! 1. **Collision** – a scan is present and its closest reading is below
//!    `collision_threshold`.  Wins over everything else.
//! 2. **LowBattery** – a battery sample is present and below
//!    `battery_threshold`.
//! 3. **Normal** – otherwise, including when no samples have arrived.
//!
//! An empty scan counts as "no scan available".

use safeguard_types::{BatteryLevel, HazardClassification, ProximityScan, SafetyConfig};

/// Stateless classifier over the two latest samples.
///
/// # Example
///
/// ```
/// use safeguard_kernel::hazard::HazardEvaluator;
/// use safeguard_types::{BatteryLevel, HazardClassification, ProximityScan, SafetyConfig};
///
/// let evaluator = HazardEvaluator::new(&SafetyConfig::default());
///
/// let battery = BatteryLevel::now(20.0);
/// let scan = ProximityScan::now(vec![1.0, 0.05, 3.0]);
///
/// // Collision takes precedence over the low battery.
/// assert_eq!(
///     evaluator.classify(Some(&battery), Some(&scan)),
///     HazardClassification::Collision
/// );
/// assert_eq!(evaluator.classify(None, None), HazardClassification::Normal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardEvaluator {
    battery_threshold: f32,
    collision_threshold: f32,
}

impl HazardEvaluator {
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            battery_threshold: config.battery_threshold,
            collision_threshold: config.collision_threshold,
        }
    }

    pub fn battery_threshold(&self) -> f32 {
        self.battery_threshold
    }

    pub fn collision_threshold(&self) -> f32 {
        self.collision_threshold
    }

    /// Classify the current hazard from the latest samples.
    pub fn classify(
        &self,
        battery: Option<&BatteryLevel>,
        scan: Option<&ProximityScan>,
    ) -> HazardClassification {
        if scan
            .and_then(Self::min_range)
            .is_some_and(|closest| closest < self.collision_threshold)
        {
            return HazardClassification::Collision;
        }

        if battery.is_some_and(|b| b.percent < self.battery_threshold) {
            return HazardClassification::LowBattery;
        }

        HazardClassification::Normal
    }

    /// Closest reading in `scan`, or `None` for an empty scan.
    ///
    /// NaN readings are skipped; `+inf` ("no return") is kept and only wins
    /// when every reading is a no-return.
    pub fn min_range(scan: &ProximityScan) -> Option<f32> {
        scan.ranges
            .iter()
            .copied()
            .filter(|r| !r.is_nan())
            .reduce(f32::min)
    }
}

impl Default for HazardEvaluator {
    fn default() -> Self {
        Self::new(&SafetyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(percent: f32) -> BatteryLevel {
        BatteryLevel::now(percent)
    }

    fn scan(ranges: &[f32]) -> ProximityScan {
        ProximityScan::now(ranges.to_vec())
    }

    // ------------------------------------------------------------------ battery

    #[test]
    fn healthy_battery_without_scan_is_normal() {
        let ev = HazardEvaluator::default();
        for percent in [30.0, 30.5, 50.0, 100.0, 150.0] {
            assert_eq!(
                ev.classify(Some(&battery(percent)), None),
                HazardClassification::Normal,
                "percent {percent}"
            );
        }
    }

    #[test]
    fn battery_below_threshold_is_low_battery() {
        let ev = HazardEvaluator::default();
        for percent in [0.0, 10.0, 29.9] {
            assert_eq!(
                ev.classify(Some(&battery(percent)), Some(&scan(&[5.0, 2.0]))),
                HazardClassification::LowBattery,
                "percent {percent}"
            );
        }
    }

    #[test]
    fn battery_at_threshold_is_normal() {
        let ev = HazardEvaluator::default();
        assert_eq!(
            ev.classify(Some(&battery(30.0)), None),
            HazardClassification::Normal
        );
    }

    // ------------------------------------------------------------------ collision

    #[test]
    fn close_obstacle_is_collision() {
        let ev = HazardEvaluator::default();
        assert_eq!(
            ev.classify(Some(&battery(50.0)), Some(&scan(&[1.0, 0.05, 2.0]))),
            HazardClassification::Collision
        );
    }

    #[test]
    fn collision_wins_over_low_battery() {
        let ev = HazardEvaluator::default();
        assert_eq!(
            ev.classify(Some(&battery(5.0)), Some(&scan(&[0.1]))),
            HazardClassification::Collision
        );
    }

    #[test]
    fn collision_without_battery_sample() {
        let ev = HazardEvaluator::default();
        assert_eq!(
            ev.classify(None, Some(&scan(&[0.19]))),
            HazardClassification::Collision
        );
    }

    #[test]
    fn range_at_threshold_is_not_collision() {
        let ev = HazardEvaluator::new(&SafetyConfig {
            collision_threshold: 0.5,
            ..SafetyConfig::default()
        });
        assert_eq!(
            ev.classify(None, Some(&scan(&[0.5, 1.0]))),
            HazardClassification::Normal
        );
    }

    // ------------------------------------------------------------------ absence

    #[test]
    fn no_samples_is_normal() {
        let ev = HazardEvaluator::default();
        assert_eq!(ev.classify(None, None), HazardClassification::Normal);
    }

    #[test]
    fn empty_scan_is_treated_as_missing() {
        let ev = HazardEvaluator::default();
        assert_eq!(
            ev.classify(Some(&battery(50.0)), Some(&scan(&[]))),
            HazardClassification::Normal
        );
        // An empty scan must not mask a low battery either.
        assert_eq!(
            ev.classify(Some(&battery(20.0)), Some(&scan(&[]))),
            HazardClassification::LowBattery
        );
    }

    // ------------------------------------------------------------------ min_range

    #[test]
    fn min_range_of_empty_scan_is_none() {
        assert_eq!(HazardEvaluator::min_range(&scan(&[])), None);
    }

    #[test]
    fn min_range_ignores_nan_and_keeps_infinity() {
        assert_eq!(
            HazardEvaluator::min_range(&scan(&[f32::NAN, 3.0, f32::INFINITY])),
            Some(3.0)
        );
        assert_eq!(
            HazardEvaluator::min_range(&scan(&[f32::INFINITY, f32::INFINITY])),
            Some(f32::INFINITY)
        );
        assert_eq!(HazardEvaluator::min_range(&scan(&[f32::NAN])), None);
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let ev = HazardEvaluator::new(&SafetyConfig {
            battery_threshold: 10.0,
            collision_threshold: 1.0,
            rotation_angular_velocity: 0.5,
        });
        assert_eq!(
            ev.classify(Some(&battery(20.0)), None),
            HazardClassification::Normal
        );
        assert_eq!(
            ev.classify(None, Some(&scan(&[0.9]))),
            HazardClassification::Collision
        );
    }
}
