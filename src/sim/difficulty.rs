//! Time-driven difficulty curve
//!
//! A step function of elapsed race time. The multiplier scales opponent
//! forward speed, opponent lateral speed and spawn cadence alike.

use crate::tuning::{DIFFICULTY_CAP, DifficultyStep, DifficultyTuning, TuningError};

/// Validated, monotonic step table
#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    base: f32,
    steps: Vec<DifficultyStep>,
}

impl DifficultyCurve {
    /// Build from a tuning table, rejecting anything non-monotonic or out of range
    pub fn new(tuning: &DifficultyTuning) -> Result<Self, TuningError> {
        let range_error = |multiplier| TuningError::MultiplierRange {
            multiplier,
            min: 1.0,
            max: tuning.max,
        };
        if !(1.0..=DIFFICULTY_CAP).contains(&tuning.max) {
            return Err(TuningError::MultiplierRange {
                multiplier: tuning.max,
                min: 1.0,
                max: DIFFICULTY_CAP,
            });
        }
        if !(1.0..=tuning.max).contains(&tuning.base) {
            return Err(range_error(tuning.base));
        }

        let mut last_after = 0.0;
        let mut last_multiplier = tuning.base;
        for (index, step) in tuning.steps.iter().enumerate() {
            if step.after <= last_after {
                return Err(TuningError::ThresholdOrder {
                    index,
                    after: step.after,
                });
            }
            if step.multiplier < last_multiplier {
                return Err(TuningError::MultiplierDecreases {
                    index,
                    multiplier: step.multiplier,
                });
            }
            if step.multiplier > tuning.max {
                return Err(range_error(step.multiplier));
            }
            last_after = step.after;
            last_multiplier = step.multiplier;
        }

        Ok(Self {
            base: tuning.base,
            steps: tuning.steps.clone(),
        })
    }

    /// Multiplier in effect `elapsed` seconds into the race
    pub fn multiplier(&self, elapsed: f32) -> f32 {
        let reached = self.steps.partition_point(|step| step.after <= elapsed);
        match reached {
            0 => self.base,
            n => self.steps[n - 1].multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_curve() -> DifficultyCurve {
        DifficultyCurve::new(&DifficultyTuning::default()).unwrap()
    }

    #[test]
    fn test_plateaus() {
        let curve = default_curve();
        assert_eq!(curve.multiplier(0.0), 1.0);
        assert_eq!(curve.multiplier(29.99), 1.0);
        assert_eq!(curve.multiplier(30.0), 1.2);
        assert_eq!(curve.multiplier(45.0), 1.2);
        assert_eq!(curve.multiplier(46.0), 1.4);
        assert_eq!(curve.multiplier(59.0), 1.4);
        assert_eq!(curve.multiplier(70.0), 1.6);
        assert_eq!(curve.multiplier(90.0), 1.8);
        assert_eq!(curve.multiplier(100.0), 2.0);
        assert_eq!(curve.multiplier(10_000.0), 2.0);
    }

    #[test]
    fn test_empty_table_is_flat() {
        let tuning = DifficultyTuning {
            steps: Vec::new(),
            ..Default::default()
        };
        let curve = DifficultyCurve::new(&tuning).unwrap();
        assert_eq!(curve.multiplier(500.0), 1.0);
    }

    #[test]
    fn test_rejects_cap_above_two() {
        let tuning = DifficultyTuning {
            max: 3.0,
            ..Default::default()
        };
        assert!(matches!(
            DifficultyCurve::new(&tuning),
            Err(TuningError::MultiplierRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_monotonic_and_bounded(a in 0.0f32..200.0, b in 0.0f32..200.0) {
            let curve = default_curve();
            let (t1, t2) = if a <= b { (a, b) } else { (b, a) };
            let (m1, m2) = (curve.multiplier(t1), curve.multiplier(t2));
            prop_assert!(m1 <= m2);
            prop_assert!((1.0..=2.0).contains(&m1));
            prop_assert!((1.0..=2.0).contains(&m2));
        }
    }
}
