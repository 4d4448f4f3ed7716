use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PanicThresholds;

/// One motion-sensor reading: variance magnitudes computed on-device over
/// the sampling window. Append-only once recorded.
///
/// `is_panic` is classified exactly once, at ingestion time. High variance
/// on BOTH axes at the same time reads as struggle; either alone is just
/// normal walking or a phone being turned over in a pocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Acceleration magnitude variance (m/s^2).
    pub accel_variance: f64,
    /// Gyroscope rotation variance (rad/s).
    pub gyro_variance: f64,
    pub is_panic: bool,
}

impl MotionEvent {
    /// Classify and record a raw variance reading against the configured
    /// panic thresholds. Both must be exceeded simultaneously.
    pub fn classify(
        accel_variance: f64,
        gyro_variance: f64,
        timestamp: DateTime<Utc>,
        thresholds: &PanicThresholds,
    ) -> Self {
        let is_panic = accel_variance > thresholds.accel_variance
            && gyro_variance > thresholds.gyro_variance;

        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            accel_variance,
            gyro_variance,
            is_panic,
        }
    }

    /// Window extraction drops readings failing this check.
    pub fn is_wellformed(&self) -> bool {
        self.accel_variance.is_finite() && self.gyro_variance.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RISK;

    #[test]
    fn test_both_variances_high_is_panic() {
        let m = MotionEvent::classify(3.0, 0.6, Utc::now(), &RISK.panic);
        assert!(m.is_panic);
    }

    #[test]
    fn test_accel_alone_is_not_panic() {
        // Running raises accel variance but not rotation
        let m = MotionEvent::classify(5.0, 0.1, Utc::now(), &RISK.panic);
        assert!(!m.is_panic);
    }

    #[test]
    fn test_gyro_alone_is_not_panic() {
        let m = MotionEvent::classify(0.5, 2.0, Utc::now(), &RISK.panic);
        assert!(!m.is_panic);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly at threshold does not qualify
        let m = MotionEvent::classify(2.0, 0.5, Utc::now(), &RISK.panic);
        assert!(!m.is_panic);
    }

    #[test]
    fn test_nan_variance_is_malformed() {
        let m = MotionEvent::classify(f64::NAN, 0.6, Utc::now(), &RISK.panic);
        assert!(!m.is_wellformed());
    }
}
