//! Risk detection configuration.
//!
//! Everything tunable about the rule engine lives here as plain data. The
//! engine takes a `RiskConfig` at construction and never reads process-wide
//! state, so tests can run alternate thresholds side by side.

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Timelike, Utc};

use crate::models::risk::RuleName;

/// Variance levels above which a motion reading classifies as panic.
/// Both must be exceeded simultaneously (strict >).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanicThresholds {
    /// Acceleration magnitude variance (m/s^2).
    pub accel_variance: f64,
    /// Gyroscope rotation variance (rad/s).
    pub gyro_variance: f64,
}

/// Spans of the two signal windows the rules read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalWindowSpans {
    /// The general "recent" window (locations + motion).
    pub recent_secs: i64,
    /// The short window used for sustained-panic counting.
    pub very_recent_secs: i64,
}

/// Overnight wrap window: [start_hour, 24) U [0, end_hour).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl NightWindow {
    /// True when the instant's hour falls inside the night window.
    /// Assumes the window wraps midnight (start > end), which the default does.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let hour = instant.hour();
        hour >= self.start_hour || hour < self.end_hour
    }
}

/// Distance/count thresholds the movement rules compare against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementThresholds {
    /// Below this gap between the two freshest fixes the user has
    /// effectively stopped moving (meters).
    pub abnormal_stop_m: f64,
    /// Prolonged-stop rule: the early trail segments must sum past this
    /// (meters) to count as significant movement.
    pub trail_movement_m: f64,
    /// Prolonged-stop rule: the late trail segments must sum under this
    /// (meters) to count as stationary.
    pub trail_stationary_m: f64,
    /// How many points of track history the prolonged-stop rule inspects.
    pub trail_length: usize,
    /// Panic events in the short window needed for a sustained-panic fire.
    pub sustained_panic_count: usize,
    /// Recent fixes needed before the GPS-loss rule applies at all.
    pub gps_loss_min_recent: usize,
    /// Cellular fixes among them needed to call tracking "cellular-only".
    pub gps_loss_min_cellular: usize,
}

/// Additive corroboration boosts, each clamped to `max_confidence`
/// immediately after it is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceBoosts {
    pub recent_panic: f64,
    pub night_hours: f64,
    /// Hard ceiling. Confidence never reports certainty.
    pub max_confidence: f64,
}

/// Base confidence per declared rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleConfidenceTable {
    pub sustained_panic_movement: f64,
    pub panic_movement_abnormal_stop: f64,
    pub panic_movement_night: f64,
    pub gps_loss_cellular_movement: f64,
    /// Declared but reserved: no evaluation unit exists for this rule.
    pub route_deviation: f64,
    pub prolonged_stop_unusual_location: f64,
}

impl RuleConfidenceTable {
    pub fn base_confidence(&self, rule: RuleName) -> f64 {
        match rule {
            RuleName::SustainedPanicMovement => self.sustained_panic_movement,
            RuleName::PanicMovementAbnormalStop => self.panic_movement_abnormal_stop,
            RuleName::PanicMovementNight => self.panic_movement_night,
            RuleName::GpsLossCellularMovement => self.gps_loss_cellular_movement,
            RuleName::RouteDeviation => self.route_deviation,
            RuleName::ProlongedStopUnusualLocation => self.prolonged_stop_unusual_location,
            // Manual path, always full confidence, not tunable
            RuleName::TestAlert => 1.0,
        }
    }
}

/// The Master Risk Configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskConfig {
    pub panic: PanicThresholds,
    pub windows: SignalWindowSpans,
    pub night: NightWindow,
    pub movement: MovementThresholds,
    pub boosts: ConfidenceBoosts,
    pub confidence: RuleConfidenceTable,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RISK
    }
}

pub const RISK: RiskConfig = RiskConfig {
    panic: PanicThresholds {
        // Deliberately sensitive: a false alert costs a text message, a
        // missed struggle costs much more.
        accel_variance: 2.0,
        gyro_variance: 0.5,
    },

    windows: SignalWindowSpans {
        recent_secs: 60,
        very_recent_secs: 30,
    },

    night: NightWindow {
        start_hour: 22, // 10 PM
        end_hour: 5,    // 5 AM
    },

    movement: MovementThresholds {
        abnormal_stop_m: 10.0,
        trail_movement_m: 100.0,
        trail_stationary_m: 20.0,
        trail_length: 5,
        sustained_panic_count: 3,
        gps_loss_min_recent: 3,
        gps_loss_min_cellular: 2,
    },

    boosts: ConfidenceBoosts {
        recent_panic: 0.15,
        night_hours: 0.10,
        max_confidence: 0.95,
    },

    confidence: RuleConfidenceTable {
        sustained_panic_movement: 0.75,
        panic_movement_abnormal_stop: 0.70,
        panic_movement_night: 0.65,
        gps_loss_cellular_movement: 0.50,
        route_deviation: 0.60, // reserved rule, kept in the table
        prolonged_stop_unusual_location: 0.55,
    },
};
