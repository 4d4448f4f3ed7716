use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::LocationPoint;

/// Contributing-signal tags attached to risk events. Most are fixed labels;
/// the sustained-panic count tag is built dynamically from the event count.
pub mod signals {
    pub const SUSTAINED_PANIC: &str = "sustained_panic";
    pub const PANIC_MOVEMENT: &str = "panic_movement";
    pub const SUDDEN_STOP: &str = "sudden_stop";
    pub const NIGHT_HOURS: &str = "night_hours";
    pub const GPS_LOST: &str = "gps_lost";
    pub const CELLULAR_TRACKING: &str = "cellular_tracking";
    pub const CONTINUED_MOVEMENT: &str = "continued_movement";
    pub const MOVEMENT_DETECTED: &str = "movement_detected";
    pub const LOCATION_STATIONARY: &str = "location_stationary";
    pub const MANUAL_TEST: &str = "manual_test";
}

/// The named detection rules.
///
/// `RouteDeviation` is declared (it has a base confidence in the rule table)
/// but reserved: no evaluation unit exists for it. `TestAlert` is the manual
/// dispatcher-exercise path and never comes out of the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleName {
    SustainedPanicMovement,
    PanicMovementAbnormalStop,
    PanicMovementNight,
    GpsLossCellularMovement,
    RouteDeviation,
    ProlongedStopUnusualLocation,
    TestAlert,
}

impl RuleName {
    /// Human-readable description, for debug surfaces and alert auditing.
    pub fn description(&self) -> &'static str {
        match self {
            RuleName::SustainedPanicMovement => {
                "Sustained panic movement detected (3+ events in 30 seconds)"
            }
            RuleName::PanicMovementAbnormalStop => {
                "Panic movement detected followed by sudden stop"
            }
            RuleName::PanicMovementNight => "Panic movement during night hours (10PM - 5AM)",
            RuleName::GpsLossCellularMovement => {
                "GPS lost, now tracking via cellular only with continued movement"
            }
            RuleName::RouteDeviation => "Significant deviation from expected route",
            RuleName::ProlongedStopUnusualLocation => {
                "Extended stop in unusual location after movement"
            }
            RuleName::TestAlert => "Manual test of the guardian alert path",
        }
    }
}

/// The engine's output record when a rule fired.
///
/// Created once, outcome flags stamped by the dispatch step, then appended
/// to the trip's risk log - never revised after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub rule_name: RuleName,
    pub contributing_signals: Vec<String>,
    /// 0.0 to 1.0 (capped at 0.95 by the confidence adjuster).
    pub confidence: f64,
    /// Where we last saw the user when the rule fired.
    pub last_known_location: Option<LocationPoint>,
    /// push OR sms.
    pub alert_sent: bool,
    pub sms_sent: bool,
    pub push_sent: bool,
}

impl RiskEvent {
    pub fn new(
        rule_name: RuleName,
        contributing_signals: Vec<String>,
        confidence: f64,
        last_known_location: Option<LocationPoint>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            rule_name,
            contributing_signals,
            confidence,
            last_known_location,
            alert_sent: false,
            sms_sent: false,
            push_sent: false,
        }
    }

    /// Synthetic full-confidence event for exercising the alert path.
    pub fn test_alert(last_known_location: Option<LocationPoint>, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            RuleName::TestAlert,
            vec![signals::MANUAL_TEST.to_string()],
            1.0,
            last_known_location,
            timestamp,
        )
    }
}
