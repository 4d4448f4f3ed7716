use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::LocationPoint;
use crate::models::motion::MotionEvent;
use crate::models::risk::RiskEvent;

/// Trip lifecycle.
///
/// `Active -> Alert` happens exactly when the engine produces a detection.
/// `Ended` is terminal. There is no way back from `Alert` to `Active`: once
/// a guardian has been (or should have been) notified, the trip stays
/// flagged until it ends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TripStatus {
    Active,
    Alert,
    Ended,
}

/// Who gets notified on detection. Both fields optional - a trip without
/// either is simply unreachable, which dispatch treats as a valid outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianContact {
    pub phone: Option<String>,
    pub push_token: Option<String>,
}

impl GuardianContact {
    pub fn is_reachable(&self) -> bool {
        self.phone.is_some() || self.push_token.is_some()
    }
}

/// One monitored journey session. The trip is the unit of consistency: all
/// windowing and rule evaluation operates on one trip's logs as of the
/// moment the engine is invoked. Logs are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub user_id: String,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub guardian: GuardianContact,
    pub locations: Vec<LocationPoint>,
    pub motion_events: Vec<MotionEvent>,
    pub risk_events: Vec<RiskEvent>,
    pub last_risk_check: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn new(user_id: &str, guardian: GuardianContact, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: TripStatus::Active,
            start_time,
            end_time: None,
            guardian,
            locations: Vec::new(),
            motion_events: Vec::new(),
            risk_events: Vec::new(),
            last_risk_check: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TripStatus::Active
    }

    /// The immutable view the rule engine evaluates. Borrowing keeps the
    /// engine decoupled from trip bookkeeping (status, guardian, risk log).
    pub fn signals(&self) -> SignalSnapshot<'_> {
        SignalSnapshot {
            locations: &self.locations,
            motion_events: &self.motion_events,
        }
    }

    pub fn last_location(&self) -> Option<&LocationPoint> {
        self.locations.last()
    }
}

/// Borrowed snapshot of a trip's signal logs as of one evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct SignalSnapshot<'a> {
    pub locations: &'a [LocationPoint],
    pub motion_events: &'a [MotionEvent],
}
