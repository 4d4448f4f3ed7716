use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a fix came from.
/// Cellular fixes are tower/IP triangulation results and are approximate;
/// they carry an uncertainty radius instead of a GPS accuracy figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationSource {
    Gps,
    Cellular,
}

/// A single fix on a trip's track. Append-only: never edited after recording.
///
/// Consumers may assume ascending timestamp order within a trip log but NOT
/// regular spacing - devices report opportunistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Reported GPS accuracy in meters (0.0 when the device gave none).
    pub accuracy: f64,
    pub source: LocationSource,
    /// Uncertainty radius in meters for cellular/IP fixes. None for GPS.
    pub accuracy_radius: Option<f64>,
}

impl LocationPoint {
    /// A device GPS fix.
    pub fn gps(latitude: f64, longitude: f64, timestamp: DateTime<Utc>, accuracy: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            latitude,
            longitude,
            timestamp,
            accuracy,
            source: LocationSource::Gps,
            accuracy_radius: None,
        }
    }

    /// A triangulated fix from the cellular/IP lookup service.
    pub fn cellular(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        accuracy_radius: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            latitude,
            longitude,
            timestamp,
            accuracy: 0.0,
            source: LocationSource::Cellular,
            accuracy_radius: Some(accuracy_radius),
        }
    }

    /// A corrupt fix must not poison rule evaluation: the window extractor
    /// drops anything failing this check and evaluates the rest.
    pub fn is_wellformed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}
