use chrono::{DateTime, Utc};

use crate::config::RiskConfig;

use super::windows::SignalWindows;

/// Corroboration boosts for an existing detection.
///
/// Two independent additive boosts, each clamped to the ceiling the moment
/// it is applied so they can never compound past it, even transiently. The
/// result never drops below the base the rule carried in. No detection, no
/// boost - this is only called once a rule has fired.
pub fn adjust(
    base_confidence: f64,
    windows: &SignalWindows,
    now: DateTime<Utc>,
    config: &RiskConfig,
) -> f64 {
    let cap = config.boosts.max_confidence;
    let mut confidence = base_confidence;

    // Panic anywhere in the recent window corroborates whatever fired,
    // including the panic rules themselves.
    if windows.has_recent_panic() {
        confidence = (confidence + config.boosts.recent_panic).min(cap);
    }

    // Same deal for night hours, even when the night rule is what fired.
    if config.night.contains(now) {
        confidence = (confidence + config.boosts.night_hours).min(cap);
    }

    confidence
}
