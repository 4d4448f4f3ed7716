use chrono::{DateTime, Duration, Utc};

use crate::config::RiskConfig;
use crate::models::location::LocationPoint;
use crate::models::motion::MotionEvent;
use crate::models::trip::SignalSnapshot;

/// Time-bounded views over one trip's signal logs, relative to an injected
/// reference instant.
///
/// Extraction is pure: input order (ascending timestamp) is preserved,
/// malformed records are dropped rather than aborting evaluation, and empty
/// history yields empty views.
#[derive(Debug)]
pub struct SignalWindows<'a> {
    /// Locations inside the recent window (60s default).
    pub recent_locations: Vec<&'a LocationPoint>,
    /// Motion events inside the recent window.
    pub recent_motion: Vec<&'a MotionEvent>,
    /// Motion events inside the short window (30s default).
    pub very_recent_motion: Vec<&'a MotionEvent>,
}

impl<'a> SignalWindows<'a> {
    pub fn extract(
        snapshot: &SignalSnapshot<'a>,
        now: DateTime<Utc>,
        config: &RiskConfig,
    ) -> Self {
        let recent_cutoff = now - Duration::seconds(config.windows.recent_secs);
        let very_recent_cutoff = now - Duration::seconds(config.windows.very_recent_secs);

        // Cutoffs are exclusive: a record stamped exactly at the boundary is out.
        let recent_locations = snapshot
            .locations
            .iter()
            .filter(|l| l.is_wellformed() && l.timestamp > recent_cutoff)
            .collect();

        let recent_motion = snapshot
            .motion_events
            .iter()
            .filter(|m| m.is_wellformed() && m.timestamp > recent_cutoff)
            .collect();

        let very_recent_motion = snapshot
            .motion_events
            .iter()
            .filter(|m| m.is_wellformed() && m.timestamp > very_recent_cutoff)
            .collect();

        Self {
            recent_locations,
            recent_motion,
            very_recent_motion,
        }
    }

    /// Any panic-flagged event in the recent window?
    pub fn has_recent_panic(&self) -> bool {
        self.recent_motion.iter().any(|m| m.is_panic)
    }

    /// Panic-flagged events in the short window.
    pub fn very_recent_panic_count(&self) -> usize {
        self.very_recent_motion.iter().filter(|m| m.is_panic).count()
    }
}
