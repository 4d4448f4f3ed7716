use chrono::{DateTime, Utc};

use crate::config::RiskConfig;
use crate::models::risk::RiskEvent;
use crate::models::trip::SignalSnapshot;

use super::confidence;
use super::rules::{self, RuleContext};
use super::windows::SignalWindows;

/// The rule engine front door.
///
/// Holds its configuration by value: evaluation is a pure function of
/// (snapshot, now, config), so it is safe to re-run, retry, or call from
/// concurrent cycles. Nothing here touches a clock or any shared state.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate one trip snapshot as of `now`.
    ///
    /// Returns at most one detection. Outcome flags on the returned event
    /// stay unset until the dispatch step stamps them.
    pub fn evaluate(&self, snapshot: &SignalSnapshot<'_>, now: DateTime<Utc>) -> Option<RiskEvent> {
        // 1. Window the signals
        let windows = SignalWindows::extract(snapshot, now, &self.config);

        // 2. First-match rule walk
        let ctx = RuleContext {
            snapshot,
            windows: &windows,
            now,
            config: &self.config,
        };
        let detection = rules::first_match(&ctx)?;

        // 3. Boost for corroborating conditions
        let confidence =
            confidence::adjust(detection.base_confidence, &windows, now, &self.config);

        // 4. Snapshot where we last saw the user: freshest recent fix,
        //    else freshest fix overall, else nothing
        let last_known = windows
            .recent_locations
            .last()
            .copied()
            .or_else(|| snapshot.locations.iter().rev().find(|l| l.is_wellformed()))
            .cloned();

        Some(RiskEvent::new(
            detection.rule,
            detection.contributing_signals,
            confidence,
            last_known,
            now,
        ))
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
