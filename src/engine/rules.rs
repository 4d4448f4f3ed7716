use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::config::RiskConfig;
use crate::models::location::{LocationPoint, LocationSource};
use crate::models::risk::{RuleName, signals};
use crate::models::trip::SignalSnapshot;
use crate::utils::geo_utils::haversine_distance_m;

use super::windows::SignalWindows;

/// Everything a rule predicate may look at. Bundled so the rule table stays
/// a flat list of uniform function pointers.
pub struct RuleContext<'a> {
    pub snapshot: &'a SignalSnapshot<'a>,
    pub windows: &'a SignalWindows<'a>,
    pub now: DateTime<Utc>,
    pub config: &'a RiskConfig,
}

/// One fired rule: name, the signal tags that contributed, and the base
/// confidence before boosts.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub rule: RuleName,
    pub contributing_signals: Vec<String>,
    pub base_confidence: f64,
}

/// A rule unit: returns the contributing signal tags when its precondition
/// holds, None otherwise.
type RuleCheck = fn(&RuleContext) -> Option<Vec<String>>;

/// THE PRIORITY LIST.
/// First match wins and later rules are never evaluated - the order favors
/// the most specific/urgent signal (sustained panic) over the softer
/// movement heuristics. RouteDeviation has no unit here: declared in the
/// confidence table, reserved.
const RULES: &[(RuleName, RuleCheck)] = &[
    (RuleName::SustainedPanicMovement, check_sustained_panic),
    (RuleName::PanicMovementAbnormalStop, check_panic_abnormal_stop),
    (RuleName::PanicMovementNight, check_panic_at_night),
    (RuleName::GpsLossCellularMovement, check_gps_loss_cellular),
    (RuleName::ProlongedStopUnusualLocation, check_prolonged_stop),
];

/// Walk the rule table in priority order. At most one detection per
/// evaluation, by construction.
pub fn first_match(ctx: &RuleContext) -> Option<Detection> {
    for (rule, check) in RULES {
        if let Some(tags) = check(ctx) {
            return Some(Detection {
                rule: *rule,
                contributing_signals: tags,
                base_confidence: ctx.config.confidence.base_confidence(*rule),
            });
        }
    }
    None
}

/// Rule 1: repeated panic readings in the short window. Fires on motion
/// alone - no location data needed.
fn check_sustained_panic(ctx: &RuleContext) -> Option<Vec<String>> {
    let count = ctx.windows.very_recent_panic_count();
    if count < ctx.config.movement.sustained_panic_count {
        return None;
    }

    log::warn!("SUSTAINED PANIC: {} panic events detected", count);
    Some(vec![
        signals::SUSTAINED_PANIC.to_string(),
        format!(
            "{}_panic_events_in_{}s",
            count, ctx.config.windows.very_recent_secs
        ),
    ])
}

/// Rule 2: panic followed by the track going still - the gap between the
/// two freshest fixes collapses below the stop threshold.
fn check_panic_abnormal_stop(ctx: &RuleContext) -> Option<Vec<String>> {
    if !ctx.windows.has_recent_panic() {
        return None;
    }

    let locs = &ctx.windows.recent_locations;
    if locs.len() < 2 {
        return None;
    }

    let last = locs[locs.len() - 1];
    let prev = locs[locs.len() - 2];
    let distance = haversine_distance_m(
        prev.latitude,
        prev.longitude,
        last.latitude,
        last.longitude,
    );

    if distance < ctx.config.movement.abnormal_stop_m {
        return Some(vec![
            signals::PANIC_MOVEMENT.to_string(),
            signals::SUDDEN_STOP.to_string(),
        ]);
    }
    None
}

/// Rule 3: any recent panic during night hours.
fn check_panic_at_night(ctx: &RuleContext) -> Option<Vec<String>> {
    if ctx.windows.has_recent_panic() && ctx.config.night.contains(ctx.now) {
        return Some(vec![
            signals::PANIC_MOVEMENT.to_string(),
            signals::NIGHT_HOURS.to_string(),
        ]);
    }
    None
}

/// Rule 4: tracking degraded from GPS to cellular-only but fixes keep
/// arriving - the device is still moving, we just can't see it well.
fn check_gps_loss_cellular(ctx: &RuleContext) -> Option<Vec<String>> {
    let locs = &ctx.windows.recent_locations;
    if locs.len() < ctx.config.movement.gps_loss_min_recent {
        return None;
    }

    let newest_gps = locs
        .iter()
        .filter(|l| l.source == LocationSource::Gps)
        .next_back()?;
    let cellular: Vec<&&LocationPoint> = locs
        .iter()
        .filter(|l| l.source == LocationSource::Cellular)
        .collect();
    if cellular.len() < ctx.config.movement.gps_loss_min_cellular {
        return None;
    }

    // Had GPS, now only cellular keeps producing points
    let newest_cellular = cellular[cellular.len() - 1];
    if newest_cellular.timestamp > newest_gps.timestamp {
        return Some(vec![
            signals::GPS_LOST.to_string(),
            signals::CELLULAR_TRACKING.to_string(),
            signals::CONTINUED_MOVEMENT.to_string(),
        ]);
    }
    None
}

/// Rule 5: significant movement then a dead stop, read off the tail of the
/// FULL track history (not just the recent window).
fn check_prolonged_stop(ctx: &RuleContext) -> Option<Vec<String>> {
    let valid: Vec<&LocationPoint> = ctx
        .snapshot
        .locations
        .iter()
        .filter(|l| l.is_wellformed())
        .collect();

    let trail_len = ctx.config.movement.trail_length;
    if valid.len() < trail_len {
        return None;
    }

    let trail = &valid[valid.len() - trail_len..];
    let segments: Vec<f64> = trail
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_distance_m(a.latitude, a.longitude, b.latitude, b.longitude))
        .collect();
    if segments.len() < 2 {
        return None;
    }

    let early_movement: f64 = segments[..2].iter().sum();
    let now_stationary: f64 = segments[segments.len() - 2..].iter().sum();

    if early_movement > ctx.config.movement.trail_movement_m
        && now_stationary < ctx.config.movement.trail_stationary_m
    {
        return Some(vec![
            signals::MOVEMENT_DETECTED.to_string(),
            signals::SUDDEN_STOP.to_string(),
            signals::LOCATION_STATIONARY.to_string(),
        ]);
    }
    None
}
