//! Full-pipeline scenarios: ingestion -> windowing -> rules -> confidence
//! -> dispatch -> status transition, driven through the public surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::alert::{AlertDispatcher, PushSender, SimulatedPush, SimulatedSms, SmsSender};
use crate::config::{ALERTING, RISK};
use crate::engine::RiskEngine;
use crate::models::location::LocationPoint;
use crate::models::motion::MotionEvent;
use crate::models::risk::RuleName;
use crate::models::trip::{GuardianContact, SignalSnapshot, TripStatus};
use crate::monitor::TripMonitor;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn late_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 23, 30, 0).unwrap()
}

fn guardian() -> GuardianContact {
    GuardianContact {
        phone: Some("+10005550100".to_string()),
        push_token: Some("token-abc".to_string()),
    }
}

fn simulated_monitor() -> TripMonitor {
    let dispatcher =
        AlertDispatcher::new(Arc::new(SimulatedPush), Arc::new(SimulatedSms), ALERTING);
    TripMonitor::new(RISK, dispatcher)
}

async fn feed_panic_burst(monitor: &TripMonitor, trip_id: &str, now: DateTime<Utc>) {
    // 3 readings in a 10-second span, both variances above threshold
    for secs_ago in [20, 15, 10] {
        monitor
            .record_motion(trip_id, 3.0, 0.6, now - Duration::seconds(secs_ago))
            .await
            .unwrap();
    }
}

// ----- Engine scenarios (pure core, fixed instants) -----

#[test]
fn test_panic_burst_scores_ninety_percent_in_daytime() {
    let now = noon();
    let motion: Vec<MotionEvent> = [20, 15, 10]
        .iter()
        .map(|s| MotionEvent::classify(3.0, 0.6, now - Duration::seconds(*s), &RISK.panic))
        .collect();
    assert!(motion.iter().all(|m| m.is_panic));

    let snapshot = SignalSnapshot {
        locations: &[],
        motion_events: &motion,
    };
    let event = RiskEngine::default().evaluate(&snapshot, now).unwrap();

    assert_eq!(event.rule_name, RuleName::SustainedPanicMovement);
    // 0.75 base + 0.15 recent-panic boost, no night boost at noon
    assert!((event.confidence - 0.90).abs() < 1e-9);
}

#[test]
fn test_panic_then_stop_scores_eighty_five_percent() {
    let now = noon();
    // One panic event only: sustained-panic can't fire
    let motion = vec![MotionEvent::classify(
        2.5,
        0.7,
        now - Duration::seconds(40),
        &RISK.panic,
    )];
    // Two fixes ~5m apart inside the window
    let locations = vec![
        LocationPoint::gps(28.61390, 77.2090, now - Duration::seconds(30), 5.0),
        LocationPoint::gps(28.61394, 77.2090, now - Duration::seconds(15), 5.0),
    ];
    let snapshot = SignalSnapshot {
        locations: &locations,
        motion_events: &motion,
    };
    let event = RiskEngine::default().evaluate(&snapshot, now).unwrap();

    assert_eq!(event.rule_name, RuleName::PanicMovementAbnormalStop);
    assert!((event.confidence - 0.85).abs() < 1e-9);
}

#[test]
fn test_prolonged_stop_without_panic_keeps_base_confidence() {
    let now = noon();
    // First two segments sum ~150m, last two ~10m
    let locations = vec![
        LocationPoint::gps(28.61390, 77.2090, now - Duration::seconds(300), 5.0),
        LocationPoint::gps(28.61458, 77.2090, now - Duration::seconds(240), 5.0),
        LocationPoint::gps(28.61525, 77.2090, now - Duration::seconds(180), 5.0),
        LocationPoint::gps(28.61529, 77.2090, now - Duration::seconds(120), 5.0),
        LocationPoint::gps(28.61533, 77.2090, now - Duration::seconds(60), 5.0),
    ];
    let snapshot = SignalSnapshot {
        locations: &locations,
        motion_events: &[],
    };
    let event = RiskEngine::default().evaluate(&snapshot, now).unwrap();

    assert_eq!(event.rule_name, RuleName::ProlongedStopUnusualLocation);
    assert!((event.confidence - 0.55).abs() < 1e-9);
}

#[test]
fn test_empty_history_detects_nothing() {
    let snapshot = SignalSnapshot {
        locations: &[],
        motion_events: &[],
    };
    assert!(RiskEngine::default().evaluate(&snapshot, noon()).is_none());
}

#[test]
fn test_evaluation_is_idempotent() {
    let now = late_night();
    let motion: Vec<MotionEvent> = [25, 15, 5]
        .iter()
        .map(|s| MotionEvent::classify(3.0, 0.6, now - Duration::seconds(*s), &RISK.panic))
        .collect();
    let snapshot = SignalSnapshot {
        locations: &[],
        motion_events: &motion,
    };

    let engine = RiskEngine::default();
    let a = engine.evaluate(&snapshot, now).unwrap();
    let b = engine.evaluate(&snapshot, now).unwrap();

    // Identical detection (ids are per-event record identity, not semantics)
    assert_eq!(a.rule_name, b.rule_name);
    assert_eq!(a.contributing_signals, b.contributing_signals);
    assert_eq!(a.confidence, b.confidence);
    assert_eq!(a.timestamp, b.timestamp);
}

#[test]
fn test_confidence_always_within_bounds() {
    // Sweep the scenario grid; every detection must land in [base, 0.95]
    let instants = [noon(), late_night()];
    for now in instants {
        let motion: Vec<MotionEvent> = [25, 15, 5]
            .iter()
            .map(|s| MotionEvent::classify(3.0, 0.6, now - Duration::seconds(*s), &RISK.panic))
            .collect();
        let snapshot = SignalSnapshot {
            locations: &[],
            motion_events: &motion,
        };
        let event = RiskEngine::default().evaluate(&snapshot, now).unwrap();
        let base = RISK.confidence.base_confidence(event.rule_name);
        assert!(event.confidence >= base);
        assert!(event.confidence <= RISK.boosts.max_confidence);
    }
}

// ----- Monitor scenarios (lifecycle + transitions + dispatch) -----

#[tokio::test]
async fn test_detection_transitions_trip_to_alert() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;

    feed_panic_burst(&monitor, &trip_id, now).await;
    let risk = monitor.check_and_alert(&trip_id, now).await?.unwrap();

    // Simulated channels always deliver
    assert!(risk.push_sent && risk.sms_sent && risk.alert_sent);

    let trip = monitor.snapshot(&trip_id).await?;
    assert_eq!(trip.status, TripStatus::Alert);
    assert_eq!(trip.risk_events.len(), 1);
    assert_eq!(trip.last_risk_check, Some(now));
    Ok(())
}

#[tokio::test]
async fn test_quiet_cycle_only_refreshes_last_check() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;

    monitor
        .record_location(
            &trip_id,
            LocationPoint::gps(28.6139, 77.2090, now - Duration::seconds(30), 5.0),
        )
        .await?;
    let risk = monitor.check_and_alert(&trip_id, now).await?;

    assert!(risk.is_none());
    let trip = monitor.snapshot(&trip_id).await?;
    assert_eq!(trip.status, TripStatus::Active);
    assert!(trip.risk_events.is_empty());
    assert_eq!(trip.last_risk_check, Some(now));
    Ok(())
}

#[tokio::test]
async fn test_alerted_trip_is_not_realerted() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;

    feed_panic_burst(&monitor, &trip_id, now).await;
    assert!(monitor.check_and_alert(&trip_id, now).await?.is_some());

    // Second cycle sees `alert` status and stands down
    let again = monitor
        .check_and_alert(&trip_id, now + Duration::seconds(5))
        .await?;
    assert!(again.is_none());

    let trip = monitor.snapshot(&trip_id).await?;
    assert_eq!(trip.risk_events.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_cycles_produce_one_alert() -> Result<()> {
    let monitor = Arc::new(simulated_monitor());
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;
    feed_panic_burst(&monitor, &trip_id, now).await;

    // A location update and a motion update racing into evaluation
    let m1 = monitor.clone();
    let m2 = monitor.clone();
    let id1 = trip_id.clone();
    let id2 = trip_id.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { m1.check_and_alert(&id1, now).await }),
        tokio::spawn(async move { m2.check_and_alert(&id2, now).await }),
    );
    let results = [a.unwrap()?, b.unwrap()?];

    // Exactly one cycle won the trip lock while still active
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    let trip = monitor.snapshot(&trip_id).await?;
    assert_eq!(trip.risk_events.len(), 1);
    assert_eq!(trip.status, TripStatus::Alert);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_evaluation_leaves_trip_untouched() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;
    feed_panic_burst(&monitor, &trip_id, now).await;

    let preview = monitor.evaluate_only(&trip_id, now).await?.unwrap();
    assert_eq!(preview.rule_name, RuleName::SustainedPanicMovement);
    assert!(!preview.alert_sent);

    // Nothing dispatched, nothing appended, no transition
    let trip = monitor.snapshot(&trip_id).await?;
    assert_eq!(trip.status, TripStatus::Active);
    assert!(trip.risk_events.is_empty());
    assert!(trip.last_risk_check.is_none());
    Ok(())
}

#[tokio::test]
async fn test_ended_trip_rejects_signals_and_skips_evaluation() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;
    feed_panic_burst(&monitor, &trip_id, now).await;
    monitor.end_trip(&trip_id, now).await?;

    assert!(
        monitor
            .record_motion(&trip_id, 3.0, 0.6, now)
            .await
            .is_err()
    );
    assert!(
        monitor
            .record_location(
                &trip_id,
                LocationPoint::gps(28.6139, 77.2090, now, 5.0)
            )
            .await
            .is_err()
    );
    // Pending panic data is ignored once the trip ended
    assert!(monitor.check_and_alert(&trip_id, now).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_malformed_history_is_still_evaluable() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;

    // A corrupt fix sneaks in alongside a real panic burst
    let mut corrupt = LocationPoint::gps(28.6139, 77.2090, now - Duration::seconds(20), 5.0);
    corrupt.longitude = f64::NAN;
    monitor.record_location(&trip_id, corrupt).await?;
    feed_panic_burst(&monitor, &trip_id, now).await;

    let risk = monitor.check_and_alert(&trip_id, now).await?.unwrap();
    assert_eq!(risk.rule_name, RuleName::SustainedPanicMovement);
    // The corrupt fix must not become the last-known location
    assert!(risk.last_known_location.is_none());
    Ok(())
}

#[tokio::test]
async fn test_guardian_update_then_test_alert() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", GuardianContact::default(), now)
        .await;

    // Unreachable guardian: both channels come back false
    let outcome = monitor.send_test_alert(&trip_id, now).await?;
    assert!(!outcome.alert_sent());

    monitor
        .update_guardian(&trip_id, Some("+10005550123".to_string()), None)
        .await?;
    let outcome = monitor.send_test_alert(&trip_id, now).await?;
    assert!(!outcome.push_sent);
    assert!(outcome.sms_sent);
    Ok(())
}

#[tokio::test]
async fn test_debug_info_reflects_tracking_state() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let trip_id = monitor
        .start_trip("user-1", guardian(), now - Duration::minutes(10))
        .await;

    monitor
        .record_location(
            &trip_id,
            LocationPoint::cellular(28.6139, 77.2090, now - Duration::seconds(30), 900.0),
        )
        .await?;
    feed_panic_burst(&monitor, &trip_id, now).await;
    monitor.check_and_alert(&trip_id, now).await?;

    let info = monitor.debug_info(&trip_id).await?;
    assert_eq!(info.status, TripStatus::Alert);
    assert_eq!(info.total_locations, 1);
    assert_eq!(info.total_motion_events, 3);
    assert!(info.panic_in_recent_motion);
    assert_eq!(info.accuracy_radius, Some(900.0));
    assert_eq!(info.last_risk_rule, Some(RuleName::SustainedPanicMovement));
    assert!(info.guardian_phone_set);
    Ok(())
}

#[tokio::test]
async fn test_active_trip_listing_tracks_transitions() -> Result<()> {
    let monitor = simulated_monitor();
    let now = noon();
    let first = monitor.start_trip("user-1", guardian(), now).await;
    let second = monitor.start_trip("user-2", guardian(), now).await;

    assert_eq!(monitor.active_trips().await.len(), 2);

    monitor.end_trip(&first, now).await?;
    let remaining = monitor.active_trips().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].0, second);
    Ok(())
}

// ----- Dispatch policy through the monitor, with scripted channels -----

struct CountingPush {
    calls: AtomicUsize,
    succeed: bool,
}

#[async_trait::async_trait]
impl PushSender for CountingPush {
    async fn send_push(&self, _token: &str, _title: &str, _body: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(())
        } else {
            anyhow::bail!("push provider down")
        }
    }
}

struct CountingSms {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl SmsSender for CountingSms {
    async fn send_sms(
        &self,
        _phone: &str,
        _message: &str,
        _location: Option<&LocationPoint>,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_sms_fallback_fires_regardless_of_push_outcome() -> Result<()> {
    for push_succeeds in [true, false] {
        let push = Arc::new(CountingPush {
            calls: AtomicUsize::new(0),
            succeed: push_succeeds,
        });
        let sms = Arc::new(CountingSms {
            calls: AtomicUsize::new(0),
        });
        let dispatcher = AlertDispatcher::new(push.clone(), sms.clone(), ALERTING);
        let monitor = TripMonitor::new(RISK, dispatcher);

        let now = noon();
        let trip_id = monitor
            .start_trip("user-1", guardian(), now - Duration::minutes(10))
            .await;
        feed_panic_burst(&monitor, &trip_id, now).await;

        let risk = monitor.check_and_alert(&trip_id, now).await?.unwrap();
        assert_eq!(risk.push_sent, push_succeeds);
        assert!(risk.sms_sent);
        assert!(risk.alert_sent);
        assert_eq!(push.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sms.calls.load(Ordering::SeqCst), 1);
    }
    Ok(())
}
