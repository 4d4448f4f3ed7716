use chrono::{DateTime, Utc};

use anyhow::{Result, bail};
use serde::Serialize;

use crate::alert::{AlertDispatcher, AlertOutcome};
use crate::config::RiskConfig;
use crate::data::TripStore;
use crate::engine::RiskEngine;
use crate::models::location::{LocationPoint, LocationSource};
use crate::models::motion::MotionEvent;
use crate::models::risk::{RiskEvent, RuleName};
use crate::models::trip::{GuardianContact, Trip, TripStatus};

/// How many trailing motion events the debug summary inspects for panic.
const DEBUG_MOTION_TAIL: usize = 5;

/// Facade tying the trip registry, the pure rule engine, and the alert
/// dispatcher into the trip lifecycle. This is the only place status
/// transitions happen.
pub struct TripMonitor {
    store: TripStore,
    engine: RiskEngine,
    dispatcher: AlertDispatcher,
}

impl TripMonitor {
    pub fn new(config: RiskConfig, dispatcher: AlertDispatcher) -> Self {
        Self {
            store: TripStore::new(),
            engine: RiskEngine::new(config),
            dispatcher,
        }
    }

    // ----- Trip Lifecycle -----

    /// Start a new trip and begin its tracking session. Returns the trip id.
    pub async fn start_trip(
        &self,
        user_id: &str,
        guardian: GuardianContact,
        now: DateTime<Utc>,
    ) -> String {
        let trip = Trip::new(user_id, guardian, now);
        let id = trip.id.clone();
        self.store.insert(trip).await;
        log::info!("Trip created: {}", id);
        id
    }

    /// End a trip - stops all tracking. Terminal.
    pub async fn end_trip(&self, trip_id: &str, now: DateTime<Utc>) -> Result<()> {
        let handle = self.store.get(trip_id).await?;
        let mut trip = handle.lock().await;

        if trip.status == TripStatus::Ended {
            bail!("Trip already ended: {}", trip_id);
        }
        trip.status = TripStatus::Ended;
        trip.end_time = Some(now);

        log::info!("Trip ended: {}", trip_id);
        Ok(())
    }

    /// Merge updated guardian contact fields. Empty/absent fields keep the
    /// existing value rather than clearing it.
    pub async fn update_guardian(
        &self,
        trip_id: &str,
        phone: Option<String>,
        push_token: Option<String>,
    ) -> Result<()> {
        let handle = self.store.get(trip_id).await?;
        let mut trip = handle.lock().await;

        if let Some(phone) = phone.filter(|p| !p.is_empty()) {
            trip.guardian.phone = Some(phone);
        }
        if let Some(token) = push_token.filter(|t| !t.is_empty()) {
            trip.guardian.push_token = Some(token);
        }
        Ok(())
    }

    // ----- Signal Ingestion -----

    /// Append a location fix. Only active trips accept signals.
    pub async fn record_location(&self, trip_id: &str, point: LocationPoint) -> Result<String> {
        let handle = self.store.get(trip_id).await?;
        let mut trip = handle.lock().await;

        if !trip.is_active() {
            bail!("Trip is not active: {}", trip_id);
        }

        let point_id = point.id.clone();
        trip.locations.push(point);
        Ok(point_id)
    }

    /// Classify and append a motion reading. The panic decision is made
    /// here, once, against the engine's configured thresholds - callers see
    /// it on the returned event and can trigger an evaluation cycle on it.
    pub async fn record_motion(
        &self,
        trip_id: &str,
        accel_variance: f64,
        gyro_variance: f64,
        now: DateTime<Utc>,
    ) -> Result<MotionEvent> {
        let handle = self.store.get(trip_id).await?;
        let mut trip = handle.lock().await;

        if !trip.is_active() {
            bail!("Trip is not active: {}", trip_id);
        }

        let event =
            MotionEvent::classify(accel_variance, gyro_variance, now, &self.engine.config().panic);
        if event.is_panic {
            log::warn!("Panic movement detected for trip {}", trip_id);
        }

        trip.motion_events.push(event.clone());
        Ok(event)
    }

    // ----- Risk Evaluation -----

    /// One evaluation cycle.
    ///
    /// Holds the trip's lock across read -> evaluate -> dispatch -> append
    /// -> transition, so concurrent cycles for the same trip cannot both
    /// observe `active` and double-alert. The per-channel dispatch timeout
    /// bounds how long the lock is held.
    pub async fn check_and_alert(
        &self,
        trip_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RiskEvent>> {
        let handle = self.store.get(trip_id).await?;
        let mut trip = handle.lock().await;

        // Evaluation is only meaningful while active. Retries and races
        // land here harmlessly instead of re-alerting an alerted trip.
        if !trip.is_active() {
            return Ok(None);
        }

        match self.engine.evaluate(&trip.signals(), now) {
            Some(mut risk) => {
                let outcome = self.dispatcher.dispatch(&trip.guardian, &risk).await;
                risk.push_sent = outcome.push_sent;
                risk.sms_sent = outcome.sms_sent;
                risk.alert_sent = outcome.alert_sent();

                trip.risk_events.push(risk.clone());
                trip.status = TripStatus::Alert;
                trip.last_risk_check = Some(now);

                log::warn!("RISK DETECTED for trip {}: {}", trip_id, risk.rule_name);
                Ok(Some(risk))
            }
            None => {
                trip.last_risk_check = Some(now);
                Ok(None)
            }
        }
    }

    /// Dry-run evaluation: no append, no transition, no dispatch.
    pub async fn evaluate_only(
        &self,
        trip_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RiskEvent>> {
        let handle = self.store.get(trip_id).await?;
        let trip = handle.lock().await;
        Ok(self.engine.evaluate(&trip.signals(), now))
    }

    /// Push a synthetic full-confidence event through the real dispatcher
    /// without touching trip status. For verifying the guardian path works.
    pub async fn send_test_alert(&self, trip_id: &str, now: DateTime<Utc>) -> Result<AlertOutcome> {
        let handle = self.store.get(trip_id).await?;
        let trip = handle.lock().await;

        let test_risk = RiskEvent::test_alert(trip.last_location().cloned(), now);
        Ok(self.dispatcher.dispatch(&trip.guardian, &test_risk).await)
    }

    // ----- Introspection -----

    /// Full trip clone (locations, motion, risk log included).
    pub async fn snapshot(&self, trip_id: &str) -> Result<Trip> {
        let handle = self.store.get(trip_id).await?;
        let trip = handle.lock().await;
        Ok(trip.clone())
    }

    pub async fn active_trips(&self) -> Vec<(String, DateTime<Utc>)> {
        self.store.active_trips().await
    }

    /// Flat tracking-state summary for dashboards and demos.
    pub async fn debug_info(&self, trip_id: &str) -> Result<TripDebugInfo> {
        let handle = self.store.get(trip_id).await?;
        let trip = handle.lock().await;

        let last_location = trip.last_location();
        let panic_in_recent_motion = trip
            .motion_events
            .iter()
            .rev()
            .take(DEBUG_MOTION_TAIL)
            .any(|m| m.is_panic);
        let last_risk = trip.risk_events.last();

        Ok(TripDebugInfo {
            trip_id: trip.id.clone(),
            status: trip.status,
            tracking_source: last_location.map(|l| l.source),
            accuracy: last_location.map(|l| l.accuracy).unwrap_or(0.0),
            accuracy_radius: last_location.and_then(|l| l.accuracy_radius),
            total_locations: trip.locations.len(),
            total_motion_events: trip.motion_events.len(),
            panic_in_recent_motion,
            last_risk_rule: last_risk.map(|r| r.rule_name),
            last_risk_confidence: last_risk.map(|r| r.confidence),
            guardian_phone_set: trip.guardian.phone.is_some(),
            last_location: last_location.cloned(),
        })
    }
}

/// Point-in-time tracking summary of one trip.
#[derive(Debug, Clone, Serialize)]
pub struct TripDebugInfo {
    pub trip_id: String,
    pub status: TripStatus,
    pub tracking_source: Option<LocationSource>,
    pub accuracy: f64,
    pub accuracy_radius: Option<f64>,
    pub total_locations: usize,
    pub total_motion_events: usize,
    /// Panic flag anywhere in the last few motion events.
    pub panic_in_recent_motion: bool,
    pub last_risk_rule: Option<RuleName>,
    pub last_risk_confidence: Option<f64>,
    pub guardian_phone_set: bool,
    pub last_location: Option<LocationPoint>,
}
