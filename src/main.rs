use std::panic;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use tabled::{Table, Tabled};

use trip_sentinel::{
    ALERTING, AlertDispatcher, Cli, GuardianContact, LocationPoint, RISK, Scenario, SimulatedPush,
    SimulatedSms, TripMonitor,
};

#[tokio::main]
async fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("trip_sentinel"), log::LevelFilter::Info)
        .init();

    let args = Cli::parse();

    // Fixed reference instant so every run of a scenario is identical.
    // The engine never reads a clock; we hand it this instant explicitly.
    let now = if args.at_night {
        Utc.with_ymd_and_hms(2024, 6, 15, 23, 30, 0).unwrap()
    } else {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    };

    let guardian = GuardianContact {
        phone: Some(args.guardian_phone).filter(|p| !p.is_empty()),
        push_token: Some(args.guardian_push_token).filter(|t| !t.is_empty()),
    };

    let dispatcher =
        AlertDispatcher::new(Arc::new(SimulatedPush), Arc::new(SimulatedSms), ALERTING);
    let monitor = TripMonitor::new(RISK, dispatcher);

    let trip_id = monitor
        .start_trip("demo_user", guardian, now - Duration::minutes(10))
        .await;
    println!("Trip {} started, playing scenario {:?}...\n", trip_id, args.scenario);

    feed_scenario(&monitor, &trip_id, args.scenario, now).await?;

    match monitor.check_and_alert(&trip_id, now).await? {
        Some(event) => println!(
            "\nRisk detected: {} ({})\nConfidence {:.2}, signals: {}\n",
            event.rule_name,
            event.rule_name.description(),
            event.confidence,
            event.contributing_signals.join(", "),
        ),
        None => println!("\nNo risk detected.\n"),
    }

    // Tracking summary
    let info = monitor.debug_info(&trip_id).await?;
    println!("{}\n", Table::new([SummaryRow::from_info(&info)]));

    // Risk log
    let trip = monitor.snapshot(&trip_id).await?;
    if !trip.risk_events.is_empty() {
        let rows: Vec<RiskRow> = trip.risk_events.iter().map(RiskRow::from_event).collect();
        println!("{}", Table::new(rows));
    }

    Ok(())
}

/// Append the scripted signal feed for one scenario, stamped at fixed
/// offsets before the reference instant.
async fn feed_scenario(
    monitor: &TripMonitor,
    trip_id: &str,
    scenario: Scenario,
    now: DateTime<Utc>,
) -> Result<()> {
    let gps = |lat: f64, lon: f64, secs_ago: i64| {
        LocationPoint::gps(lat, lon, now - Duration::seconds(secs_ago), 5.0)
    };
    let cell = |lat: f64, lon: f64, secs_ago: i64| {
        LocationPoint::cellular(lat, lon, now - Duration::seconds(secs_ago), 850.0)
    };

    match scenario {
        Scenario::PanicBurst => {
            // Three struggle-level readings inside 10 seconds
            for secs_ago in [20, 15, 10] {
                let event = monitor
                    .record_motion(trip_id, 3.0, 0.6, now - Duration::seconds(secs_ago))
                    .await?;
                println!("  motion @-{}s  panic={}", secs_ago, event.is_panic);
            }
        }
        Scenario::AbnormalStop => {
            monitor
                .record_motion(trip_id, 2.6, 0.8, now - Duration::seconds(40))
                .await?;
            // ~5m apart: the track has stopped dead
            monitor
                .record_location(trip_id, gps(28.61390, 77.20900, 30))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61394, 77.20900, 15))
                .await?;
        }
        Scenario::GpsLoss => {
            monitor
                .record_location(trip_id, gps(28.61390, 77.20900, 50))
                .await?;
            monitor
                .record_location(trip_id, cell(28.61500, 77.21000, 30))
                .await?;
            monitor
                .record_location(trip_id, cell(28.61620, 77.21110, 10))
                .await?;
        }
        Scenario::ProlongedStop => {
            // Two ~75m hops, then parked
            monitor
                .record_location(trip_id, gps(28.61390, 77.20900, 300))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61458, 77.20900, 240))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61525, 77.20900, 180))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61529, 77.20900, 120))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61533, 77.20900, 59))
                .await?;
        }
        Scenario::Quiet => {
            monitor
                .record_location(trip_id, gps(28.61390, 77.20900, 50))
                .await?;
            monitor
                .record_location(trip_id, gps(28.61490, 77.20900, 25))
                .await?;
            monitor
                .record_motion(trip_id, 0.3, 0.05, now - Duration::seconds(20))
                .await?;
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct SummaryRow {
    status: String,
    source: String,
    locations: usize,
    motion: usize,
    panic: bool,
    guardian_phone: bool,
}

impl SummaryRow {
    fn from_info(info: &trip_sentinel::TripDebugInfo) -> Self {
        Self {
            status: info.status.to_string(),
            source: info
                .tracking_source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string()),
            locations: info.total_locations,
            motion: info.total_motion_events,
            panic: info.panic_in_recent_motion,
            guardian_phone: info.guardian_phone_set,
        }
    }
}

#[derive(Tabled)]
struct RiskRow {
    rule: String,
    confidence: String,
    signals: String,
    push: bool,
    sms: bool,
}

impl RiskRow {
    fn from_event(event: &trip_sentinel::RiskEvent) -> Self {
        Self {
            rule: event.rule_name.to_string(),
            confidence: format!("{:.2}", event.confidence),
            signals: event.contributing_signals.join(", "),
            push: event.push_sent,
            sms: event.sms_sent,
        }
    }
}
