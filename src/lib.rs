#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

// Core modules
pub mod alert;
pub mod config;
pub mod data;
pub mod engine;
pub mod models;
pub mod monitor;
pub mod utils;

#[cfg(test)]
mod integration_tests;

// Re-export commonly used types outside of crate
pub use alert::{AlertDispatcher, AlertOutcome, PushSender, SimulatedPush, SimulatedSms, SmsSender};
pub use config::{ALERTING, AlertConfig, RISK, RiskConfig};
pub use engine::RiskEngine;
pub use models::{GuardianContact, LocationPoint, MotionEvent, RiskEvent, RuleName, Trip, TripStatus};
pub use monitor::{TripDebugInfo, TripMonitor};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scenario to play through the monitor
    #[arg(long, value_enum, default_value = "panic-burst")]
    pub scenario: Scenario,

    /// Guardian phone number for SMS alerts (empty disables the channel)
    #[arg(long, default_value = "+10005550100")]
    pub guardian_phone: String,

    /// Guardian push token (empty disables the channel)
    #[arg(long, default_value = "demo-push-token-0001")]
    pub guardian_push_token: String,

    /// Evaluate as if it were night (23:30 local) instead of midday
    #[arg(long, default_value_t = false)]
    pub at_night: bool,
}

/// Scripted signal feeds, one per detection rule plus a quiet baseline.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Burst of panic readings inside the short window
    PanicBurst,
    /// One panic reading, then the track stops dead
    AbnormalStop,
    /// GPS fixes give way to cellular-only tracking
    GpsLoss,
    /// Significant movement then a dead stop on the track tail
    ProlongedStop,
    /// Normal walking, nothing to detect
    Quiet,
}
