//! Configuration module for the trip sentinel.

// Can all be private because we have a public re-export.
mod alerting;
mod risk;

// Re-export commonly used items
pub use alerting::{ALERTING, AlertConfig};
pub use risk::{
    ConfidenceBoosts, MovementThresholds, NightWindow, PanicThresholds, RISK, RiskConfig,
    RuleConfidenceTable, SignalWindowSpans,
};
