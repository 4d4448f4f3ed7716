pub mod location;
pub mod motion;
pub mod risk;
pub mod trip;

// Re-export commonly used items
pub use location::{LocationPoint, LocationSource};
pub use motion::MotionEvent;
pub use risk::{RiskEvent, RuleName};
pub use trip::{GuardianContact, SignalSnapshot, Trip, TripStatus};
