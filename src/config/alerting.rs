use std::time::Duration;

/// Alert delivery settings.
#[derive(Debug, Clone, Copy)]
pub struct AlertConfig {
    /// Per-channel delivery budget. A hung provider becomes a failed channel
    /// after this long; it never blocks the trip cycle.
    pub channel_timeout: Duration,
    /// Title line for push notifications.
    pub push_title: &'static str,
}

impl Default for AlertConfig {
    fn default() -> Self {
        ALERTING
    }
}

pub const ALERTING: AlertConfig = AlertConfig {
    channel_timeout: Duration::from_secs(10),
    push_title: "🚨 Safety Alert",
};
