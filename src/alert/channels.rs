use anyhow::Result;

use crate::models::location::LocationPoint;

// --- TRAIT DEFINITIONS ---

/// Primary channel: push notification to the guardian's device.
///
/// Ok means the provider accepted the message. Implementations talk to an
/// external service; the dispatcher handles their failures and timeouts.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send_push(&self, token: &str, title: &str, body: &str) -> Result<()>;
}

/// Mandatory fallback channel: SMS to the guardian's phone.
#[async_trait::async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver an SMS. When a location is given, implementations append a
    /// maps link so the guardian can act on the message directly.
    async fn send_sms(
        &self,
        phone: &str,
        message: &str,
        location: Option<&LocationPoint>,
    ) -> Result<()>;
}

/// Google Maps pin for a fix, suitable for an SMS body.
pub fn maps_link(location: &LocationPoint) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        location.latitude, location.longitude
    )
}

// --- SIMULATED IMPLEMENTATIONS ---

/// Stand-in provider for the demo binary and tests: logs the notification
/// and reports success without touching the network.
pub struct SimulatedPush;

#[async_trait::async_trait]
impl PushSender for SimulatedPush {
    async fn send_push(&self, token: &str, title: &str, body: &str) -> Result<()> {
        let shown: String = token.chars().take(20).collect();
        log::info!("SIMULATED PUSH to token {}...: {} - {}", shown, title, body);
        Ok(())
    }
}

pub struct SimulatedSms;

#[async_trait::async_trait]
impl SmsSender for SimulatedSms {
    async fn send_sms(
        &self,
        phone: &str,
        message: &str,
        location: Option<&LocationPoint>,
    ) -> Result<()> {
        let full_message = match location {
            Some(loc) => format!("{} Location: {}", message, maps_link(loc)),
            None => message.to_string(),
        };
        log::info!("SIMULATED SMS to {}: {}", phone, full_message);
        Ok(())
    }
}
