use std::sync::Arc;

use futures::join;
use tokio::time::timeout;

use crate::config::AlertConfig;
use crate::models::location::LocationPoint;
use crate::models::risk::RiskEvent;
use crate::models::trip::GuardianContact;

use super::channels::{PushSender, SmsSender};

/// Per-channel outcome flags for one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertOutcome {
    pub push_sent: bool,
    pub sms_sent: bool,
}

impl AlertOutcome {
    /// The composite signal: did ANY channel get through?
    pub fn alert_sent(&self) -> bool {
        self.push_sent || self.sms_sent
    }
}

/// Fans a risk event out to the guardian over push + SMS.
///
/// Push is the primary channel. SMS is a mandatory fallback attempted
/// whenever a phone number exists - push success does NOT suppress it; the
/// redundancy is the policy. Both attempts run concurrently under a
/// per-channel timeout so a hung provider can't stall the trip cycle, and
/// transport failures are absorbed into `false` outcomes, never raised.
pub struct AlertDispatcher {
    push: Arc<dyn PushSender>,
    sms: Arc<dyn SmsSender>,
    config: AlertConfig,
}

impl AlertDispatcher {
    pub fn new(push: Arc<dyn PushSender>, sms: Arc<dyn SmsSender>, config: AlertConfig) -> Self {
        Self { push, sms, config }
    }

    pub async fn dispatch(&self, contact: &GuardianContact, risk: &RiskEvent) -> AlertOutcome {
        let message = format!(
            "⚠️ TRIP SENTINEL: Potential risk detected. Rule: {}. User may need help.",
            risk.rule_name
        );

        let push_attempt = async {
            match &contact.push_token {
                Some(token) => self.try_push(token, &message).await,
                None => false,
            }
        };

        let sms_attempt = async {
            match &contact.phone {
                Some(phone) => {
                    self.try_sms(phone, &message, risk.last_known_location.as_ref())
                        .await
                }
                // No phone, no SMS - a valid outcome, not an error
                None => false,
            }
        };

        let (push_sent, sms_sent) = join!(push_attempt, sms_attempt);
        let outcome = AlertOutcome {
            push_sent,
            sms_sent,
        };

        // Log for auditability
        log::info!(
            "Alert dispatch for {}: push={}, sms={}",
            risk.rule_name,
            outcome.push_sent,
            outcome.sms_sent
        );

        outcome
    }

    async fn try_push(&self, token: &str, body: &str) -> bool {
        let attempt = self.push.send_push(token, self.config.push_title, body);
        match timeout(self.config.channel_timeout, attempt).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("Push channel failed: {:#}", e);
                false
            }
            Err(_) => {
                log::warn!(
                    "Push channel timed out after {:?}",
                    self.config.channel_timeout
                );
                false
            }
        }
    }

    async fn try_sms(&self, phone: &str, message: &str, location: Option<&LocationPoint>) -> bool {
        let attempt = self.sms.send_sms(phone, message, location);
        match timeout(self.config.channel_timeout, attempt).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("SMS channel failed: {:#}", e);
                false
            }
            Err(_) => {
                log::warn!(
                    "SMS channel timed out after {:?}",
                    self.config.channel_timeout
                );
                false
            }
        }
    }
}
