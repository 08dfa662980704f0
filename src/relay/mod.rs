//! Messenger webhook relay
//!
//! Receives page events from the messaging platform, decodes referral
//! payloads and forwards them to the external workflow engine. The relay
//! owns no workflow logic; it verifies, decodes and ships.

use crate::config::settings::RelaySettings;
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use serde_json::{Value, json};

/// Webhook relay to the workflow engine
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    http: Client,
    settings: RelaySettings,
}

impl WebhookRelay {
    /// Create a relay from settings
    pub fn new(settings: RelaySettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    /// Answer an inbound GET verification.
    ///
    /// Returns the challenge to echo when the shared token matches; an
    /// unconfigured (empty) token never verifies.
    pub fn verify(&self, token: &str, challenge: &str) -> Option<String> {
        if !self.settings.verify_token.is_empty() && token == self.settings.verify_token {
            tracing::info!("Webhook verified");
            return Some(challenge.to_string());
        }
        tracing::warn!("Webhook verification failed");
        None
    }

    /// Decode a base64url referral payload into JSON
    pub fn decode_referral(ref_param: &str) -> Result<Value> {
        let bytes = URL_SAFE_NO_PAD
            .decode(ref_param.trim_end_matches('='))
            .map_err(|e| Error::relay(format!("referral payload not base64url: {}", e)))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::relay(format!("referral payload not JSON: {}", e)))?;
        Ok(value)
    }

    /// Process an inbound page-event batch, forwarding each decoded event.
    ///
    /// Returns the number of events forwarded.
    pub async fn relay_events(&self, payload: &Value) -> Result<u32> {
        if payload.get("object").and_then(Value::as_str) != Some("page") {
            return Err(Error::relay("unsupported webhook object"));
        }

        let mut forwarded = 0;
        let entries = payload
            .get("entry")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for entry in entries {
            let events = entry
                .get("messaging")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for event in events {
                if let Some(outbound) = Self::build_outbound(&event) {
                    self.forward(&outbound).await?;
                    forwarded += 1;
                } else {
                    tracing::debug!("Ignoring webhook event without referral or message");
                }
            }
        }

        Ok(forwarded)
    }

    /// Shape one messaging event for the workflow engine
    fn build_outbound(event: &Value) -> Option<Value> {
        let sender_id = event
            .get("sender")
            .and_then(|sender| sender.get("id"))
            .and_then(Value::as_str)?;

        let referral = event
            .get("referral")
            .or_else(|| event.get("postback").and_then(|p| p.get("referral")));

        if let Some(referral) = referral {
            let job_context = referral
                .get("ref")
                .and_then(Value::as_str)
                .and_then(|raw| Self::decode_referral(raw).ok());

            return Some(json!({
                "type": "messenger_referral",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "senderId": sender_id,
                "jobContext": job_context,
                "rawReferral": referral,
                "source": "facebook_messenger",
            }));
        }

        if let Some(message) = event.get("message") {
            return Some(json!({
                "type": "messenger_message",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "senderId": sender_id,
                "message": message,
                "source": "facebook_messenger",
            }));
        }

        None
    }

    /// POST one payload to the workflow engine
    async fn forward(&self, payload: &Value) -> Result<()> {
        if self.settings.forward_url.is_empty() {
            tracing::warn!("No forward URL configured, dropping webhook payload");
            return Ok(());
        }

        let response = self
            .http
            .post(&self.settings.forward_url)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::relay(format!(
                "workflow engine answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_with_token(token: &str) -> WebhookRelay {
        let mut settings = RelaySettings::default();
        settings.verify_token = token.to_string();
        WebhookRelay::new(settings)
    }

    #[test]
    fn test_verify_matching_token() {
        let relay = relay_with_token("sekrit");
        assert_eq!(
            relay.verify("sekrit", "challenge_123").as_deref(),
            Some("challenge_123")
        );
    }

    #[test]
    fn test_verify_wrong_token() {
        let relay = relay_with_token("sekrit");
        assert!(relay.verify("guess", "challenge_123").is_none());
    }

    #[test]
    fn test_verify_unconfigured_never_passes() {
        let relay = relay_with_token("");
        assert!(relay.verify("", "challenge_123").is_none());
    }

    #[test]
    fn test_decode_referral_round_trip() {
        let context = json!({"jobId": "job_1", "groupId": "g_9"});
        let encoded = URL_SAFE_NO_PAD.encode(context.to_string());

        let decoded = WebhookRelay::decode_referral(&encoded).unwrap();
        assert_eq!(decoded, context);
    }

    #[test]
    fn test_decode_referral_rejects_garbage() {
        assert!(WebhookRelay::decode_referral("!!!not-base64!!!").is_err());
    }

    #[test]
    fn test_build_outbound_referral() {
        let context = json!({"jobId": "job_1"});
        let encoded = URL_SAFE_NO_PAD.encode(context.to_string());
        let event = json!({
            "sender": {"id": "user_7"},
            "referral": {"ref": encoded},
        });

        let outbound = WebhookRelay::build_outbound(&event).unwrap();
        assert_eq!(outbound["type"], "messenger_referral");
        assert_eq!(outbound["senderId"], "user_7");
        assert_eq!(outbound["jobContext"]["jobId"], "job_1");
    }

    #[test]
    fn test_build_outbound_postback_referral() {
        let event = json!({
            "sender": {"id": "user_7"},
            "postback": {"referral": {"ref": "bad base64 is fine, context stays null"}},
        });

        let outbound = WebhookRelay::build_outbound(&event).unwrap();
        assert_eq!(outbound["type"], "messenger_referral");
        assert!(outbound["jobContext"].is_null());
    }

    #[test]
    fn test_build_outbound_message() {
        let event = json!({
            "sender": {"id": "user_7"},
            "message": {"text": "hello"},
        });

        let outbound = WebhookRelay::build_outbound(&event).unwrap();
        assert_eq!(outbound["type"], "messenger_message");
        assert_eq!(outbound["message"]["text"], "hello");
    }

    #[test]
    fn test_build_outbound_ignores_other_events() {
        let event = json!({
            "sender": {"id": "user_7"},
            "delivery": {"watermark": 1},
        });
        assert!(WebhookRelay::build_outbound(&event).is_none());
    }

    #[tokio::test]
    async fn test_relay_rejects_non_page_objects() {
        let relay = relay_with_token("sekrit");
        let payload = json!({"object": "user", "entry": []});
        assert!(relay.relay_events(&payload).await.is_err());
    }

    #[tokio::test]
    async fn test_relay_empty_batch() {
        let relay = relay_with_token("sekrit");
        let payload = json!({"object": "page", "entry": []});
        assert_eq!(relay.relay_events(&payload).await.unwrap(), 0);
    }
}
