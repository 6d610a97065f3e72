use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use crate::BillingError;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Bound on the session-creation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum skew between a webhook's signed timestamp and our clock.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Provider credentials, read from the environment. Checkout runs in
/// simulated mode when the key pair is absent.
#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub publishable_key: Option<String>,
    pub webhook_secret: Option<String>,
}

impl StripeConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env_nonempty("STRIPE_SECRET_KEY"),
            publishable_key: env_nonempty("STRIPE_PUBLISHABLE_KEY"),
            webhook_secret: env_nonempty("STRIPE_WEBHOOK_SECRET"),
        }
    }

    /// Real checkout requires both halves of the key pair.
    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some() && self.publishable_key.is_some()
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub struct SessionParams {
    pub product_name: String,
    pub unit_amount_cents: i64,
    pub success_url: String,
    pub cancel_url: String,
    pub ad_id: Option<String>,
    pub plan: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, secret_key })
    }

    /// Create a hosted checkout session for a monthly subscription.
    /// The listing id and plan ride along as metadata so the webhook can
    /// finish the activation after payment.
    pub async fn create_subscription_session(
        &self,
        params: &SessionParams,
    ) -> Result<CheckoutSession, BillingError> {
        let amount = params.unit_amount_cents.to_string();

        // Stripe's nested form-encoded parameter format
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][product_data][name]", &params.product_name),
            ("line_items[0][price_data][recurring][interval]", "month"),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][quantity]", "1"),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
            ("metadata[plan]", &params.plan),
        ];
        if let Some(ad_id) = &params.ad_id {
            form.push(("metadata[ad_id]", ad_id));
        }

        let response = self
            .http
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| BillingError::Provider(format!("checkout session request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "checkout session creation failed");
            return Err(BillingError::Provider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BillingError::Provider(format!("failed to read session response: {}", e)))?;
        let session: CheckoutSession = serde_json::from_str(&body)
            .map_err(|e| BillingError::Provider(format!("failed to parse session response: {}", e)))?;
        Ok(session)
    }
}

// ── Webhook verification ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

/// Verify a webhook signature header of the form `t=<unix>,v1=<hex>[,v1=…]`.
/// The signed payload is `"{t}.{body}"`; comparison is constant-time and
/// the timestamp must be within `tolerance_secs` of `now_unix`.
pub fn verify_webhook_signature(
    secret: &str,
    payload: &[u8],
    sig_header: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> Result<(), BillingError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in sig_header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or_else(|| BillingError::InvalidSignature("malformed signature header".into()))?;
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    candidates.push(bytes);
                }
            }
            // Unknown schemes (v0, test signatures) are ignored
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| BillingError::InvalidSignature("missing timestamp".into()))?;
    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(BillingError::InvalidSignature(
            "timestamp outside tolerance".into(),
        ));
    }
    if candidates.is_empty() {
        return Err(BillingError::InvalidSignature("no v1 signature".into()));
    }

    for candidate in &candidates {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| BillingError::InvalidSignature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }

    Err(BillingError::InvalidSignature("signature mismatch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let sig = sign("whsec_test", 1_700_000_000, payload);
        let header = format!("t=1700000000,v1={}", sig);

        verify_webhook_signature("whsec_test", payload, &header, 300, 1_700_000_100).unwrap();
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let sig = sign("whsec_test", 1_700_000_000, b"original");
        let header = format!("t=1700000000,v1={}", sig);

        let err = verify_webhook_signature("whsec_test", b"tampered", &header, 300, 1_700_000_100)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidSignature(_)));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = b"{}";
        let sig = sign("whsec_test", 1_700_000_000, payload);
        let header = format!("t=1700000000,v1={}", sig);

        let err = verify_webhook_signature("whsec_test", payload, &header, 300, 1_700_001_000)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidSignature(_)));
    }

    #[test]
    fn any_matching_v1_candidate_passes() {
        let payload = b"{}";
        let good = sign("whsec_test", 1_700_000_000, payload);
        let header = format!("t=1700000000,v1={},v1={}", "00".repeat(32), good);

        verify_webhook_signature("whsec_test", payload, &header, 300, 1_700_000_000).unwrap();
    }

    #[test]
    fn malformed_header_is_rejected() {
        let err =
            verify_webhook_signature("whsec_test", b"{}", "garbage", 300, 1_700_000_000).unwrap_err();
        assert!(matches!(err, BillingError::InvalidSignature(_)));
    }
}
