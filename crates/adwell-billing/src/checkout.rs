use std::sync::Arc;

use adwell_db::Database;
use adwell_db::models::AdRow;
use adwell_types::models::Plan;
use anyhow::anyhow;
use tracing::{info, warn};

use crate::stripe::{SessionParams, StripeClient, StripeConfig};
use crate::{BillingError, pricing, vip};

/// Decides how a checkout is fulfilled: with provider credentials a hosted
/// session is created and activation waits for the webhook; without them
/// the payment is simulated and state is mutated immediately.
#[derive(Clone)]
pub struct CheckoutService {
    config: StripeConfig,
    client: Option<StripeClient>,
    site_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub plan: Plan,
    pub coupon_code: Option<String>,
    pub ad_id: Option<String>,
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Payment simulated; VIP state already mutated where applicable.
    Simulated { url: String, amount_cents: i64 },
    /// Hosted session created; state mutation deferred to confirmation.
    SessionCreated { url: String },
}

impl CheckoutService {
    pub fn new(config: StripeConfig, site_url: String) -> anyhow::Result<Self> {
        let client = match &config.secret_key {
            Some(secret) if config.is_configured() => Some(StripeClient::new(secret.clone())?),
            _ => None,
        };
        Ok(Self {
            config,
            client,
            site_url: site_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.config.webhook_secret.as_deref()
    }

    pub async fn checkout(
        &self,
        db: &Arc<Database>,
        input: CheckoutInput,
    ) -> Result<CheckoutOutcome, BillingError> {
        let quote = {
            let db = db.clone();
            let plan = input.plan;
            let code = input.coupon_code.clone();
            tokio::task::spawn_blocking(move || pricing::quote(&db, plan, code.as_deref()))
                .await
                .map_err(|e| BillingError::Internal(anyhow!("join error: {}", e)))??
        };

        let (success_url, cancel_url) = self.redirect_urls(input.ad_id.as_deref());

        if !self.is_live() {
            // No provider keys: simulate success. With no listing attached
            // this degrades to a home redirect and mutates nothing.
            if let Some(ad_id) = input.ad_id.clone() {
                let db = db.clone();
                let make_vip = input.plan == Plan::Vip;
                tokio::task::spawn_blocking(move || vip::set_vip(&db, &ad_id, make_vip))
                    .await
                    .map_err(|e| BillingError::Internal(anyhow!("join error: {}", e)))??;
            }
            info!(
                plan = input.plan.as_str(),
                amount_cents = quote.amount_cents,
                "simulated checkout"
            );
            return Ok(CheckoutOutcome::Simulated {
                url: success_url,
                amount_cents: quote.amount_cents,
            });
        }

        let Some(client) = self.client.as_ref() else {
            return Err(BillingError::Provider(
                "payment provider not configured".into(),
            ));
        };

        let params = SessionParams {
            product_name: input.plan.product_name().to_string(),
            unit_amount_cents: quote.amount_cents,
            success_url,
            cancel_url,
            ad_id: input.ad_id.clone(),
            plan: input.plan.as_str().to_string(),
        };

        let session = client.create_subscription_session(&params).await?;
        let url = session
            .url
            .ok_or_else(|| BillingError::Provider("session has no redirect url".into()))?;
        info!(session = %session.id, "checkout session created");

        Ok(CheckoutOutcome::SessionCreated { url })
    }

    fn redirect_urls(&self, ad_id: Option<&str>) -> (String, String) {
        match ad_id {
            Some(id) => (
                format!("{}/ad/{}/manage?checkout=success", self.site_url, id),
                format!("{}/ad/{}/manage?checkout=cancel", self.site_url, id),
            ),
            None => (
                format!("{}/?checkout=success", self.site_url),
                format!("{}/?checkout=cancel", self.site_url),
            ),
        }
    }
}

/// Apply a confirmed `checkout.session.completed` event. Sessions without a
/// listing in their metadata, or whose listing has since been deleted, are
/// acknowledged without mutation — redelivery cannot make them succeed.
pub fn apply_session_completed(
    db: &Database,
    session: &serde_json::Value,
) -> Result<Option<AdRow>, BillingError> {
    let metadata = &session["metadata"];
    let Some(ad_id) = metadata["ad_id"].as_str() else {
        info!("completed session carries no listing metadata");
        return Ok(None);
    };
    let plan = metadata["plan"].as_str().unwrap_or("vip");

    match vip::set_vip(db, ad_id, plan == "vip") {
        Ok(ad) => {
            info!(ad_id, plan, "payment confirmed, VIP state applied");
            Ok(Some(ad))
        }
        Err(BillingError::AdNotFound(_)) => {
            warn!(ad_id, "confirmed payment references a deleted listing");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> CheckoutService {
        CheckoutService::new(StripeConfig::default(), "http://localhost:3000/".to_string())
            .unwrap()
    }

    fn seed_ad(db: &Database, id: &str) {
        db.insert_ad(&AdRow {
            id: id.to_string(),
            company_name: "Acme".to_string(),
            description: "A test listing".to_string(),
            category: "commerce".to_string(),
            country: "SA".to_string(),
            city: "Riyadh".to_string(),
            image: "/placeholder.svg?height=400&width=600".to_string(),
            logo: None,
            phone: "+966500000000".to_string(),
            whatsapp: None,
            website: None,
            email: None,
            owner_email: Some("owner@example.com".to_string()),
            is_vip: false,
            vip_expires_at: None,
            created_at: Utc::now().to_rfc3339(),
        })
        .unwrap();
    }

    #[tokio::test]
    async fn simulated_checkout_activates_vip() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        seed_ad(&db, "A1");

        let outcome = service()
            .checkout(
                &db,
                CheckoutInput {
                    plan: Plan::Vip,
                    coupon_code: None,
                    ad_id: Some("A1".to_string()),
                },
            )
            .await
            .unwrap();

        match outcome {
            CheckoutOutcome::Simulated { url, amount_cents } => {
                assert_eq!(url, "http://localhost:3000/ad/A1/manage?checkout=success");
                assert_eq!(amount_cents, pricing::VIP_MONTHLY_CENTS);
            }
            other => panic!("expected simulated outcome, got {:?}", other),
        }
        assert!(db.get_ad("A1").unwrap().unwrap().is_vip);
    }

    #[tokio::test]
    async fn standard_plan_checkout_clears_vip() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        seed_ad(&db, "A1");
        db.set_ad_vip("A1", true, None).unwrap();

        service()
            .checkout(
                &db,
                CheckoutInput {
                    plan: Plan::Standard,
                    coupon_code: None,
                    ad_id: Some("A1".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(!db.get_ad("A1").unwrap().unwrap().is_vip);
    }

    #[tokio::test]
    async fn missing_listing_id_redirects_home_and_mutates_nothing() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        seed_ad(&db, "A1");

        let outcome = service()
            .checkout(
                &db,
                CheckoutInput {
                    plan: Plan::Vip,
                    coupon_code: None,
                    ad_id: None,
                },
            )
            .await
            .unwrap();

        match outcome {
            CheckoutOutcome::Simulated { url, .. } => {
                assert_eq!(url, "http://localhost:3000/?checkout=success");
            }
            other => panic!("expected simulated outcome, got {:?}", other),
        }
        assert!(!db.get_ad("A1").unwrap().unwrap().is_vip);
    }

    #[tokio::test]
    async fn unknown_listing_fails_checkout() {
        let db = Arc::new(Database::open_in_memory().unwrap());

        let err = service()
            .checkout(
                &db,
                CheckoutInput {
                    plan: Plan::Vip,
                    coupon_code: None,
                    ad_id: Some("missing".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::AdNotFound(_)));
    }

    #[tokio::test]
    async fn coupon_discounts_the_simulated_amount() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        seed_ad(&db, "A1");
        db.upsert_coupon("SAVE50", 50).unwrap();

        let outcome = service()
            .checkout(
                &db,
                CheckoutInput {
                    plan: Plan::Vip,
                    coupon_code: Some("SAVE50".to_string()),
                    ad_id: Some("A1".to_string()),
                },
            )
            .await
            .unwrap();

        match outcome {
            CheckoutOutcome::Simulated { amount_cents, .. } => assert_eq!(amount_cents, 1499),
            other => panic!("expected simulated outcome, got {:?}", other),
        }
    }

    #[test]
    fn session_completed_without_listing_is_acknowledged() {
        let db = Database::open_in_memory().unwrap();
        let session = serde_json::json!({ "id": "cs_test_1", "metadata": {} });
        assert!(apply_session_completed(&db, &session).unwrap().is_none());
    }

    #[test]
    fn session_completed_activates_the_listing() {
        let db = Database::open_in_memory().unwrap();
        seed_ad(&db, "A1");
        let session = serde_json::json!({
            "id": "cs_test_1",
            "metadata": { "ad_id": "A1", "plan": "vip" }
        });

        let ad = apply_session_completed(&db, &session).unwrap().unwrap();
        assert!(ad.is_vip);
    }

    #[test]
    fn session_completed_for_deleted_listing_is_acknowledged() {
        let db = Database::open_in_memory().unwrap();
        let session = serde_json::json!({
            "id": "cs_test_1",
            "metadata": { "ad_id": "gone", "plan": "vip" }
        });
        assert!(apply_session_completed(&db, &session).unwrap().is_none());
    }
}
