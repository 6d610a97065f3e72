use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, warn};

use adwell_billing::checkout::{self, CheckoutInput, CheckoutOutcome};
use adwell_billing::stripe::{self, WebhookEvent};
use adwell_billing::{BillingError, pricing};
use adwell_types::api::{CheckoutRequest, CheckoutResponse, PriceQuery, PriceResponse};

use crate::ads::can_manage;
use crate::auth::AppState;
use crate::middleware::Claims;

/// GET /api/price — preview the charge for a plan and optional coupon code.
pub async fn price_quote(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let quote = tokio::task::spawn_blocking(move || {
        pricing::quote(&db.db, query.plan, query.code.as_deref())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("price quote failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(PriceResponse {
        ok: true,
        amount: pricing::dollars(quote.amount_cents),
        coupon: quote.coupon,
    }))
}

/// POST /api/stripe/checkout — simulated or hosted-session checkout.
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CheckoutRequest>,
) -> Response {
    // When a listing is attached, only its owner (or an admin) may pay for it
    if let Some(ad_id) = req.ad_id.clone() {
        let db = state.clone();
        let lookup = tokio::task::spawn_blocking(move || db.db.get_ad(&ad_id)).await;
        let ad = match lookup {
            Ok(Ok(Some(ad))) => ad,
            Ok(Ok(None)) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(CheckoutResponse::failure("ad not found")),
                )
                    .into_response();
            }
            Ok(Err(e)) => {
                error!("checkout ad lookup failed: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(CheckoutResponse::failure("internal error")),
                )
                    .into_response();
            }
            Err(e) => {
                error!("spawn_blocking join error: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(CheckoutResponse::failure("internal error")),
                )
                    .into_response();
            }
        };

        if !can_manage(&claims, &ad) {
            return (
                StatusCode::FORBIDDEN,
                Json(CheckoutResponse::failure("not the listing owner")),
            )
                .into_response();
        }
    }

    let input = CheckoutInput {
        plan: req.plan,
        coupon_code: req.coupon_code,
        ad_id: req.ad_id,
    };

    match state.checkout.checkout(&state.db, input).await {
        Ok(CheckoutOutcome::Simulated { url, amount_cents }) => Json(CheckoutResponse {
            ok: true,
            url: Some(url),
            amount: Some(pricing::dollars(amount_cents)),
            simulated: Some(true),
            error: None,
        })
        .into_response(),
        Ok(CheckoutOutcome::SessionCreated { url }) => Json(CheckoutResponse {
            ok: true,
            url: Some(url),
            amount: None,
            simulated: None,
            error: None,
        })
        .into_response(),
        Err(BillingError::AdNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(CheckoutResponse::failure("ad not found")),
        )
            .into_response(),
        Err(e) => {
            error!("checkout failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CheckoutResponse::failure(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/stripe/webhook — signature-verified payment confirmation.
/// This is the only path that activates VIP after a real payment.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state.checkout.webhook_secret() else {
        warn!("webhook received but no webhook secret is configured");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let Some(signature) = headers.get("stripe-signature").and_then(|v| v.to_str().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if let Err(e) = stripe::verify_webhook_signature(
        secret,
        &body,
        signature,
        stripe::SIGNATURE_TOLERANCE_SECS,
        Utc::now().timestamp(),
    ) {
        warn!("webhook signature rejected: {}", e);
        return StatusCode::BAD_REQUEST.into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("unparseable webhook event: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if event.kind == "checkout.session.completed" {
        let db = state.clone();
        let applied = tokio::task::spawn_blocking(move || {
            checkout::apply_session_completed(&db.db, &event.data.object)
        })
        .await;

        match applied {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("failed to apply confirmed payment: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            Err(e) => {
                error!("spawn_blocking join error: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    Json(serde_json::json!({ "ok": true })).into_response()
}
