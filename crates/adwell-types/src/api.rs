use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Coupon, Plan, Role};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
}

// -- Ads --

/// Publish form. Required fields arrive as plain strings so that a missing
/// key and an empty value fail validation the same way, with a field-level
/// message rather than a body-level deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishAdRequest {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
    pub image: Option<String>,
    pub logo: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAdRequest {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub image: Option<String>,
    pub logo: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdQuery {
    pub category: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
}

/// Field-level validation failures, reported before any state mutation.
#[derive(Debug, Serialize)]
pub struct ValidationErrors {
    pub ok: bool,
    pub errors: BTreeMap<String, String>,
}

// -- Pricing / checkout --

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    #[serde(default)]
    pub plan: Plan,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub ok: bool,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan: Plan,
    pub coupon_code: Option<String>,
    pub ad_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckoutResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        CheckoutResponse {
            ok: false,
            url: None,
            amount: None,
            simulated: None,
            error: Some(error.into()),
        }
    }
}

// -- Admin: coupons --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCouponRequest {
    pub code: String,
    pub percent: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetCouponActiveRequest {
    pub active: bool,
}

// -- Admin: categories --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    pub image: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryColorRequest {
    pub color: String,
}

// -- Admin: users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}
