use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Visitor,
    Advertiser,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::Advertiser => "advertiser",
            Role::Admin => "admin",
        }
    }

    /// Total mapping from the stored role column. Unknown values fall back
    /// to the least-privileged authenticated role.
    pub fn from_db(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            "visitor" => Role::Visitor,
            _ => Role::Advertiser,
        }
    }
}

/// Paid placement tiers. `vip` is the default everywhere a plan can be
/// omitted, matching the public API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Vip,
    Standard,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Vip => "vip",
            Plan::Standard => "standard",
        }
    }

    /// Line-item product name shown on the hosted checkout page.
    pub fn product_name(self) -> &'static str {
        match self {
            Plan::Vip => "AdWell VIP",
            Plan::Standard => "AdWell Standard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub slug: String,
    pub name_ar: String,
    pub name_en: String,
    pub image: String,
    pub color: String,
}

/// A company listing on the directory wall. `is_vip` and `vip_expires_at`
/// are owned by the billing subsystem; everything else is edited by the
/// listing's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: String,
    pub company_name: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub city: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub is_vip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub percent: u8,
    pub active: bool,
}
