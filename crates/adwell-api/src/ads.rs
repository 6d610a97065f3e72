use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use adwell_db::models::{AdRow, AdUpdate};
use adwell_types::api::{AdQuery, PublishAdRequest, UpdateAdRequest, ValidationErrors};
use adwell_types::models::{Ad, Role};

use crate::auth::AppState;
use crate::middleware::Claims;

const DEFAULT_COVER: &str = "/placeholder.svg?height=400&width=600";
const DEFAULT_LOGO: &str = "/placeholder.svg?height=80&width=80";

pub async fn publish_ad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PublishAdRequest>,
) -> Result<Response, StatusCode> {
    // Field-level validation happens before anything is written
    let mut errors = validate_publish(&req);

    if errors.is_empty() {
        let known = state
            .db
            .get_category(&req.category)
            .map_err(|e| {
                error!("category lookup failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .is_some();
        if !known {
            errors.insert("category".to_string(), "unknown category".to_string());
        }
    }

    if !errors.is_empty() {
        return Ok(
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ValidationErrors { ok: false, errors }))
                .into_response(),
        );
    }

    let row = AdRow {
        id: Uuid::new_v4().to_string(),
        company_name: req.company_name,
        description: req.description,
        category: req.category,
        country: req.country,
        city: req.city,
        image: req.image.unwrap_or_else(|| DEFAULT_COVER.to_string()),
        logo: Some(req.logo.unwrap_or_else(|| DEFAULT_LOGO.to_string())),
        phone: req.phone,
        whatsapp: req.whatsapp,
        website: req.website,
        email: req.email,
        owner_email: Some(claims.email),
        is_vip: false,
        vip_expires_at: None,
        created_at: Utc::now().to_rfc3339(),
    };

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let insert_row = row.clone();
    tokio::task::spawn_blocking(move || db.db.insert_ad(&insert_row))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("ad insert failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(ad_from_row(row))).into_response())
}

pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<AdQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.list_ads(
            query.category.as_deref(),
            query.country.as_deref(),
            query.city.as_deref(),
            query.q.as_deref(),
        )
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("ad listing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let ads: Vec<Ad> = rows.into_iter().map(ad_from_row).collect();
    Ok(Json(ads))
}

pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = state
        .db
        .get_ad(&id)
        .map_err(|e| {
            error!("ad lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ad_from_row(row)))
}

pub async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAdRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let update = AdUpdate {
        company_name: req.company_name,
        description: req.description,
        category: req.category,
        country: req.country,
        city: req.city,
        image: req.image,
        logo: req.logo,
        phone: req.phone,
        whatsapp: req.whatsapp,
        website: req.website,
        email: req.email,
    };

    let db = state.clone();
    let updated = tokio::task::spawn_blocking(move || -> Result<AdRow, StatusCode> {
        let ad = db
            .db
            .get_ad(&id)
            .map_err(|e| {
                error!("ad lookup failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

        if !can_manage(&claims, &ad) {
            return Err(StatusCode::FORBIDDEN);
        }

        if let Some(category) = &update.category {
            let known = db
                .db
                .get_category(category)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
                .is_some();
            if !known {
                return Err(StatusCode::UNPROCESSABLE_ENTITY);
            }
        }

        db.db
            .update_ad(&ad.id, &update)
            .map_err(|e| {
                error!("ad update failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(ad_from_row(updated)))
}

pub async fn delete_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || -> Result<(), StatusCode> {
        let ad = db
            .db
            .get_ad(&id)
            .map_err(|e| {
                error!("ad lookup failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

        if !can_manage(&claims, &ad) {
            return Err(StatusCode::FORBIDDEN);
        }

        db.db
            .delete_ad(&ad.id)
            .map_err(|e| {
                error!("ad delete failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        Ok(())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(StatusCode::NO_CONTENT)
}

/// Owners manage their own listings; admins manage everything. A listing
/// with no recorded owner is admin-managed only.
pub(crate) fn can_manage(claims: &Claims, ad: &AdRow) -> bool {
    claims.role == Role::Admin || ad.owner_email.as_deref() == Some(claims.email.as_str())
}

pub(crate) fn ad_from_row(row: AdRow) -> Ad {
    let created_at = parse_timestamp(&row.created_at).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on ad '{}'", row.created_at, row.id);
        DateTime::default()
    });

    Ad {
        id: row.id,
        company_name: row.company_name,
        description: row.description,
        category: row.category,
        country: row.country,
        city: row.city,
        image: row.image,
        logo: row.logo,
        phone: row.phone,
        whatsapp: row.whatsapp,
        website: row.website,
        email: row.email,
        owner_email: row.owner_email,
        is_vip: row.is_vip,
        vip_expires_at: row.vip_expires_at.as_deref().and_then(parse_timestamp),
        created_at,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>().ok().or_else(|| {
        // SQLite defaults store "YYYY-MM-DD HH:MM:SS" without timezone.
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|ndt| ndt.and_utc())
            .ok()
    })
}

fn validate_publish(req: &PublishAdRequest) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    require_field(&mut errors, "companyName", &req.company_name);
    require_field(&mut errors, "description", &req.description);
    require_field(&mut errors, "category", &req.category);
    require_field(&mut errors, "country", &req.country);
    require_field(&mut errors, "city", &req.city);
    require_field(&mut errors, "phone", &req.phone);
    errors
}

fn require_field(errors: &mut BTreeMap<String, String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "required".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> PublishAdRequest {
        PublishAdRequest {
            company_name: "Acme".to_string(),
            description: "Widgets".to_string(),
            category: "commerce".to_string(),
            country: "SA".to_string(),
            city: "Riyadh".to_string(),
            phone: "+966500000000".to_string(),
            image: None,
            logo: None,
            whatsapp: None,
            website: None,
            email: None,
        }
    }

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let mut req = full_request();
        req.company_name = String::new();
        req.phone = "   ".to_string();

        let errors = validate_publish(&req);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("companyName"));
        assert!(errors.contains_key("phone"));
    }

    #[test]
    fn complete_request_validates_clean() {
        assert!(validate_publish(&full_request()).is_empty());
    }
}
