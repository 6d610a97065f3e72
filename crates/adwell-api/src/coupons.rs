use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use adwell_db::models::CouponRow;
use adwell_types::api::{CreateCouponRequest, SetCouponActiveRequest};
use adwell_types::models::Coupon;

use crate::auth::AppState;

pub async fn create_coupon(
    State(state): State<AppState>,
    Json(req): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = state.db.upsert_coupon(code, req.percent).map_err(|e| {
        error!("coupon create failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(coupon_from_row(row))))
}

pub async fn list_coupons(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let rows = state.db.list_coupons().map_err(|e| {
        error!("coupon listing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let coupons: Vec<Coupon> = rows.into_iter().map(coupon_from_row).collect();
    Ok(Json(coupons))
}

pub async fn set_coupon_active(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SetCouponActiveRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = state
        .db
        .set_coupon_active(&code, req.active)
        .map_err(|e| {
            error!("coupon toggle failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(coupon_from_row(row)))
}

pub(crate) fn coupon_from_row(row: CouponRow) -> Coupon {
    Coupon {
        code: row.code,
        percent: row.percent.clamp(0, 100) as u8,
        active: row.active,
    }
}
