use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use adwell_db::models::CategoryRow;
use adwell_types::api::{CreateCategoryRequest, UpdateCategoryColorRequest, ValidationErrors};
use adwell_types::models::Category;

use crate::auth::AppState;

const DEFAULT_IMAGE: &str = "/placeholder.svg?height=400&width=600";
const DEFAULT_COLOR: &str = "#1e88e5";

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let rows = state.db.list_categories().map_err(|e| {
        error!("category listing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let categories: Vec<Category> = rows.into_iter().map(category_from_row).collect();
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Response, StatusCode> {
    let mut errors = BTreeMap::new();
    for (field, value) in [
        ("slug", &req.slug),
        ("nameAr", &req.name_ar),
        ("nameEn", &req.name_en),
    ] {
        if value.trim().is_empty() {
            errors.insert(field.to_string(), "required".to_string());
        }
    }
    if !errors.is_empty() {
        return Ok(
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ValidationErrors { ok: false, errors }))
                .into_response(),
        );
    }

    let row = state
        .db
        .upsert_category(
            &req.slug,
            &req.name_ar,
            &req.name_en,
            req.image.as_deref().unwrap_or(DEFAULT_IMAGE),
            req.color.as_deref().unwrap_or(DEFAULT_COLOR),
        )
        .map_err(|e| {
            error!("category create failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(category_from_row(row))).into_response())
}

pub async fn update_category_color(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<UpdateCategoryColorRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = state
        .db
        .update_category_color(&slug, &req.color)
        .map_err(|e| {
            error!("category color update failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(category_from_row(row)))
}

fn category_from_row(row: CategoryRow) -> Category {
    Category {
        slug: row.slug,
        name_ar: row.name_ar,
        name_en: row.name_en,
        image: row.image,
        color: row.color,
    }
}
