//! HTTP handlers for asset queries and administration.
//! Every response body is an `AssetView`; gating state never leaves the
//! service. Domain work is delegated to `AssetService`.

use crate::{
    errors::AppError,
    models::{
        asset::{Asset, AssetDraft},
        enums::AssetVendor,
        view::AssetView,
    },
    services::asset_service::AssetService,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Query params accepted by `GET /assets`.
#[derive(Debug, Deserialize)]
pub struct ListAssetsQuery {
    pub vendor: Option<AssetVendor>,
}

/// Body of `PUT /admin/assets/{id}/release`.
#[derive(Debug, Deserialize)]
pub struct RescheduleReq {
    pub release_timestamp: DateTime<Utc>,
}

fn views(assets: Vec<Asset>) -> Json<Vec<AssetView>> {
    Json(assets.into_iter().map(AssetView::from).collect())
}

/// GET `/assets` — available assets, optionally narrowed by `?vendor=`.
pub async fn list_assets(
    State(service): State<AssetService>,
    query: Result<Query<ListAssetsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query?;
    let assets = match q.vendor {
        Some(vendor) => service.find_all_by_vendor(vendor).await?,
        None => service.find_all_available().await?,
    };
    Ok(views(assets))
}

/// GET `/assets/{id}` — 404 unless the asset exists and is available.
pub async fn get_asset(
    State(service): State<AssetService>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let asset = service
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("asset `{}` not found", id)))?;
    Ok(Json(AssetView::from(asset)))
}

/// GET `/admin/assets` — the whole catalogue.
pub async fn list_all_assets(
    State(service): State<AssetService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(views(service.find_all().await?))
}

/// GET `/admin/assets/unavailable` — scheduled or suppressed assets.
pub async fn list_unavailable_assets(
    State(service): State<AssetService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(views(service.find_all_unavailable().await?))
}

/// POST `/admin/assets` — register an asset.
pub async fn create_asset(
    State(service): State<AssetService>,
    body: Result<Json<AssetDraft>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(draft) = body?;
    let asset = service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(AssetView::from(asset))))
}

/// DELETE `/admin/assets/{id}` — remove an asset whatever its state.
pub async fn delete_asset(
    State(service): State<AssetService>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let asset = service.load(id).await?;
    service.delete(&asset).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/admin/assets/{id}/release` — move the release instant.
pub async fn reschedule_asset(
    State(service): State<AssetService>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RescheduleReq>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let asset = service.reschedule(id, req.release_timestamp).await?;
    Ok(Json(AssetView::from(asset)))
}

/// POST `/admin/assets/{id}/suppress`
pub async fn suppress_asset(
    State(service): State<AssetService>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    Ok(Json(AssetView::from(service.suppress(id).await?)))
}

/// POST `/admin/assets/{id}/unsuppress`
pub async fn unsuppress_asset(
    State(service): State<AssetService>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    Ok(Json(AssetView::from(service.unsuppress(id).await?)))
}
