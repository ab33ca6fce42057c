//! Defines routes for the OTA asset API.
//!
//! ## Structure
//! - **Public endpoints**
//!   - `GET    /assets`              — available assets (`?vendor=` narrows by vendor)
//!   - `GET    /assets/{id}`         — one available asset
//!
//! - **Admin endpoints**
//!   - `GET    /admin/assets`                  — whole catalogue
//!   - `POST   /admin/assets`                  — register asset
//!   - `GET    /admin/assets/unavailable`      — scheduled or suppressed assets
//!   - `DELETE /admin/assets/{id}`             — delete asset
//!   - `PUT    /admin/assets/{id}/release`     — reschedule release
//!   - `POST   /admin/assets/{id}/suppress`    — suppress
//!   - `POST   /admin/assets/{id}/unsuppress`  — lift suppression

use crate::{
    handlers::{
        asset_handlers::{
            create_asset, delete_asset, get_asset, list_all_assets, list_assets,
            list_unavailable_assets, reschedule_asset, suppress_asset, unsuppress_asset,
        },
        health_handlers::{healthz, readyz},
    },
    services::asset_service::AssetService,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Build and return the router for the asset API.
///
/// The router carries shared state (`AssetService`) to all handlers.
pub fn routes() -> Router<AssetService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Public routes
        .route("/assets", get(list_assets))
        .route("/assets/{id}", get(get_asset))
        // Admin routes
        .route("/admin/assets", get(list_all_assets).post(create_asset))
        .route("/admin/assets/unavailable", get(list_unavailable_assets))
        .route("/admin/assets/{id}", delete(delete_asset))
        .route("/admin/assets/{id}/release", put(reschedule_asset))
        .route("/admin/assets/{id}/suppress", post(suppress_asset))
        .route("/admin/assets/{id}/unsuppress", post(unsuppress_asset))
}
