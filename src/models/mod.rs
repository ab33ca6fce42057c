//! Core data models for the OTA asset backend.
//!
//! `Asset` is the full persisted record; `AssetView` is the only shape that
//! ever leaves the service over HTTP.

pub mod asset;
pub mod compat;
pub mod enums;
pub mod view;
