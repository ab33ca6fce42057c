//! Public projection of an asset.

use super::{
    asset::Asset,
    compat::AssetCompat,
    enums::{AssetType, AssetVendor, UpdateChannel},
};
use serde::Serialize;
use uuid::Uuid;

/// The shape of an asset as OTA clients and API callers see it.
///
/// Release scheduling, upload time and suppression are internal gating state
/// and are not part of it. The changelog is split into one entry per line.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AssetView {
    pub id: Uuid,
    pub file_name: String,
    pub vendor: AssetVendor,
    pub version: String,
    pub download_uri: String,
    pub changelog: Vec<String>,
    pub sha256_hash: String,
    pub asset_type: AssetType,
    pub update_channel: UpdateChannel,
    pub compat: AssetCompat,
}

impl From<&Asset> for AssetView {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id(),
            file_name: asset.file_name().to_string(),
            vendor: asset.vendor(),
            version: asset.version().to_string(),
            download_uri: asset.download_uri().to_string(),
            changelog: changelog_lines(asset.changelog()),
            sha256_hash: asset.sha256_hash().to_string(),
            asset_type: asset.asset_type(),
            update_channel: asset.update_channel(),
            compat: asset.compat().clone(),
        }
    }
}

impl From<Asset> for AssetView {
    fn from(asset: Asset) -> Self {
        Self::from(&asset)
    }
}

fn changelog_lines(changelog: &str) -> Vec<String> {
    changelog
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
