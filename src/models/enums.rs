//! Closed value sets carried by every asset.
//!
//! The JSON spelling of each variant matches the text stored in the database
//! (see `db::converters`).

use serde::{Deserialize, Serialize};

/// Vendor that produced the firmware image.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetVendor {
    Planet,
    Mediatek,
    Google,
}

/// Kind of artifact an OTA client is being offered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Firmware,
    Modem,
    Bootloader,
    Recovery,
}

/// Release track an asset is published on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateChannel {
    Stable,
    Beta,
    Nightly,
}
