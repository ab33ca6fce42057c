//! Device compatibility attached to an asset.

use serde::{Deserialize, Serialize};

/// Which devices an asset may be installed on.
///
/// The availability rules never look inside this record; it is persisted as a
/// JSON column and handed back to clients unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetCompat {
    /// Device model identifiers (e.g. "gemini-pda", "cosmo-communicator").
    #[serde(default)]
    pub device_models: Vec<String>,

    /// Lowest installed base version the asset can be applied on top of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_base_version: Option<String>,
}
