//! Hook fired when an asset becomes visible to OTA clients.

use crate::models::asset::Asset;
use tracing::info;

/// Receives assets that just transitioned into availability.
///
/// Called inline, on the same call stack as the mutation, at most once per
/// service call.
pub trait AssetNotifier: Send + Sync {
    fn asset_available(&self, asset: &Asset);
}

/// Records the transition in the log. Device fan-out is owned by the external
/// notification system.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotifier;

impl AssetNotifier for LoggingNotifier {
    fn asset_available(&self, asset: &Asset) {
        info!(
            asset_id = %asset.id(),
            vendor = ?asset.vendor(),
            version = asset.version(),
            channel = ?asset.update_channel(),
            "asset updated and now available, begin fan-out notify"
        );
    }
}
