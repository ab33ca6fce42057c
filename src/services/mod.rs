//! Domain services and the collaborators they are built from.

pub mod asset_service;
pub mod clock;
pub mod notifier;
