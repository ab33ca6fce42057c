//! Enum ↔ column text mapping.
//!
//! Every enum stored in the `assets` table owns an explicit table of
//! `(variant, text)` pairs. Encoding and decoding both go through that table so
//! the two directions cannot drift apart, and [`check_table`] lets startup
//! reject a table with duplicated entries before any row is touched.

use crate::models::enums::{AssetType, AssetVendor, UpdateChannel};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("column `{column}` holds unrecognized value `{value}`")]
    UnknownValue { column: &'static str, value: String },
    #[error("column `{column}` has no stored text for variant {variant}")]
    UnmappedVariant { column: &'static str, variant: String },
    #[error("column `{column}` maps `{entry}` more than once")]
    DuplicateEntry { column: &'static str, entry: String },
}

/// An enum persisted as a text column.
pub trait ColumnEnum: Copy + Eq + Debug + 'static {
    /// Name of the column the enum lives in.
    const COLUMN: &'static str;

    /// Variant ↔ stored text pairs.
    const TABLE: &'static [(Self, &'static str)];

    fn to_column(self) -> Result<&'static str, ConversionError> {
        Self::TABLE
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|(_, text)| *text)
            .ok_or_else(|| ConversionError::UnmappedVariant {
                column: Self::COLUMN,
                variant: format!("{:?}", self),
            })
    }

    fn from_column(value: &str) -> Result<Self, ConversionError> {
        Self::TABLE
            .iter()
            .find(|(_, text)| *text == value)
            .map(|(variant, _)| *variant)
            .ok_or_else(|| ConversionError::UnknownValue {
                column: Self::COLUMN,
                value: value.to_string(),
            })
    }
}

/// Verify that no variant and no stored text appears twice in `T::TABLE`.
pub fn check_table<T: ColumnEnum>() -> Result<(), ConversionError> {
    for (i, (variant, text)) in T::TABLE.iter().enumerate() {
        for (other_variant, other_text) in &T::TABLE[i + 1..] {
            if variant == other_variant {
                return Err(ConversionError::DuplicateEntry {
                    column: T::COLUMN,
                    entry: format!("{:?}", variant),
                });
            }
            if text == other_text {
                return Err(ConversionError::DuplicateEntry {
                    column: T::COLUMN,
                    entry: text.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Check every mapping table the `assets` table depends on.
pub fn check_all_tables() -> Result<(), ConversionError> {
    check_table::<AssetVendor>()?;
    check_table::<AssetType>()?;
    check_table::<UpdateChannel>()?;
    Ok(())
}

impl ColumnEnum for AssetVendor {
    const COLUMN: &'static str = "vendor";
    const TABLE: &'static [(Self, &'static str)] = &[
        (AssetVendor::Planet, "PLANET"),
        (AssetVendor::Mediatek, "MEDIATEK"),
        (AssetVendor::Google, "GOOGLE"),
    ];
}

impl ColumnEnum for AssetType {
    const COLUMN: &'static str = "asset_type";
    const TABLE: &'static [(Self, &'static str)] = &[
        (AssetType::Firmware, "FIRMWARE"),
        (AssetType::Modem, "MODEM"),
        (AssetType::Bootloader, "BOOTLOADER"),
        (AssetType::Recovery, "RECOVERY"),
    ];
}

impl ColumnEnum for UpdateChannel {
    const COLUMN: &'static str = "update_channel";
    const TABLE: &'static [(Self, &'static str)] = &[
        (UpdateChannel::Stable, "STABLE"),
        (UpdateChannel::Beta, "BETA"),
        (UpdateChannel::Nightly, "NIGHTLY"),
    ];
}
