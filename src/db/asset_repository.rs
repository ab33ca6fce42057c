//! Persistence of [`Asset`] records.
//!
//! `AssetRepository` is the seam between the availability rules and the
//! storage technology. `SqliteAssetRepository` is the production backend;
//! each call maps to exactly one statement.

use super::converters::{ColumnEnum, ConversionError};
use crate::models::{
    asset::{Asset, AssetDraft, InvalidField},
    compat::AssetCompat,
    enums::{AssetType, AssetVendor, UpdateChannel},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("stored compat for asset {id} is not valid JSON: {source}")]
    Compat {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored asset {id} is invalid: {source}")]
    CorruptRow {
        id: Uuid,
        #[source]
        source: InvalidField,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage collaborator for assets. Every call is atomic on its own; nothing
/// spans more than one record.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert or overwrite the record with the asset's id, returning what was stored.
    async fn save(&self, asset: &Asset) -> StorageResult<Asset>;

    async fn delete(&self, asset: &Asset) -> StorageResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Asset>>;

    async fn find_all(&self) -> StorageResult<Vec<Asset>>;

    async fn find_all_by_vendor(&self, vendor: AssetVendor) -> StorageResult<Vec<Asset>>;

    /// Cheap round-trip used by readiness probes.
    async fn ping(&self) -> StorageResult<()>;
}

const ASSET_COLUMNS: &str = "id, file_name, vendor, version, download_uri, changelog, \
     sha256_hash, release_timestamp, upload_timestamp, asset_type, update_channel, \
     compat, suppressed";

/// Raw `assets` row as SQLite returns it.
#[derive(FromRow, Debug)]
struct AssetRow {
    id: Uuid,
    file_name: String,
    vendor: String,
    version: String,
    download_uri: String,
    changelog: String,
    sha256_hash: String,
    release_timestamp: DateTime<Utc>,
    upload_timestamp: DateTime<Utc>,
    asset_type: String,
    update_channel: String,
    compat: String,
    suppressed: bool,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StorageError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let compat: AssetCompat = serde_json::from_str(&row.compat)
            .map_err(|source| StorageError::Compat { id, source })?;
        let draft = AssetDraft {
            vendor: AssetVendor::from_column(&row.vendor)?,
            version: row.version,
            download_uri: row.download_uri,
            changelog: row.changelog,
            sha256_hash: row.sha256_hash,
            release_timestamp: row.release_timestamp,
            upload_timestamp: Some(row.upload_timestamp),
            asset_type: AssetType::from_column(&row.asset_type)?,
            update_channel: UpdateChannel::from_column(&row.update_channel)?,
            compat,
        };
        Asset::new(id, row.file_name, draft, row.suppressed)
            .map_err(|source| StorageError::CorruptRow { id, source })
    }
}

/// `AssetRepository` backed by the shared SQLite pool.
#[derive(Clone)]
pub struct SqliteAssetRepository {
    db: Arc<SqlitePool>,
}

impl SqliteAssetRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    fn decode_all(rows: Vec<AssetRow>) -> StorageResult<Vec<Asset>> {
        rows.into_iter().map(Asset::try_from).collect()
    }
}

#[async_trait]
impl AssetRepository for SqliteAssetRepository {
    async fn save(&self, asset: &Asset) -> StorageResult<Asset> {
        let compat = serde_json::to_string(asset.compat()).map_err(|source| {
            StorageError::Compat {
                id: asset.id(),
                source,
            }
        })?;

        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            INSERT INTO assets ({ASSET_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                file_name = excluded.file_name,
                vendor = excluded.vendor,
                version = excluded.version,
                download_uri = excluded.download_uri,
                changelog = excluded.changelog,
                sha256_hash = excluded.sha256_hash,
                release_timestamp = excluded.release_timestamp,
                upload_timestamp = excluded.upload_timestamp,
                asset_type = excluded.asset_type,
                update_channel = excluded.update_channel,
                compat = excluded.compat,
                suppressed = excluded.suppressed
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(asset.id())
        .bind(asset.file_name())
        .bind(asset.vendor().to_column()?)
        .bind(asset.version())
        .bind(asset.download_uri())
        .bind(asset.changelog())
        .bind(asset.sha256_hash())
        .bind(asset.release_timestamp())
        .bind(asset.upload_timestamp())
        .bind(asset.asset_type().to_column()?)
        .bind(asset.update_channel().to_column()?)
        .bind(compat)
        .bind(asset.is_suppressed())
        .fetch_one(&*self.db)
        .await?;

        debug!("saved asset {}", asset.id());
        Asset::try_from(row)
    }

    async fn delete(&self, asset: &Asset) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(asset.id())
            .execute(&*self.db)
            .await?;
        debug!(
            "deleted asset {} ({} row(s))",
            asset.id(),
            result.rows_affected()
        );
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Asset>> {
        sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .map(Asset::try_from)
        .transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets ORDER BY release_timestamp ASC, id ASC"
        ))
        .fetch_all(&*self.db)
        .await?;
        Self::decode_all(rows)
    }

    async fn find_all_by_vendor(&self, vendor: AssetVendor) -> StorageResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE vendor = ? \
             ORDER BY release_timestamp ASC, id ASC"
        ))
        .bind(vendor.to_column()?)
        .fetch_all(&*self.db)
        .await?;
        Self::decode_all(rows)
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}
