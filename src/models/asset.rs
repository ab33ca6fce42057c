//! Represents a single downloadable firmware release.

use super::{
    compat::AssetCompat,
    enums::{AssetType, AssetVendor, UpdateChannel},
};
use axum::http::Uri;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

const SHA256_HEX_LEN: usize = 64;

/// A field that failed validation while building an [`Asset`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct InvalidField {
    pub field: &'static str,
    pub reason: &'static str,
}

impl InvalidField {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Everything a caller supplies when registering a new asset.
///
/// The identifier and file name are never taken from the caller: the id is
/// generated and the file name is derived from `download_uri`.
#[derive(Deserialize, Clone, Debug)]
pub struct AssetDraft {
    pub vendor: AssetVendor,
    pub version: String,
    pub download_uri: String,
    pub changelog: String,
    pub sha256_hash: String,
    pub release_timestamp: DateTime<Utc>,
    /// Stamped with the service clock when omitted.
    #[serde(default)]
    pub upload_timestamp: Option<DateTime<Utc>>,
    pub asset_type: AssetType,
    pub update_channel: UpdateChannel,
    pub compat: AssetCompat,
}

/// A firmware release artifact as stored by the backend.
///
/// Fields are read-only once built. The only legitimate changes after creation
/// are rescheduling the release instant and toggling suppression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    id: Uuid,
    file_name: String,
    vendor: AssetVendor,
    version: String,
    download_uri: String,
    changelog: String,
    sha256_hash: String,
    release_timestamp: DateTime<Utc>,
    upload_timestamp: DateTime<Utc>,
    asset_type: AssetType,
    update_channel: UpdateChannel,
    compat: AssetCompat,
    suppressed: bool,
}

impl Asset {
    /// Build a validated asset.
    ///
    /// `upload_timestamp` must already be resolved; a draft still carrying
    /// `None` is rejected.
    pub fn new(
        id: Uuid,
        file_name: String,
        draft: AssetDraft,
        suppressed: bool,
    ) -> Result<Self, InvalidField> {
        ensure_not_blank("file_name", &file_name)?;
        ensure_not_blank("version", &draft.version)?;
        ensure_not_blank("changelog", &draft.changelog)?;
        parse_download_uri(&draft.download_uri)?;
        let download_uri = draft.download_uri.trim().to_string();
        let sha256_hash = normalize_sha256(&draft.sha256_hash)?;
        let upload_timestamp = draft
            .upload_timestamp
            .ok_or_else(|| InvalidField::new("upload_timestamp", "is required"))?;

        Ok(Self {
            id,
            file_name,
            vendor: draft.vendor,
            version: draft.version,
            download_uri,
            changelog: draft.changelog,
            sha256_hash,
            release_timestamp: draft.release_timestamp,
            upload_timestamp,
            asset_type: draft.asset_type,
            update_channel: draft.update_channel,
            compat: draft.compat,
            suppressed,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn vendor(&self) -> AssetVendor {
        self.vendor
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn download_uri(&self) -> &str {
        &self.download_uri
    }

    /// Newline-delimited list of changes.
    pub fn changelog(&self) -> &str {
        &self.changelog
    }

    pub fn sha256_hash(&self) -> &str {
        &self.sha256_hash
    }

    pub fn release_timestamp(&self) -> DateTime<Utc> {
        self.release_timestamp
    }

    pub fn upload_timestamp(&self) -> DateTime<Utc> {
        self.upload_timestamp
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn update_channel(&self) -> UpdateChannel {
        self.update_channel
    }

    pub fn compat(&self) -> &AssetCompat {
        &self.compat
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Move the instant the asset is released at.
    pub fn reschedule(&mut self, release_timestamp: DateTime<Utc>) {
        self.release_timestamp = release_timestamp;
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    /// Whether OTA clients may see this asset at `now`.
    ///
    /// An asset is available once its release instant has been reached and
    /// for as long as it is not suppressed.
    pub fn is_available_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        !self.suppressed && self.release_timestamp <= now.with_timezone(&Utc)
    }

    pub fn is_not_available_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        !self.is_available_at(now)
    }
}

/// Derive the stored file name from a download URI: the last segment of its
/// path, ignoring any query string.
pub fn file_name_from_uri(download_uri: &str) -> Result<String, InvalidField> {
    let uri = parse_download_uri(download_uri)?;
    let name = uri.path().rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        return Err(InvalidField::new(
            "download_uri",
            "path does not end in a file name",
        ));
    }
    Ok(name.to_string())
}

fn parse_download_uri(raw: &str) -> Result<Uri, InvalidField> {
    let uri: Uri = raw
        .trim()
        .parse()
        .map_err(|_| InvalidField::new("download_uri", "is not a valid URI"))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(InvalidField::new(
            "download_uri",
            "must be absolute with a scheme and host",
        ));
    }
    Ok(uri)
}

fn ensure_not_blank(field: &'static str, value: &str) -> Result<(), InvalidField> {
    if value.trim().is_empty() {
        return Err(InvalidField::new(field, "must not be blank"));
    }
    Ok(())
}

fn normalize_sha256(raw: &str) -> Result<String, InvalidField> {
    let hash = raw.trim();
    if hash.len() != SHA256_HEX_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidField::new(
            "sha256_hash",
            "must be 64 hexadecimal characters",
        ));
    }
    Ok(hash.to_ascii_lowercase())
}
