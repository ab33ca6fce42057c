//! src/services/asset_service.rs
//!
//! AssetService — create, query and gate firmware assets. Every read path goes
//! through the availability predicate here rather than in SQL, so the rule is
//! one function regardless of the storage backend. Catalogues are small (tens
//! to hundreds of rows), so filtering after a full load is fine.

use super::{clock::Clock, notifier::AssetNotifier};
use crate::{
    db::asset_repository::{AssetRepository, StorageError},
    models::{
        asset::{Asset, AssetDraft, InvalidField, file_name_from_uri},
        enums::AssetVendor,
    },
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset `{0}` not found")]
    NotFound(Uuid),
    #[error("malformed input: {0}")]
    MalformedInput(#[from] InvalidField),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// AssetService applies the availability rule to every read and fires the
/// notification hook on mutations that make an asset available.
///
/// Each operation is one load and at most one save; there is no locking, so
/// concurrent writers to the same record resolve as last-write-wins.
#[derive(Clone)]
pub struct AssetService {
    repository: Arc<dyn AssetRepository>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn AssetNotifier>,
}

impl AssetService {
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn AssetNotifier>,
    ) -> Self {
        Self {
            repository,
            clock,
            notifier,
        }
    }

    /// Storage backend, exposed for readiness checks.
    pub fn repository(&self) -> &Arc<dyn AssetRepository> {
        &self.repository
    }

    /// Availability of `asset` at the service clock's current instant.
    pub fn is_available(&self, asset: &Asset) -> bool {
        asset.is_available_at(&self.clock.now())
    }

    /// Register a new asset.
    ///
    /// The file name is taken from the last path segment of the download URI
    /// and a fresh id is assigned. Nothing is persisted if validation fails.
    pub async fn create(&self, mut draft: AssetDraft) -> AssetResult<Asset> {
        let file_name = file_name_from_uri(&draft.download_uri)?;
        if draft.upload_timestamp.is_none() {
            draft.upload_timestamp = Some(self.clock.now().with_timezone(&Utc));
        }
        let asset = Asset::new(Uuid::new_v4(), file_name, draft, false)?;

        let stored = self.repository.save(&asset).await?;
        info!(
            "created asset {} ({:?} {} -> {})",
            stored.id(),
            stored.vendor(),
            stored.version(),
            stored.file_name()
        );
        Ok(stored)
    }

    /// Remove an asset regardless of its availability.
    pub async fn delete(&self, asset: &Asset) -> AssetResult<()> {
        self.repository.delete(asset).await?;
        info!("deleted asset {}", asset.id());
        Ok(())
    }

    /// Fetch a record without applying the availability rule.
    pub async fn load(&self, id: Uuid) -> AssetResult<Asset> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AssetError::NotFound(id))
    }

    /// Move the release instant of an asset.
    pub async fn reschedule(
        &self,
        id: Uuid,
        release_timestamp: DateTime<Utc>,
    ) -> AssetResult<Asset> {
        self.modify(id, |asset| asset.reschedule(release_timestamp))
            .await
    }

    /// Hide an asset from clients whatever its release instant.
    pub async fn suppress(&self, id: Uuid) -> AssetResult<Asset> {
        self.modify(id, |asset| asset.set_suppressed(true)).await
    }

    pub async fn unsuppress(&self, id: Uuid) -> AssetResult<Asset> {
        self.modify(id, |asset| asset.set_suppressed(false)).await
    }

    /// Load, mutate, notify on a transition into availability, then save.
    ///
    /// Both availability checks use the same instant so a release timestamp
    /// passing mid-call cannot register as a transition.
    async fn modify<F>(&self, id: Uuid, mutate: F) -> AssetResult<Asset>
    where
        F: FnOnce(&mut Asset) + Send,
    {
        let mut asset = self.load(id).await?;
        let now = self.clock.now();
        let was_available = asset.is_available_at(&now);

        mutate(&mut asset);

        if !was_available && asset.is_available_at(&now) {
            self.notifier.asset_available(&asset);
        } else {
            debug!(
                "asset {} availability unchanged or withdrawn (was {}, now {})",
                id,
                was_available,
                asset.is_available_at(&now)
            );
        }

        Ok(self.repository.save(&asset).await?)
    }

    /// Every stored asset, available or not.
    pub async fn find_all(&self) -> AssetResult<Vec<Asset>> {
        Ok(self.repository.find_all().await?)
    }

    /// Available assets from one vendor.
    pub async fn find_all_by_vendor(&self, vendor: AssetVendor) -> AssetResult<Vec<Asset>> {
        let assets = self.repository.find_all_by_vendor(vendor).await?;
        let now = self.clock.now();
        Ok(retain(assets, |asset| asset.is_available_at(&now)))
    }

    /// The asset with `id`, or `None` if it is missing or not available.
    pub async fn find_by_id(&self, id: Uuid) -> AssetResult<Option<Asset>> {
        let asset = self.repository.find_by_id(id).await?;
        Ok(asset.filter(|asset| self.is_available(asset)))
    }

    pub async fn find_all_available(&self) -> AssetResult<Vec<Asset>> {
        let assets = self.repository.find_all().await?;
        let now = self.clock.now();
        Ok(retain(assets, |asset| asset.is_available_at(&now)))
    }

    pub async fn find_all_unavailable(&self) -> AssetResult<Vec<Asset>> {
        let assets = self.repository.find_all().await?;
        let now = self.clock.now();
        Ok(retain(assets, |asset| asset.is_not_available_at(&now)))
    }
}

fn retain(assets: Vec<Asset>, keep: impl Fn(&Asset) -> bool) -> Vec<Asset> {
    assets.into_iter().filter(|asset| keep(asset)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        db::{asset_repository::SqliteAssetRepository, test_pool},
        models::asset::tests::draft,
        services::clock::FixedClock,
    };
    use chrono::Duration;
    use std::sync::Mutex;

    /// Collects the ids of every asset it is notified about.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) notified: Mutex<Vec<Uuid>>,
    }

    impl RecordingNotifier {
        pub(crate) fn count(&self) -> usize {
            self.notified.lock().unwrap().len()
        }
    }

    impl AssetNotifier for RecordingNotifier {
        fn asset_available(&self, asset: &Asset) {
            self.notified.lock().unwrap().push(asset.id());
        }
    }

    pub(crate) async fn service_at(now: DateTime<Utc>) -> (AssetService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AssetService::new(
            Arc::new(SqliteAssetRepository::new(test_pool().await)),
            Arc::new(FixedClock(now)),
            notifier.clone(),
        );
        (service, notifier)
    }

    /// Repository whose writes always fail; reads go to a real SQLite store
    /// unless `reads_fail` is set.
    pub(crate) struct FailingRepository {
        pub(crate) inner: SqliteAssetRepository,
        pub(crate) reads_fail: bool,
    }

    impl FailingRepository {
        pub(crate) async fn new(reads_fail: bool) -> Self {
            Self {
                inner: SqliteAssetRepository::new(test_pool().await),
                reads_fail,
            }
        }

        fn read_guard(&self) -> Result<(), StorageError> {
            if self.reads_fail {
                Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl AssetRepository for FailingRepository {
        async fn save(&self, _asset: &Asset) -> Result<Asset, StorageError> {
            Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
        }

        async fn delete(&self, _asset: &Asset) -> Result<(), StorageError> {
            Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, StorageError> {
            self.read_guard()?;
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self) -> Result<Vec<Asset>, StorageError> {
            self.read_guard()?;
            self.inner.find_all().await
        }

        async fn find_all_by_vendor(
            &self,
            vendor: AssetVendor,
        ) -> Result<Vec<Asset>, StorageError> {
            self.read_guard()?;
            self.inner.find_all_by_vendor(vendor).await
        }

        async fn ping(&self) -> Result<(), StorageError> {
            self.read_guard()
        }
    }

    pub(crate) fn service_over(
        repository: Arc<dyn AssetRepository>,
        now: DateTime<Utc>,
    ) -> AssetService {
        AssetService::new(
            repository,
            Arc::new(FixedClock(now)),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn stored(now: DateTime<Utc>, release: DateTime<Utc>) -> Asset {
        let mut input = draft(release);
        input.upload_timestamp = Some(now);
        Asset::new(Uuid::new_v4(), "v2.1.0.bin".into(), input, false).unwrap()
    }

    #[tokio::test]
    async fn failed_create_is_a_storage_error_and_saves_nothing() {
        let now = Utc::now();
        let repo = Arc::new(FailingRepository::new(false).await);
        let service = service_over(repo.clone(), now);

        let err = service.create(draft(now)).await.unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)), "got {err:?}");
        assert!(repo.inner.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_mutations_leave_the_stored_record_unchanged() {
        let now = Utc::now();
        let repo = Arc::new(FailingRepository::new(false).await);
        let original = repo
            .inner
            .save(&stored(now, now + Duration::hours(1)))
            .await
            .unwrap();
        let service = service_over(repo.clone(), now);

        let err = service.suppress(original.id()).await.unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)), "got {err:?}");
        let err = service
            .reschedule(original.id(), now - Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)), "got {err:?}");
        let err = service.delete(&original).await.unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)), "got {err:?}");

        let current = repo.inner.find_by_id(original.id()).await.unwrap();
        assert_eq!(current, Some(original));
    }

    #[tokio::test]
    async fn failed_reads_are_storage_errors() {
        let now = Utc::now();
        let service = service_over(Arc::new(FailingRepository::new(true).await), now);

        assert!(matches!(
            service.find_all().await,
            Err(AssetError::Storage(_))
        ));
        assert!(matches!(
            service.find_all_available().await,
            Err(AssetError::Storage(_))
        ));
        assert!(matches!(
            service.find_all_unavailable().await,
            Err(AssetError::Storage(_))
        ));
        assert!(matches!(
            service.find_all_by_vendor(AssetVendor::Planet).await,
            Err(AssetError::Storage(_))
        ));
        assert!(matches!(
            service.find_by_id(Uuid::new_v4()).await,
            Err(AssetError::Storage(_))
        ));
        assert!(matches!(
            service.suppress(Uuid::new_v4()).await,
            Err(AssetError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn create_derives_file_name_and_assigns_id() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;

        let created = service.create(draft(now)).await.unwrap();
        assert_eq!(created.file_name(), "v2.1.0.bin");
        assert!(!created.is_suppressed());
        assert_eq!(service.load(created.id()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn create_stamps_missing_upload_time_from_clock() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let mut input = draft(now);
        input.upload_timestamp = None;

        let created = service.create(input).await.unwrap();
        assert_eq!(created.upload_timestamp(), now);
    }

    #[tokio::test]
    async fn create_with_unusable_uri_persists_nothing() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let mut input = draft(now);
        input.download_uri = "https://cdn.example.com/firmware/".into();

        let err = service.create(input).await.unwrap_err();
        assert!(matches!(err, AssetError::MalformedInput(_)));
        assert!(service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_on_missing_ids_are_not_found() {
        let (service, notifier) = service_at(Utc::now()).await;
        let id = Uuid::new_v4();

        assert!(matches!(service.suppress(id).await, Err(AssetError::NotFound(x)) if x == id));
        assert!(matches!(service.unsuppress(id).await, Err(AssetError::NotFound(_))));
        assert!(matches!(
            service.reschedule(id, Utc::now()).await,
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(service.load(id).await, Err(AssetError::NotFound(_))));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn reschedule_into_the_past_notifies_once() {
        let now = Utc::now();
        let (service, notifier) = service_at(now).await;
        let pending = service
            .create(draft(now + Duration::days(1)))
            .await
            .unwrap();
        assert!(!service.is_available(&pending));

        let released = service
            .reschedule(pending.id(), now - Duration::hours(1))
            .await
            .unwrap();
        assert!(service.is_available(&released));
        assert_eq!(*notifier.notified.lock().unwrap(), vec![pending.id()]);

        // already available, moving the instant again is not a new transition
        service
            .reschedule(pending.id(), now - Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn reschedule_to_a_future_time_does_not_notify() {
        let now = Utc::now();
        let (service, notifier) = service_at(now).await;
        let pending = service
            .create(draft(now + Duration::days(1)))
            .await
            .unwrap();

        let moved = service
            .reschedule(pending.id(), now + Duration::days(7))
            .await
            .unwrap();
        assert_eq!(moved.release_timestamp(), now + Duration::days(7));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn reschedule_of_suppressed_asset_does_not_notify() {
        let now = Utc::now();
        let (service, notifier) = service_at(now).await;
        let pending = service
            .create(draft(now + Duration::days(1)))
            .await
            .unwrap();
        service.suppress(pending.id()).await.unwrap();

        service
            .reschedule(pending.id(), now - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(notifier.count(), 0);
        assert_eq!(service.find_by_id(pending.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn suppress_then_unsuppress_restores_availability() {
        let now = Utc::now();
        let (service, notifier) = service_at(now).await;
        let released = service
            .create(draft(now - Duration::hours(1)))
            .await
            .unwrap();
        assert!(service.is_available(&released));

        let suppressed = service.suppress(released.id()).await.unwrap();
        assert!(!service.is_available(&suppressed));
        assert_eq!(notifier.count(), 0);

        let restored = service.unsuppress(released.id()).await.unwrap();
        assert!(service.is_available(&restored));
        assert_eq!(restored, released);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn unsuppress_of_unreleased_asset_does_not_notify() {
        let now = Utc::now();
        let (service, notifier) = service_at(now).await;
        let pending = service
            .create(draft(now + Duration::days(1)))
            .await
            .unwrap();

        service.suppress(pending.id()).await.unwrap();
        let restored = service.unsuppress(pending.id()).await.unwrap();
        assert_eq!(restored, pending);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn find_by_id_hides_suppressed_and_unreleased_assets() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let released = service
            .create(draft(now - Duration::hours(1)))
            .await
            .unwrap();
        let pending = service
            .create(draft(now + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(
            service.find_by_id(released.id()).await.unwrap(),
            Some(released.clone())
        );
        assert_eq!(service.find_by_id(pending.id()).await.unwrap(), None);

        service.suppress(released.id()).await.unwrap();
        assert_eq!(service.find_by_id(released.id()).await.unwrap(), None);
        assert!(service.load(released.id()).await.unwrap().is_suppressed());
    }

    #[tokio::test]
    async fn available_and_unavailable_partition_the_catalogue() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let mut ids = Vec::new();
        for hours in [-3, -1, 1, 3] {
            ids.push(
                service
                    .create(draft(now + Duration::hours(hours)))
                    .await
                    .unwrap()
                    .id(),
            );
        }
        service.suppress(ids[0]).await.unwrap();

        let all = service.find_all().await.unwrap();
        let available = service.find_all_available().await.unwrap();
        let unavailable = service.find_all_unavailable().await.unwrap();

        assert_eq!(all.len(), 4);
        assert_eq!(available.len() + unavailable.len(), all.len());
        assert_eq!(available.iter().map(Asset::id).collect::<Vec<_>>(), vec![ids[1]]);
        for asset in &all {
            let in_available = available.contains(asset);
            let in_unavailable = unavailable.contains(asset);
            assert!(in_available ^ in_unavailable);
        }
    }

    #[tokio::test]
    async fn vendor_query_only_returns_available_assets_of_that_vendor() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let planet = service
            .create(draft(now - Duration::hours(1)))
            .await
            .unwrap();
        service
            .create(draft(now + Duration::hours(1)))
            .await
            .unwrap();
        let mut google = draft(now - Duration::hours(1));
        google.vendor = AssetVendor::Google;
        service.create(google).await.unwrap();

        let found = service
            .find_all_by_vendor(AssetVendor::Planet)
            .await
            .unwrap();
        assert_eq!(found, vec![planet]);
        assert!(
            service
                .find_all_by_vendor(AssetVendor::Mediatek)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let now = Utc::now();
        let (service, _) = service_at(now).await;
        let kept = service
            .create(draft(now - Duration::hours(1)))
            .await
            .unwrap();
        let doomed = service
            .create(draft(now - Duration::hours(2)))
            .await
            .unwrap();
        service.suppress(doomed.id()).await.unwrap();

        let before = service.find_all().await.unwrap().len();
        let doomed = service.load(doomed.id()).await.unwrap();
        service.delete(&doomed).await.unwrap();

        assert_eq!(service.find_all().await.unwrap().len(), before - 1);
        assert_eq!(service.find_by_id(doomed.id()).await.unwrap(), None);
        assert!(matches!(
            service.load(doomed.id()).await,
            Err(AssetError::NotFound(_))
        ));
        assert_eq!(service.find_by_id(kept.id()).await.unwrap(), Some(kept));
    }
}
