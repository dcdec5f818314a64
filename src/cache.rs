use std::sync::Arc;
use std::time::Duration;

use fieldx::fxstruct;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::codec::JsonCodec;
use crate::key::normalize_filter;
use crate::key::CacheKey;
use crate::policy::TtlPolicy;
use crate::policy::DEFAULT_COLLECTION_TTL;
use crate::policy::DEFAULT_ENTITY_TTL;
use crate::policy::DEFAULT_FILTERED_TTL;
use crate::traits::CacheBackend;
use crate::traits::Codec;
use crate::traits::EntityStore;
use crate::types::AsideError;
use crate::types::DeleteOutcome;
use crate::types::UpdateOutcome;

/// Read-through front for one entity kind.
///
/// Reads check the cache first and fall back to the store on miss,
/// repopulating the slot on the way out. Writes go to the store first and
/// then refresh or drop the single-entity slot; collection and filtered
/// slots are left to expire on their own (see [`update`](Self::update)).
///
/// ```ignore
/// let products = AsideCache::builder()
///     .store(product_store)
///     .backend(MokaBackend::builder().name("products").build()?)
///     .build()?;
///
/// let all = products.get_all().await?;
/// let one = products.get_by_id(&42).await?;
/// ```
///
/// Every cache interaction is best-effort: a backend or codec fault is
/// logged and the operation proceeds against the store alone. Only store
/// faults reach the caller.
#[fxstruct(sync, no_new, default(off), builder(vis(pub), doc("Builder object of [`AsideCache`].")))]
pub struct AsideCache<ES, CB>
where
    ES: EntityStore,
    CB: CacheBackend,
{
    #[fieldx(builder(required, into), get(clone))]
    store: Arc<ES>,

    #[fieldx(builder(required, into), get(clone))]
    backend: Arc<CB>,

    #[fieldx(private, get(copy), default(JsonCodec))]
    codec: JsonCodec,

    /// TTL of the full-collection slot. Sliding: hot collection views stay
    /// warm for as long as they keep being read.
    #[fieldx(get(copy), default(DEFAULT_COLLECTION_TTL))]
    collection_ttl: Duration,

    /// TTL of filtered-view slots. Absolute: filtered views are cheap to
    /// recompute and a hard deadline bounds their staleness.
    #[fieldx(get(copy), default(DEFAULT_FILTERED_TTL))]
    filtered_ttl: Duration,

    /// TTL of single-entity slots. Sliding.
    #[fieldx(get(copy), default(DEFAULT_ENTITY_TTL))]
    entity_ttl: Duration,
}

impl<ES, CB> AsideCache<ES, CB>
where
    ES: EntityStore,
    CB: CacheBackend,
{
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.store().kind()
    }

    /// The full collection of the kind.
    pub async fn get_all(&self) -> Result<Vec<ES::Value>, AsideError<ES::Error>> {
        let key = CacheKey::all(self.kind());

        if let Some(cached) = self.cache_read::<Vec<ES::Value>>(&key).await {
            return Ok(cached);
        }

        let rows = self.store().fetch_all().await.map_err(AsideError::Store)?;
        self.cache_write(&key, &rows, TtlPolicy::Sliding(self.collection_ttl())).await;

        Ok(rows)
    }

    /// Entities matching a scalar filter value. The value is normalized
    /// before key construction so that differently spelled but logically
    /// equal filters share one slot.
    pub async fn get_filtered(&self, filter: &str) -> Result<Vec<ES::Value>, AsideError<ES::Error>> {
        let filter = normalize_filter(filter);
        let key = CacheKey::filtered(self.kind(), &filter);

        if let Some(cached) = self.cache_read::<Vec<ES::Value>>(&key).await {
            return Ok(cached);
        }

        let rows = self.store().fetch_where(&filter).await.map_err(AsideError::Store)?;
        self.cache_write(&key, &rows, TtlPolicy::Absolute(self.filtered_ttl())).await;

        Ok(rows)
    }

    /// A single entity, or `None` when it is absent from both cache and
    /// store. Absences are not cached: a miss is cheap and self-healing.
    pub async fn get_by_id(&self, id: &ES::Id) -> Result<Option<ES::Value>, AsideError<ES::Error>> {
        let key = CacheKey::by_id(self.kind(), id);

        if let Some(cached) = self.cache_read::<ES::Value>(&key).await {
            return Ok(Some(cached));
        }

        let Some(row) = self.store().fetch_by_id(id).await.map_err(AsideError::Store)?
        else {
            debug!("[{}] no '{key}' in either cache or store", self.kind());
            return Ok(None);
        };

        self.cache_write(&key, &row, TtlPolicy::Sliding(self.entity_ttl())).await;

        Ok(Some(row))
    }

    /// Store first, cache second. On success the single-entity slot is
    /// overwritten with the new value rather than dropped, so a read that
    /// follows the update within the same request sees what was written.
    /// Collection and filtered slots are intentionally not touched: they
    /// serve stale data until their TTL lapses.
    pub async fn update(&self, id: &ES::Id, value: ES::Value) -> Result<UpdateOutcome, AsideError<ES::Error>> {
        let supplied = self.store().id_of(&value);
        if supplied != *id {
            return Err(AsideError::IdMismatch {
                requested: id.to_string(),
                supplied:  supplied.to_string(),
            });
        }

        if self.store().fetch_by_id(id).await.map_err(AsideError::Store)?.is_none() {
            return Ok(UpdateOutcome::NotFound);
        }

        self.store().save(&value).await.map_err(AsideError::Store)?;

        let key = CacheKey::by_id(self.kind(), id);
        self.cache_write(&key, &value, TtlPolicy::Sliding(self.entity_ttl())).await;

        Ok(UpdateOutcome::Updated)
    }

    /// Store first, cache second; the single-entity slot is dropped. The
    /// same staleness window as for [`update`](Self::update) applies to
    /// collection and filtered slots.
    pub async fn delete(&self, id: &ES::Id) -> Result<DeleteOutcome, AsideError<ES::Error>> {
        if self.store().fetch_by_id(id).await.map_err(AsideError::Store)?.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        self.store().remove(id).await.map_err(AsideError::Store)?;

        self.cache_evict(&CacheKey::by_id(self.kind(), id)).await;

        Ok(DeleteOutcome::Deleted)
    }

    // The three helpers below implement the recovery policy: any cache or
    // codec fault degrades to a plain store operation. An undecodable
    // payload counts as a miss; whatever is in the slot gets overwritten by
    // the next write.

    async fn cache_read<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let payload = match self.backend().get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("[{}] MISS({key})", self.kind());
                return None;
            }
            Err(error) => {
                warn!("[{}] cache read of '{key}' failed, falling back to store: {error}", self.kind());
                return None;
            }
        };

        match self.codec().decode(&payload) {
            Ok(value) => {
                debug!("[{}] HIT({key})", self.kind());
                Some(value)
            }
            Err(error) => {
                warn!("[{}] undecodable payload under '{key}', treating as miss: {error}", self.kind());
                None
            }
        }
    }

    async fn cache_write<T>(&self, key: &CacheKey, value: &T, policy: TtlPolicy)
    where
        T: Serialize,
    {
        let payload = match self.codec().encode(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("[{}] could not encode payload for '{key}', skipping cache: {error}", self.kind());
                return;
            }
        };

        if let Err(error) = self.backend().set(key, payload, policy).await {
            warn!("[{}] cache write of '{key}' failed, skipping: {error}", self.kind());
        }
    }

    async fn cache_evict(&self, key: &CacheKey) {
        if let Err(error) = self.backend().delete(key).await {
            warn!("[{}] cache delete of '{key}' failed, entry left to expire: {error}", self.kind());
        }
    }
}
