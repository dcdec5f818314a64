use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use fieldx::fxstruct;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use moka::Expiry;

use crate::key::CacheKey;
use crate::policy::TtlPolicy;
use crate::traits::CacheBackend;

/// What a cache slot holds: the serialized payload plus the policy that
/// governs its lifetime. The policy travels with the entry so the expiry
/// hooks can tell sliding entries from absolute ones.
#[derive(Debug, Clone)]
pub(crate) struct CachedBlob {
    pub(crate) payload: Arc<[u8]>,
    pub(crate) policy:  TtlPolicy,
}

struct PolicyExpiry;

impl Expiry<CacheKey, CachedBlob> for PolicyExpiry {
    fn expire_after_create(&self, _key: &CacheKey, value: &CachedBlob, _created_at: Instant) -> Option<Duration> {
        Some(value.policy.duration())
    }

    fn expire_after_read(
        &self,
        _key: &CacheKey,
        value: &CachedBlob,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        // Sliding entries get a fresh lease on every access; absolute ones
        // keep whatever remains of the deadline fixed at write time.
        match value.policy {
            TtlPolicy::Sliding(d) => Some(d),
            TtlPolicy::Absolute(_) => duration_until_expiry,
        }
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CachedBlob,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite restarts the clock for either policy.
        Some(value.policy.duration())
    }
}

/// In-process [`CacheBackend`] over a moka cache. Entry reaping is owned by
/// moka; per-entry policies are enforced through the expiry hooks above.
#[fxstruct(sync, no_new, builder(vis(pub)))]
pub struct MokaBackend {
    /// Backend name. Most useful for debugging and logging.
    #[fieldx(get(clone), builder(into), default("aside".to_string()))]
    name: String,

    #[fieldx(get(copy), default(10_000))]
    max_capacity: u64,

    #[fieldx(private, lazy, get(clone), builder(off))]
    cache: Arc<Cache<CacheKey, CachedBlob>>,
}

impl MokaBackend {
    fn build_cache(&self) -> Arc<Cache<CacheKey, CachedBlob>> {
        Arc::new(
            Cache::builder()
                .name(&self.name())
                .max_capacity(self.max_capacity())
                .eviction_policy(EvictionPolicy::tiny_lfu())
                .expire_after(PolicyExpiry)
                .build(),
        )
    }

    /// Number of live entries. Eventually consistent, intended for tests and
    /// diagnostics.
    pub fn entry_count(&self) -> u64 {
        self.cache().entry_count()
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    type Error = Infallible;

    async fn get(&self, key: &CacheKey) -> Result<Option<Arc<[u8]>>, Self::Error> {
        Ok(self.cache().get(key).await.map(|blob| blob.payload))
    }

    async fn set(&self, key: &CacheKey, payload: Arc<[u8]>, policy: TtlPolicy) -> Result<(), Self::Error> {
        self.cache().insert(key.clone(), CachedBlob { payload, policy }).await;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), Self::Error> {
        self.cache().invalidate(key).await;
        Ok(())
    }
}
