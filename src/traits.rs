use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::key::CacheKey;
use crate::policy::TtlPolicy;

/// The authoritative, durable side of the pattern: a relational table, a
/// document collection, anything that can answer the five queries below
/// atomically. Store faults are hard faults and always propagate to the
/// caller.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    type Id: Debug + Display + Hash + Clone + Eq + Send + Sync + 'static;
    type Value: Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Error: Debug + Display + Send + Sync + 'static;

    /// Entity kind this store serves. Becomes the cache key namespace.
    fn kind(&self) -> &'static str;

    fn id_of(&self, value: &Self::Value) -> Self::Id;

    async fn fetch_all(&self) -> Result<Vec<Self::Value>, Self::Error>;

    /// All entities matching a scalar filter value. The match is
    /// case-insensitive; callers pass an already case-folded value.
    async fn fetch_where(&self, filter: &str) -> Result<Vec<Self::Value>, Self::Error>;

    async fn fetch_by_id(&self, id: &Self::Id) -> Result<Option<Self::Value>, Self::Error>;

    /// Persist a new revision of an entity known to exist.
    async fn save(&self, value: &Self::Value) -> Result<(), Self::Error>;

    async fn remove(&self, id: &Self::Id) -> Result<(), Self::Error>;
}

/// An abstract key-value service with per-entry TTL support. No cross-key
/// operations, no transactions; each call stands alone. May be an in-process
/// map or a remote cluster behind a client.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    type Error: Debug + Display + Send + Sync + 'static;

    async fn get(&self, key: &CacheKey) -> Result<Option<Arc<[u8]>>, Self::Error>;
    async fn set(&self, key: &CacheKey, payload: Arc<[u8]>, policy: TtlPolicy) -> Result<(), Self::Error>;
    async fn delete(&self, key: &CacheKey) -> Result<(), Self::Error>;
}

/// Converts entities to and from the byte representation stored in the cache.
/// The round trip must be lossless for every field callers read back.
pub trait Codec: Send + Sync + 'static {
    type Error: Debug + Display + Send + Sync + 'static;

    fn encode<T>(&self, value: &T) -> Result<Arc<[u8]>, Self::Error>
    where
        T: Serialize;

    fn decode<T>(&self, payload: &[u8]) -> Result<T, Self::Error>
    where
        T: DeserializeOwned;
}
