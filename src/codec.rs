use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::traits::Codec;

/// JSON codec for cache payloads. Payloads are an implementation detail of
/// the cache layer and need not be stable across versions; they are
/// disposable, never authoritative.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    type Error = serde_json::Error;

    fn encode<T>(&self, value: &T) -> Result<Arc<[u8]>, Self::Error>
    where
        T: Serialize,
    {
        Ok(Arc::from(serde_json::to_vec(value)?))
    }

    fn decode<T>(&self, payload: &[u8]) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(payload)
    }
}
