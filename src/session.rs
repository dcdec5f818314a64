use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use fieldx::fxstruct;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::codec::JsonCodec;
use crate::key::CacheKey;
use crate::policy::TtlPolicy;
use crate::policy::DEFAULT_CART_IDLE_TTL;
use crate::summary::summarize;
use crate::summary::CartSummary;
use crate::summary::DiscountRule;
use crate::summary::PricingRules;
use crate::traits::CacheBackend;
use crate::traits::Codec;
use crate::types::CartError;

/// Caller-supplied session identity. Falls back to an anonymous placeholder
/// when the caller supplies none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self("guest".to_string())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One cart position. A session holds at most one line per product;
/// re-adding a product increments the existing line's quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLine {
    #[serde(rename = "i")]
    pub product_id: u32,
    #[serde(rename = "n")]
    pub name:       String,
    #[serde(rename = "p")]
    pub unit_price: f64,
    #[serde(rename = "q")]
    pub quantity:   u32,
}

/// Session-scoped cart collection, backed purely by the cache. There is no
/// durable store behind it: the backend is the single source of truth, its
/// faults are hard, and an idle session simply expires.
///
/// The whole collection is rewritten on every mutation, since the backend
/// has no sub-key mutation primitive. Two concurrent [`add_item`](Self::add_item)
/// calls for one session therefore race on read-modify-write: the last
/// writer wins and an interleaved increment can be lost. Accepted for
/// session-scoped, single-user data.
#[fxstruct(sync, no_new, default(off), builder(vis(pub), doc("Builder object of [`CartStore`].")))]
pub struct CartStore<CB>
where
    CB: CacheBackend,
{
    #[fieldx(builder(required, into), get(clone))]
    backend: Arc<CB>,

    #[fieldx(private, get(copy), default(JsonCodec))]
    codec: JsonCodec,

    /// Sliding idle timeout of a session's cart; every read or rewrite of
    /// the collection resets it.
    #[fieldx(get(copy), default(DEFAULT_CART_IDLE_TTL))]
    idle_ttl: Duration,
}

impl<CB> CartStore<CB>
where
    CB: CacheBackend,
{
    /// Merge a line into the session's cart and rewrite the collection.
    /// Returns the cart as written.
    pub async fn add_item(&self, session: &SessionId, line: CartLine) -> Result<Vec<CartLine>, CartError<CB::Error>> {
        let key = CacheKey::session(session);
        let mut lines = self.read_lines(&key).await?;

        if let Some(existing) = lines.iter_mut().find(|l| l.product_id == line.product_id) {
            existing.quantity += line.quantity;
            debug!("[cart] merged product {} for '{session}', quantity now {}", line.product_id, existing.quantity);
        }
        else {
            debug!("[cart] new product {} for '{session}'", line.product_id);
            lines.push(line);
        }

        let payload = self.codec().encode(&lines).map_err(CartError::Codec)?;
        self.backend()
            .set(&key, payload, TtlPolicy::Sliding(self.idle_ttl()))
            .await
            .map_err(CartError::Backend)?;

        Ok(lines)
    }

    /// Current cart contents. An absent cart is an empty cart, not an error.
    pub async fn items(&self, session: &SessionId) -> Result<Vec<CartLine>, CartError<CB::Error>> {
        self.read_lines(&CacheKey::session(session)).await
    }

    /// Price the session's cart with the supplied rules. Reading the cart
    /// counts as an access and extends its idle lease; the computation
    /// itself is pure.
    pub async fn summary(
        &self,
        session: &SessionId,
        rules: &PricingRules,
        discounts: &[&dyn DiscountRule],
    ) -> Result<CartSummary, CartError<CB::Error>> {
        Ok(summarize(&self.items(session).await?, rules, discounts))
    }

    /// Drop the session's cart outright.
    pub async fn clear(&self, session: &SessionId) -> Result<(), CartError<CB::Error>> {
        debug!("[cart] clearing '{session}'");
        self.backend()
            .delete(&CacheKey::session(session))
            .await
            .map_err(CartError::Backend)
    }

    async fn read_lines(&self, key: &CacheKey) -> Result<Vec<CartLine>, CartError<CB::Error>> {
        let Some(payload) = self.backend().get(key).await.map_err(CartError::Backend)?
        else {
            return Ok(Vec::new());
        };

        match self.codec().decode(&payload) {
            Ok(lines) => Ok(lines),
            Err(error) => {
                // A cart we cannot read back is gone for good; start over
                // rather than wedge the session.
                warn!("[cart] undecodable payload under '{key}', starting an empty cart: {error}");
                Ok(Vec::new())
            }
        }
    }
}
