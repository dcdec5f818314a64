//! # aside-cache
//!
//! Read-through (cache-aside) layer between request handlers and a
//! key-indexed, record-based store.
//!
//! Think of it as the hot front door for data the backend already owns.
//!
//! # The Basics
//!
//! The crate is designed for the following use case:
//!
//! - Durable entities live in a relational (or any record-based) store that
//!   answers atomic single-entity and single-query operations.
//! - Lookup latency matters; store round trips are worth skipping when a
//!   recent answer is at hand.
//! - Some state is purely ephemeral (a per-session shopping cart) and has
//!   no backing store at all.
//!
//! The layer operates on the following principles:
//!
//! - It is backend-agnostic: the cache is an abstract key-value service with
//!   `get`/`set`/`delete` and per-entry TTL support ([`CacheBackend`]); the
//!   store is an abstract record service ([`EntityStore`]). Both are
//!   explicitly constructed, injected collaborators, never ambient
//!   singletons.
//! - Reads check the cache first and fall back to the store on miss,
//!   repopulating the slot on the way out. Writes hit the store first and
//!   then refresh or drop the affected single-entity slot, never the
//!   reverse order.
//! - The cache is a performance optimization, not a source of truth: any
//!   cache or codec fault on a store-backed path is logged and recovered by
//!   going straight to the store. Store faults always propagate.
//! - Fully async, safe for concurrent unsynchronized use; each cache call
//!   stands alone, with no cross-key atomicity. A collection view may serve
//!   stale rows right after a single-entity update until its TTL lapses;
//!   that window is part of the contract, not a bug.
//! - Entry reaping is owned by the backend; entries carry a sliding or
//!   absolute [`TtlPolicy`](policy::TtlPolicy) chosen per call site.
//! - There is no stampede guard: concurrent misses on one key each go to
//!   the store. The first write wins the slot and the rest are overwrites
//!   of equal data.
//!
//! ```ignore
//! let backend = MokaBackend::builder().name("products").build()?;
//! let products = AsideCache::builder()
//!     .store(product_store)
//!     .backend(backend)
//!     .build()?;
//!
//! let all = products.get_all().await?;
//! let phones = products.get_filtered("Electronics").await?;
//! products.update(&42, revised).await?;
//! ```
//!
//! The second instance of the pattern, [`CartStore`](session::CartStore),
//! owns a cache-only collection keyed by session identity with merge-on-add
//! semantics and a sliding idle timeout, and
//! [`summarize`](summary::summarize) folds a cart into a priced aggregate
//! with externally supplied tax, delivery, and discount rules.

pub mod backend;
pub mod cache;
pub mod codec;
pub mod key;
pub mod mock;
pub mod policy;
pub mod session;
pub mod summary;
pub mod traits;
pub mod types;

#[doc(inline)]
pub use cache::AsideCache;
#[doc(inline)]
pub use traits::CacheBackend;
#[doc(inline)]
pub use traits::EntityStore;

pub mod prelude {
    pub use crate::backend::MokaBackend;
    pub use crate::cache::AsideCache;
    pub use crate::codec::JsonCodec;
    pub use crate::key::CacheKey;
    pub use crate::policy::TtlPolicy;
    pub use crate::session::CartLine;
    pub use crate::session::CartStore;
    pub use crate::session::SessionId;
    pub use crate::summary::summarize;
    pub use crate::summary::CartSummary;
    pub use crate::summary::DiscountRule;
    pub use crate::summary::PricingRules;
    pub use crate::summary::TieredDiscount;
    pub use crate::traits::CacheBackend;
    pub use crate::traits::Codec;
    pub use crate::traits::EntityStore;
    pub use crate::types::AsideError;
    pub use crate::types::CartError;
    pub use crate::types::DeleteOutcome;
    pub use crate::types::UpdateOutcome;
}
