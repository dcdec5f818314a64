#![cfg(any(test, feature = "test"))]
//! In-memory collaborators for exercising the cache layer without a real
//! database or cache cluster: a seeded product store with call counters and
//! an offline switch, plus a backend decorator that fails on demand.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fieldx::fxstruct;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::key::CacheKey;
use crate::policy::TtlPolicy;
use crate::traits::CacheBackend;
use crate::traits::EntityStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    #[serde(rename = "i")]
    pub id:       u32,
    #[serde(rename = "n")]
    pub name:     String,
    #[serde(rename = "c")]
    pub category: String,
    #[serde(rename = "p")]
    pub price:    f64,
    #[serde(rename = "q")]
    pub quantity: u32,
}

/// The catalog the store ships with.
pub fn seed_products() -> Vec<Product> {
    let rows = [
        (1, "Apple iPhone 14", "Electronics", 999.0, 50),
        (2, "Samsung Galaxy S22", "Electronics", 899.0, 40),
        (3, "Sony WH-1000XM4 Headphones", "Electronics", 349.0, 30),
        (4, "Nike Air Zoom Pegasus", "Footwear", 120.0, 100),
        (5, "Adidas Ultraboost", "Footwear", 180.0, 80),
        (6, "Organic Apples (1kg)", "Groceries", 4.0, 200),
        (7, "Organic Bananas (1 Dozen)", "Groceries", 3.0, 150),
    ];

    rows.into_iter()
        .map(|(id, name, category, price, quantity)| Product {
            id,
            name: name.to_string(),
            category: category.to_string(),
            price,
            quantity,
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum MockStoreError {
    #[error("store is offline")]
    Offline,
}

/// In-memory [`EntityStore`] over the product catalog. Counts every fetch so
/// tests can tell a cache hit from a store round trip, and flips offline on
/// request to drive the hard-fault paths.
#[fxstruct(sync, no_new, builder(vis(pub)))]
pub struct MemStore {
    #[fieldx(inner_mut, get, get_mut, builder(off), default(HashMap::new()))]
    rows: HashMap<u32, Product>,

    #[fieldx(vis(pub), inner_mut, get(copy), set, builder(off), default(false))]
    offline: bool,

    #[fieldx(vis(pub), inner_mut, get(copy), set, builder(off), default(0))]
    fetch_all_calls: u32,

    #[fieldx(vis(pub), inner_mut, get(copy), set, builder(off), default(0))]
    fetch_where_calls: u32,

    #[fieldx(vis(pub), inner_mut, get(copy), set, builder(off), default(0))]
    fetch_by_id_calls: u32,
}

impl MemStore {
    pub fn with_catalog() -> Self {
        let store = Self::builder().build().expect("MemStore builder");
        store.rows_mut().extend(seed_products().into_iter().map(|p| (p.id, p)));
        store
    }

    pub fn store_reads(&self) -> u32 {
        self.fetch_all_calls() + self.fetch_where_calls() + self.fetch_by_id_calls()
    }

    fn ensure_online(&self) -> Result<(), MockStoreError> {
        if self.offline() {
            return Err(MockStoreError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemStore {
    type Error = MockStoreError;
    type Id = u32;
    type Value = Product;

    fn kind(&self) -> &'static str {
        "products"
    }

    fn id_of(&self, value: &Self::Value) -> Self::Id {
        value.id
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, Self::Error> {
        self.ensure_online()?;
        self.set_fetch_all_calls(self.fetch_all_calls() + 1);

        let mut all: Vec<Product> = self.rows().values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn fetch_where(&self, filter: &str) -> Result<Vec<Product>, Self::Error> {
        self.ensure_online()?;
        self.set_fetch_where_calls(self.fetch_where_calls() + 1);

        let filter = filter.to_lowercase();
        let mut matching: Vec<Product> = self
            .rows()
            .values()
            .filter(|p| p.category.to_lowercase() == filter)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.id);
        Ok(matching)
    }

    async fn fetch_by_id(&self, id: &Self::Id) -> Result<Option<Product>, Self::Error> {
        self.ensure_online()?;
        self.set_fetch_by_id_calls(self.fetch_by_id_calls() + 1);

        Ok(self.rows().get(id).cloned())
    }

    async fn save(&self, value: &Product) -> Result<(), Self::Error> {
        self.ensure_online()?;
        self.rows_mut().insert(value.id, value.clone());
        Ok(())
    }

    async fn remove(&self, id: &Self::Id) -> Result<(), Self::Error> {
        self.ensure_online()?;
        self.rows_mut().remove(id);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MockCacheError {
    #[error("cache service unreachable")]
    Unreachable,
}

/// Decorator over any backend that fails every operation while armed.
/// Proves that cache faults degrade to store traffic instead of surfacing.
#[fxstruct(sync, no_new, default(off), builder(vis(pub)))]
pub struct FlakyBackend<CB>
where
    CB: CacheBackend,
{
    #[fieldx(builder(required, into), get(clone))]
    inner: Arc<CB>,

    #[fieldx(vis(pub), inner_mut, get(copy), set, builder(off), default(false))]
    failing: bool,
}

impl<CB> FlakyBackend<CB>
where
    CB: CacheBackend,
{
    fn ensure_reachable(&self) -> Result<(), MockCacheError> {
        if self.failing() {
            return Err(MockCacheError::Unreachable);
        }
        Ok(())
    }
}

#[async_trait]
impl<CB> CacheBackend for FlakyBackend<CB>
where
    CB: CacheBackend,
{
    type Error = MockCacheError;

    async fn get(&self, key: &CacheKey) -> Result<Option<Arc<[u8]>>, Self::Error> {
        self.ensure_reachable()?;
        self.inner().get(key).await.map_err(|_| MockCacheError::Unreachable)
    }

    async fn set(&self, key: &CacheKey, payload: Arc<[u8]>, policy: TtlPolicy) -> Result<(), Self::Error> {
        self.ensure_reachable()?;
        self.inner().set(key, payload, policy).await.map_err(|_| MockCacheError::Unreachable)
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), Self::Error> {
        self.ensure_reachable()?;
        self.inner().delete(key).await.map_err(|_| MockCacheError::Unreachable)
    }
}
