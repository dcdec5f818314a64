use std::sync::Arc;
use std::time::Duration;

use aside_cache::mock::FlakyBackend;
use aside_cache::mock::MemStore;
use aside_cache::mock::Product;
use aside_cache::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn fixture() -> Result<(Arc<MemStore>, AsideCache<MemStore, MokaBackend>), Box<dyn std::error::Error>> {
    let store = Arc::new(MemStore::with_catalog());
    let cache = AsideCache::builder()
        .store(Arc::clone(&store))
        .backend(MokaBackend::builder().name("products-test").build()?)
        .build()?;
    Ok((store, cache))
}

type Flaky = FlakyBackend<MokaBackend>;

fn flaky_fixture() -> Result<(Arc<MemStore>, Arc<Flaky>, AsideCache<MemStore, Flaky>), Box<dyn std::error::Error>> {
    let store = Arc::new(MemStore::with_catalog());
    let backend = Arc::new(
        FlakyBackend::builder()
            .inner(MokaBackend::builder().name("flaky-test").build()?)
            .build()?,
    );
    let cache = AsideCache::builder()
        .store(Arc::clone(&store))
        .backend(Arc::clone(&backend))
        .build()?;
    Ok((store, backend, cache))
}

fn revised(product: &Product, price: f64) -> Product {
    Product {
        price,
        ..product.clone()
    }
}

#[tokio::test]
async fn repeated_get_by_id_is_idempotent_and_cached() -> TestResult {
    let (store, cache) = fixture()?;

    let first = cache.get_by_id(&1).await?.expect("seeded product");
    let second = cache.get_by_id(&1).await?.expect("seeded product");

    assert_eq!(first, second);
    // The second read came out of the cache, not the store.
    assert_eq!(store.fetch_by_id_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn get_all_hits_the_store_once() -> TestResult {
    let (store, cache) = fixture()?;

    let rows = cache.get_all().await?;
    assert_eq!(rows.len(), 7);

    let again = cache.get_all().await?;
    assert_eq!(again, rows);
    assert_eq!(store.fetch_all_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_entity_is_an_outcome_not_an_error() -> TestResult {
    let (_store, cache) = fixture()?;

    let ghost = Product {
        id:       999,
        name:     "ghost".to_string(),
        category: "none".to_string(),
        price:    1.0,
        quantity: 1,
    };

    assert!(cache.get_by_id(&999).await?.is_none());
    assert_eq!(cache.update(&999, ghost).await?, UpdateOutcome::NotFound);
    assert_eq!(cache.delete(&999).await?, DeleteOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn update_refreshes_the_single_entity_slot() -> TestResult {
    let (store, cache) = fixture()?;

    let phone = cache.get_by_id(&1).await?.expect("seeded product");
    assert_eq!(cache.update(&1, revised(&phone, 899.0)).await?, UpdateOutcome::Updated);

    let reads_after_update = store.fetch_by_id_calls();
    let fresh = cache.get_by_id(&1).await?.expect("updated product");

    // Read-after-write: the slot was overwritten, not merely dropped, so
    // this read never touched the store.
    assert_eq!(fresh.price, 899.0);
    assert_eq!(store.fetch_by_id_calls(), reads_after_update);
    Ok(())
}

#[tokio::test]
async fn update_with_mismatched_ids_is_rejected() -> TestResult {
    let (store, cache) = fixture()?;

    let phone = cache.get_by_id(&1).await?.expect("seeded product");
    let result = cache.update(&2, revised(&phone, 1.0)).await;

    assert!(matches!(result, Err(AsideError::IdMismatch { .. })));
    // Rejected before any store write: the stored row is untouched.
    assert_eq!(store.fetch_by_id_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn stale_collection_after_update_is_expected() -> TestResult {
    let (store, cache) = fixture()?;

    let before = cache.get_all().await?;
    let phone = before.iter().find(|p| p.id == 1).expect("seeded product").clone();

    assert_eq!(cache.update(&1, revised(&phone, 111.0)).await?, UpdateOutcome::Updated);

    // The collection slot is intentionally left alone by update: until its
    // TTL lapses it keeps serving the pre-update rows. This is the
    // documented staleness window, not a bug.
    let after = cache.get_all().await?;
    assert_eq!(after, before);
    assert_eq!(store.fetch_all_calls(), 1);

    // The single-entity slot meanwhile already serves the new value.
    assert_eq!(cache.get_by_id(&1).await?.expect("updated product").price, 111.0);
    Ok(())
}

#[tokio::test]
async fn delete_drops_the_single_entity_slot() -> TestResult {
    let (store, cache) = fixture()?;

    cache.get_by_id(&4).await?.expect("seeded product");
    assert_eq!(cache.delete(&4).await?, DeleteOutcome::Deleted);

    let reads_before = store.fetch_by_id_calls();
    assert!(cache.get_by_id(&4).await?.is_none());
    // The slot is gone, so the lookup went back to the store.
    assert!(store.fetch_by_id_calls() > reads_before);
    Ok(())
}

#[tokio::test]
async fn filter_spellings_share_one_slot() -> TestResult {
    let (store, cache) = fixture()?;

    let spelled = cache.get_filtered("Electronics").await?;
    let padded = cache.get_filtered(" electronics ").await?;

    assert_eq!(spelled.len(), 3);
    assert_eq!(padded, spelled);
    assert_eq!(store.fetch_where_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unreachable_cache_degrades_to_store_reads() -> TestResult {
    let (store, backend, cache) = flaky_fixture()?;

    backend.set_failing(true);

    // The caller sees correct data and no error; only latency changes.
    let phone = cache.get_by_id(&1).await?.expect("seeded product");
    assert_eq!(phone.id, 1);
    let again = cache.get_by_id(&1).await?.expect("seeded product");
    assert_eq!(again, phone);
    assert_eq!(store.fetch_by_id_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn unreachable_cache_never_fails_a_write() -> TestResult {
    let (store, backend, cache) = flaky_fixture()?;

    backend.set_failing(true);

    let phone = cache.get_by_id(&1).await?.expect("seeded product");
    assert_eq!(cache.update(&1, revised(&phone, 777.0)).await?, UpdateOutcome::Updated);
    assert_eq!(cache.delete(&2).await?, DeleteOutcome::Deleted);

    backend.set_failing(false);

    // The refresh of the slot was skipped, so the next read goes to the
    // store and still observes the committed update.
    let reads_before = store.fetch_by_id_calls();
    assert_eq!(cache.get_by_id(&1).await?.expect("updated product").price, 777.0);
    assert!(store.fetch_by_id_calls() > reads_before);
    Ok(())
}

#[tokio::test]
async fn store_faults_always_propagate() -> TestResult {
    let (store, cache) = fixture()?;

    store.set_offline(true);
    assert!(matches!(cache.get_all().await, Err(AsideError::Store(_))));
    assert!(matches!(cache.get_by_id(&1).await, Err(AsideError::Store(_))));

    store.set_offline(false);
    // A warm cache, however, keeps answering even with the store down.
    cache.get_by_id(&1).await?.expect("seeded product");
    store.set_offline(true);
    assert!(cache.get_by_id(&1).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn collection_slot_expires_and_refetches() -> TestResult {
    let store = Arc::new(MemStore::with_catalog());
    let cache: AsideCache<MemStore, MokaBackend> = AsideCache::builder()
        .store(Arc::clone(&store))
        .backend(MokaBackend::builder().name("expiry-test").build()?)
        .collection_ttl(Duration::from_millis(200))
        .build()?;

    let before = cache.get_all().await?;
    let phone = before.iter().find(|p| p.id == 1).expect("seeded product").clone();
    cache.update(&1, revised(&phone, 123.0)).await?;

    tokio::time::sleep(Duration::from_millis(600)).await;

    // Past its TTL the stale collection is gone; the refetch sees the update.
    let after = cache.get_all().await?;
    assert_eq!(store.fetch_all_calls(), 2);
    assert_eq!(after.iter().find(|p| p.id == 1).expect("updated product").price, 123.0);
    Ok(())
}

#[tokio::test]
async fn sliding_entity_slot_outlives_its_ttl_while_read() -> TestResult {
    let store = Arc::new(MemStore::with_catalog());
    let cache: AsideCache<MemStore, MokaBackend> = AsideCache::builder()
        .store(Arc::clone(&store))
        .backend(MokaBackend::builder().name("sliding-test").build()?)
        .entity_ttl(Duration::from_millis(500))
        .build()?;

    cache.get_by_id(&1).await?.expect("seeded product");

    // Touch the slot well within the TTL, over a span longer than the TTL.
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        cache.get_by_id(&1).await?.expect("seeded product");
    }

    // Every read renewed the lease; the store was queried exactly once.
    assert_eq!(store.fetch_by_id_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn absolute_filtered_slot_expires_regardless_of_reads() -> TestResult {
    let store = Arc::new(MemStore::with_catalog());
    let cache: AsideCache<MemStore, MokaBackend> = AsideCache::builder()
        .store(Arc::clone(&store))
        .backend(MokaBackend::builder().name("absolute-test").build()?)
        .filtered_ttl(Duration::from_millis(500))
        .build()?;

    cache.get_filtered("Footwear").await?;

    tokio::time::sleep(Duration::from_millis(250)).await;
    // A read within the deadline does not extend it.
    cache.get_filtered("Footwear").await?;
    assert_eq!(store.fetch_where_calls(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    cache.get_filtered("Footwear").await?;
    assert_eq!(store.fetch_where_calls(), 2);
    Ok(())
}
