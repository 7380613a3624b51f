//! End-to-end acquisition flow: raw observation in, validated and
//! deduplicated record out, with counters telling the story.

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use reap::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DESCRIPTION: &str =
    "Spacious craftsman bungalow with updated kitchen and fenced yard";

fn raw_listing() -> RawRecord {
    RawRecord::new()
        .with_field("url", "u1")
        .with_field("price", "$300,000")
        .with_field("address", "  1 Main St \n")
        .with_field("description", DESCRIPTION)
        .with_field("source", "s")
}

#[tokio::test]
async fn test_validate_store_and_reject_stale_resubmission() {
    let stats = Arc::new(PipelineStats::new());
    let store = InMemoryListingStore::new(Arc::clone(&stats));
    let validator = Validator::new(ValidationRules::default()).unwrap();

    // acquisition pass: raw -> validated -> stored as new
    let validated = validator.validate(&raw_listing()).unwrap();
    assert_eq!(validated.price, 300_000.0);
    assert_eq!(validated.address, "1 Main St");

    let first = StoredRecord::from_validated(validated.clone(), "buyer-leads");
    let first_updated_at = first.updated_at;
    assert_eq!(store.upsert(first).await.unwrap(), UpsertOutcome::Inserted);

    // a retried fetch delivers an older snapshot of the same listing
    let mut stale = StoredRecord::from_validated(validated, "buyer-leads");
    stale.price = 295_000.0;
    stale.updated_at = first_updated_at - ChronoDuration::seconds(60);
    assert_eq!(
        store.upsert(stale).await.unwrap(),
        UpsertOutcome::SkippedStale
    );

    // the newer state survived and the duplicate was counted
    let stored = store.get("u1").await.unwrap().unwrap();
    assert_eq!(stored.price, 300_000.0);
    assert_eq!(stored.updated_at, first_updated_at);
    assert_eq!(stats.snapshot().duplicates, 1);
}

#[tokio::test]
async fn test_newer_observation_replaces_stored_record() {
    let stats = Arc::new(PipelineStats::new());
    let store = InMemoryListingStore::new(Arc::clone(&stats));
    let validator = Validator::new(ValidationRules::default()).unwrap();

    let validated = validator.validate(&raw_listing()).unwrap();
    let first = StoredRecord::from_validated(validated.clone(), "buyer-leads");
    let first_updated_at = first.updated_at;
    store.upsert(first).await.unwrap();

    let mut newer = StoredRecord::from_validated(validated, "buyer-leads");
    newer.price = 310_000.0;
    newer.updated_at = first_updated_at + ChronoDuration::seconds(60);
    assert_eq!(store.upsert(newer).await.unwrap(), UpsertOutcome::Updated);

    let stored = store.get("u1").await.unwrap().unwrap();
    assert_eq!(stored.price, 310_000.0);
    assert_eq!(stats.snapshot().duplicates, 0);
}

struct OneShotFetch {
    calls: AtomicU64,
}

#[async_trait]
impl ProviderFetch for OneShotFetch {
    async fn fetch(
        &self,
        _endpoint: &str,
        _params: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({ "call": call }))
    }
}

#[tokio::test]
async fn test_disk_cache_survives_gateway_restart() {
    let dir = tempfile::tempdir().unwrap();
    let fetch = OneShotFetch {
        calls: AtomicU64::new(0),
    };
    let params: BTreeMap<String, String> =
        BTreeMap::from([("zip".to_string(), "78701".to_string())]);

    {
        let stats = Arc::new(PipelineStats::new());
        let cache = Arc::new(FsCacheStore::new(dir.path()).await.unwrap());
        let gateway = CachingGateway::new(
            cache,
            vec![ProviderConfig::new("attom")],
            stats,
        );
        gateway
            .fetch("attom", "/listings", &params, &fetch)
            .await
            .unwrap();
    }

    // a fresh gateway over the same directory, as after a process restart
    let stats = Arc::new(PipelineStats::new());
    let cache = Arc::new(FsCacheStore::new(dir.path()).await.unwrap());
    let gateway =
        CachingGateway::new(cache, vec![ProviderConfig::new("attom")], stats);
    let payload = gateway
        .fetch("attom", "/listings", &params, &fetch)
        .await
        .unwrap();

    assert_eq!(payload, serde_json::json!({ "call": 0 }));
    assert_eq!(fetch.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.stats().cache_hits, 1);
}

#[tokio::test]
async fn test_corrupt_cache_entry_degrades_to_live_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let params = BTreeMap::new();
    let key = CacheKey::new("attom", "/listings", &params);

    let provider_dir = dir.path().join("attom");
    std::fs::create_dir_all(&provider_dir).unwrap();
    std::fs::write(
        provider_dir.join(format!("{}.json", key.digest())),
        b"{ truncated",
    )
    .unwrap();

    let stats = Arc::new(PipelineStats::new());
    let cache = Arc::new(FsCacheStore::new(dir.path()).await.unwrap());
    let gateway = CachingGateway::new(
        cache,
        vec![ProviderConfig::new("attom")],
        Arc::clone(&stats),
    );
    let fetch = OneShotFetch {
        calls: AtomicU64::new(0),
    };

    let payload = gateway
        .fetch("attom", "/listings", &params, &fetch)
        .await
        .unwrap();

    assert_eq!(payload, serde_json::json!({ "call": 0 }));
    let snap = stats.snapshot();
    assert_eq!(snap.cache_errors, 1);
    // the refreshed entry replaced the corrupt one
    assert_eq!(
        gateway
            .fetch("attom", "/listings", &params, &fetch)
            .await
            .unwrap(),
        serde_json::json!({ "call": 0 })
    );
}
