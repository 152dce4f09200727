//! Config repository integration tests
//!
//! Runs the repository against the in-memory store with fault injection,
//! the moka cache, and broker doubles.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use prost::Message;
use tamarind_common::{CacheError, ConfigError, Outcome, StoreError, operation};
use tamarind_config::service::cache::{CACHE_TTL, cache_key};
use tamarind_config::{AuditLog, UpdateConfigIn};
use tamarind_persistence::{CacheClient, DocumentStore};

use common::{
    CacheMode, FailingBroker, Harness, RecordingBroker, TestStore, config_in, details, payload,
};

#[tokio::test]
async fn test_insert_then_get_by_name() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);

    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(inserted.version, 1);

    let doc = h
        .repo
        .get("db-creds", Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(doc.config_id, inserted.config_id);
    assert_eq!(doc.version, 1);
    assert_eq!(doc.payload, payload("x"));
}

#[tokio::test]
async fn test_repeat_insert_bumps_version_in_scope() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let first = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();
    h.repo
        .get("db-creds", Some("host1"), &details())
        .await
        .unwrap();

    let second = h
        .repo
        .insert(config_in("db-creds", "alice", "y"), Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(second.config_id, first.config_id);
    assert_eq!(second.version, 2);

    let doc = h
        .repo
        .get("db-creds", Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.payload, payload("y"));

    let by_id = h
        .repo
        .get(&first.config_id, Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(by_id.version, 2);
}

#[tokio::test]
async fn test_scopes_are_versioned_independently() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let a = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();
    let b = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host2"), &details())
        .await
        .unwrap();
    let c = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();

    assert_eq!((a.version, b.version, c.version), (1, 1, 1));
    assert_ne!(a.config_id, b.config_id);
    assert_ne!(a.config_id, c.config_id);
    assert_eq!(h.store.inner.head_count(), 3);
}

#[tokio::test]
async fn test_get_missing_is_not_found_and_not_cached() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);

    let err = h
        .repo
        .get("nonexistent", Some("host1"), &details())
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::NotFound("nonexistent".to_string()));
    assert_eq!(err.outcome(), Outcome::NotFound);

    let cache = h.cache.as_ref().unwrap();
    assert!(!cache.contains_key(&cache_key("nonexistent", Some("host1"))));
}

#[tokio::test]
async fn test_get_with_wrong_host_is_not_found() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();

    let err = h
        .repo
        .get(&inserted.config_id, Some("host2"), &details())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[tokio::test]
async fn test_cached_name_does_not_leak_into_other_host_scope() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    h.repo
        .insert(config_in("db_hostA", "mallory", "evil"), Some("hostB"), &details())
        .await
        .unwrap();

    // Host-agnostic read caches the hostB document under its name
    let agnostic = h.repo.get("db_hostA", None, &details()).await.unwrap();
    assert_eq!(agnostic.host.as_deref(), Some("hostB"));

    let err = h
        .repo
        .get("db", Some("hostA"), &details())
        .await
        .unwrap_err();
    assert_eq!(err, ConfigError::NotFound("db".to_string()));
}

#[tokio::test]
async fn test_empty_identifier_is_rejected() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let err = h.repo.get("", None, &details()).await.unwrap_err();
    assert_eq!(err.outcome(), Outcome::BadRequest);
    assert_eq!(h.store.find_calls(), 0);
}

#[tokio::test]
async fn test_insert_rejects_malformed_config_name() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);

    for name in ["bad name!", "svc/db", "$where"] {
        let err = h
            .repo
            .insert(config_in(name, "alice", "x"), Some("host1"), &details())
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{}", name);
        assert_eq!(err.outcome(), Outcome::BadRequest);
    }
    assert_eq!(h.store.find_calls(), 0);
    assert_eq!(h.store.inner.head_count(), 0);
}

#[tokio::test]
async fn test_repeated_gets_are_identical() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();

    let first = h.repo.get(&inserted.config_id, None, &details()).await.unwrap();
    for _ in 0..3 {
        let again = h.repo.get(&inserted.config_id, None, &details()).await.unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(h.store.inner.version_count(), 1);
}

#[tokio::test]
async fn test_disabled_cache_always_reads_store() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();
    let after_insert = h.store.find_calls();

    for _ in 0..3 {
        h.repo.get(&inserted.config_id, None, &details()).await.unwrap();
    }
    assert_eq!(h.store.find_calls(), after_insert + 3);
}

#[tokio::test]
async fn test_enabled_cache_serves_writer_reads() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();
    let after_insert = h.store.find_calls();

    h.repo
        .get(&inserted.config_id, Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(h.store.find_calls(), after_insert);
}

#[tokio::test]
async fn test_cache_does_not_change_results() {
    let cached = Harness::new(TestStore::new(), CacheMode::Moka);
    let uncached = Harness::new(TestStore::new(), CacheMode::Disabled);

    let mut body = config_in("db-creds", "alice", "x");
    body.config
        .insert("pool".to_string(), serde_json::json!({"min": 1, "max": 8, "ratio": 0.5}));
    body.parents = vec!["base".to_string()];

    let a = cached.repo.insert(body.clone(), None, &details()).await.unwrap();
    let b = uncached.repo.insert(body.clone(), None, &details()).await.unwrap();

    let from_cache = cached.repo.get(&a.config_id, None, &details()).await.unwrap();
    let from_store = uncached.repo.get(&b.config_id, None, &details()).await.unwrap();

    assert_eq!(from_cache.payload, body.config);
    assert_eq!(from_cache.payload, from_store.payload);
    assert_eq!(from_cache.parents, from_store.parents);
    assert_eq!(from_cache.version, from_store.version);
}

#[tokio::test]
async fn test_unreachable_cache_falls_back_to_store() {
    let h = Harness::new(TestStore::new(), CacheMode::Failing);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();

    let doc = h.repo.get(&inserted.config_id, None, &details()).await.unwrap();
    assert_eq!(doc.payload, payload("x"));
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_surfaced() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let cache = h.cache.clone().unwrap();
    cache
        .set(&cache_key("db-creds", None), "@@not-base64@@".to_string(), CACHE_TTL)
        .await
        .unwrap();

    let err = h.repo.get("db-creds", None, &details()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Cache(CacheError::Corrupt(_))));
    assert_eq!(err.outcome(), Outcome::Internal);
}

#[tokio::test]
async fn test_list_rejects_non_numeric_paging() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    h.repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();

    let err = h
        .repo
        .list(Some("abc"), Some("10"), &details())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert_eq!(err.outcome(), Outcome::BadRequest);
}

#[tokio::test]
async fn test_list_clamps_limit() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    for i in 0..120 {
        h.repo
            .insert(config_in(&format!("cfg-{}", i), "alice", "x"), None, &details())
            .await
            .unwrap();
    }

    let over = h.repo.list(Some("0"), Some("150"), &details()).await.unwrap();
    let max = h.repo.list(Some("0"), Some("100"), &details()).await.unwrap();
    assert_eq!(over.len(), 100);
    assert_eq!(over, max);

    let defaulted = h.repo.list(None, None, &details()).await.unwrap();
    assert_eq!(defaulted, max);

    let tail = h.repo.list(Some("100"), Some("50"), &details()).await.unwrap();
    assert_eq!(tail.len(), 20);
}

#[tokio::test]
async fn test_update_by_id_appends_version() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();

    let update = UpdateConfigIn {
        config_name: Some("db-creds".to_string()),
        requester: "bob".to_string(),
        config: payload("z"),
        parents: Some(vec!["base".to_string()]),
    };
    let outcome = h
        .repo
        .update_by_id(&inserted.config_id, update, &details())
        .await
        .unwrap();
    assert_eq!(outcome.version, 2);
    assert_eq!(outcome.head.matched, 1);

    let doc = h
        .repo
        .get(&inserted.config_id, Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.payload, payload("z"));
    assert_eq!(doc.parents, vec!["base".to_string()]);

    let history = h.repo.history(&inserted.config_id, &details()).await.unwrap();
    let versions: Vec<i64> = history.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![1, 2]);
    assert_eq!(history[1].created_by, "bob");
}

#[tokio::test]
async fn test_update_missing_config_is_not_found() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let err = h
        .repo
        .update_by_id(
            "6f1c2a4e-7b3d-4c1e-9a2b-0123456789ab",
            UpdateConfigIn::default(),
            &details(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
    assert_eq!(h.store.inner.version_count(), 0);
}

#[tokio::test]
async fn test_update_cannot_rename() {
    let h = Harness::new(TestStore::new(), CacheMode::Disabled);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();

    let update = UpdateConfigIn {
        config_name: Some("other".to_string()),
        requester: "bob".to_string(),
        config: payload("z"),
        parents: None,
    };
    let err = h
        .repo
        .update_by_id(&inserted.config_id, update, &details())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[tokio::test]
async fn test_cache_is_stale_after_update_by_id() {
    let h = Harness::new(TestStore::new(), CacheMode::Moka);
    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
        .await
        .unwrap();

    let update = UpdateConfigIn {
        requester: "bob".to_string(),
        config: payload("z"),
        ..UpdateConfigIn::default()
    };
    h.repo
        .update_by_id(&inserted.config_id, update, &details())
        .await
        .unwrap();

    // The writer's cached snapshot still answers until its TTL runs out
    let cached = h
        .repo
        .get(&inserted.config_id, Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(cached.version, 1);
    assert_eq!(cached.payload, payload("x"));

    let stored = h
        .store
        .inner
        .find_one(&tamarind_persistence::ConfigFilter::by_id(
            &inserted.config_id,
            None,
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.version, 2);

    // A later insert into the same scope refreshes the snapshot
    h.repo
        .insert(config_in("db-creds", "alice", "w"), Some("host1"), &details())
        .await
        .unwrap();
    let refreshed = h
        .repo
        .get(&inserted.config_id, Some("host1"), &details())
        .await
        .unwrap();
    assert_eq!(refreshed.version, 3);
}

#[tokio::test]
async fn test_failed_version_append_may_leave_head_committed() {
    let store = TestStore::new();
    store.fail_version_append.store(true, Ordering::SeqCst);
    let h = Harness::new(store, CacheMode::Moka);

    let err = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Store(StoreError::Backend(_))));
    assert_eq!(err.outcome(), Outcome::Internal);

    assert_eq!(h.store.inner.head_count(), 1);
    assert_eq!(h.store.inner.version_count(), 0);
    // Nothing cached for a failed write
    assert_eq!(h.cache.as_ref().unwrap().entry_count(), 0);
}

#[tokio::test]
async fn test_failed_head_upsert_may_leave_version_committed() {
    let store = TestStore::new();
    store.fail_head_update.store(true, Ordering::SeqCst);
    let h = Harness::new(store, CacheMode::Disabled);

    let err = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Store(_)));

    assert_eq!(h.store.inner.head_count(), 0);
    assert_eq!(h.store.inner.version_count(), 1);
}

#[tokio::test]
async fn test_concurrent_first_inserts_both_claim_version_one() {
    // Both inserts read the scope before either writes
    let h = Harness::new(TestStore::with_find_barrier(2), CacheMode::Disabled);
    let details = details();

    let (a, b) = tokio::join!(
        h.repo
            .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details),
        h.repo
            .insert(config_in("db-creds", "bob", "y"), Some("host1"), &details),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.version, 1);
    assert_eq!(b.version, 1);
    assert_ne!(a.config_id, b.config_id);

    // One head survives; both version records were appended
    assert_eq!(h.store.inner.head_count(), 1);
    assert_eq!(h.store.inner.version_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_hits_deadline() {
    let h = Harness::new(
        TestStore::with_find_delay(Duration::from_secs(30)),
        CacheMode::Disabled,
    );

    let err = h
        .repo
        .get("db-creds", None, &details())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::Store(StoreError::Timeout(Duration::from_secs(1)))
    );
}

#[tokio::test]
async fn test_failing_broker_does_not_change_outcomes() {
    let quiet = Harness::new(TestStore::new(), CacheMode::Moka);
    let noisy = Harness::with_broker(TestStore::new(), CacheMode::Moka, Arc::new(FailingBroker));

    for h in [&quiet, &noisy] {
        let inserted = h
            .repo
            .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
            .await
            .unwrap();
        assert_eq!(inserted.version, 1);

        let doc = h
            .repo
            .get("db-creds", Some("host1"), &details())
            .await
            .unwrap();
        assert_eq!(doc.payload, payload("x"));

        assert!(matches!(
            h.repo.get("nonexistent", None, &details()).await,
            Err(ConfigError::NotFound(_))
        ));
        assert!(matches!(
            h.repo.list(Some("abc"), Some("10"), &details()).await,
            Err(ConfigError::Validation(_))
        ));
        assert_eq!(h.repo.list(None, None, &details()).await.unwrap().len(), 1);
    }

    let common::Harness { repo, workers, .. } = noisy;
    drop(repo);
    let stats = workers.unwrap().join().await;
    assert_eq!(stats.failed(), 5);
    assert_eq!(stats.delivered(), 0);
}

#[tokio::test]
async fn test_audit_fires_before_failed_write() {
    let broker = Arc::new(RecordingBroker::default());
    let store = TestStore::new();
    store.fail_version_append.store(true, Ordering::SeqCst);
    store.fail_head_update.store(true, Ordering::SeqCst);
    let h = Harness::with_broker(store, CacheMode::Disabled, broker.clone());

    assert!(
        h.repo
            .insert(config_in("db-creds", "alice", "x"), Some("host1"), &details())
            .await
            .is_err()
    );

    let common::Harness { repo, workers, .. } = h;
    drop(repo);
    workers.unwrap().join().await;

    let messages = broker.messages.lock();
    assert_eq!(messages.len(), 1);
    let (topic, bytes) = &messages[0];
    assert_eq!(topic, "config.audit");

    let log = AuditLog::decode(bytes.as_slice()).unwrap();
    assert_eq!(log.func_name, operation::INSERT_CONFIG);
    assert_eq!(log.service, "tamarind");
    let fields = log.message.unwrap().fields;
    assert!(fields.contains_key("config_name"));
    assert!(fields.contains_key("host"));
    assert!(fields.contains_key("request.method"));
    assert!(fields.contains_key("parents"));

    let config = match fields["config"].kind.as_ref() {
        Some(prost_types::value::Kind::StringValue(rendered)) => rendered.clone(),
        other => panic!("config not rendered as text: {:?}", other),
    };
    assert!(config.contains("url"));
}

#[tokio::test]
async fn test_every_operation_emits_one_event() {
    let broker = Arc::new(RecordingBroker::default());
    let h = Harness::with_broker(TestStore::new(), CacheMode::Moka, broker.clone());

    let inserted = h
        .repo
        .insert(config_in("db-creds", "alice", "x"), None, &details())
        .await
        .unwrap();
    h.repo.get(&inserted.config_id, None, &details()).await.unwrap();
    h.repo.list(None, None, &details()).await.unwrap();
    h.repo
        .update_by_id(&inserted.config_id, UpdateConfigIn::default(), &details())
        .await
        .unwrap();
    h.repo.history(&inserted.config_id, &details()).await.unwrap();

    let common::Harness { repo, workers, .. } = h;
    drop(repo);
    workers.unwrap().join().await;

    let mut operations: Vec<String> = broker
        .messages
        .lock()
        .iter()
        .map(|(_, bytes)| AuditLog::decode(bytes.as_slice()).unwrap().func_name)
        .collect();
    operations.sort();
    assert_eq!(
        operations,
        vec![
            operation::GET_CONFIG,
            operation::GET_CONFIG_HISTORY,
            operation::GET_CONFIGS,
            operation::INSERT_CONFIG,
            operation::UPDATE_CONFIG_BY_ID,
        ]
    );
}
