//! Live Redis Integration Tests
//!
//! Require a reachable Redis server; run with
//! `REDIS_ADDRESS=localhost:6379 cargo test -- --ignored`.
//! Each test uses its own key prefix, except the purge test which flushes the
//! selected database.

use std::sync::Arc;
use std::time::Duration;

use traced_cache::trace::TagValue;
use traced_cache::{Cache, CacheError, Context, MockTracer, TransportOptions, Ttl};

fn options() -> TransportOptions {
    let address = std::env::var("REDIS_ADDRESS").unwrap_or_else(|_| "localhost:6379".to_string());
    TransportOptions::new(address)
}

async fn connect() -> (Cache, MockTracer) {
    let tracer = MockTracer::new();
    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    let cache = Cache::connect(&ctx, &options(), Arc::new(tracer.clone()))
        .await
        .expect("redis must be reachable for integration tests");
    (cache, tracer)
}

#[tokio::test]
#[ignore]
async fn test_new_and_ping() {
    let (cache, tracer) = connect().await;
    cache.ping(&Context::background()).await.unwrap();

    let spans = tracer.finished_spans();
    assert_eq!(spans.len(), 2);
    assert_eq!(
        spans[0].tag("db.instance"),
        Some(&TagValue::from(options().address))
    );
}

#[tokio::test]
#[ignore]
async fn test_set_get_remove() {
    let (cache, _) = connect().await;
    let ctx = Context::background();

    let cases = [
        ("it:set:empty-value", ""),
        ("it:set:existing", "newval"),
        ("it:set:absent", "set"),
    ];
    for (key, value) in cases {
        cache.set(&ctx, key, value).await.unwrap();
        let got: Option<String> = cache.get(&ctx, key).await.unwrap();
        assert_eq!(got.as_deref(), Some(value), "{}", key);

        cache.remove(&ctx, key).await.unwrap();
        let got: Option<String> = cache.get(&ctx, key).await.unwrap();
        assert!(got.is_none(), "{}", key);
    }
}

#[tokio::test]
#[ignore]
async fn test_set_ttl() {
    let (cache, _) = connect().await;
    let ctx = Context::background();

    cache
        .set_ttl(&ctx, "it:testTTL", "short", Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(
        cache.ttl(&ctx, "it:testTTL").await.unwrap(),
        Ttl::Expires(Duration::from_secs(10))
    );
    cache.remove(&ctx, "it:testTTL").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_purge() {
    let (cache, _) = connect().await;
    let ctx = Context::background();

    cache.set(&ctx, "it:purge", "value").await.unwrap();
    cache.purge(&ctx).await.unwrap();
    let got: Option<String> = cache.get(&ctx, "it:purge").await.unwrap();
    assert!(got.is_none());
}

#[tokio::test]
#[ignore]
async fn test_close() {
    let (cache, _) = connect().await;
    let ctx = Context::background();

    cache.close(&ctx).await.unwrap();
    let err = cache.ping(&ctx).await.unwrap_err();
    assert!(matches!(err, CacheError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_store_fails_with_transport_error() {
    let tracer = MockTracer::new();
    let mut options = TransportOptions::new("127.0.0.1:1");
    options.connect_timeout = Duration::from_millis(200);
    let cache = Cache::new(&options, Arc::new(tracer.clone())).unwrap();

    let ctx = Context::background().with_timeout(Duration::from_secs(2));
    let err = cache.get::<String>(&ctx, "test").await.unwrap_err();
    assert!(err.is_transport());

    let spans = tracer.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].tag("error"), Some(&TagValue::Bool(true)));
}
