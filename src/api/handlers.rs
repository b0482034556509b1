//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint. Every handler runs its
//! cache call under a context bounded by the configured request timeout.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::api::ApiError;
use crate::cache::Cache;
use crate::client::Ttl;
use crate::context::Context;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, PurgeResponse, SetRequest, SetResponse,
    TtlResponse,
};
use crate::transport::Transport;

/// Application state shared across all handlers.
pub struct AppState<T: Transport> {
    /// Cache facade; clones share the underlying transport
    pub cache: Cache<T>,
    /// Deadline applied to each request's cache call
    pub request_timeout: Duration,
}

impl<T: Transport> AppState<T> {
    pub fn new(cache: Cache<T>, request_timeout: Duration) -> Self {
        Self {
            cache,
            request_timeout,
        }
    }

    fn context(&self) -> Context {
        Context::background().with_timeout(self.request_timeout)
    }
}

impl<T: Transport> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value, with a TTL in seconds when `ttl` is given.
pub async fn set_handler<T: Transport>(
    State(state): State<AppState<T>>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, ApiError> {
    let ctx = state.context();
    match req.ttl {
        Some(secs) => {
            state
                .cache
                .set_ttl(&ctx, &req.key, &req.value, Duration::from_secs(secs))
                .await?
        }
        None => state.cache.set(&ctx, &req.key, &req.value).await?,
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler<T: Transport>(
    State(state): State<AppState<T>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let value: Option<Value> = state.cache.get(&state.context(), &key).await?;
    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler<T: Transport>(
    State(state): State<AppState<T>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.cache.remove(&state.context(), &key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /purge
pub async fn purge_handler<T: Transport>(
    State(state): State<AppState<T>>,
) -> Result<Json<PurgeResponse>, ApiError> {
    state.cache.purge(&state.context()).await?;
    Ok(Json(PurgeResponse::new()))
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler<T: Transport>(
    State(state): State<AppState<T>>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>, ApiError> {
    match state.cache.ttl(&state.context(), &key).await? {
        Ttl::Missing => Err(ApiError::NotFound(key)),
        ttl => Ok(Json(TtlResponse::new(key, ttl))),
    }
}

/// Handler for GET /health
///
/// Pings the store; answers 503 when it cannot be reached.
pub async fn health_handler<T: Transport>(
    State(state): State<AppState<T>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.cache.ping(&state.context()).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy())),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(e.to_string())),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::trace::MockTracer;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn test_state() -> AppState<MemoryTransport> {
        let client = Client::new(MemoryTransport::new(), Arc::new(MockTracer::new()));
        AppState::new(Cache::from_client(client), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"name": "test_value"}),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"name": "test_value"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "to_delete".to_string(),
            value: json!("value"),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        // Deleting again is still a success
        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_set_empty_key() {
        let state = test_state();

        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        assert!(set_handler(State(state.clone()), Json(req)).await.is_ok());
        let value: Option<Value> = state
            .cache
            .get(&Context::background(), "")
            .await
            .unwrap();
        assert_eq!(value, Some(json!("value")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "session".to_string(),
            value: json!(1),
            ttl: Some(30),
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let response = ttl_handler(State(state.clone()), Path("session".to_string()))
            .await
            .unwrap();
        assert_eq!(response.ttl, Some(30));

        let result = ttl_handler(State(state), Path("absent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_purge_handler() {
        let state = test_state();
        state
            .cache
            .set(&Context::background(), "a", "1")
            .await
            .unwrap();

        purge_handler(State(state.clone())).await.unwrap();
        let result = get_handler(State(state), Path("a".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state();
        let (status, response) = health_handler(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status, "healthy");

        state.cache.client().transport().set_unavailable(Some("down"));
        let (status, response) = health_handler(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, "unhealthy");
    }
}
