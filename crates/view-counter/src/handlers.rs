use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::ViewCounterError;
use crate::service::IncrementOutcome;
use crate::state::ViewCounterState;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewsResponse {
    pub views: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SlugViewsResponse {
    pub slug: String,
    pub views: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BatchViewsResponse {
    pub views: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Comma separated slugs.
    #[serde(default)]
    pub slugs: Option<String>,
}

/// Routes for reading and recording views, mounted under `/api/views`.
pub fn router<S: ViewCounterState>() -> Router<S> {
    Router::new()
        .route("/api/views", post(record_view::<S>).get(batch_views::<S>))
        .route("/api/views/{slug}", get(slug_views::<S>))
}

/// Record one view. The body is `{"slug": ...}`; anything that does not
/// normalize to a slug is rejected before the store is touched.
pub async fn record_view<S: ViewCounterState>(
    State(state): State<S>,
    body: Bytes,
) -> Result<Json<ViewsResponse>, ViewCounterError> {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let slug = payload
        .get("slug")
        .and_then(|raw| state.normalize_slug(raw))
        .ok_or(ViewCounterError::InvalidSlug)?;

    match state.views().increment(&slug).await {
        IncrementOutcome::Counted(views) => Ok(Json(ViewsResponse { views })),
        IncrementOutcome::Disabled => Ok(Json(ViewsResponse { views: 0 })),
        IncrementOutcome::Failed => Err(ViewCounterError::RecordFailed),
    }
}

pub async fn slug_views<S: ViewCounterState>(
    State(state): State<S>,
    Path(raw): Path<String>,
) -> Result<Json<SlugViewsResponse>, ViewCounterError> {
    let slug = state
        .normalize_slug(&Value::String(raw))
        .ok_or(ViewCounterError::InvalidSlug)?;
    let views = state.views().get(&slug).await;
    Ok(Json(SlugViewsResponse { slug, views }))
}

pub async fn batch_views<S: ViewCounterState>(
    State(state): State<S>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<BatchViewsResponse>, ViewCounterError> {
    let raw = query.slugs.unwrap_or_default();
    let slugs = raw
        .split(',')
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            state
                .normalize_slug(&Value::String(piece.to_string()))
                .ok_or(ViewCounterError::InvalidSlug)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let views = state.views().get_many(&slugs).await;
    Ok(Json(BatchViewsResponse { views }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::service::ViewCounter;
    use crate::store::{CounterStore, StoreError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::net::SocketAddr;
    use std::sync::Arc;

    #[derive(Clone)]
    struct TestState {
        views: ViewCounter,
    }

    impl ViewCounterState for TestState {
        fn views(&self) -> &ViewCounter {
            &self.views
        }

        fn normalize_slug(&self, raw: &Value) -> Option<String> {
            let slug = raw.as_str()?.trim().to_ascii_lowercase();
            let ok = !slug.is_empty()
                && slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            ok.then_some(slug)
        }
    }

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<i64>, StoreError> {
            Err(StoreError::Command("down".into()))
        }

        async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
            Err(StoreError::Command("down".into()))
        }

        async fn incr(&self, _key: &str) -> Result<i64, StoreError> {
            Err(StoreError::Command("down".into()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Command("down".into()))
        }
    }

    async fn serve(views: ViewCounter) -> SocketAddr {
        let app = router().with_state(TestState { views });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn post_slug(addr: SocketAddr, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/views"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_record_view_counts_up() {
        let addr = serve(ViewCounter::new(Arc::new(MemoryStore::new()), "pageviews")).await;

        let first = post_slug(addr, json!({"slug": "my-post"})).await;
        assert_eq!(first, (200, json!({"views": 1})));

        let second = post_slug(addr, json!({"slug": "My-Post"})).await;
        assert_eq!(second, (200, json!({"views": 2})));
    }

    #[tokio::test]
    async fn test_record_view_rejects_bad_input() {
        let addr = serve(ViewCounter::new(Arc::new(MemoryStore::new()), "pageviews")).await;
        let invalid = (400, json!({"error": "Invalid slug"}));

        assert_eq!(post_slug(addr, json!({"slug": "../etc"})).await, invalid);
        assert_eq!(post_slug(addr, json!({"slug": 42})).await, invalid);
        assert_eq!(post_slug(addr, json!({})).await, invalid);
    }

    #[tokio::test]
    async fn test_record_view_disabled_is_zero() {
        let addr = serve(ViewCounter::disabled()).await;
        let response = post_slug(addr, json!({"slug": "a"})).await;
        assert_eq!(response, (200, json!({"views": 0})));
    }

    #[tokio::test]
    async fn test_record_view_store_failure_is_500() {
        let addr = serve(ViewCounter::new(Arc::new(DownStore), "pageviews")).await;
        assert_eq!(
            post_slug(addr, json!({"slug": "a"})).await,
            (500, json!({"error": "Failed to record view"}))
        );
    }

    #[tokio::test]
    async fn test_batch_and_single_reads() {
        let store = MemoryStore::with_counts([("pageviews:a", 10), ("pageviews:c", 30)]);
        let addr = serve(ViewCounter::new(Arc::new(store), "pageviews")).await;
        let client = reqwest::Client::new();

        let batch: BatchViewsResponse = client
            .get(format!("http://{addr}/api/views?slugs=a,b,c"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            batch.views,
            HashMap::from([
                ("a".to_string(), 10),
                ("b".to_string(), 0),
                ("c".to_string(), 30),
            ])
        );

        let single: SlugViewsResponse = client
            .get(format!("http://{addr}/api/views/c"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(single, SlugViewsResponse { slug: "c".into(), views: 30 });

        let empty: BatchViewsResponse = client
            .get(format!("http://{addr}/api/views"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(empty.views.is_empty());

        let rejected = client
            .get(format!("http://{addr}/api/views?slugs=a,b%2Fc"))
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 400);
    }
}
