//! Client for Upstash-style Redis REST endpoints.
//!
//! Every command is sent as `POST {base_url}` with the command encoded as a
//! JSON array, e.g. `["INCR", "pageviews:my-post"]`. The endpoint replies
//! with `{"result": ...}` on success or `{"error": "..."}` on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::store::{CounterStore, StoreError};

/// Endpoint and access token for a REST counter store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCredentials {
    pub url: Url,
    pub token: String,
}

impl StoreCredentials {
    /// Parse a raw endpoint URL and token. Only http(s) endpoints are accepted.
    pub fn parse(raw_url: &str, token: &str) -> anyhow::Result<Self> {
        let url = Url::parse(raw_url.trim())
            .map_err(|err| anyhow::anyhow!("invalid counter store URL: {err}"))?;

        match url.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!("counter store URL must be http(s), got `{other}`"),
        }

        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("counter store token is empty");
        }

        Ok(Self {
            url,
            token: token.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct UpstashStore {
    client: reqwest::Client,
    credentials: StoreCredentials,
}

impl UpstashStore {
    pub fn new(credentials: StoreCredentials, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build counter store client: {err}"))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    async fn command(&self, args: Vec<String>) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(self.credentials.url.clone())
            .bearer_auth(&self.credentials.token)
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: CommandReply = response.json().await?;
        if let Some(message) = reply.error {
            return Err(StoreError::Command(message));
        }
        Ok(reply.result)
    }
}

#[async_trait]
impl CounterStore for UpstashStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let result = self.command(vec!["GET".into(), key.into()]).await?;
        decode_optional_int(&result)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push("MGET".to_string());
        args.extend(keys.iter().cloned());

        let result = self.command(args).await?;
        let Value::Array(items) = result else {
            return Err(StoreError::Decode(format!("MGET expected array, got {result}")));
        };
        if items.len() != keys.len() {
            return Err(StoreError::Decode(format!(
                "MGET returned {} values for {} keys",
                items.len(),
                keys.len()
            )));
        }
        items.iter().map(decode_optional_int).collect()
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let result = self.command(vec!["INCR".into(), key.into()]).await?;
        decode_optional_int(&result)?
            .ok_or_else(|| StoreError::Decode("INCR returned null".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.command(vec!["PING".into()]).await.map(|_| ())
    }
}

/// Counter values arrive as JSON numbers from INCR and as strings from GET/MGET.
fn decode_optional_int(value: &Value) -> Result<Option<i64>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| StoreError::Decode(format!("non-integer counter {n}"))),
        Value::String(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::Decode(format!("non-integer counter {s:?}"))),
        other => Err(StoreError::Decode(format!("unexpected counter value {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::json;
    use std::sync::Arc;

    const TOKEN: &str = "secret-token";

    // Speaks just enough of the REST protocol to exercise the client.
    async fn fake_endpoint(
        State(store): State<Arc<MemoryStore>>,
        headers: HeaderMap,
        Json(args): Json<Vec<String>>,
    ) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TOKEN}"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
        }

        let reply = match args.first().map(String::as_str) {
            Some("PING") => json!({"result": "PONG"}),
            Some("INCR") => json!({"result": store.incr(&args[1]).await.unwrap()}),
            Some("GET") => match store.get(&args[1]).await.unwrap() {
                Some(v) => json!({"result": v.to_string()}),
                None => json!({"result": null}),
            },
            Some("MGET") => {
                let values = store.mget(&args[1..]).await.unwrap();
                let values: Vec<Value> = values
                    .into_iter()
                    .map(|v| v.map_or(Value::Null, |v| Value::String(v.to_string())))
                    .collect();
                json!({"result": values})
            }
            _ => json!({"error": "ERR unknown command"}),
        };
        (StatusCode::OK, Json(reply))
    }

    async fn spawn_fake(store: Arc<MemoryStore>) -> Url {
        let app = Router::new()
            .route("/", post(fake_endpoint))
            .with_state(store);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn client(url: Url, token: &str) -> UpstashStore {
        let credentials = StoreCredentials {
            url,
            token: token.to_string(),
        };
        UpstashStore::new(credentials, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_credentials_require_http_scheme() {
        assert!(StoreCredentials::parse("https://example.upstash.io", "t").is_ok());
        assert!(StoreCredentials::parse("redis://example:6379", "t").is_err());
        assert!(StoreCredentials::parse("not a url", "t").is_err());
    }

    #[test]
    fn test_credentials_reject_blank_token() {
        assert!(StoreCredentials::parse("https://example.upstash.io", "  ").is_err());
    }

    #[test]
    fn test_decode_optional_int() {
        assert_eq!(decode_optional_int(&json!(null)).unwrap(), None);
        assert_eq!(decode_optional_int(&json!(7)).unwrap(), Some(7));
        assert_eq!(decode_optional_int(&json!("42")).unwrap(), Some(42));
        assert!(decode_optional_int(&json!("abc")).is_err());
        assert!(decode_optional_int(&json!([1])).is_err());
    }

    #[tokio::test]
    async fn test_incr_get_and_mget_over_http() {
        let store = Arc::new(MemoryStore::with_counts([("pageviews:c", 30)]));
        let url = spawn_fake(store).await;
        let upstash = client(url, TOKEN);

        assert_eq!(upstash.incr("pageviews:a").await.unwrap(), 1);
        assert_eq!(upstash.incr("pageviews:a").await.unwrap(), 2);
        assert_eq!(upstash.get("pageviews:a").await.unwrap(), Some(2));
        assert_eq!(upstash.get("pageviews:missing").await.unwrap(), None);

        let keys = vec![
            "pageviews:a".to_string(),
            "pageviews:b".to_string(),
            "pageviews:c".to_string(),
        ];
        assert_eq!(
            upstash.mget(&keys).await.unwrap(),
            vec![Some(2), None, Some(30)]
        );
        upstash.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_token_surfaces_status_error() {
        let url = spawn_fake(Arc::new(MemoryStore::new())).await;
        let upstash = client(url, "wrong");

        let err = upstash.incr("pageviews:a").await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstash = client(Url::parse(&format!("http://{addr}/")).unwrap(), TOKEN);
        let err = upstash.get("pageviews:a").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
