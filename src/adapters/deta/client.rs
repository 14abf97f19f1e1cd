//! Deta Base HTTP client
//!
//! [`DetaBaseApi`] is the per-base seam the model talks through;
//! [`DetaBase`] implements it over the Base HTTP API
//! (`{endpoint}/{project_id}/{base}/items`, `/query`).

use super::query::DetaCondition;
use crate::config::{DetaConfig, SecretString};
use crate::domain::{DetaError, DittormError, Record, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// One page of a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPage {
    pub items: Vec<Record>,
    /// Key to resume from; `None` once the query is exhausted
    pub last: Option<String>,
}

/// Operations the Deta model needs from one base
#[async_trait]
pub trait DetaBaseApi: Send + Sync {
    /// Base (table) name
    fn name(&self) -> &str;

    /// Item by key, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Record>>;

    /// One page of items matching `condition`, in ascending key order
    ///
    /// `limit` of `None` lets the service pick the page size; `last` resumes
    /// after that key.
    async fn fetch(
        &self,
        condition: &DetaCondition,
        limit: Option<usize>,
        last: Option<&str>,
    ) -> Result<FetchPage>;

    /// Insert or replace the item stored under its `key` field
    async fn put(&self, item: Record) -> Result<Record>;

    /// Delete by key; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    paging: Paging,
    #[serde(default)]
    items: Vec<Record>,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    last: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    processed: Option<ItemList>,
    #[serde(default)]
    failed: Option<ItemList>,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<Record>,
}

/// Project-level connection to Deta Base
///
/// # Example
///
/// ```no_run
/// use dittorm::adapters::deta::{DetaBaseApi, DetaClient};
/// use dittorm::config::{secret_string, DetaConfig};
///
/// # async fn example() -> dittorm::domain::Result<()> {
/// let config = DetaConfig {
///     project_key: secret_string("a0abcyxz_secret".to_string()),
///     endpoint: "https://database.deta.sh/v1".to_string(),
///     timeout_seconds: 30,
/// };
///
/// let comments = DetaClient::connect(&config)?.base("Comment");
/// let item = comments.get("9007199254740900").await?;
/// # Ok(())
/// # }
/// ```
pub struct DetaClient {
    endpoint: String,
    project_id: String,
    project_key: SecretString,
    client: Client,
}

impl DetaClient {
    /// Build a client from the project key
    ///
    /// # Errors
    ///
    /// Returns [`DittormError::Configuration`] if the project key has no
    /// project ID prefix, or [`DetaError::ConnectionFailed`] if the HTTP
    /// client cannot be built.
    pub fn connect(config: &DetaConfig) -> Result<Self> {
        let project_id = config
            .project_key
            .expose_secret()
            .as_str()
            .split('_')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                DittormError::Configuration("deta.project_key has no project ID".to_string())
            })?
            .to_string();

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DetaError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id,
            project_key: config.project_key.clone(),
            client,
        })
    }

    /// Handle on one base; no request is made
    pub fn base(&self, name: &str) -> DetaBase {
        DetaBase {
            name: name.to_string(),
            url: format!("{}/{}/{name}", self.endpoint, self.project_id),
            project_key: self.project_key.clone(),
            client: self.client.clone(),
        }
    }
}

/// HTTP handle on one Deta base
pub struct DetaBase {
    name: String,
    url: String,
    project_key: SecretString,
    client: Client,
}

impl DetaBase {
    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("X-API-Key", self.project_key.expose_secret().as_str())
    }

    fn item_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| DittormError::Configuration(format!("invalid Deta URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DittormError::Configuration(format!("invalid Deta URL: {}", self.url)))?
            .extend(["items", key]);
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.request(builder)
            .send()
            .await
            .map_err(|e| DetaError::ConnectionFailed(e.to_string()).into())
    }

    async fn check(resp: Response) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("errors").cloned())
            .and_then(|errors| match errors {
                Value::Array(errors) => Some(
                    errors
                        .iter()
                        .map(|e| e.as_str().map_or_else(|| e.to_string(), str::to_string))
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
                _ => None,
            })
            .unwrap_or(body);

        Err(DetaError::RequestFailed { status, message }.into())
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
        resp.json::<T>()
            .await
            .map_err(|e| DittormError::from(DetaError::InvalidResponse(e.to_string())))
    }
}

#[async_trait]
impl DetaBaseApi for DetaBase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Record>> {
        let resp = self.send(self.client.get(self.item_url(key)?)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = Self::check(resp).await?;
        Ok(Some(Self::decode(resp).await?))
    }

    async fn fetch(
        &self,
        condition: &DetaCondition,
        limit: Option<usize>,
        last: Option<&str>,
    ) -> Result<FetchPage> {
        let mut body = Map::new();
        let query = if condition.is_empty() {
            json!([])
        } else {
            json!([condition])
        };
        body.insert("query".to_string(), query);
        if let Some(limit) = limit {
            body.insert("limit".to_string(), json!(limit));
        }
        if let Some(last) = last {
            body.insert("last".to_string(), json!(last));
        }

        let body_json = Value::Object(body.clone());
        tracing::debug!(base = %self.name, body = %body_json, "Deta query");

        let resp = self
            .send(self.client.post(format!("{}/query", self.url)).json(&body))
            .await?;
        let page: QueryResponse = Self::decode(Self::check(resp).await?).await?;

        Ok(FetchPage {
            items: page.items,
            last: page.paging.last,
        })
    }

    async fn put(&self, item: Record) -> Result<Record> {
        let resp = self
            .send(
                self.client
                    .put(format!("{}/items", self.url))
                    .json(&json!({ "items": [&item] })),
            )
            .await?;
        let body: PutResponse = Self::decode(Self::check(resp).await?).await?;

        if let Some(failed) = body.failed.filter(|f| !f.items.is_empty()) {
            return Err(DetaError::PutFailed(Value::Array(
                failed.items.into_iter().map(Value::Object).collect(),
            )
            .to_string())
            .into());
        }

        Ok(body
            .processed
            .and_then(|p| p.items.into_iter().next())
            .unwrap_or(item))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let resp = self.send(self.client.delete(self.item_url(key)?)).await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use mockito::Matcher;

    fn config(endpoint: &str) -> DetaConfig {
        DetaConfig {
            project_key: secret_string("a0abcyxz_secret".to_string()),
            endpoint: endpoint.to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_connect_derives_project_id() {
        let client = DetaClient::connect(&config("https://database.deta.sh/v1/")).unwrap();
        let base = client.base("Comment");
        assert_eq!(base.name(), "Comment");
        assert_eq!(base.url, "https://database.deta.sh/v1/a0abcyxz/Comment");
    }

    #[test]
    fn test_connect_rejects_key_without_project_id() {
        let mut config = config("https://database.deta.sh/v1");
        config.project_key = secret_string("_secret".to_string());
        assert!(matches!(
            DetaClient::connect(&config),
            Err(DittormError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing_item_is_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a0abcyxz/Comment/items/nope")
            .match_header("X-API-Key", "a0abcyxz_secret")
            .with_status(404)
            .with_body(r#"{"key":"nope"}"#)
            .create_async()
            .await;

        let base = DetaClient::connect(&config(&server.url())).unwrap().base("Comment");
        assert!(base.get("nope").await.unwrap().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_cursor() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/a0abcyxz/Comment/query")
            .match_body(Matcher::Json(json!({
                "query": [{"status": "approved"}],
                "limit": 2,
                "last": "k2"
            })))
            .with_status(200)
            .with_body(
                r#"{"paging":{"size":2,"last":"k4"},"items":[{"key":"k3"},{"key":"k4"}]}"#,
            )
            .create_async()
            .await;

        let base = DetaClient::connect(&config(&server.url())).unwrap().base("Comment");
        let condition = json!({"status": "approved"}).as_object().cloned().unwrap();

        let page = base.fetch(&condition, Some(2), Some("k2")).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.last.as_deref(), Some("k4"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_reports_failed_items() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/a0abcyxz/Comment/items")
            .with_status(207)
            .with_body(r#"{"failed":{"items":[{"key":"k1"}]}}"#)
            .create_async()
            .await;

        let base = DetaClient::connect(&config(&server.url())).unwrap().base("Comment");
        let item = json!({"key": "k1"}).as_object().cloned().unwrap();

        assert!(matches!(
            base.put(item).await,
            Err(DittormError::Deta(DetaError::PutFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_error_status_carries_service_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/a0abcyxz/Comment/items/k1")
            .with_status(401)
            .with_body(r#"{"errors":["Unauthorized"]}"#)
            .create_async()
            .await;

        let base = DetaClient::connect(&config(&server.url())).unwrap().base("Comment");
        match base.delete("k1").await {
            Err(DittormError::Deta(DetaError::RequestFailed { status, message })) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
