//! LeanCloud REST client
//!
//! [`LeanCloudApi`] is the seam the model talks through; [`LeanCloudClient`]
//! implements it over the REST API (`/1.1/classes`, `/1.1/batch`).

use super::query::LeanQuery;
use crate::config::LeanCloudConfig;
use crate::domain::record::merge;
use crate::domain::{DittormError, LeanCloudError, Record, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Largest page the find endpoint returns by default
pub const PAGE_SIZE: usize = 100;

/// Sub-requests per `/1.1/batch` call
const BATCH_SIZE: usize = 50;

static SHARED: OnceLock<Arc<LeanCloudClient>> = OnceLock::new();

/// Paging, ordering and projection for [`LeanCloudApi::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    /// Descending sort field
    pub descending: Option<String>,
    pub keys: Option<Vec<String>>,
}

/// Operations the LeanCloud model needs from the service
#[async_trait]
pub trait LeanCloudApi: Send + Sync {
    /// One page of objects matching `query`
    async fn find(&self, query: &LeanQuery, options: &FindOptions) -> Result<Vec<Record>>;

    /// Number of objects matching `query`
    async fn count(&self, query: &LeanQuery) -> Result<u64>;

    /// Create an object with the given ACL; returns it with `objectId`
    async fn create(&self, class_name: &str, data: &Record, acl: &Value) -> Result<Record>;

    /// Overwrite the given fields of one object; returns the saved fields
    async fn update(&self, class_name: &str, object_id: &str, data: &Record) -> Result<Record>;

    /// Delete objects by ID
    async fn destroy_all(&self, class_name: &str, object_ids: &[String]) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    results: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    error: String,
}

/// HTTP client for the LeanCloud REST API
///
/// # Example
///
/// ```no_run
/// use dittorm::adapters::leancloud::LeanCloudClient;
/// use dittorm::config::{secret_string, LeanCloudConfig};
///
/// # fn example() -> dittorm::domain::Result<()> {
/// let config = LeanCloudConfig {
///     app_id: "app-id".to_string(),
///     app_key: secret_string("app-key".to_string()),
///     master_key: None,
///     server_url: "https://app.api.lncldglobal.com".to_string(),
///     timeout_seconds: 30,
/// };
///
/// let client = LeanCloudClient::shared(&config)?;
/// # Ok(())
/// # }
/// ```
pub struct LeanCloudClient {
    base_url: String,
    app_id: String,
    key_header: String,
    client: Client,
}

impl LeanCloudClient {
    /// Build a client for one application
    ///
    /// # Errors
    ///
    /// Returns [`LeanCloudError::ConnectionFailed`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &LeanCloudConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LeanCloudError::ConnectionFailed(e.to_string()))?;

        // master key requests bypass ACLs
        let key_header = match config.master_key {
            Some(ref master_key) => format!("{},master", master_key.expose_secret().as_str()),
            None => config.app_key.expose_secret().as_str().to_string(),
        };

        Ok(Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            key_header,
            client,
        })
    }

    /// Process-wide client, built on first use
    ///
    /// Safe to call any number of times from any task. The first
    /// configuration to arrive wins; later calls get the same client back
    /// whatever configuration they pass.
    pub fn shared(config: &LeanCloudConfig) -> Result<Arc<LeanCloudClient>> {
        if let Some(client) = SHARED.get() {
            return Ok(Arc::clone(client));
        }

        let ours = Arc::new(Self::new(config)?);
        let winner = SHARED.get_or_init(|| Arc::clone(&ours));
        if Arc::ptr_eq(winner, &ours) {
            tracing::info!(
                app_id = %config.app_id,
                server_url = %config.server_url,
                master = config.master_key.is_some(),
                "Initialized LeanCloud client"
            );
        }

        Ok(Arc::clone(winner))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-LC-Id", &self.app_id)
            .header("X-LC-Key", &self.key_header)
    }

    fn class_url(&self, class_name: &str) -> String {
        format!("{}/1.1/classes/{class_name}", self.base_url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = self
            .request(builder)
            .send()
            .await
            .map_err(|e| LeanCloudError::ConnectionFailed(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { code, error }) => LeanCloudError::Api {
                code,
                message: error,
            },
            Err(_) => LeanCloudError::Api {
                code: i64::from(status.as_u16()),
                message: body,
            },
        };
        Err(err.into())
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
        resp.json::<T>()
            .await
            .map_err(|e| DittormError::from(LeanCloudError::InvalidResponse(e.to_string())))
    }
}

fn find_params(query: &LeanQuery, options: &FindOptions) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(condition) = query.where_param() {
        params.push(("where", condition));
    }
    if let Some(limit) = options.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(skip) = options.skip {
        params.push(("skip", skip.to_string()));
    }
    if let Some(ref field) = options.descending {
        params.push(("order", format!("-{field}")));
    }
    if let Some(ref keys) = options.keys {
        params.push(("keys", keys.join(",")));
    }
    params
}

#[async_trait]
impl LeanCloudApi for LeanCloudClient {
    async fn find(&self, query: &LeanQuery, options: &FindOptions) -> Result<Vec<Record>> {
        let url = self.class_url(query.class_name());
        let params = find_params(query, options);

        tracing::debug!(url = %url, params = ?params, "LeanCloud find");

        let resp = self.send(self.client.get(&url).query(&params)).await?;
        let body: FindResponse = Self::decode(resp).await?;
        Ok(body.results)
    }

    async fn count(&self, query: &LeanQuery) -> Result<u64> {
        let url = self.class_url(query.class_name());
        let mut params = vec![("count", "1".to_string()), ("limit", "0".to_string())];
        if let Some(condition) = query.where_param() {
            params.push(("where", condition));
        }

        let resp = self.send(self.client.get(&url).query(&params)).await?;
        let body: CountResponse = Self::decode(resp).await?;
        Ok(body.count)
    }

    async fn create(&self, class_name: &str, data: &Record, acl: &Value) -> Result<Record> {
        let url = self.class_url(class_name);
        let mut payload = data.clone();
        payload.insert("ACL".to_string(), acl.clone());

        let resp = self
            .send(
                self.client
                    .post(&url)
                    .query(&[("fetchWhenSave", "true")])
                    .json(&payload),
            )
            .await?;
        let saved: Record = Self::decode(resp).await?;

        Ok(merge(&payload, &saved))
    }

    async fn update(&self, class_name: &str, object_id: &str, data: &Record) -> Result<Record> {
        let url = format!("{}/{object_id}", self.class_url(class_name));

        let resp = self
            .send(
                self.client
                    .put(&url)
                    .query(&[("fetchWhenSave", "true")])
                    .json(data),
            )
            .await?;
        let saved: Record = Self::decode(resp).await?;

        Ok(merge(data, &saved))
    }

    async fn destroy_all(&self, class_name: &str, object_ids: &[String]) -> Result<()> {
        let url = format!("{}/1.1/batch", self.base_url);

        let batches = object_ids.chunks(BATCH_SIZE).map(|chunk| {
            let requests: Vec<Value> = chunk
                .iter()
                .map(|id| {
                    json!({
                        "method": "DELETE",
                        "path": format!("/1.1/classes/{class_name}/{id}"),
                    })
                })
                .collect();
            let request = self.client.post(&url).json(&json!({ "requests": requests }));

            async move {
                let resp = self.send(request).await?;
                Self::decode::<Vec<Value>>(resp).await
            }
        });

        // every batch is sent even when an earlier one fails
        let outcomes = join_all(batches).await;

        let mut failed = 0;
        let mut first_error = None;
        for (chunk, outcome) in object_ids.chunks(BATCH_SIZE).zip(outcomes) {
            match outcome {
                Ok(results) => {
                    for result in results.iter().filter(|r| r.get("error").is_some()) {
                        failed += 1;
                        tracing::warn!(class = %class_name, error = %result["error"], "LeanCloud delete failed");
                    }
                }
                Err(e) => {
                    failed += chunk.len();
                    tracing::warn!(class = %class_name, size = chunk.len(), error = %e, "LeanCloud batch delete failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if failed > 0 {
            return Err(LeanCloudError::BatchFailed {
                failed,
                total: object_ids.len(),
            }
            .into());
        }
        Ok(())
    }
}
