use std::collections::HashMap;
use std::time::Duration;

use engagement_core::{BulkResponse, QueryOutcome};
use reqwest::Url;
use serde_json::Value;

use crate::{ConfigError, GraphError, GraphErrorKind};

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub base_url: String,
    pub api_version: String,
    pub access_token: String,
    pub fields: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            api_version: "v2.10".to_string(),
            access_token: String::new(),
            fields: "engagement,og_object".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GraphSettings {
    /// Versioned root, e.g. `https://graph.facebook.com/v2.10/`.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = format!(
            "{}/{}/",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        );
        Url::parse(&raw).map_err(|err| ConfigError::Endpoint {
            url: raw.clone(),
            message: err.to_string(),
        })
    }
}

/// Remote capability the pipeline queries. Timeouts and retries live here, not in the callers.
#[async_trait::async_trait]
pub trait GraphClient: Send + Sync {
    async fn query_one(&self, id: &str) -> Result<QueryOutcome, GraphError>;

    /// One request for all `ids`; the response is keyed by identifier.
    async fn query_many(&self, ids: &[String]) -> Result<BulkResponse, GraphError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGraphClient {
    settings: GraphSettings,
    endpoint: Url,
    client: reqwest::Client,
}

impl ReqwestGraphClient {
    pub fn new(settings: GraphSettings) -> Result<Self, ConfigError> {
        let endpoint = settings.endpoint()?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ConfigError::Endpoint {
                url: endpoint.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            settings,
            endpoint,
            client,
        })
    }

    async fn get(&self, key: &str, value: &str) -> Result<Value, GraphError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(key, value)
            .append_pair("fields", &self.settings.fields)
            .append_pair("access_token", &self.settings.access_token);

        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|err| GraphError::new(GraphErrorKind::MalformedResponse, err.to_string()))?;
        if !value.is_object() {
            return Err(GraphError::new(
                GraphErrorKind::MalformedResponse,
                "expected a json object",
            ));
        }
        Ok(value)
    }
}

#[async_trait::async_trait]
impl GraphClient for ReqwestGraphClient {
    async fn query_one(&self, id: &str) -> Result<QueryOutcome, GraphError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GraphError::new(GraphErrorKind::InvalidIdentifier, "empty id"));
        }
        let value = self.get("id", id).await?;
        Ok(parse_outcome(&value))
    }

    async fn query_many(&self, ids: &[String]) -> Result<BulkResponse, GraphError> {
        let ids: Vec<&str> = ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let value = self.get("ids", &ids.join(",")).await?;
        let Value::Object(entries) = value else {
            return Ok(HashMap::new());
        };

        let mut results = HashMap::with_capacity(entries.len());
        for (id, entry) in entries {
            if !entry.is_object() {
                return Err(GraphError::new(
                    GraphErrorKind::MalformedResponse,
                    format!("entry for {id} is not an object"),
                ));
            }
            results.insert(id, parse_outcome(&entry));
        }
        Ok(results)
    }
}

fn parse_outcome(value: &Value) -> QueryOutcome {
    QueryOutcome {
        object: value.get("og_object").cloned(),
        engagement: value.get("engagement").cloned(),
        error: value.get("error").map(describe_error),
    }
}

fn describe_error(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| error.to_string())
}

/// Graph API failures carry `{"error": {"message", "type", "code"}}`.
pub(crate) fn api_error(status: u16, body: &[u8]) -> GraphError {
    let error = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").cloned())
        .filter(Value::is_object);
    match error {
        Some(error) => GraphError::new(
            GraphErrorKind::Api {
                code: error.get("code").and_then(Value::as_i64),
                error_type: error
                    .get("type")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned),
            },
            describe_error(&error),
        ),
        None => GraphError::new(
            GraphErrorKind::HttpStatus(status),
            String::from_utf8_lossy(body).into_owned(),
        ),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> GraphError {
    if err.is_timeout() {
        return GraphError::new(GraphErrorKind::Timeout, err.to_string());
    }
    GraphError::new(GraphErrorKind::Network, err.to_string())
}
