use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;

use crate::graph::{api_error, map_reqwest_error};
use crate::{AccessToken, ConfigError, GraphError, GraphErrorKind, GraphSettings, TokenError};

/// App credentials and the short-lived user token they extend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
    pub user_token: String,
}

#[async_trait::async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self) -> Result<AccessToken, TokenError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Trades a short-lived user token for a long-lived one (`fb_exchange_token` grant).
#[derive(Debug, Clone)]
pub struct OAuthExchanger {
    endpoint: Url,
    credentials: AppCredentials,
    client: reqwest::Client,
}

impl OAuthExchanger {
    pub fn new(settings: &GraphSettings, credentials: AppCredentials) -> Result<Self, ConfigError> {
        let raw = format!("{}/oauth/access_token", settings.base_url.trim_end_matches('/'));
        let endpoint_error = |message: String| ConfigError::Endpoint {
            url: raw.clone(),
            message,
        };
        let endpoint = Url::parse(&raw).map_err(|err| endpoint_error(err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| endpoint_error(err.to_string()))?;
        Ok(Self {
            endpoint,
            credentials,
            client,
        })
    }
}

#[async_trait::async_trait]
impl TokenExchanger for OAuthExchanger {
    async fn exchange(&self) -> Result<AccessToken, TokenError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("grant_type", "fb_exchange_token")
            .append_pair("client_id", &self.credentials.app_id)
            .append_pair("client_secret", &self.credentials.app_secret)
            .append_pair("fb_exchange_token", &self.credentials.user_token);

        let response = self.client.post(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body).into());
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| GraphError::new(GraphErrorKind::MalformedResponse, err.to_string()))?;
        Ok(AccessToken {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            created: Utc::now(),
        })
    }
}
