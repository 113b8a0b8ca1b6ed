use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};

use crate::{read_optional, write_atomic, GraphError, PersistError, TokenExchanger};

/// Long-lived user access token plus the instant it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds; `None` means the token does not expire.
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub created: DateTime<Utc>,
}

impl AccessToken {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.expires_in?).ok()?;
        self.created.checked_add_signed(Duration::try_seconds(seconds)?)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at().map(|at| at - now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token cache error: {0}")]
    Persist(#[from] PersistError),
    #[error("token cache is unreadable: {0}")]
    Format(String),
    #[error("token exchange failed: {0}")]
    Exchange(#[from] GraphError),
}

/// Cached credential state, injected before the pipeline is built.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AccessToken>, TokenError>;

    fn save(&self, token: &AccessToken) -> Result<(), TokenError>;

    fn tolerance(&self) -> Duration {
        Duration::days(1)
    }

    fn is_expiring_soon(&self, token: &AccessToken, now: DateTime<Utc>) -> bool {
        token
            .remaining(now)
            .is_some_and(|left| left < self.tolerance())
    }
}

/// RON file holding the most recent token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    tolerance: Duration,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tolerance: Duration::days(1),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AccessToken>, TokenError> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(None);
        };
        ron::from_str(&content)
            .map(Some)
            .map_err(|err| TokenError::Format(err.to_string()))
    }

    fn save(&self, token: &AccessToken) -> Result<(), TokenError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(token, pretty)
            .map_err(|err| TokenError::Format(err.to_string()))?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }

    fn tolerance(&self) -> Duration {
        self.tolerance
    }
}

/// Reuse the cached token unless it is missing, unreadable or close to expiry.
pub async fn ensure_token(
    store: &dyn TokenStore,
    exchanger: &dyn TokenExchanger,
    now: DateTime<Utc>,
) -> Result<AccessToken, TokenError> {
    let cached = match store.load() {
        Ok(token) => token,
        Err(err) => {
            engine_warn!("Ignoring token cache: {}", err);
            None
        }
    };

    let token = match cached {
        Some(token) if !store.is_expiring_soon(&token, now) => {
            engine_info!("Found cached access token");
            return Ok(token);
        }
        Some(_) => {
            engine_info!("Cached access token expires soon, exchanging a new one");
            exchanger.exchange().await?
        }
        None => {
            engine_info!("No cached access token, exchanging a new one");
            exchanger.exchange().await?
        }
    };

    store.save(&token)?;
    Ok(token)
}
