//! HTTP adapter for the remote marketplace API.

use std::{
    fs, io,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
    cache::{Family, QueryCache},
    response::{Envelope, ErrorBody, GENERIC_FAILURE},
};

pub const DEFAULT_API_URL: &str = "https://api.waylocal.app/";

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("authentication required")]
    AuthFailure,
    #[error("http {status}: {}", .body.user_message())]
    Http { status: u16, body: ErrorBody },
    #[error("server rejected request: {0}")]
    Rejected(String),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ApiError {
    /// True for transient failures worth a retry on idempotent reads.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout => GENERIC_FAILURE.to_string(),
            Self::AuthFailure => "Please sign in to continue.".to_string(),
            Self::Http { body, .. } => body.user_message(),
            Self::Rejected(message) => message.clone(),
            Self::Shape(_) => GENERIC_FAILURE.to_string(),
        }
    }

    /// Not-found reads surface as `Ok(None)` in the detail operations.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Bearer token persisted on this device, mirrored in memory so every
/// request does not hit the filesystem.
#[derive(Debug)]
pub struct TokenStore {
    path: Option<PathBuf>,
    cached: Mutex<Option<String>>,
}

impl TokenStore {
    /// Open the store at `path`, loading any previously saved token.
    pub fn open(path: PathBuf) -> Self {
        let cached = fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            path: Some(path),
            cached: Mutex::new(cached),
        }
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: &str) -> io::Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, token)?;
        }
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    pub fn clear(&self) -> io::Result<()> {
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Shared handle for every remote operation: attaches the bearer token when
/// one is stored, unwraps the response envelope, and maps 401 to
/// [`ApiError::AuthFailure`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
    cache: QueryCache,
}

impl ApiClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(base_url: Url, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, tokens, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: Url,
        tokens: Arc<TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("waylocal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            tokens,
            cache: QueryCache::new(),
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Drop cached reads for `family` and anything embedding it. Called by
    /// every mutation after the server confirms the write.
    pub fn invalidate(&self, family: Family) {
        self.cache.invalidate(family);
    }

    /// Idempotent read, retried once on transient failure, bypassing the
    /// cache.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value = self.fetch_value(path, query).await?;
        from_value(value)
    }

    /// Idempotent read served through the family cache.
    pub async fn get_cached<T: DeserializeOwned>(
        &self,
        family: Family,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let op = operation_key(path, query);
        let value = self
            .cache
            .get_with(family, op, self.fetch_value(path, query))
            .await?;
        serde_json::from_value((*value).clone()).map_err(|e| ApiError::Shape(e.to_string()))
    }

    /// Mutation. Never retried automatically.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let value = self
            .execute(self.request(Method::POST, url).json(body))
            .await?;
        from_value(value)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let value = self
            .execute(self.request(Method::PUT, url).json(body))
            .await?;
        from_value(value)
    }

    /// Mutation whose response payload is ignored.
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.request(Method::POST, url).json(body))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Multipart upload (images). The only non-JSON request body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let value = self
            .execute(self.request(Method::POST, url).multipart(form))
            .await?;
        from_value(value)
    }

    /// Open a long-lived streaming GET (event stream). The caller consumes
    /// the byte stream; no envelope unwrapping happens here.
    pub async fn stream(&self, path: &str) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        let res = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        match res.status() {
            s if s.is_success() => Ok(res),
            StatusCode::UNAUTHORIZED => {
                warn!("authentication failure (401) opening stream");
                Err(ApiError::AuthFailure)
            }
            s => {
                let status = s.as_u16();
                let text = res.text().await.unwrap_or_default();
                Err(ApiError::Http {
                    status,
                    body: ErrorBody::from_raw(&text),
                })
            }
        }
    }

    async fn fetch_value(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        let send = || async {
            let rb = self.request(Method::GET, url.clone()).query(query);
            self.execute(rb).await
        };
        send.retry(
            &ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(250))
                .with_max_times(1),
        )
        .when(ApiError::should_retry)
        .notify(|e, dur| {
            warn!(
                "read failed, retrying after {:.2}s: {}",
                dur.as_secs_f64(),
                e
            )
        })
        .await
    }

    async fn execute(&self, rb: RequestBuilder) -> Result<Value, ApiError> {
        let res = rb.send().await.map_err(map_reqwest_error)?;
        match res.status() {
            s if s.is_success() => {
                let envelope: Envelope<Value> = res
                    .json()
                    .await
                    .map_err(|e| ApiError::Shape(e.to_string()))?;
                envelope.into_data().map_err(ApiError::Rejected)
            }
            StatusCode::UNAUTHORIZED => {
                warn!("authentication failure (401) from api");
                Err(ApiError::AuthFailure)
            }
            s => {
                let status = s.as_u16();
                let text = res.text().await.unwrap_or_default();
                Err(ApiError::Http {
                    status,
                    body: ErrorBody::from_raw(&text),
                })
            }
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let rb = self.http.request(method, url);
        match self.tokens.get() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Shape(format!("bad endpoint {path}: {e}")))
    }
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Shape(e.to_string()))
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// Canonical cache key for a read: path plus query pairs in call order.
fn operation_key(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut key = String::from(path);
    for (i, (name, value)) in query.iter().enumerate() {
        key.push(if i == 0 { '?' } else { '&' });
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_keys_include_query_pairs() {
        assert_eq!(operation_key("/document/requests", &[]), "/document/requests");
        assert_eq!(
            operation_key(
                "/place/places",
                &[("city", "Lisbon".to_string()), ("page", "2".to_string())]
            ),
            "/place/places?city=Lisbon&page=2"
        );
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ApiError::Timeout.should_retry());
        assert!(ApiError::Transport("reset".into()).should_retry());
        assert!(
            ApiError::Http {
                status: 503,
                body: ErrorBody::default()
            }
            .should_retry()
        );
        assert!(
            !ApiError::Http {
                status: 400,
                body: ErrorBody::default()
            }
            .should_retry()
        );
        assert!(!ApiError::AuthFailure.should_retry());
    }

    #[test]
    fn http_errors_surface_the_server_field_message() {
        let err = ApiError::Http {
            status: 400,
            body: ErrorBody::from_raw(r#"{"title": ["title is taken"]}"#),
        };
        assert_eq!(err.user_message(), "title is taken");
    }

    #[test]
    fn token_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let store = TokenStore::open(path.clone());
        assert_eq!(store.get(), None);
        store.set("secret-token").unwrap();

        let reopened = TokenStore::open(path);
        assert_eq!(reopened.get().as_deref(), Some("secret-token"));

        reopened.clear().unwrap();
        assert_eq!(reopened.get(), None);
        assert_eq!(TokenStore::open(dir.path().join("token")).get(), None);
    }

    #[test]
    fn endpoint_join_keeps_the_base_prefix() {
        let client = ApiClient::new(
            Url::parse("http://localhost:8000/v1/").unwrap(),
            Arc::new(TokenStore::in_memory()),
        )
        .unwrap();
        let url = client.endpoint("/document/requests").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/v1/document/requests");
    }
}
