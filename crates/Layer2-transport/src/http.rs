//! HTTP transport - thin request wrapper
//!
//! Every backend call goes through [`HttpTransport::request`]: JSON content
//! type by default, optional bearer credential, uniform error decoding.
//! The transport holds no mutable state and is cheap to clone.

use crate::error::TransportError;
use codexec_foundation::{ClientConfig, Credential};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// Request Options
// ============================================================================

/// Request body variants
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Pre-serialized JSON
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
    /// Body that failed to serialize; reported when the request is sent
    Invalid(String),
}

/// Per-request options: method, body, credential
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    pub credential: Option<Credential>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    /// JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = match serde_json::to_vec(body) {
            Ok(bytes) => RequestBody::Json(bytes),
            Err(e) => RequestBody::Invalid(e.to_string()),
        };
        self
    }

    /// Form-encoded body
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Attach a bearer credential (no-op for `None`)
    pub fn bearer(mut self, credential: Option<&Credential>) -> Self {
        self.credential = credential.cloned();
        self
    }
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// Stateless HTTP client bound to one backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    /// `http(s)://host[:port]/<prefix>` without trailing slash
    base: String,
}

impl HttpTransport {
    /// Create a transport for `server_url` + `api_prefix` with default timeouts
    pub fn new(server_url: &str, api_prefix: &str) -> Result<Self, TransportError> {
        let config = ClientConfig::new()
            .server_url(server_url)
            .api_prefix(api_prefix);
        Self::from_config(&config)
    }

    /// Create a transport from the merged client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, config.effective_server_url(), &config.effective_api_prefix())
    }

    /// Use a preconfigured `reqwest::Client`
    pub fn with_client(client: Client, server_url: &str, api_prefix: &str) -> Result<Self, TransportError> {
        let server = Url::parse(server_url)
            .map_err(|e| TransportError::InvalidRequest(format!("Invalid server URL '{}': {}", server_url, e)))?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(TransportError::InvalidRequest(format!(
                "Server URL must be http or https: {}",
                server_url
            )));
        }

        let prefix = api_prefix.trim_matches('/');
        let base = if prefix.is_empty() {
            server.as_str().trim_end_matches('/').to_string()
        } else {
            format!("{}/{}", server.as_str().trim_end_matches('/'), prefix)
        };

        Ok(Self { client, base })
    }

    /// Base URL including the API prefix
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Absolute URL for an endpoint such as `/files/3`
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, TransportError> {
        let joined = format!("{}/{}", self.base, endpoint.trim_start_matches('/'));
        Url::parse(&joined)
            .map_err(|e| TransportError::InvalidRequest(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }

    /// Duplex stream URL for an endpoint (`http→ws`, `https→wss`)
    pub fn stream_url(&self, endpoint: &str) -> Result<Url, TransportError> {
        let mut url = self.endpoint_url(endpoint)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidRequest(format!("Cannot derive stream URL for '{}'", endpoint)))?;
        Ok(url)
    }

    /// Send a request.
    ///
    /// Returns `Ok(None)` for a success status without content (204, or an
    /// empty body). Any non-success status fails with
    /// [`TransportError::Status`]; this never returns a value in that case.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, TransportError> {
        let url = self.endpoint_url(endpoint)?;
        debug!("{} {}", options.method, url.path());

        let mut builder = self.client.request(options.method.clone(), url);

        builder = match options.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE),
            RequestBody::Json(bytes) => builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Invalid(reason) => {
                return Err(TransportError::InvalidRequest(format!(
                    "Failed to serialize request body: {}",
                    reason
                )))
            }
        };

        if let Some(credential) = &options.credential {
            builder = builder.bearer_auth(credential.token());
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = TransportError::from_http_status(status.as_u16(), &body);
            debug!("{} {} failed: {}", options.method, endpoint, err);
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            warn!("Undecodable response from {}: {}", endpoint, e);
            TransportError::InvalidResponse(e.to_string())
        })
    }

    /// Send a request that must return a body
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, TransportError> {
        self.request(endpoint, options)
            .await?
            .ok_or_else(|| TransportError::InvalidResponse(format!("Empty response from {}", endpoint)))
    }

    /// Send a request whose body, if any, is ignored
    pub async fn request_empty(&self, endpoint: &str, options: RequestOptions) -> Result<(), TransportError> {
        self.request::<serde_json::Value>(endpoint, options).await.map(|_| ())
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_decode() {
        TransportError::InvalidResponse(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Percent-encode a single path segment (ids coming back from the server)
pub fn path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
