//! Connection settings for the Figma API and the object store.
//!
//! These are plain resolved values. Discovery (flags, environment, `.env`
//! files) lives in the server binary; this crate only consumes the result.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Default Figma REST API root.
pub const DEFAULT_FIGMA_BASE_URL: &str = "https://api.figma.com/v1";

/// Credential used to authenticate against the Figma API.
#[derive(Debug)]
pub enum FigmaAuth {
    /// Personal access token, sent as `X-Figma-Token`.
    PersonalToken(SecretString),
    /// OAuth access token, sent as `Authorization: Bearer`.
    OAuth(SecretString),
}

impl FigmaAuth {
    /// Header name and value to attach to every request.
    pub(crate) fn header(&self) -> (&'static str, String) {
        match self {
            FigmaAuth::PersonalToken(token) => ("X-Figma-Token", token.expose_secret().to_string()),
            FigmaAuth::OAuth(token) => (
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
        }
    }

    /// Short label for logs (never the secret itself).
    pub fn kind(&self) -> &'static str {
        match self {
            FigmaAuth::PersonalToken(_) => "personal_token",
            FigmaAuth::OAuth(_) => "oauth",
        }
    }
}

/// Figma API client configuration.
#[derive(Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth: FigmaAuth,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Default request timeout (30 seconds). Whole-file fetches on large
    /// documents are slow.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(auth: FigmaAuth) -> Self {
        Self {
            base_url: DEFAULT_FIGMA_BASE_URL.to_string(),
            auth,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// S3-compatible object storage settings.
#[derive(Debug)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
    /// Public URL root for uploaded objects (e.g. a CDN). Defaults to the
    /// virtual-hosted bucket URL.
    pub public_base_url: Option<String>,
    /// Prefix prepended to every generated object key.
    pub key_prefix: Option<String>,
}

impl StorageConfig {
    /// Virtual-hosted style bucket host.
    pub fn host(&self) -> String {
        format!("{}.s3.{}.amazonaws.com", self.bucket, self.region)
    }
}
