//! Backend and webhook client configuration.
//!
//! Both configurations load from environment variables. The backend API key
//! is held in a [`Zeroizing`] buffer and redacted from `Debug` output.

use url::Url;
use zeroize::Zeroizing;

/// Connection settings for the hosted relational backend.
///
/// Custom `Debug` implementation redacts the `api_key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project URL of the backend; tables live under `{backend_url}/rest/v1/`.
    pub backend_url: Url,
    /// API key, sent as both `apikey` and bearer token.
    pub api_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("backend_url", &self.backend_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `REGDESK_BACKEND_URL` (required)
    /// - `REGDESK_API_KEY` (required)
    /// - `REGDESK_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("REGDESK_API_KEY")
            .map_err(|_| ConfigError::Missing("REGDESK_API_KEY"))?;
        Ok(Self {
            backend_url: required_url("REGDESK_BACKEND_URL")?,
            api_key: Zeroizing::new(api_key),
            timeout_secs: env_secs("REGDESK_TIMEOUT_SECS", 30),
        })
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(port: u16, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            backend_url: local_url(port)?,
            api_key: Zeroizing::new(api_key.to_string()),
            timeout_secs: 5,
        })
    }
}

/// Endpoints of the two generation webhooks.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Laws-generation webhook.
    pub laws_url: Url,
    /// Control-framework-generation webhook.
    pub control_framework_url: Url,
    /// Request timeout in seconds. Generation runs a model on the far side,
    /// so this is much longer than the backend timeout.
    pub timeout_secs: u64,
}

impl WebhookConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `REGDESK_LAWS_WEBHOOK_URL` (required)
    /// - `REGDESK_CONTROLS_WEBHOOK_URL` (required)
    /// - `REGDESK_WEBHOOK_TIMEOUT_SECS` (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            laws_url: required_url("REGDESK_LAWS_WEBHOOK_URL")?,
            control_framework_url: required_url("REGDESK_CONTROLS_WEBHOOK_URL")?,
            timeout_secs: env_secs("REGDESK_WEBHOOK_TIMEOUT_SECS", 300),
        })
    }

    /// Configuration pointing both webhooks at a local mock server.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        let base = local_url(port)?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| ConfigError::InvalidUrl(path.to_string(), e.to_string()))
        };
        Ok(Self {
            laws_url: join("webhook/laws")?,
            control_framework_url: join("webhook/control-framework")?,
            timeout_secs: 5,
        })
    }
}

/// Everything the console needs to reach its collaborators.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection.
    pub backend: BackendConfig,
    /// Generation webhooks. `None` disables generation.
    pub webhooks: Option<WebhookConfig>,
}

impl ClientConfig {
    /// Load both configurations from the environment.
    ///
    /// The backend variables are required. The webhook variables are
    /// optional as a pair: when neither URL is set generation is disabled,
    /// when only one is set loading fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = BackendConfig::from_env()?;
        let webhooks_configured = ["REGDESK_LAWS_WEBHOOK_URL", "REGDESK_CONTROLS_WEBHOOK_URL"]
            .iter()
            .any(|var| std::env::var(var).is_ok());
        let webhooks = if webhooks_configured {
            Some(WebhookConfig::from_env()?)
        } else {
            None
        };
        Ok(Self { backend, webhooks })
    }

    /// Backend and webhooks on the same local mock server.
    pub fn local_mock(port: u16, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            backend: BackendConfig::local_mock(port, api_key)?,
            webhooks: Some(WebhookConfig::local_mock(port)?),
        })
    }
}

fn required_url(var: &'static str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).map_err(|_| ConfigError::Missing(var))?;
    parse_url(var, &raw)
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_secs(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn local_url(port: u16) -> Result<Url, ConfigError> {
    parse_url("localhost", &format!("http://127.0.0.1:{port}"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}
