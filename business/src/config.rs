use serde::Deserialize;
use std::env::vars;
use storedesk_states::State;
use ustr::Ustr;

/// Backend used when nothing is configured: the dashboard's local dev server.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(String),
}

#[derive(Debug, Clone)]
pub struct BusinessConfig {
    /// Origin of the REST backend, without the `/api` suffix.
    pub api_base_url: String,
    /// Opaque bearer token forwarded as `Authorization` when present.
    ///
    /// Session handling lives outside storedesk; this is only passed through.
    pub auth_token: Option<String>,
}

// Environment variables read by `BusinessConfig::from_env`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    storedesk_api_base_url: Option<String>,
    storedesk_auth_token: Option<String>,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Reads `STOREDESK_API_BASE_URL` and `STOREDESK_AUTH_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_env::from_iter(vars()).map_err(|e| ConfigError::Env(e.to_string()))?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let RawConfig {
            storedesk_api_base_url,
            storedesk_auth_token,
        } = raw;

        let api_base_url = match storedesk_api_base_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                log::debug!("STOREDESK_API_BASE_URL not set, using {DEFAULT_API_BASE_URL}");
                DEFAULT_API_BASE_URL.to_owned()
            }
        };

        Self {
            api_base_url,
            auth_token: storedesk_auth_token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn api_url(&self) -> Ustr {
        let base = self.api_base_url.trim_end_matches('/');
        if base.is_empty() {
            Ustr::from("/api")
        } else {
            Ustr::from(&format!("{base}/api"))
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl State for BusinessConfig {}
