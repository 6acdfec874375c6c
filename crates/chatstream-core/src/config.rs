use std::time::Duration;

use crate::errors::TransportError;

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "CHATSTREAM_BASE_URL";
/// Optional connect timeout override, in whole seconds.
pub const CONNECT_TIMEOUT_SECS_ENV: &str = "CHATSTREAM_CONNECT_TIMEOUT_SECS";

/// Configuration for the HTTP stream transport.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL, for example `http://localhost:8100`.
    pub base_url: String,
    /// Path of the streaming endpoint.
    pub stream_path: String,
    /// Bound on establishing the connection. An open stream may stay idle
    /// for as long as the server keeps it open.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stream_path: "/stream".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Builds a config from `CHATSTREAM_BASE_URL` and
    /// `CHATSTREAM_CONNECT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let base_url = lookup(BASE_URL_ENV).unwrap_or_default();
        if base_url.trim().is_empty() {
            return Err(TransportError::Config(format!("missing {BASE_URL_ENV}")));
        }
        let mut config = Self::new(base_url.trim());
        if let Some(raw) = lookup(CONNECT_TIMEOUT_SECS_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                TransportError::Config(format!(
                    "{CONNECT_TIMEOUT_SECS_ENV} must be whole seconds"
                ))
            })?;
            config = config.connect_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.stream_path.trim_start_matches('/')
        )
    }
}
