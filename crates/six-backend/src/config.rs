//! Backend endpoint configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the contact matching and connection endpoints live.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the Supabase project (RPC host).
    pub supabase_url: String,

    /// Public anon key sent as `apikey`.
    pub supabase_anon_key: String,

    /// Base URL of the graph backend (`/users/connect`).
    pub backend_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(
        supabase_url: impl Into<String>,
        supabase_anon_key: impl Into<String>,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            supabase_url: trim_base(supabase_url.into()),
            supabase_anon_key: supabase_anon_key.into(),
            backend_url: trim_base(backend_url.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create config from environment variables.
    ///
    /// Requires `SIX_SUPABASE_URL`, `SIX_SUPABASE_ANON_KEY` and
    /// `SIX_BACKEND_URL`; `SIX_HTTP_TIMEOUT_MS` is optional.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required("SIX_SUPABASE_URL")?,
            required("SIX_SUPABASE_ANON_KEY")?,
            required("SIX_BACKEND_URL")?,
        );

        if let Ok(raw) = std::env::var("SIX_HTTP_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("SIX_HTTP_TIMEOUT_MS is not a number: {raw:?}"))
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.supabase_url, function)
    }

    pub(crate) fn backend_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"<redacted>")
            .field("backend_url", &self.backend_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::Config(format!("{name} is not set"))),
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
