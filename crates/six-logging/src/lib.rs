//! Tracing setup shared by Six binaries.
//!
//! `RUST_LOG` always wins. Without it, the default filter depends on the
//! application environment: verbose for development, `info` for production.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown application environment: {0:?}")]
    UnknownEnv(String),

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Deployment environment, read from `SIX_APP_ENV`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    /// Read `SIX_APP_ENV`, defaulting to development when unset.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var("SIX_APP_ENV") {
            Ok(raw) => raw.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub const fn default_directive(self) -> &'static str {
        match self {
            Self::Development => "info,six_contacts=debug,six_backend=debug,six_cli=debug",
            Self::Production => "warn,six_contacts=info,six_backend=info,six_cli=info",
        }
    }

    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for AppEnv {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::UnknownEnv(other.to_string())),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Build the filter for `env`, preferring `RUST_LOG` when set.
pub fn env_filter(env: AppEnv) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| env.default_directive().into())
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed; see [`try_init`] for tests.
pub fn init(env: AppEnv) -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(env_filter(env))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(env.is_development())
                .with_ansi(env.is_development()),
        )
        .try_init()?;

    tracing::debug!(%env, "Tracing initialised");
    Ok(())
}

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn try_init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter(AppEnv::Development))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
