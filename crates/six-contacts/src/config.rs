//! Configuration for the contact sync coordinator.

use std::time::Duration;

use crate::contact::ContactField;
use crate::error::{Error, Result};

/// How long a non-empty device read is reused before the device is queried again.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_millis(30_000);

/// Configuration for a [`ContactSync`](crate::ContactSync).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSyncConfig {
    /// Freshness window of the load cache.
    pub freshness_window: Duration,

    /// Fields requested from the device contact provider.
    pub fields: Vec<ContactField>,
}

impl Default for ContactSyncConfig {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            fields: vec![ContactField::PhoneNumbers, ContactField::Name],
        }
    }
}

impl ContactSyncConfig {
    /// Create config from environment variables with defaults for anything unset.
    ///
    /// Reads `SIX_CONTACT_FRESHNESS_MS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SIX_CONTACT_FRESHNESS_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("SIX_CONTACT_FRESHNESS_MS is not a number: {raw:?}"))
            })?;
            config.freshness_window = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Set the load cache freshness window.
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Set the fields requested from the device.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<ContactField>) -> Self {
        self.fields = fields;
        self
    }
}
