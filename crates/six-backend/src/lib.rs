//! Six Backend - remote side of contact sync.
//!
//! Implements [`six_contacts::SyncBackend`] over HTTP: phone identifiers
//! are matched against registered users through a Supabase RPC, then the
//! graph backend is asked to connect the requester with each match.
//!
//! # Example
//!
//! ```rust,ignore
//! use six_backend::{BackendConfig, SixBackend};
//!
//! let backend = SixBackend::new(BackendConfig::from_env()?, session.clone())?;
//! let report = backend.sync(&phones).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{MatchedUser, SixBackend};
pub use config::{BackendConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
