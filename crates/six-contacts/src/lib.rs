//! Six Contacts - device contact sync for the Six client.
//!
//! Turns the device address book into a de-duplicated set of phone
//! identifiers and hands that set to the remote sync endpoint, while making
//! sure repeated UI triggers never cause duplicate permission prompts,
//! duplicate device reads, or duplicate sync calls.
//!
//! # Architecture
//!
//! - **Normalizer**: raw phone strings → last-10-digit identifiers
//! - **Permission Gate**: OS contact permission, published to observers
//! - **Contact Loader**: cached, coalesced device reads (30 s freshness window)
//! - **Sync Coordinator**: check → prompt → load → sync, coalesced per kind
//!
//! # Example
//!
//! ```rust,ignore
//! use six_contacts::{ContactSync, ContactSyncConfig, Session, SignedInUser};
//!
//! let session = Session::signed_in(SignedInUser::new(user_id, token));
//! let sync = ContactSync::new(provider, backend, session, ContactSyncConfig::default());
//!
//! match sync.check_and_load(true).await {
//!     Ok(outcome) => println!("{outcome:?}"),
//!     Err(e) if e.is_permission_denied() => println!("enable contacts in settings"),
//!     Err(e) => eprintln!("sync failed: {e}"),
//! }
//! ```

pub mod config;
pub mod contact;
pub mod coordinator;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod permission;
pub mod provider;
pub mod session;
pub mod status;

mod flight;

#[cfg(test)]
mod testing;

pub use config::{ContactSyncConfig, DEFAULT_FRESHNESS_WINDOW};
pub use contact::{ContactField, PhoneEntry, RawContact};
pub use coordinator::{CheckOutcome, ContactSync, ContactsView};
pub use error::{Error, Result};
pub use loader::{ContactList, ContactLoader, LoadCache};
pub use normalize::{normalize, normalize_number, NormalizedPhoneSet, IDENTIFIER_LEN};
pub use permission::{PermissionGate, PermissionState, PermissionStatus};
pub use provider::{ContactProvider, MemoryContactProvider, SyncBackend, SyncReport};
pub use session::{Session, SignedInUser};
pub use status::ContactsSnapshot;
