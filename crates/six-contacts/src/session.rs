//! Signed-in user session shared across the application.

use std::fmt;
use std::sync::{Arc, RwLock, PoisonError};

/// Identity of the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub id: String,
    pub access_token: String,
}

impl SignedInUser {
    pub fn new(id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for SignedInUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedInUser")
            .field("id", &self.id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Application session state. Cloning shares the same session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Arc<RwLock<Option<SignedInUser>>>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session with `user` signed in.
    pub fn signed_in(user: SignedInUser) -> Self {
        let session = Self::new();
        session.set_user(Some(user));
        session
    }

    pub fn set_user(&self, user: Option<SignedInUser>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub fn clear(&self) {
        self.set_user(None);
    }

    pub fn user(&self) -> Option<SignedInUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.user().map(|u| u.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id().is_some()
    }
}
