//! Shared session state
//!
//! The auth client and every collection adapter hold the same
//! [`SessionHandle`]; signing in or out through the auth client is
//! immediately visible to the adapters that scope their queries by the
//! current identity.

use std::sync::{Arc, Mutex};

use crate::auth::types::{Identity, Session};

/// Shared, mutable handle to the current session
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Option<Session>>>,
}

impl SessionHandle {
    /// Create an empty handle (signed out)
    pub fn new() -> Self {
        Self::default()
    }

    /// The current session, if signed in
    pub fn get(&self) -> Option<Session> {
        self.inner.lock().unwrap().clone()
    }

    /// Replace the current session
    pub fn set(&self, session: Session) {
        *self.inner.lock().unwrap() = Some(session);
    }

    /// Clear the current session
    pub fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }

    /// The current identity, if signed in
    pub fn identity(&self) -> Option<Identity> {
        self.inner.lock().unwrap().as_ref().map(Session::identity)
    }

    /// The current access token, if signed in
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.access_token.clone())
    }
}
