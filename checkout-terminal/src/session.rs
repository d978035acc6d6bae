//! Operator session
//!
//! Holds who is checking out (a guest or a signed-in member) and the bearer
//! credential that goes with them. Logout is announced to each registered
//! [`SessionListener`] in registration order, then the session falls back to a
//! fresh guest.

use std::sync::Arc;

use parking_lot::RwLock;
use shared::client::{Identity, LoginResponse};

/// Component that must react to a logout
pub trait SessionListener: Send + Sync {
    fn on_logout(&self);
}

pub struct Session {
    identity: RwLock<Identity>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &*self.identity.read())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl Session {
    /// Start as a guest
    pub fn new() -> Self {
        Self::with_identity(Identity::guest())
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(identity),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.write().push(listener);
    }

    pub fn identity(&self) -> Identity {
        self.identity.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.identity.read().token().map(str::to_owned)
    }

    pub fn is_guest(&self) -> bool {
        self.identity.read().is_guest()
    }

    pub fn sign_in(&self, login: LoginResponse) {
        let identity = Identity::from(login);
        tracing::info!(user = %identity.display_name(), "Member signed in");
        *self.identity.write() = identity;
    }

    /// Notify listeners, then become a new guest
    pub fn logout(&self) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.on_logout();
        }
        *self.identity.write() = Identity::guest();
        tracing::info!("Session ended, continuing as guest");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
