//! Seam to the external credential holder.

use std::sync::RwLock;

/// Read-only view of the bearer credential, plus the invalidation signal.
///
/// The engine never mutates the credential itself; on an authorization
/// failure it calls [`invalidate`](CredentialProvider::invalidate) and
/// leaves re-acquisition to the auth collaborator.
pub trait CredentialProvider: Send + Sync {
    /// The current bearer token, if any. Requests proceed without one when
    /// absent (the server will reject with 401).
    fn credential(&self) -> Option<String>;

    /// Signal that the current credential was rejected and should be
    /// dropped.
    fn invalidate(&self);
}

/// Simple shared credential slot for hosts and tests.
///
/// The auth collaborator calls [`set`](SharedCredential::set) after sign-in;
/// `invalidate` clears the slot.
#[derive(Debug, Default)]
pub struct SharedCredential {
    token: RwLock<Option<String>>,
}

impl SharedCredential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Install a fresh credential after sign-in.
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().expect("credential lock poisoned") = Some(token.into());
    }
}

impl CredentialProvider for SharedCredential {
    fn credential(&self) -> Option<String> {
        self.token.read().expect("credential lock poisoned").clone()
    }

    fn invalidate(&self) {
        self.token.write().expect("credential lock poisoned").take();
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_clears_the_slot() {
        let cred = SharedCredential::new("t1");
        assert_eq!(cred.credential().as_deref(), Some("t1"));
        cred.invalidate();
        assert_eq!(cred.credential(), None);
        cred.set("t2");
        assert_eq!(cred.credential().as_deref(), Some("t2"));
    }
}
