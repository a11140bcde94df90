//! Access policy for the session store's callers.
//!
//! Verifying who a user *is* belongs to the transport's access-control
//! collaborator; this policy only answers whether a verified user id may use
//! the assistant. It is an explicit, injected object -- the "everyone may
//! talk to the bot" switch is an atomic flag on the policy, not a mutable
//! module-level variable.

use std::sync::atomic::{AtomicBool, Ordering};

/// Decides which user ids are allowed through.
///
/// The owner is always allowed. Everyone else is allowed only while open
/// access is enabled.
#[derive(Debug)]
pub struct AccessPolicy {
    owner_id: i64,
    open_access: AtomicBool,
}

impl AccessPolicy {
    pub fn new(owner_id: i64, open_access: bool) -> Self {
        Self {
            owner_id,
            open_access: AtomicBool::new(open_access),
        }
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        user_id == self.owner_id || self.open_access.load(Ordering::Relaxed)
    }

    pub fn open_access(&self) -> bool {
        self.open_access.load(Ordering::Relaxed)
    }

    pub fn set_open_access(&self, open: bool) {
        self.open_access.store(open, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_always_allowed() {
        let policy = AccessPolicy::new(100, false);
        assert!(policy.is_allowed(100));
        assert!(!policy.is_allowed(200));
    }

    #[test]
    fn test_open_access_allows_everyone() {
        let policy = AccessPolicy::new(100, false);
        policy.set_open_access(true);
        assert!(policy.is_allowed(200));

        policy.set_open_access(false);
        assert!(!policy.is_allowed(200));
        assert!(policy.is_allowed(100));
    }
}
