//! Session / identity contract
//!
//! Sessions are issued elsewhere; the actions only ask "who is calling".

use crate::domain::OwnerId;

/// Resolves the caller's owner identity for one request.
///
/// `None` is an expected outcome (signed-out caller), not a fault.
pub trait SessionProvider: Send + Sync {
    fn current_owner_id(&self) -> Option<OwnerId>;
}

/// Identity resolved for a single request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    owner: Option<OwnerId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { owner: None }
    }

    pub fn for_owner(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }
}

impl SessionProvider for Session {
    fn current_owner_id(&self) -> Option<OwnerId> {
        self.owner.clone()
    }
}
