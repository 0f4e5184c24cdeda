//! Per-resource authorization predicates.
//!
//! Each policy is a pure function of (request identity, action, resource
//! owner). Denials distinguish "not authenticated" from "not permitted" so
//! the transport layer can map them to 401 vs 403.

use uuid::Uuid;

use crate::auth::AuthUser;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Requester is anonymous but the action needs an identity.
    NotAuthenticated(String),
    /// Requester is known but lacks the required right.
    NotPermitted(String),
}

impl Decision {
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::NotAuthenticated(msg) => Err(AppError::AuthError(msg)),
            Decision::NotPermitted(msg) => Err(AppError::Forbidden(msg)),
        }
    }
}

pub trait Policy {
    fn authorize(&self, identity: Option<&AuthUser>, action: Action, owner: Option<Uuid>)
        -> Decision;
}

/// Reads are open; writes require any authenticated identity.
pub struct AuthenticatedOrReadOnly;

impl Policy for AuthenticatedOrReadOnly {
    fn authorize(
        &self,
        identity: Option<&AuthUser>,
        action: Action,
        _owner: Option<Uuid>,
    ) -> Decision {
        match (action, identity) {
            (Action::Read, _) => Decision::Allow,
            (Action::Write, Some(_)) => Decision::Allow,
            (Action::Write, None) => {
                Decision::NotAuthenticated("Authentication required for this action".to_string())
            }
        }
    }
}

/// Reads are open; writes require the requester to own the resource.
pub struct OwnerOrReadOnly;

impl Policy for OwnerOrReadOnly {
    fn authorize(
        &self,
        identity: Option<&AuthUser>,
        action: Action,
        owner: Option<Uuid>,
    ) -> Decision {
        if action == Action::Read {
            return Decision::Allow;
        }
        match identity {
            None => {
                Decision::NotAuthenticated("Authentication required for this action".to_string())
            }
            Some(user) if owner == Some(user.id) => Decision::Allow,
            Some(_) => {
                Decision::NotPermitted("Only the owner may modify this resource".to_string())
            }
        }
    }
}

/// Only administrators, for any action.
pub struct AdminOnly;

impl Policy for AdminOnly {
    fn authorize(
        &self,
        identity: Option<&AuthUser>,
        _action: Action,
        _owner: Option<Uuid>,
    ) -> Decision {
        match identity {
            None => {
                Decision::NotAuthenticated("Authentication required for this action".to_string())
            }
            Some(user) if user.is_admin => Decision::Allow,
            Some(_) => Decision::NotPermitted("Administrator access required".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "maria".to_string(),
            is_admin,
        }
    }

    #[test]
    fn reads_are_always_open() {
        assert_eq!(
            AuthenticatedOrReadOnly.authorize(None, Action::Read, None),
            Decision::Allow
        );
        assert_eq!(
            OwnerOrReadOnly.authorize(None, Action::Read, Some(Uuid::new_v4())),
            Decision::Allow
        );
    }

    #[test]
    fn anonymous_writes_are_unauthenticated_not_forbidden() {
        let d = AuthenticatedOrReadOnly.authorize(None, Action::Write, None);
        assert!(matches!(d, Decision::NotAuthenticated(_)));

        let d = OwnerOrReadOnly.authorize(None, Action::Write, Some(Uuid::new_v4()));
        assert!(matches!(d, Decision::NotAuthenticated(_)));
    }

    #[test]
    fn only_the_owner_may_write() {
        let owner = user(false);
        let stranger = user(false);

        assert_eq!(
            OwnerOrReadOnly.authorize(Some(&owner), Action::Write, Some(owner.id)),
            Decision::Allow
        );
        let d = OwnerOrReadOnly.authorize(Some(&stranger), Action::Write, Some(owner.id));
        assert!(matches!(d, Decision::NotPermitted(_)));
    }

    #[test]
    fn admin_gate() {
        let admin = user(true);
        let regular = user(false);

        assert_eq!(
            AdminOnly.authorize(Some(&admin), Action::Write, None),
            Decision::Allow
        );
        assert!(matches!(
            AdminOnly.authorize(Some(&regular), Action::Write, None),
            Decision::NotPermitted(_)
        ));
        assert!(matches!(
            AdminOnly.authorize(None, Action::Write, None),
            Decision::NotAuthenticated(_)
        ));
    }
}
