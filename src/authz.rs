use crate::auth::Identity;
use crate::roles::Role;

/// Result of a route-level role check.
#[derive(Debug, PartialEq, Eq)]
pub enum Authz {
    Allow,
    Deny,
}

impl Authz {
    pub fn is_deny(&self) -> bool {
        matches!(self, Authz::Deny)
    }
}

/// Route-level authorization: allow when the caller holds at least one of
/// the allowed roles (any-of, not all-of). No identity is an automatic deny.
///
/// Rendering a deny is surface-specific and left to the handler: the web
/// surface redirects to the dashboard, the api surface returns a 403
/// envelope.
pub fn require_roles(identity: Option<&Identity>, allowed: &[Role]) -> Authz {
    match identity {
        Some(identity) if identity.has_any(allowed) => Authz::Allow,
        _ => Authz::Deny,
    }
}
