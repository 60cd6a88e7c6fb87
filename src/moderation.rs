use crate::auth::Identity;

/// Moderation state of a comment, stored as the `is_active` flag. There are
/// exactly two states and no automatic transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStatus {
    /// Awaiting approval, hidden from the public.
    Pending,
    /// Publicly visible.
    Active,
}

impl CommentStatus {
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            CommentStatus::Active
        } else {
            CommentStatus::Pending
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CommentStatus::Active)
    }

    /// Initial state at creation: admin-authored comments bypass moderation,
    /// everyone else starts pending.
    pub fn initial_for(creator: &Identity) -> Self {
        if creator.is_admin() {
            CommentStatus::Active
        } else {
            CommentStatus::Pending
        }
    }

    /// Applies a moderation transition. Approve and reject are idempotent:
    /// approving an already active comment stays active and succeeds.
    /// Transitions are admin-only, enforced by the authorization guard at
    /// the route, not here.
    pub fn apply(self, approve: bool) -> Self {
        if approve {
            CommentStatus::Active
        } else {
            CommentStatus::Pending
        }
    }
}

/// Comment visibility filter for read paths, derived from the reader once
/// and pushed down into the storage query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Admin readers see every comment.
    All,
    /// Authenticated readers see active comments plus their own.
    ActiveOrAuthor(u64),
    /// Anonymous readers see only active comments.
    ActiveOnly,
}

impl Visibility {
    pub fn for_reader(reader: Option<&Identity>) -> Self {
        match reader {
            Some(identity) if identity.is_admin() => Visibility::All,
            Some(identity) => Visibility::ActiveOrAuthor(identity.id),
            None => Visibility::ActiveOnly,
        }
    }

    /// The predicate applied by the storage layer; kept here so it can be
    /// tested against the query implementation.
    pub fn allows(&self, author_id: u64, is_active: bool) -> bool {
        match self {
            Visibility::All => true,
            Visibility::ActiveOrAuthor(reader_id) => is_active || author_id == *reader_id,
            Visibility::ActiveOnly => is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::roles::Role;

    use super::*;

    fn identity(id: u64, roles: Vec<Role>) -> Identity {
        Identity {
            id,
            name: format!("user{id}"),
            roles,
        }
    }

    #[test]
    fn test_initial_state() {
        let admin = identity(1, vec![Role::Admin]);
        let user = identity(2, vec![Role::User]);
        let customer = identity(3, vec![Role::Customer]);

        assert_eq!(CommentStatus::initial_for(&admin), CommentStatus::Active);
        assert_eq!(CommentStatus::initial_for(&user), CommentStatus::Pending);
        assert_eq!(CommentStatus::initial_for(&customer), CommentStatus::Pending);
    }

    #[test]
    fn test_transitions_idempotent() {
        let pending = CommentStatus::Pending;
        let active = pending.apply(true);
        assert_eq!(active, CommentStatus::Active);
        // Approving twice keeps the comment active.
        assert_eq!(active.apply(true), CommentStatus::Active);

        let rejected = active.apply(false);
        assert_eq!(rejected, CommentStatus::Pending);
        assert_eq!(rejected.apply(false), CommentStatus::Pending);
    }

    #[test]
    fn test_active_roundtrip() {
        assert!(CommentStatus::from_active(true).is_active());
        assert!(!CommentStatus::from_active(false).is_active());
    }

    #[test]
    fn test_visibility() {
        let admin = identity(1, vec![Role::Admin]);
        let user = identity(2, vec![Role::User]);

        let all = Visibility::for_reader(Some(&admin));
        assert_eq!(all, Visibility::All);
        assert!(all.allows(9, false));

        let own = Visibility::for_reader(Some(&user));
        assert_eq!(own, Visibility::ActiveOrAuthor(2));
        assert!(own.allows(9, true)); // someone else's active comment
        assert!(own.allows(2, false)); // own pending comment
        assert!(!own.allows(9, false)); // someone else's pending comment

        let anon = Visibility::for_reader(None);
        assert_eq!(anon, Visibility::ActiveOnly);
        assert!(anon.allows(9, true));
        assert!(!anon.allows(9, false));
    }
}
