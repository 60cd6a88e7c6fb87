use crate::auth::Identity;
use crate::roles::Role;

/// Data-level check for post update/delete. Admin may mutate any post, User
/// only posts it authored. Customer can create posts but never mutate
/// existing ones, including its own (write-once, an intentional asymmetry).
pub fn can_mutate_post(identity: &Identity, author_id: u64) -> bool {
    if identity.is_admin() {
        return true;
    }
    if identity.roles.contains(&Role::User) {
        return identity.id == author_id;
    }
    false
}

/// Data-level check for comment delete: the comment's author or an admin.
pub fn can_delete_comment(identity: &Identity, author_id: u64) -> bool {
    identity.id == author_id || identity.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: u64, roles: Vec<Role>) -> Identity {
        Identity {
            id,
            name: format!("user{id}"),
            roles,
        }
    }

    #[test]
    fn test_post_ownership_matrix() {
        let admin = identity(1, vec![Role::Admin]);
        let user = identity(2, vec![Role::User]);
        let customer = identity(3, vec![Role::Customer]);

        // Admin mutates anything.
        assert!(can_mutate_post(&admin, 1));
        assert!(can_mutate_post(&admin, 2));

        // User mutates only its own posts.
        assert!(can_mutate_post(&user, 2));
        assert!(!can_mutate_post(&user, 1));
        assert!(!can_mutate_post(&user, 3));

        // Customer mutates nothing, not even its own posts.
        assert!(!can_mutate_post(&customer, 3));
        assert!(!can_mutate_post(&customer, 1));
    }

    #[test]
    fn test_post_multi_role() {
        // Holding Customer alongside User does not revoke the User rights.
        let both = identity(5, vec![Role::Customer, Role::User]);
        assert!(can_mutate_post(&both, 5));
        assert!(!can_mutate_post(&both, 6));
    }

    #[test]
    fn test_comment_delete() {
        let admin = identity(1, vec![Role::Admin]);
        let user = identity(2, vec![Role::User]);
        let customer = identity(3, vec![Role::Customer]);

        assert!(can_delete_comment(&user, 2));
        assert!(!can_delete_comment(&user, 3));

        assert!(can_delete_comment(&admin, 2));
        assert!(can_delete_comment(&admin, 1));

        // Customers may delete their own comments, just not posts.
        assert!(can_delete_comment(&customer, 3));
        assert!(!can_delete_comment(&customer, 2));
    }
}
