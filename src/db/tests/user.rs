use crate::api::user::{GetUserRequest, User};
use crate::api::QueryRequest;
use crate::db::types::{CreateUserParams, UpdateUserParams, UserAuth};
use crate::db::Database;
use crate::roles::Role;

pub fn run_user_tests(db: &Database) {
    test_create(db);
    test_get(db);
    test_update(db);
}

fn test_create(db: &Database) {
    let users = [
        CreateUserParams {
            name: String::from("alice"),
            email: String::from("alice@example.com"),
            password: String::from("hash_alice"),
            salt: String::from("salt_alice"),
            roles: String::from("admin"),
            create_time: 50,
        },
        CreateUserParams {
            name: String::from("bob"),
            email: String::from("bob@example.com"),
            password: String::from("hash_bob"),
            salt: String::from("salt_bob"),
            roles: String::from("user,customer"),
            create_time: 100,
        },
    ];

    db.with_transaction(|tx| {
        let mut expect_id = 1;
        for user in users {
            let id = tx.create_user(user)?;
            assert_eq!(id, expect_id);
            expect_id += 1;
        }
        Ok(())
    })
    .unwrap();
}

fn test_get(db: &Database) {
    let alice = User {
        id: 1,
        name: String::from("alice"),
        email: String::from("alice@example.com"),
        roles: vec![Role::Admin],
        update_time: 50,
    };
    let bob = User {
        id: 2,
        name: String::from("bob"),
        email: String::from("bob@example.com"),
        roles: vec![Role::User, Role::Customer],
        update_time: 100,
    };

    db.with_transaction(|tx| {
        let users = tx.get_users(GetUserRequest::default())?;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0], bob);
        assert_eq!(users[1], alice);

        let users = tx.get_users(GetUserRequest {
            query: QueryRequest {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
            ..Default::default()
        })?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0], alice);

        let user = tx.get_user(2)?;
        assert_eq!(user, bob);

        assert!(tx.has_user_email("alice@example.com")?);
        assert!(!tx.has_user_email("none@example.com")?);

        let count = tx.count_users(GetUserRequest::default())?;
        assert_eq!(count, 2);

        let users = tx.get_users(GetUserRequest {
            query: QueryRequest {
                search: Some(String::from("al")),
                ..Default::default()
            },
            ..Default::default()
        })?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0], alice);

        let auth = tx.get_user_auth("alice@example.com")?;
        assert_eq!(
            auth,
            UserAuth {
                id: 1,
                name: String::from("alice"),
                email: String::from("alice@example.com"),
                password: String::from("hash_alice"),
                salt: String::from("salt_alice"),
                roles: String::from("admin"),
            }
        );

        let result = tx.get_user_auth("none@example.com");
        assert!(result.is_err());

        Ok(())
    })
    .unwrap();
}

fn test_update(db: &Database) {
    db.with_transaction(|tx| {
        tx.update_user(UpdateUserParams {
            id: 2,
            name: String::from("bobby"),
            email: String::from("bobby@example.com"),
            password: None,
            update_time: 4000,
        })?;

        let user = tx.get_user(2)?;
        assert_eq!(user.name, "bobby");
        assert_eq!(user.email, "bobby@example.com");
        assert_eq!(user.update_time, 4000);

        // Password untouched when the update carries none.
        let auth = tx.get_user_auth("bobby@example.com")?;
        assert_eq!(auth.password, "hash_bob");
        assert_eq!(auth.salt, "salt_bob");

        tx.update_user(UpdateUserParams {
            id: 2,
            name: String::from("bobby"),
            email: String::from("bobby@example.com"),
            password: Some((String::from("new_hash"), String::from("new_salt"))),
            update_time: 5000,
        })?;

        let auth = tx.get_user_auth("bobby@example.com")?;
        assert_eq!(auth.password, "new_hash");
        assert_eq!(auth.salt, "new_salt");

        Ok(())
    })
    .unwrap();
}
