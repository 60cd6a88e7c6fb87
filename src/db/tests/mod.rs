mod post;
mod user;

use anyhow::{bail, Result};

use super::types::CreateUserParams;
use super::Database;

pub fn run_tests(db: &Database) {
    user::run_user_tests(db);
    category::run_category_tests(db);
    post::run_post_tests(db);
    comment::run_comment_tests(db);

    test_rollback(db);
}

fn test_rollback(db: &Database) {
    let result: Result<()> = db.with_transaction(|tx| {
        tx.create_user(CreateUserParams {
            name: String::from("ghost"),
            email: String::from("ghost@example.com"),
            password: String::from("hash"),
            salt: String::from("test_salt"),
            roles: String::from("user"),
            create_time: 50,
        })
        .unwrap();

        bail!("rollback");
    });
    assert!(result.is_err());

    db.with_transaction(|tx| {
        assert!(!tx.has_user_email("ghost@example.com")?);
        Ok(())
    })
    .unwrap();
}
