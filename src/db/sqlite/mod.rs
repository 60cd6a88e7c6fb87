mod category;
mod comment;
mod post;
mod user;

pub mod config;

use std::path::Path;

use anyhow::Result;
use rusqlite::types::Value as DbValue;
use rusqlite::Connection as RawConnection;
use rusqlite::Transaction as RawTransaction;

use crate::api::category::{Category, GetCategoryRequest, PatchCategoryRequest};
use crate::api::comment::{Comment, GetCommentRequest};
use crate::api::post::{GetPostRequest, PatchPostRequest, Post};
use crate::api::user::{GetUserRequest, User};
use crate::moderation::Visibility;

use super::sql::Value;
use super::types::{
    Connection, CreateCategoryParams, CreateCommentParams, CreatePostParams, CreateUserParams,
    Transaction, UpdateUserParams, UserAuth,
};

/// SQLite-backed storage. The simplest storage type, suited to single-node
/// deployments. Supports both file-based and in-memory databases.
pub struct SqliteConnection {
    conn: RawConnection,
}

pub struct SqliteTransaction<'a> {
    tx: RawTransaction<'a>,
}

impl SqliteConnection {
    /// Opens a SQLite database file, creating it and all required tables if
    /// they don't exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = RawConnection::open(path)?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database whose content is lost on exit.
    /// Recommended for testing only.
    pub fn memory() -> Result<Self> {
        let conn = RawConnection::open_in_memory()?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    fn init_tables(conn: &RawConnection) -> Result<()> {
        user::create_table(conn)?;
        category::create_table(conn)?;
        post::create_table(conn)?;
        comment::create_table(conn)?;
        Ok(())
    }
}

impl<'a> Connection<'a, SqliteTransaction<'a>> for SqliteConnection {
    fn transaction(&'a mut self) -> Result<SqliteTransaction<'a>> {
        let tx = self.conn.transaction()?;
        Ok(SqliteTransaction { tx })
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<u64> {
        user::create(&self.tx, params)
    }

    fn update_user(&self, params: UpdateUserParams) -> Result<()> {
        user::update(&self.tx, params)
    }

    fn has_user_email(&self, email: &str) -> Result<bool> {
        user::has_email(&self.tx, email)
    }

    fn get_user_auth(&self, email: &str) -> Result<UserAuth> {
        user::get_auth(&self.tx, email)
    }

    fn get_user(&self, id: u64) -> Result<User> {
        user::get(&self.tx, id)
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        user::count_users(&self.tx, req)
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        user::get_users(&self.tx, req)
    }

    fn create_category(&self, params: CreateCategoryParams) -> Result<u64> {
        category::create(&self.tx, params)
    }

    fn update_category(&self, patch: PatchCategoryRequest, update_time: u64) -> Result<()> {
        category::update(&self.tx, patch, update_time)
    }

    fn delete_category(&self, id: u64) -> Result<()> {
        category::delete(&self.tx, id)
    }

    fn has_category(&self, id: u64) -> Result<bool> {
        category::has(&self.tx, id)
    }

    fn has_category_name(&self, name: &str) -> Result<bool> {
        category::has_name(&self.tx, name)
    }

    fn count_categories(&self, req: GetCategoryRequest) -> Result<u64> {
        category::count_categories(&self.tx, req)
    }

    fn get_categories(&self, req: GetCategoryRequest) -> Result<Vec<Category>> {
        category::get_categories(&self.tx, req)
    }

    fn create_post(&self, params: CreatePostParams) -> Result<u64> {
        post::create(&self.tx, params)
    }

    fn update_post(&self, patch: PatchPostRequest, update_time: u64) -> Result<()> {
        post::update(&self.tx, patch, update_time)
    }

    fn delete_post(&self, id: u64) -> Result<()> {
        post::delete(&self.tx, id)
    }

    fn has_post(&self, id: u64) -> Result<bool> {
        post::has(&self.tx, id)
    }

    fn get_post(&self, id: u64) -> Result<Post> {
        post::get(&self.tx, id)
    }

    fn count_posts(&self, req: GetPostRequest) -> Result<u64> {
        post::count_posts(&self.tx, req)
    }

    fn get_posts(&self, req: GetPostRequest) -> Result<Vec<Post>> {
        post::get_posts(&self.tx, req)
    }

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64> {
        comment::create(&self.tx, params)
    }

    fn get_comment(&self, id: u64) -> Result<Comment> {
        comment::get(&self.tx, id)
    }

    fn has_comment(&self, id: u64) -> Result<bool> {
        comment::has(&self.tx, id)
    }

    fn set_comment_active(&self, id: u64, is_active: bool, updated_by: u64) -> Result<()> {
        comment::set_active(&self.tx, id, is_active, updated_by)
    }

    fn delete_comment(&self, id: u64) -> Result<()> {
        comment::delete(&self.tx, id)
    }

    fn delete_post_comments(&self, post_id: u64) -> Result<u64> {
        comment::delete_post_comments(&self.tx, post_id)
    }

    fn count_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<u64> {
        comment::count_comments(&self.tx, req, visibility)
    }

    fn get_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<Vec<Comment>> {
        comment::get_comments(&self.tx, req, visibility)
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

/// Converts builder values into SQLite parameters. Booleans are stored as
/// integers.
pub fn convert_values(values: Vec<Value>) -> Vec<DbValue> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Text(text) => DbValue::Text(text),
            Value::Integer(integer) => DbValue::Integer(integer as i64),
            Value::Bool(boolean) => DbValue::Integer(boolean as i64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::db::tests::run_tests;
    use crate::db::{Database, UnionConnection};

    use super::*;

    #[test]
    fn test_memory() {
        let sqlite = SqliteConnection::memory().unwrap();
        let conn = UnionConnection::Sqlite(sqlite);
        let db = Database::new(conn);

        run_tests(&db);
    }

    #[test]
    fn test_file() {
        let path = "/tmp/test_newshub.db";
        let _ = fs::remove_file(path);

        let sqlite = SqliteConnection::open(Path::new(path)).unwrap();
        let conn = UnionConnection::Sqlite(sqlite);
        let db = Database::new(conn);

        run_tests(&db);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_convert_values() {
        let values = vec![
            Value::Text(String::from("hello")),
            Value::Integer(42),
            Value::Bool(true),
            Value::Bool(false),
        ];
        let converted = convert_values(values);
        assert_eq!(
            converted,
            vec![
                DbValue::Text(String::from("hello")),
                DbValue::Integer(42),
                DbValue::Integer(1),
                DbValue::Integer(0),
            ]
        );
    }
}
