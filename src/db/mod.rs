mod sql;
mod sqlite;

#[cfg(test)]
mod tests;

pub mod config;
pub mod types;

use std::cell::RefCell;
use std::sync::Mutex;

use anyhow::{bail, Result};
use sqlite::{SqliteConnection, SqliteTransaction};
use types::{
    Connection, CreateCategoryParams, CreateCommentParams, CreatePostParams, CreateUserParams,
    Transaction, UpdateUserParams, UserAuth,
};

use crate::api::category::{Category, GetCategoryRequest, PatchCategoryRequest};
use crate::api::comment::{Comment, GetCommentRequest};
use crate::api::post::{GetPostRequest, PatchPostRequest, Post};
use crate::api::user::{GetUserRequest, User};
use crate::moderation::Visibility;

/// Storage entry point. All access goes through [`Database::with_transaction`],
/// which commits on success and rolls back on error, so multi-table operations
/// like post deletion stay atomic.
pub struct Database {
    conn: Mutex<RefCell<UnionConnection>>,
}

impl Database {
    pub fn new(conn: UnionConnection) -> Self {
        Self {
            conn: Mutex::new(RefCell::new(conn)),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        let conn = SqliteConnection::memory().unwrap();
        Self::new(UnionConnection::Sqlite(conn))
    }

    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Transaction) -> Result<T>,
    {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => bail!("failed to lock connection: {:#}", e),
        };
        let mut conn = conn.borrow_mut();
        let tx = conn.transaction()?;

        let result = f(&tx);

        if result.is_ok() {
            tx.commit()
        } else {
            tx.rollback()
        }?;

        result
    }
}

pub enum UnionConnection {
    Sqlite(SqliteConnection),
}

pub enum UnionTransaction<'a> {
    Sqlite(SqliteTransaction<'a>),
}

impl<'a> Connection<'a, UnionTransaction<'a>> for UnionConnection {
    fn transaction(&'a mut self) -> Result<UnionTransaction<'a>> {
        match self {
            UnionConnection::Sqlite(conn) => conn.transaction().map(UnionTransaction::Sqlite),
        }
    }
}

impl Transaction for UnionTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_user(params),
        }
    }

    fn update_user(&self, params: UpdateUserParams) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_user(params),
        }
    }

    fn has_user_email(&self, email: &str) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_user_email(email),
        }
    }

    fn get_user_auth(&self, email: &str) -> Result<UserAuth> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user_auth(email),
        }
    }

    fn get_user(&self, id: u64) -> Result<User> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user(id),
        }
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_users(req),
        }
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_users(req),
        }
    }

    fn create_category(&self, params: CreateCategoryParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_category(params),
        }
    }

    fn update_category(&self, patch: PatchCategoryRequest, update_time: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_category(patch, update_time),
        }
    }

    fn delete_category(&self, id: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_category(id),
        }
    }

    fn has_category(&self, id: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_category(id),
        }
    }

    fn has_category_name(&self, name: &str) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_category_name(name),
        }
    }

    fn count_categories(&self, req: GetCategoryRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_categories(req),
        }
    }

    fn get_categories(&self, req: GetCategoryRequest) -> Result<Vec<Category>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_categories(req),
        }
    }

    fn create_post(&self, params: CreatePostParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_post(params),
        }
    }

    fn update_post(&self, patch: PatchPostRequest, update_time: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_post(patch, update_time),
        }
    }

    fn delete_post(&self, id: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_post(id),
        }
    }

    fn has_post(&self, id: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_post(id),
        }
    }

    fn get_post(&self, id: u64) -> Result<Post> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_post(id),
        }
    }

    fn count_posts(&self, req: GetPostRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_posts(req),
        }
    }

    fn get_posts(&self, req: GetPostRequest) -> Result<Vec<Post>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_posts(req),
        }
    }

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_comment(params),
        }
    }

    fn get_comment(&self, id: u64) -> Result<Comment> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_comment(id),
        }
    }

    fn has_comment(&self, id: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_comment(id),
        }
    }

    fn set_comment_active(&self, id: u64, is_active: bool, updated_by: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.set_comment_active(id, is_active, updated_by),
        }
    }

    fn delete_comment(&self, id: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_comment(id),
        }
    }

    fn delete_post_comments(&self, post_id: u64) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_post_comments(post_id),
        }
    }

    fn count_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_comments(req, visibility),
        }
    }

    fn get_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<Vec<Comment>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_comments(req, visibility),
        }
    }

    fn commit(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.commit(),
        }
    }

    fn rollback(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.rollback(),
        }
    }
}
