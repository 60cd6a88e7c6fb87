use anyhow::Result;

use crate::api::category::{Category, GetCategoryRequest, PatchCategoryRequest};
use crate::api::comment::{Comment, GetCommentRequest};
use crate::api::post::{GetPostRequest, PatchPostRequest, Post, PutPostRequest};
use crate::api::user::{GetUserRequest, User};
use crate::moderation::Visibility;

pub trait Connection<'a, T>
where
    T: Transaction + 'a,
{
    fn transaction(&'a mut self) -> Result<T>;
}

pub trait Transaction {
    fn create_user(&self, params: CreateUserParams) -> Result<u64>;
    fn update_user(&self, params: UpdateUserParams) -> Result<()>;
    fn has_user_email(&self, email: &str) -> Result<bool>;
    fn get_user_auth(&self, email: &str) -> Result<UserAuth>;
    fn get_user(&self, id: u64) -> Result<User>;
    fn count_users(&self, req: GetUserRequest) -> Result<u64>;
    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>>;

    fn create_category(&self, params: CreateCategoryParams) -> Result<u64>;
    fn update_category(&self, patch: PatchCategoryRequest, update_time: u64) -> Result<()>;
    fn delete_category(&self, id: u64) -> Result<()>;
    fn has_category(&self, id: u64) -> Result<bool>;
    fn has_category_name(&self, name: &str) -> Result<bool>;
    fn count_categories(&self, req: GetCategoryRequest) -> Result<u64>;
    fn get_categories(&self, req: GetCategoryRequest) -> Result<Vec<Category>>;

    fn create_post(&self, params: CreatePostParams) -> Result<u64>;
    fn update_post(&self, patch: PatchPostRequest, update_time: u64) -> Result<()>;
    fn delete_post(&self, id: u64) -> Result<()>;
    fn has_post(&self, id: u64) -> Result<bool>;
    fn get_post(&self, id: u64) -> Result<Post>;
    fn count_posts(&self, req: GetPostRequest) -> Result<u64>;
    fn get_posts(&self, req: GetPostRequest) -> Result<Vec<Post>>;

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64>;
    fn get_comment(&self, id: u64) -> Result<Comment>;
    fn has_comment(&self, id: u64) -> Result<bool>;
    fn set_comment_active(&self, id: u64, is_active: bool, updated_by: u64) -> Result<()>;
    fn delete_comment(&self, id: u64) -> Result<()>;
    fn delete_post_comments(&self, post_id: u64) -> Result<u64>;
    fn count_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<u64>;
    fn get_comments(&self, req: GetCommentRequest, visibility: Visibility) -> Result<Vec<Comment>>;

    fn commit(self) -> Result<()>;
    fn rollback(self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    /// Salted hash, never the raw password.
    pub password: String,
    pub salt: String,
    /// Comma-joined role list.
    pub roles: String,
    pub create_time: u64,
}

#[derive(Debug, Default)]
pub struct UpdateUserParams {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// New salted hash plus its salt, when the password changes.
    pub password: Option<(String, String)>,
    pub update_time: u64,
}

/// Credential row used by login. Kept separate from [`User`] so password
/// material never travels through the list/get paths.
#[derive(Debug, Default, PartialEq)]
pub struct UserAuth {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub roles: String,
}

#[derive(Debug, Default)]
pub struct CreateCategoryParams {
    pub name: String,
    pub description: String,
    pub update_time: u64,
}

#[derive(Debug, Default)]
pub struct CreatePostParams {
    pub post: PutPostRequest,
    pub author_id: u64,
    pub create_time: u64,
}

#[derive(Debug, Default)]
pub struct CreateCommentParams {
    pub post_id: u64,
    pub author_id: u64,
    pub content: String,
    pub is_active: bool,
    pub create_time: u64,
}
