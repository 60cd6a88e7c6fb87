use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::comment::Comment;
use super::{QueryRequest, Request};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Post {
    pub id: u64,

    pub title: String,

    pub content: String,

    pub category_id: u64,

    /// The creating user. Immutable after creation, this is the field the
    /// ownership guard checks against.
    pub author_id: u64,

    /// Path of an uploaded image, managed by the external upload handler.
    pub image: Option<String>,

    pub create_time: u64,

    pub update_time: u64,
}

/// Post detail page data: the post plus the comments visible to the reader.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutPostRequest {
    pub title: String,
    pub content: String,
    pub category_id: u64,
    pub image: Option<String>,
}

impl Request for PutPostRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.title = fields.remove("title").unwrap_or_default();
        if self.title.len() < 2 {
            bail!("title must be at least 2 characters");
        }
        self.content = fields.remove("content").unwrap_or_default();
        if self.content.len() < 2 {
            bail!("content must be at least 2 characters");
        }
        self.category_id = match parse_from_map!(fields, "category_id") {
            Some(id) => id,
            None => bail!("category_id is required to put post"),
        };
        self.image = fields.remove("image");
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PatchPostRequest {
    pub id: u64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<u64>,
}

impl Request for PatchPostRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to patch post"),
        };
        self.title = fields.remove("title");
        self.content = fields.remove("content");
        self.category_id = parse_from_map!(fields, "category_id");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetPostRequest {
    pub id: Option<u64>,

    pub author_id: Option<u64>,

    pub category_id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetPostRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.author_id = parse_from_map!(fields, "author_id");
        self.category_id = parse_from_map!(fields, "category_id");
        self.query.complete(fields)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct DeletePostRequest {
    pub id: u64,
}

impl Request for DeletePostRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to delete post"),
        };
        Ok(())
    }
}
