use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Comment {
    pub id: u64,

    pub post_id: u64,

    pub author_id: u64,

    pub content: String,

    /// Moderation state: false is pending approval, true is publicly
    /// visible.
    pub is_active: bool,

    /// The user who last changed the moderation state (the author at
    /// creation time, an admin after a moderation toggle).
    pub last_updated_by: u64,

    pub create_time: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutCommentRequest {
    pub post_id: u64,
    pub content: String,
}

impl Request for PutCommentRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.post_id = match parse_from_map!(fields, "post_id") {
            Some(id) => id,
            None => bail!("post_id is required to put comment"),
        };
        self.content = fields.remove("content").unwrap_or_default();
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetCommentRequest {
    pub id: Option<u64>,

    pub post_id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetCommentRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.post_id = parse_from_map!(fields, "post_id");
        self.query.complete(fields)
    }
}

/// Moderation toggle: approve moves a comment to active, reject moves it
/// back to pending.
#[derive(Debug, Default, PartialEq)]
pub struct ModerateCommentRequest {
    pub id: u64,
    pub approve: bool,
}

impl Request for ModerateCommentRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to moderate comment"),
        };
        self.approve = match parse_from_map!(fields, "approve") {
            Some(approve) => approve,
            None => bail!("approve is required to moderate comment"),
        };
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct DeleteCommentRequest {
    pub id: u64,
}

impl Request for DeleteCommentRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to delete comment"),
        };
        Ok(())
    }
}
