use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Category {
    pub id: u64,

    pub name: String,

    pub description: String,

    pub is_active: bool,

    pub update_time: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutCategoryRequest {
    pub name: String,
    pub description: String,
}

impl Request for PutCategoryRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to put category");
        }
        self.description = fields.remove("description").unwrap_or_default();
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PatchCategoryRequest {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Request for PatchCategoryRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to patch category"),
        };
        self.name = fields.remove("name");
        self.description = fields.remove("description");
        self.is_active = parse_from_map!(fields, "is_active");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetCategoryRequest {
    pub id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetCategoryRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.query.complete(fields)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct DeleteCategoryRequest {
    pub id: u64,
}

impl Request for DeleteCategoryRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to delete category"),
        };
        Ok(())
    }
}
