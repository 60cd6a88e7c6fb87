use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;
use crate::roles::Role;

use super::{QueryRequest, Request};

/// Public view of a user, never carries password material.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: u64,

    pub name: String,

    pub email: String,

    pub roles: Vec<Role>,

    pub update_time: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Request for LoginRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.email = fields.remove("email").unwrap_or_default();
        if self.email.is_empty() {
            bail!("email is required to login");
        }
        self.password = fields.remove("password").unwrap_or_default();
        if self.password.is_empty() {
            bail!("password is required to login");
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Request for RegisterRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to register");
        }
        self.email = fields.remove("email").unwrap_or_default();
        if self.email.is_empty() {
            bail!("email is required to register");
        }
        self.password = fields.remove("password").unwrap_or_default();
        if self.password.is_empty() {
            bail!("password is required to register");
        }
        Ok(())
    }
}

/// Profile update form. Password is optional, an empty value leaves the
/// current password untouched.
#[derive(Debug, Default, PartialEq)]
pub struct ProfileUpdateRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
}

impl Request for ProfileUpdateRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to update profile");
        }
        self.email = fields.remove("email").unwrap_or_default();
        if self.email.is_empty() {
            bail!("email is required to update profile");
        }
        self.password = fields.remove("password").filter(|p| !p.trim().is_empty());
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetUserRequest {
    pub id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetUserRequest {
    fn complete(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.query.complete(fields)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expire_after: u64,
}
