pub mod category;
pub mod comment;
pub mod post;
pub mod user;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[macro_export]
macro_rules! parse_from_map {
    ($fields:expr,$field:expr) => {
        match $fields.get($field) {
            Some(value) => match value.parse() {
                Ok(value) => Some(value),
                Err(_) => anyhow::bail!(format!("{} is invalid", $field)),
            },
            None => None,
        }
    };
}

/// A request that can be completed from url-encoded fields (query string for
/// GET/DELETE, form body for POST/PUT/PATCH).
pub trait Request: Default {
    fn complete(&mut self, fields: HashMap<String, String>) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EmptyRequest;

impl Request for EmptyRequest {
    fn complete(&mut self, _fields: HashMap<String, String>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct QueryRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,

    pub search: Option<String>,
}

const DEFAULT_LIMIT: u64 = 10;

impl Request for QueryRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> anyhow::Result<()> {
        self.offset = parse_from_map!(fields, "offset");
        self.limit = parse_from_map!(fields, "limit");
        if self.limit.is_none() {
            self.limit = Some(DEFAULT_LIMIT);
        }
        self.search = fields.remove("search");
        Ok(())
    }
}

pub const STATUS_OK: u32 = 200;
pub const STATUS_BAD_REQUEST: u32 = 400;
pub const STATUS_FORBIDDEN: u32 = 403;
pub const STATUS_NOT_FOUND: u32 = 404;
pub const STATUS_INTERNAL_SERVER_ERROR: u32 = 500;

/// The uniform JSON envelope returned by the api surface,
/// `{code, success, message, data}`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct Response<T: Serialize + DeserializeOwned> {
    pub code: u32,

    pub success: bool,

    pub message: Option<String>,

    pub data: Option<T>,
}

impl<T: Serialize + DeserializeOwned> Response<T> {
    pub fn ok() -> Self {
        Self {
            code: STATUS_OK,
            success: true,
            message: None,
            data: None,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self {
            code: STATUS_OK,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::err(STATUS_BAD_REQUEST, message)
    }

    /// Authentication and authorization failures on the api surface both
    /// render as a 403 envelope, never a redirect.
    pub fn forbidden(message: impl ToString) -> Self {
        Self::err(STATUS_FORBIDDEN, message)
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::err(STATUS_NOT_FOUND, message)
    }

    pub fn resource_not_found() -> Self {
        Self::not_found("Resource not found")
    }

    pub fn internal_server_error(message: impl ToString) -> Self {
        Self::err(STATUS_INTERNAL_SERVER_ERROR, message)
    }

    pub fn database_error() -> Self {
        Self::internal_server_error("Database error")
    }

    fn err(code: u32, message: impl ToString) -> Self {
        Self {
            code,
            success: false,
            message: Some(message.to_string()),
            data: None,
        }
    }
}

/// Response of a web surface handler. View rendering is external, so pages
/// carry their data as a JSON envelope; authorization failures redirect
/// instead of erroring.
#[derive(Debug)]
pub enum WebResponse<T: Serialize + DeserializeOwned> {
    Redirect(String),
    Page(Response<T>),
}

impl<T: Serialize + DeserializeOwned> WebResponse<T> {
    pub fn redirect(location: impl ToString) -> Self {
        Self::Redirect(location.to_string())
    }

    pub fn page(data: T) -> Self {
        Self::Page(Response::with_data(data))
    }

    pub fn error(message: impl ToString) -> Self {
        Self::Page(Response::bad_request(message))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct ListResponse<T: Serialize + DeserializeOwned> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub timestamp: u64,
}
