use std::collections::HashMap;

use actix_web::web::Bytes;
use actix_web::HttpRequest;
use anyhow::{Context, Result};
use log::debug;
use url::form_urlencoded;

use crate::api::Request;

#[macro_export]
macro_rules! parse_api_request {
    ($req:expr, $body:expr) => {
        match $crate::request::parse_request_raw(&$req, $body) {
            Ok(parsed) => parsed,
            Err(e) => return $crate::api::Response::bad_request(format!("bad request: {e:#}")),
        }
    };
}

#[macro_export]
macro_rules! parse_web_request {
    ($req:expr, $body:expr) => {
        match $crate::request::parse_request_raw(&$req, $body) {
            Ok(parsed) => parsed,
            Err(e) => return $crate::api::WebResponse::error(format!("bad request: {e:#}")),
        }
    };
}

/// Parses a typed request from the query string plus an optional url-encoded
/// form body. Body fields win over query fields of the same name.
pub fn parse_request_raw<T>(req: &HttpRequest, body: Option<Bytes>) -> Result<T>
where
    T: Request,
{
    let mut fields: HashMap<String, String> =
        form_urlencoded::parse(req.query_string().as_bytes())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

    if let Some(body) = body.as_ref() {
        for (key, value) in form_urlencoded::parse(body) {
            fields.insert(key.to_string(), value.to_string());
        }
    }

    debug!(
        "- {} {}, fields: {:?}, peer: {:?}",
        req.method(),
        req.path(),
        fields.keys(),
        req.peer_addr(),
    );

    let mut parsed = T::default();
    parsed.complete(fields).context("parse request")?;

    Ok(parsed)
}
