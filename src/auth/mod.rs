pub mod jwt;
pub mod session;

use actix_web::HttpRequest;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::context::ServerContext;
use crate::roles::{self, Role};

/// Resolves the api caller or short-circuits with a 403 envelope. The
/// surface comes from the request path, so a session cookie never grants
/// access under `/api`. Both a missing credential and a bad one fail closed
/// here, the api surface never redirects.
#[macro_export]
macro_rules! auth_api_request {
    ($sc:expr, $req:expr) => {
        match $crate::auth::authenticate(
            $sc,
            &$req,
            $crate::auth::Surface::from_path($req.path()),
        ) {
            $crate::auth::Authn::Ok(identity) => identity,
            $crate::auth::Authn::Anonymous => {
                return $crate::api::Response::forbidden("Authentication required")
            }
            $crate::auth::Authn::Unauthenticated(msg) => {
                return $crate::api::Response::forbidden(msg)
            }
        }
    };
}

/// Resolves the web caller or short-circuits with a redirect to the login
/// page. Used by routes that require a signed-in user.
#[macro_export]
macro_rules! auth_web_request {
    ($sc:expr, $req:expr) => {
        match $crate::auth::authenticate(
            $sc,
            &$req,
            $crate::auth::Surface::from_path($req.path()),
        ) {
            $crate::auth::Authn::Ok(identity) => identity,
            _ => return $crate::api::WebResponse::redirect($crate::auth::LOGIN_ROUTE),
        }
    };
}

/// Resolves the web caller as an optional identity. Used by public routes
/// and by role-guarded routes whose deny UX is a dashboard redirect rather
/// than a login redirect.
#[macro_export]
macro_rules! web_identity {
    ($sc:expr, $req:expr) => {
        match $crate::auth::authenticate(
            $sc,
            &$req,
            $crate::auth::Surface::from_path($req.path()),
        ) {
            $crate::auth::Authn::Ok(identity) => Some(identity),
            _ => None,
        }
    };
}

pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// Cookie holding the opaque web session id.
pub const SESSION_COOKIE: &str = "session";
/// Fallback cookie for api clients that cannot set the Authorization header.
pub const TOKEN_COOKIE: &str = "token";

/// Where the web surface sends unauthenticated callers.
pub const LOGIN_ROUTE: &str = "/auth/login";
/// Where the web surface sends authenticated callers lacking a role.
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const HOME_ROUTE: &str = "/";

/// Which of the two client contracts a request belongs to. Decided once from
/// the route prefix at the entry point and carried explicitly, so guards
/// never re-derive it from the url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Browser surface: session cookie, redirect-based failure UX.
    Web,
    /// JSON api surface: bearer token, envelope-based failure UX.
    Api,
}

impl Surface {
    pub fn from_path(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            Surface::Api
        } else {
            Surface::Web
        }
    }
}

/// The resolved, authenticated caller: id, display name and held roles.
/// Request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub name: String,
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn has_any(&self, allowed: &[Role]) -> bool {
        roles::contains_any(&self.roles, allowed)
    }
}

/// Result of an authentication attempt.
#[derive(Debug)]
pub enum Authn {
    /// Caller presented a valid credential.
    Ok(Identity),
    /// Caller presented no credential at all.
    Anonymous,
    /// Caller presented a credential that failed verification.
    Unauthenticated(String),
}

/// Resolves the caller identity for a request. The two strategies are kept
/// separate on purpose: the session is server-held truth trusted as-is until
/// logout or expiry, the token is self-contained and verified on every
/// request. Their failure UX also differs, which the handler macros encode.
pub fn authenticate(sc: &ServerContext, req: &HttpRequest, surface: Surface) -> Authn {
    match surface {
        Surface::Web => authenticate_session(sc, req),
        Surface::Api => authenticate_token(sc, req),
    }
}

fn authenticate_session(sc: &ServerContext, req: &HttpRequest) -> Authn {
    let cookie = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie,
        None => return Authn::Anonymous,
    };

    let now = Utc::now().timestamp() as u64;
    match sc.sessions.get(cookie.value(), now) {
        Some(identity) => Authn::Ok(identity),
        None => Authn::Anonymous,
    }
}

fn authenticate_token(sc: &ServerContext, req: &HttpRequest) -> Authn {
    // Authorization header first, cookie fallback second.
    let token = match bearer_token(req) {
        Some(token) => token,
        None => match req.cookie(TOKEN_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Authn::Anonymous,
        },
    };

    let now = Utc::now().timestamp() as u64;
    match sc.jwt_validator.validate_token(&token, now) {
        Ok(identity) => Authn::Ok(identity),
        Err(e) => Authn::Unauthenticated(format!("{e:#}")),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(HEADER_AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(String::from(token))
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    use super::*;

    fn test_identity() -> Identity {
        Identity {
            id: 7,
            name: String::from("alice"),
            roles: vec![Role::User],
        }
    }

    #[test]
    fn test_session_strategy() {
        let sc = ServerContext::new_test();
        let now = Utc::now().timestamp() as u64;
        let session_id = sc.sessions.create(test_identity(), now);

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, session_id))
            .to_http_request();
        match authenticate(&sc, &req, Surface::Web) {
            Authn::Ok(identity) => assert_eq!(identity, test_identity()),
            other => panic!("expected identity, got {other:?}"),
        }

        // No cookie at all: anonymous, not an error.
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            authenticate(&sc, &req, Surface::Web),
            Authn::Anonymous
        ));

        // Unknown session id: anonymous as well.
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "stale"))
            .to_http_request();
        assert!(matches!(
            authenticate(&sc, &req, Surface::Web),
            Authn::Anonymous
        ));
    }

    #[test]
    fn test_token_strategy() {
        let sc = ServerContext::new_test();
        let now = Utc::now().timestamp() as u64;
        let token = sc
            .jwt_generator
            .generate_token(&test_identity(), now)
            .unwrap();

        let req = TestRequest::default()
            .insert_header((HEADER_AUTHORIZATION, format!("Bearer {}", token.token)))
            .to_http_request();
        match authenticate(&sc, &req, Surface::Api) {
            Authn::Ok(identity) => assert_eq!(identity, test_identity()),
            other => panic!("expected identity, got {other:?}"),
        }

        // Header absent, cookie fallback.
        let req = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE, token.token.clone()))
            .to_http_request();
        assert!(matches!(
            authenticate(&sc, &req, Surface::Api),
            Authn::Ok(_)
        ));

        // Missing both is anonymous.
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            authenticate(&sc, &req, Surface::Api),
            Authn::Anonymous
        ));

        // Garbage token is a hard authentication failure.
        let req = TestRequest::default()
            .insert_header((HEADER_AUTHORIZATION, "Bearer garbage"))
            .to_http_request();
        assert!(matches!(
            authenticate(&sc, &req, Surface::Api),
            Authn::Unauthenticated(_)
        ));
    }

    #[test]
    fn test_surface_from_path() {
        assert_eq!(Surface::from_path("/api"), Surface::Api);
        assert_eq!(Surface::from_path("/api/posts"), Surface::Api);
        assert_eq!(Surface::from_path("/apiary"), Surface::Web);
        assert_eq!(Surface::from_path("/"), Surface::Web);
        assert_eq!(Surface::from_path("/posts"), Surface::Web);
    }
}
