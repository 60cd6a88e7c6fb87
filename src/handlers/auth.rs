use std::sync::Arc;

use actix_web::cookie::time::Duration;
use actix_web::cookie::Cookie;
use actix_web::web::{Bytes, Data};
use actix_web::{HttpRequest, HttpResponse};
use anyhow::{bail, Result};
use chrono::Utc;
use log::{debug, error};

use crate::api::user::{LoginRequest, ProfileUpdateRequest, RegisterRequest, TokenResponse, User};
use crate::api::{Response, WebResponse};
use crate::auth::{Identity, DASHBOARD_ROUTE, HOME_ROUTE, LOGIN_ROUTE, SESSION_COOKIE};
use crate::context::ServerContext;
use crate::db::types::{CreateUserParams, UpdateUserParams};
use crate::request::parse_request_raw;
use crate::roles::{self, Role};
use crate::{secret, validate};

use super::{convert_response, convert_web_response, redirect_response};

/// Uniform login failure message. An unknown email and a wrong password are
/// indistinguishable to the caller.
const LOGIN_FAIL_MESSAGE: &str = "Email or Password Fail";

/// Web login: verify credentials, mint a session and hand the browser a
/// session cookie. Hand-written rather than macro-registered because it has
/// to attach the cookie to the response.
pub async fn web_login_handler(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> HttpResponse {
    let login: LoginRequest = match parse_request_raw(&req, body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return convert_web_response::<User>(WebResponse::error(format!("bad request: {e:#}")))
        }
    };

    match login_user(&login, sc.as_ref()) {
        Ok(identity) => {
            let now = Utc::now().timestamp() as u64;
            let session_id = sc.sessions.create(identity, now);

            let cookie = Cookie::build(SESSION_COOKIE, session_id)
                .path("/")
                .http_only(true)
                .secure(sc.cfg.ssl)
                .max_age(Duration::hours(sc.cfg.session_max_age_hours as i64))
                .finish();

            let mut resp = redirect_response(DASHBOARD_ROUTE);
            if let Err(e) = resp.add_cookie(&cookie) {
                error!("Failed to add session cookie: {e:#}");
                return convert_web_response::<User>(WebResponse::error("Internal error"));
            }
            resp
        }
        Err(e) => {
            debug!("Web login failed for {}: {e:#}", login.email);
            convert_web_response::<User>(WebResponse::error(LOGIN_FAIL_MESSAGE))
        }
    }
}

/// Api login: same credential check, but the caller gets a signed token
/// instead of a session.
pub async fn api_login_handler(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> HttpResponse {
    let resp = api_login(req, body, sc.as_ref()).await;
    convert_response(resp)
}

async fn api_login(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: &ServerContext,
) -> Response<TokenResponse> {
    let login: LoginRequest = crate::parse_api_request!(req, body);

    let identity = match login_user(&login, sc) {
        Ok(identity) => identity,
        Err(e) => {
            debug!("Api login failed for {}: {e:#}", login.email);
            return Response::forbidden(LOGIN_FAIL_MESSAGE);
        }
    };

    let now = Utc::now().timestamp() as u64;
    match sc.jwt_generator.generate_token(&identity, now) {
        Ok(token) => Response::with_data(token),
        Err(e) => {
            error!("Failed to generate token: {e:#}");
            Response::internal_server_error("Token error")
        }
    }
}

pub async fn web_register_handler(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> HttpResponse {
    let resp = web_register(req, body, sc.as_ref()).await;
    convert_web_response(resp)
}

async fn web_register(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: &ServerContext,
) -> WebResponse<User> {
    let register: RegisterRequest = crate::parse_web_request!(req, body);

    if let Err(e) = validate::validate_registration(&register.name, &register.email, &register.password)
    {
        return WebResponse::error(format!("{e:#}"));
    }

    let result = sc.db.with_transaction(|tx| {
        if tx.has_user_email(&register.email)? {
            return Ok(false);
        }

        let salt = secret::generate_salt(sc.cfg.salt_length);
        let password = secret::hash_password(&register.password, &salt);
        let now = Utc::now().timestamp() as u64;

        tx.create_user(CreateUserParams {
            name: register.name,
            email: register.email,
            password,
            salt,
            // New accounts start as plain users, an admin grants more.
            roles: roles::join_roles(&[Role::User]),
            create_time: now,
        })?;
        Ok(true)
    });

    match result {
        Ok(true) => WebResponse::redirect(LOGIN_ROUTE),
        Ok(false) => WebResponse::error("Email already exists"),
        Err(e) => {
            error!("Failed to register user: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

/// Web logout: drop the server-side session and expire the cookie. Always
/// redirects home, even when no session was active.
pub async fn web_logout_handler(req: HttpRequest, sc: Data<Arc<ServerContext>>) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        sc.sessions.remove(cookie.value());
    }

    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    let mut resp = redirect_response(HOME_ROUTE);
    if let Err(e) = resp.add_cookie(&removal) {
        error!("Failed to remove session cookie: {e:#}");
    }
    resp
}

/// Profile update: rewrites the account row and refreshes the session
/// snapshot in place, so the change is visible on the very next request
/// without a re-login.
pub async fn web_profile_handler(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> HttpResponse {
    let resp = web_profile(req, body, sc.as_ref()).await;
    convert_web_response(resp)
}

async fn web_profile(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: &ServerContext,
) -> WebResponse<User> {
    let op = crate::auth_web_request!(sc, req);
    let session_id = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => return WebResponse::redirect(LOGIN_ROUTE),
    };
    let update: ProfileUpdateRequest = crate::parse_web_request!(req, body);

    if let Err(e) =
        validate::validate_profile(&update.name, &update.email, update.password.as_deref())
    {
        return WebResponse::error(format!("{e:#}"));
    }

    let result = sc.db.with_transaction(|tx| {
        if tx.has_user_email(&update.email)? {
            let holder = tx.get_user_auth(&update.email)?;
            if holder.id != op.id {
                bail!("email already taken");
            }
        }

        let password = update.password.as_ref().map(|password| {
            let salt = secret::generate_salt(sc.cfg.salt_length);
            let hash = secret::hash_password(password, &salt);
            (hash, salt)
        });

        let now = Utc::now().timestamp() as u64;
        tx.update_user(UpdateUserParams {
            id: op.id,
            name: update.name.clone(),
            email: update.email.clone(),
            password,
            update_time: now,
        })?;
        Ok(())
    });

    if let Err(e) = result {
        error!("Failed to update profile: {e:#}");
        return WebResponse::error(format!("{e:#}"));
    }

    let refreshed = Identity {
        id: op.id,
        name: update.name,
        roles: op.roles,
    };
    sc.sessions.refresh(&session_id, refreshed);

    WebResponse::redirect(DASHBOARD_ROUTE)
}

/// Credential check shared by both surfaces.
fn login_user(login: &LoginRequest, sc: &ServerContext) -> Result<Identity> {
    validate::validate_login(&login.email, &login.password)?;

    sc.db.with_transaction(|tx| {
        if !tx.has_user_email(&login.email)? {
            bail!("unknown email");
        }

        let auth = tx.get_user_auth(&login.email)?;
        if !secret::verify_password(&login.password, &auth.salt, &auth.password) {
            bail!("password mismatch");
        }

        Ok(Identity {
            id: auth.id,
            name: auth.name,
            roles: roles::parse_roles(&auth.roles)?,
        })
    })
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    use super::*;

    fn seed_user(sc: &ServerContext, email: &str, password: &str, user_roles: &[Role]) -> u64 {
        let salt = secret::generate_salt(16);
        let hash = secret::hash_password(password, &salt);
        sc.db
            .with_transaction(|tx| {
                tx.create_user(CreateUserParams {
                    name: String::from("tester"),
                    email: String::from(email),
                    password: hash.clone(),
                    salt: salt.clone(),
                    roles: roles::join_roles(user_roles),
                    create_time: 100,
                })
            })
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_web_login() {
        let sc = Arc::new(ServerContext::new_test());
        seed_user(&sc, "alice@example.com", "Abc1!d", &[Role::User]);

        let req = TestRequest::post().uri("/auth/login").to_http_request();
        let body = Bytes::from_static(b"email=alice%40example.com&password=Abc1%21d");
        let resp = web_login_handler(req, Some(body), Data::new(sc.clone())).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get("Location").unwrap();
        assert_eq!(location, DASHBOARD_ROUTE);
        let cookies: Vec<_> = resp.cookies().collect();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), SESSION_COOKIE);
        assert_eq!(cookies[0].http_only(), Some(true));
        // The default config serves plain http, so the cookie must not be
        // marked Secure. The lifetime tracks session_max_age_hours.
        assert_eq!(cookies[0].secure(), Some(false));
        assert_eq!(
            cookies[0].max_age(),
            Some(Duration::hours(sc.cfg.session_max_age_hours as i64))
        );
    }

    #[actix_rt::test]
    async fn test_web_login_wrong_password() {
        let sc = Arc::new(ServerContext::new_test());
        seed_user(&sc, "alice@example.com", "Abc1!d", &[Role::User]);

        let req = TestRequest::post().uri("/auth/login").to_http_request();
        let body = Bytes::from_static(b"email=alice%40example.com&password=Wrong1%21");
        let resp = web_login_handler(req, Some(body), Data::new(sc.clone())).await;

        // No redirect, no cookie, and no session behind the scenes.
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.cookies().count(), 0);
    }

    #[actix_rt::test]
    async fn test_api_login() {
        let sc = Arc::new(ServerContext::new_test());
        seed_user(&sc, "bob@example.com", "Xyz9#a", &[Role::Admin]);

        let req = TestRequest::post().uri("/api/auth/login").to_http_request();
        let body = Bytes::from_static(b"email=bob%40example.com&password=Xyz9%23a");
        let resp = api_login_handler(req, Some(body), Data::new(sc.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = TestRequest::post().uri("/api/auth/login").to_http_request();
        let body = Bytes::from_static(b"email=bob%40example.com&password=Bad1%21a");
        let resp = api_login_handler(req, Some(body), Data::new(sc.clone())).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
