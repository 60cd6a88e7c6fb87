use actix_web::http::header;
use actix_web::HttpResponse;
use serde::{de::DeserializeOwned, Serialize};

use crate::api::{self, Response, WebResponse};

pub mod auth;
pub mod categories;
pub mod comments;
pub mod healthz;
pub mod posts;
pub mod users;

/// Wraps a typed api handler `fn(req, op, sc) -> Response<T>` into an
/// actix-web handler. Authentication runs before parsing, on the surface
/// derived from the request path; failures become a 403 envelope.
#[macro_export]
macro_rules! register_api_handlers {
    ($handler:ident) => {
        paste::paste! {
            pub async fn [< $handler _handler >](
                req: actix_web::HttpRequest,
                body: Option<actix_web::web::Bytes>,
                sc: actix_web::web::Data<std::sync::Arc<$crate::context::ServerContext>>,
            ) -> actix_web::HttpResponse {
                let f = || async move {
                    let op = $crate::auth_api_request!(sc.as_ref(), req);
                    let req = $crate::parse_api_request!(req, body);
                    $handler(req, op, sc.as_ref()).await
                };
                let resp = f().await;
                $crate::handlers::convert_response(resp)
            }
        }
    };

    ($handler:ident, $($rest:ident),* $(,)?) => {
        $crate::register_api_handlers!($handler);
        $crate::register_api_handlers!($($rest),*);
    };
}

/// Wraps a typed web handler `fn(req, op, sc) -> WebResponse<T>` that
/// requires a signed-in session. Anonymous callers are redirected to the
/// login page before the request is even parsed.
#[macro_export]
macro_rules! register_web_handlers {
    ($handler:ident) => {
        paste::paste! {
            pub async fn [< $handler _handler >](
                req: actix_web::HttpRequest,
                body: Option<actix_web::web::Bytes>,
                sc: actix_web::web::Data<std::sync::Arc<$crate::context::ServerContext>>,
            ) -> actix_web::HttpResponse {
                let f = || async move {
                    let op = $crate::auth_web_request!(sc.as_ref(), req);
                    let req = $crate::parse_web_request!(req, body);
                    $handler(req, op, sc.as_ref()).await
                };
                let resp = f().await;
                $crate::handlers::convert_web_response(resp)
            }
        }
    };

    ($handler:ident, $($rest:ident),* $(,)?) => {
        $crate::register_web_handlers!($handler);
        $crate::register_web_handlers!($($rest),*);
    };
}

/// Wraps a typed web handler `fn(req, op: Option<Identity>, sc) ->
/// WebResponse<T>`. The handler decides what an anonymous caller may see;
/// role-guarded pages pair this with a role check whose deny redirects to
/// the dashboard.
#[macro_export]
macro_rules! register_public_web_handlers {
    ($handler:ident) => {
        paste::paste! {
            pub async fn [< $handler _handler >](
                req: actix_web::HttpRequest,
                body: Option<actix_web::web::Bytes>,
                sc: actix_web::web::Data<std::sync::Arc<$crate::context::ServerContext>>,
            ) -> actix_web::HttpResponse {
                let f = || async move {
                    let op = $crate::web_identity!(sc.as_ref(), req);
                    let req = $crate::parse_web_request!(req, body);
                    $handler(req, op, sc.as_ref()).await
                };
                let resp = f().await;
                $crate::handlers::convert_web_response(resp)
            }
        }
    };

    ($handler:ident, $($rest:ident),* $(,)?) => {
        $crate::register_public_web_handlers!($handler);
        $crate::register_public_web_handlers!($($rest),*);
    };
}

pub fn convert_response<T>(resp: Response<T>) -> HttpResponse
where
    T: Serialize + DeserializeOwned,
{
    let mut http_resp = match resp.code {
        api::STATUS_OK => HttpResponse::Ok(),
        api::STATUS_BAD_REQUEST => HttpResponse::BadRequest(),
        api::STATUS_FORBIDDEN => HttpResponse::Forbidden(),
        api::STATUS_NOT_FOUND => HttpResponse::NotFound(),
        _ => HttpResponse::InternalServerError(),
    };
    http_resp.json(resp)
}

pub fn convert_web_response<T>(resp: WebResponse<T>) -> HttpResponse
where
    T: Serialize + DeserializeOwned,
{
    match resp {
        WebResponse::Redirect(location) => redirect_response(&location),
        WebResponse::Page(resp) => convert_response(resp),
    }
}

/// A 303 pointing the browser at `location`. POST handlers redirect after
/// acting so a refresh never replays the form.
pub fn redirect_response(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}
