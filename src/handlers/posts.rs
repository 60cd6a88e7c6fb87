use chrono::Utc;
use log::{debug, error};

use crate::api::comment::GetCommentRequest;
use crate::api::post::{
    DeletePostRequest, GetPostRequest, PatchPostRequest, Post, PostDetail, PutPostRequest,
};
use crate::api::{ListResponse, Response, WebResponse};
use crate::auth::{Identity, DASHBOARD_ROUTE, HOME_ROUTE};
use crate::authz::require_roles;
use crate::context::ServerContext;
use crate::db::types::CreatePostParams;
use crate::moderation::Visibility;
use crate::ownership::can_mutate_post;
use crate::roles::Role;
use crate::{register_api_handlers, register_public_web_handlers};

/// Roles allowed to create posts. Customer is create-only, the mutation
/// paths check ownership separately.
const AUTHOR_ROLES: [Role; 3] = [Role::Admin, Role::User, Role::Customer];

register_public_web_handlers!(
    web_get_posts,
    web_get_post_detail,
    web_add_post,
    web_update_post,
    web_delete_post,
);

register_api_handlers!(api_get_posts, api_put_post, api_patch_post, api_delete_post);

async fn web_get_posts(
    req: GetPostRequest,
    _op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<ListResponse<Post>> {
    debug!("Web list posts: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_posts(req.clone())?;
        let posts = tx.get_posts(req)?;
        Ok(ListResponse {
            items: posts,
            total,
        })
    });

    match result {
        Ok(list) => WebResponse::page(list),
        Err(e) => {
            error!("Failed to list posts: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_get_post_detail(
    req: GetPostRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<PostDetail> {
    let id = match req.id {
        Some(id) => id,
        None => return WebResponse::error("id is required"),
    };

    let visibility = Visibility::for_reader(op.as_ref());
    let result = sc.db.with_transaction(|tx| {
        if !tx.has_post(id)? {
            return Ok(None);
        }
        let post = tx.get_post(id)?;
        let comments = tx.get_comments(
            GetCommentRequest {
                post_id: Some(id),
                ..Default::default()
            },
            visibility,
        )?;
        Ok(Some(PostDetail { post, comments }))
    });

    match result {
        Ok(Some(detail)) => WebResponse::page(detail),
        Ok(None) => WebResponse::Page(Response::resource_not_found()),
        Err(e) => {
            error!("Failed to get post detail: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_add_post(
    req: PutPostRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Post> {
    if require_roles(op.as_ref(), &AUTHOR_ROLES).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }
    let Some(op) = op else {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    };
    debug!("Web create post by {}: {req:?}", op.id);

    match create_post(req, &op, sc) {
        Ok(Some(id)) => WebResponse::redirect(detail_route(id)),
        Ok(None) => WebResponse::error("category does not exist"),
        Err(e) => {
            error!("Failed to create post: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_update_post(
    req: PatchPostRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Post> {
    if require_roles(op.as_ref(), &[Role::Admin, Role::User]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }
    let Some(op) = op else {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    };

    match update_post(req, &op, sc) {
        Ok(UpdateOutcome::Updated(id)) => WebResponse::redirect(detail_route(id)),
        Ok(UpdateOutcome::NotFound) => WebResponse::Page(Response::resource_not_found()),
        Ok(UpdateOutcome::Denied) => WebResponse::redirect(DASHBOARD_ROUTE),
        Err(e) => {
            error!("Failed to update post: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_delete_post(
    req: DeletePostRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Post> {
    if require_roles(op.as_ref(), &[Role::Admin, Role::User]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }
    let Some(op) = op else {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    };

    match delete_post(req.id, &op, sc) {
        Ok(UpdateOutcome::Updated(_)) => WebResponse::redirect(HOME_ROUTE),
        Ok(UpdateOutcome::NotFound) => WebResponse::Page(Response::resource_not_found()),
        Ok(UpdateOutcome::Denied) => WebResponse::redirect(DASHBOARD_ROUTE),
        Err(e) => {
            error!("Failed to delete post: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn api_get_posts(
    req: GetPostRequest,
    _op: Identity,
    sc: &ServerContext,
) -> Response<ListResponse<Post>> {
    debug!("Api list posts: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_posts(req.clone())?;
        let posts = tx.get_posts(req)?;
        Ok(ListResponse {
            items: posts,
            total,
        })
    });

    match result {
        Ok(list) => Response::with_data(list),
        Err(e) => {
            error!("Failed to list posts: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_put_post(req: PutPostRequest, op: Identity, sc: &ServerContext) -> Response<()> {
    if !op.has_any(&AUTHOR_ROLES) {
        return Response::forbidden("Author role required");
    }
    debug!("Api create post by {}: {req:?}", op.id);

    match create_post(req, &op, sc) {
        Ok(Some(_)) => Response::ok(),
        Ok(None) => Response::bad_request("category does not exist"),
        Err(e) => {
            error!("Failed to create post: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_patch_post(req: PatchPostRequest, op: Identity, sc: &ServerContext) -> Response<()> {
    debug!("Api patch post by {}: {req:?}", op.id);

    match update_post(req, &op, sc) {
        Ok(UpdateOutcome::Updated(_)) => Response::ok(),
        Ok(UpdateOutcome::NotFound) => Response::resource_not_found(),
        Ok(UpdateOutcome::Denied) => Response::forbidden("Not the post author"),
        Err(e) => {
            error!("Failed to patch post: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_delete_post(req: DeletePostRequest, op: Identity, sc: &ServerContext) -> Response<()> {
    debug!("Api delete post by {}: {req:?}", op.id);

    match delete_post(req.id, &op, sc) {
        Ok(UpdateOutcome::Updated(_)) => Response::ok(),
        Ok(UpdateOutcome::NotFound) => Response::resource_not_found(),
        Ok(UpdateOutcome::Denied) => Response::forbidden("Not the post author"),
        Err(e) => {
            error!("Failed to delete post: {e:#}");
            Response::database_error()
        }
    }
}

enum UpdateOutcome {
    Updated(u64),
    NotFound,
    Denied,
}

fn create_post(
    req: PutPostRequest,
    op: &Identity,
    sc: &ServerContext,
) -> anyhow::Result<Option<u64>> {
    sc.db.with_transaction(|tx| {
        if !tx.has_category(req.category_id)? {
            return Ok(None);
        }

        let now = Utc::now().timestamp() as u64;
        let id = tx.create_post(CreatePostParams {
            post: req,
            author_id: op.id,
            create_time: now,
        })?;
        Ok(Some(id))
    })
}

fn update_post(
    req: PatchPostRequest,
    op: &Identity,
    sc: &ServerContext,
) -> anyhow::Result<UpdateOutcome> {
    sc.db.with_transaction(|tx| {
        if !tx.has_post(req.id)? {
            return Ok(UpdateOutcome::NotFound);
        }

        let post = tx.get_post(req.id)?;
        if !can_mutate_post(op, post.author_id) {
            return Ok(UpdateOutcome::Denied);
        }

        if let Some(category_id) = req.category_id {
            if !tx.has_category(category_id)? {
                return Ok(UpdateOutcome::NotFound);
            }
        }

        let now = Utc::now().timestamp() as u64;
        let id = req.id;
        tx.update_post(req, now)?;
        Ok(UpdateOutcome::Updated(id))
    })
}

/// Deletes a post and its comments together; the transaction keeps the two
/// deletes atomic.
fn delete_post(id: u64, op: &Identity, sc: &ServerContext) -> anyhow::Result<UpdateOutcome> {
    sc.db.with_transaction(|tx| {
        if !tx.has_post(id)? {
            return Ok(UpdateOutcome::NotFound);
        }

        let post = tx.get_post(id)?;
        if !can_mutate_post(op, post.author_id) {
            return Ok(UpdateOutcome::Denied);
        }

        tx.delete_post(id)?;
        let removed = tx.delete_post_comments(id)?;
        debug!("Deleted post {id} with {removed} comments");
        Ok(UpdateOutcome::Updated(id))
    })
}

fn detail_route(id: u64) -> String {
    format!("/posts/detail?id={id}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{Bytes, Data};

    use crate::auth::SESSION_COOKIE;
    use crate::db::types::CreateCategoryParams;

    use super::*;

    fn seed(sc: &ServerContext) -> (Identity, Identity) {
        sc.db
            .with_transaction(|tx| {
                tx.create_category(CreateCategoryParams {
                    name: String::from("tech"),
                    description: String::from("tech posts"),
                    update_time: 10,
                })
            })
            .unwrap();

        let admin = Identity {
            id: 1,
            name: String::from("admin"),
            roles: vec![Role::Admin],
        };
        let user = Identity {
            id: 2,
            name: String::from("user"),
            roles: vec![Role::User],
        };
        (admin, user)
    }

    fn seed_post(sc: &ServerContext, author_id: u64) -> u64 {
        sc.db
            .with_transaction(|tx| {
                tx.create_post(CreatePostParams {
                    post: PutPostRequest {
                        title: String::from("Hello"),
                        content: String::from("World"),
                        category_id: 1,
                        image: None,
                    },
                    author_id,
                    create_time: 100,
                })
            })
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_ownership_guard() {
        let sc = ServerContext::new_test();
        let (admin, user) = seed(&sc);
        let post_id = seed_post(&sc, admin.id);

        // User cannot touch the admin's post.
        let resp = api_patch_post(
            PatchPostRequest {
                id: post_id,
                title: Some(String::from("Hijacked")),
                ..Default::default()
            },
            user.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Admin can touch anything.
        let resp = api_patch_post(
            PatchPostRequest {
                id: post_id,
                title: Some(String::from("Renamed")),
                ..Default::default()
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // Customer creates but never mutates, not even its own post.
        let customer = Identity {
            id: 3,
            name: String::from("customer"),
            roles: vec![Role::Customer],
        };
        let own_id = seed_post(&sc, customer.id);
        let resp = api_delete_post(DeletePostRequest { id: own_id }, customer, &sc).await;
        assert_eq!(resp.code, 403);
    }

    #[actix_rt::test]
    async fn test_web_deny_redirects_to_dashboard() {
        let sc = Arc::new(ServerContext::new_test());
        seed(&sc);

        // Anonymous caller posting to a role-guarded web route is sent to
        // the dashboard, not handed an error page.
        let req = TestRequest::post().uri("/posts/add").to_http_request();
        let body = Bytes::from_static(b"title=Hi&content=There&category_id=1");
        let resp = web_add_post_handler(req, Some(body), Data::new(sc.clone())).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get("Location").unwrap(), DASHBOARD_ROUTE);
    }

    #[actix_rt::test]
    async fn test_api_route_ignores_session() {
        let sc = Arc::new(ServerContext::new_test());
        let (_, user) = seed(&sc);

        let now = chrono::Utc::now().timestamp() as u64;
        let session_id = sc.sessions.create(user, now);

        // A valid session cookie is a web credential. Under /api only a
        // token counts, so the request stays anonymous and is refused.
        let req = TestRequest::get()
            .uri("/api/posts")
            .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, session_id))
            .to_http_request();
        let resp = api_get_posts_handler(req, None, Data::new(sc.clone())).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn test_web_add_post_with_session() {
        let sc = Arc::new(ServerContext::new_test());
        let (_, user) = seed(&sc);

        let now = chrono::Utc::now().timestamp() as u64;
        let session_id = sc.sessions.create(user, now);

        let req = TestRequest::post()
            .uri("/posts/add")
            .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, session_id))
            .to_http_request();
        let body = Bytes::from_static(b"title=Hi&content=There&category_id=1");
        let resp = web_add_post_handler(req, Some(body), Data::new(sc.clone())).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get("Location").unwrap().to_str().unwrap();
        assert!(location.starts_with("/posts/detail?id="));
    }
}
