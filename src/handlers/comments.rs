use chrono::Utc;
use log::{debug, error};

use crate::api::comment::{
    Comment, DeleteCommentRequest, GetCommentRequest, ModerateCommentRequest, PutCommentRequest,
};
use crate::api::{ListResponse, Response, WebResponse};
use crate::auth::{Identity, DASHBOARD_ROUTE, HOME_ROUTE};
use crate::authz::require_roles;
use crate::context::ServerContext;
use crate::db::types::CreateCommentParams;
use crate::moderation::{CommentStatus, Visibility};
use crate::ownership::can_delete_comment;
use crate::roles::Role;
use crate::validate;
use crate::{register_api_handlers, register_public_web_handlers, register_web_handlers};

register_web_handlers!(web_add_comment, web_delete_comment);

register_public_web_handlers!(web_toggle_comment, web_admin_comments);

register_api_handlers!(
    api_get_comments,
    api_put_comment,
    api_moderate_comment,
    api_delete_comment,
);

async fn web_add_comment(
    req: PutCommentRequest,
    op: Identity,
    sc: &ServerContext,
) -> WebResponse<Comment> {
    if let Err(e) = validate::validate_comment(&req.content) {
        return WebResponse::error(format!("{e:#}"));
    }
    debug!("Web create comment by {}: {req:?}", op.id);

    match create_comment(req.post_id, req.content, &op, sc) {
        Ok(Some(_)) => WebResponse::redirect(detail_route(req.post_id)),
        Ok(None) => WebResponse::Page(Response::resource_not_found()),
        Err(e) => {
            error!("Failed to create comment: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

/// Web comment delete. A caller that does not own the comment is sent home
/// with no error, the comment is left untouched.
async fn web_delete_comment(
    req: DeleteCommentRequest,
    op: Identity,
    sc: &ServerContext,
) -> WebResponse<Comment> {
    match delete_comment(req.id, &op, sc) {
        Ok(DeleteOutcome::Deleted(post_id)) => WebResponse::redirect(detail_route(post_id)),
        Ok(DeleteOutcome::NotFound) => WebResponse::Page(Response::resource_not_found()),
        Ok(DeleteOutcome::Denied) => WebResponse::redirect(HOME_ROUTE),
        Err(e) => {
            error!("Failed to delete comment: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

/// Admin moderation toggle on the web surface.
async fn web_toggle_comment(
    req: ModerateCommentRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Comment> {
    if require_roles(op.as_ref(), &[Role::Admin]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }
    let Some(op) = op else {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    };

    match moderate_comment(&req, &op, sc) {
        Ok(true) => WebResponse::redirect("/admin/comments"),
        Ok(false) => WebResponse::Page(Response::resource_not_found()),
        Err(e) => {
            error!("Failed to moderate comment: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

/// Admin moderation queue, pending comments included.
async fn web_admin_comments(
    req: GetCommentRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<ListResponse<Comment>> {
    if require_roles(op.as_ref(), &[Role::Admin]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }

    match list_comments(req, Visibility::All, sc) {
        Ok(list) => WebResponse::page(list),
        Err(e) => {
            error!("Failed to list comments: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn api_get_comments(
    req: GetCommentRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<ListResponse<Comment>> {
    debug!("Api list comments by {}: {req:?}", op.id);

    let visibility = Visibility::for_reader(Some(&op));
    match list_comments(req, visibility, sc) {
        Ok(list) => Response::with_data(list),
        Err(e) => {
            error!("Failed to list comments: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_put_comment(req: PutCommentRequest, op: Identity, sc: &ServerContext) -> Response<()> {
    if let Err(e) = validate::validate_comment(&req.content) {
        return Response::bad_request(format!("{e:#}"));
    }
    debug!("Api create comment by {}: {req:?}", op.id);

    match create_comment(req.post_id, req.content, &op, sc) {
        Ok(Some(_)) => Response::ok(),
        Ok(None) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to create comment: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_moderate_comment(
    req: ModerateCommentRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<()> {
    if !op.is_admin() {
        return Response::forbidden("Admin role required");
    }

    match moderate_comment(&req, &op, sc) {
        Ok(true) => Response::ok(),
        Ok(false) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to moderate comment: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_delete_comment(
    req: DeleteCommentRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<()> {
    debug!("Api delete comment by {}: {req:?}", op.id);

    match delete_comment(req.id, &op, sc) {
        Ok(DeleteOutcome::Deleted(_)) => Response::ok(),
        Ok(DeleteOutcome::NotFound) => Response::resource_not_found(),
        Ok(DeleteOutcome::Denied) => Response::forbidden("Not the comment author"),
        Err(e) => {
            error!("Failed to delete comment: {e:#}");
            Response::database_error()
        }
    }
}

enum DeleteOutcome {
    /// Carries the post id so the web surface can redirect back to the post.
    Deleted(u64),
    NotFound,
    Denied,
}

fn create_comment(
    post_id: u64,
    content: String,
    op: &Identity,
    sc: &ServerContext,
) -> anyhow::Result<Option<u64>> {
    let status = CommentStatus::initial_for(op);
    let author_id = op.id;
    sc.db.with_transaction(move |tx| {
        if !tx.has_post(post_id)? {
            return Ok(None);
        }

        let now = Utc::now().timestamp() as u64;
        let id = tx.create_comment(CreateCommentParams {
            post_id,
            author_id,
            content,
            is_active: status.is_active(),
            create_time: now,
        })?;
        Ok(Some(id))
    })
}

fn moderate_comment(
    req: &ModerateCommentRequest,
    op: &Identity,
    sc: &ServerContext,
) -> anyhow::Result<bool> {
    let id = req.id;
    let approve = req.approve;
    let admin_id = op.id;
    sc.db.with_transaction(move |tx| {
        if !tx.has_comment(id)? {
            return Ok(false);
        }

        let comment = tx.get_comment(id)?;
        let next = CommentStatus::from_active(comment.is_active).apply(approve);
        tx.set_comment_active(id, next.is_active(), admin_id)?;
        Ok(true)
    })
}

fn delete_comment(id: u64, op: &Identity, sc: &ServerContext) -> anyhow::Result<DeleteOutcome> {
    sc.db.with_transaction(|tx| {
        if !tx.has_comment(id)? {
            return Ok(DeleteOutcome::NotFound);
        }

        let comment = tx.get_comment(id)?;
        if !can_delete_comment(op, comment.author_id) {
            return Ok(DeleteOutcome::Denied);
        }

        tx.delete_comment(id)?;
        Ok(DeleteOutcome::Deleted(comment.post_id))
    })
}

fn list_comments(
    req: GetCommentRequest,
    visibility: Visibility,
    sc: &ServerContext,
) -> anyhow::Result<ListResponse<Comment>> {
    sc.db.with_transaction(|tx| {
        let total = tx.count_comments(req.clone(), visibility.clone())?;
        let comments = tx.get_comments(req, visibility)?;
        Ok(ListResponse {
            items: comments,
            total,
        })
    })
}

fn detail_route(post_id: u64) -> String {
    format!("/posts/detail?id={post_id}")
}

#[cfg(test)]
mod tests {
    use crate::api::post::PutPostRequest;
    use crate::db::types::{CreateCategoryParams, CreatePostParams};

    use super::*;

    fn identity(id: u64, roles: Vec<Role>) -> Identity {
        Identity {
            id,
            name: format!("user{id}"),
            roles,
        }
    }

    fn seed_post(sc: &ServerContext) -> u64 {
        sc.db
            .with_transaction(|tx| {
                tx.create_category(CreateCategoryParams {
                    name: String::from("tech"),
                    description: String::from("tech posts"),
                    update_time: 10,
                })?;
                tx.create_post(CreatePostParams {
                    post: PutPostRequest {
                        title: String::from("Hello"),
                        content: String::from("World"),
                        category_id: 1,
                        image: None,
                    },
                    author_id: 1,
                    create_time: 100,
                })
            })
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_comment_lifecycle() {
        let sc = ServerContext::new_test();
        let post_id = seed_post(&sc);
        let admin = identity(1, vec![Role::Admin]);
        let user = identity(2, vec![Role::User]);

        // User comments start pending, admin comments are live immediately.
        let pending_id = create_comment(post_id, String::from("first!"), &user, &sc)
            .unwrap()
            .unwrap();
        let active_id = create_comment(post_id, String::from("welcome"), &admin, &sc)
            .unwrap()
            .unwrap();

        let anon = list_comments(
            GetCommentRequest {
                post_id: Some(post_id),
                ..Default::default()
            },
            Visibility::ActiveOnly,
            &sc,
        )
        .unwrap();
        assert_eq!(anon.total, 1);
        assert_eq!(anon.items[0].id, active_id);

        // Approval makes the pending comment public.
        let resp = api_moderate_comment(
            ModerateCommentRequest {
                id: pending_id,
                approve: true,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        let anon = list_comments(
            GetCommentRequest {
                post_id: Some(post_id),
                ..Default::default()
            },
            Visibility::ActiveOnly,
            &sc,
        )
        .unwrap();
        assert_eq!(anon.total, 2);
    }

    #[actix_rt::test]
    async fn test_moderation_requires_admin() {
        let sc = ServerContext::new_test();
        let post_id = seed_post(&sc);
        let user = identity(2, vec![Role::User]);

        let id = create_comment(post_id, String::from("hi"), &user, &sc)
            .unwrap()
            .unwrap();

        let resp = api_moderate_comment(
            ModerateCommentRequest { id, approve: true },
            user.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Still pending.
        let comment = sc.db.with_transaction(|tx| tx.get_comment(id)).unwrap();
        assert!(!comment.is_active);
    }

    #[actix_rt::test]
    async fn test_foreign_comment_delete() {
        let sc = ServerContext::new_test();
        let post_id = seed_post(&sc);
        let user = identity(2, vec![Role::User]);
        let other = identity(3, vec![Role::User]);
        let admin = identity(1, vec![Role::Admin]);

        let id = create_comment(post_id, String::from("mine"), &user, &sc)
            .unwrap()
            .unwrap();

        // The web surface swallows the deny with a silent redirect home.
        let resp = web_delete_comment(DeleteCommentRequest { id }, other.clone(), &sc).await;
        match resp {
            WebResponse::Redirect(location) => assert_eq!(location, HOME_ROUTE),
            WebResponse::Page(_) => panic!("expected redirect"),
        }
        assert!(sc.db.with_transaction(|tx| tx.has_comment(id)).unwrap());

        // The api surface says 403 outright.
        let resp = api_delete_comment(DeleteCommentRequest { id }, other, &sc).await;
        assert_eq!(resp.code, 403);

        // Admin may delete anyone's comment.
        let resp = api_delete_comment(DeleteCommentRequest { id }, admin, &sc).await;
        assert_eq!(resp.code, 200);
        assert!(!sc.db.with_transaction(|tx| tx.has_comment(id)).unwrap());
    }
}
