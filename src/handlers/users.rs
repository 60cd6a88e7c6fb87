use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::api::post::{GetPostRequest, Post};
use crate::api::user::{GetUserRequest, User};
use crate::api::{ListResponse, Response, WebResponse};
use crate::auth::{Identity, DASHBOARD_ROUTE};
use crate::authz::require_roles;
use crate::context::ServerContext;
use crate::roles::Role;
use crate::{register_api_handlers, register_public_web_handlers, register_web_handlers};

/// Dashboard page data: the signed-in account and the posts it authored.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub user: User,
    pub posts: Vec<Post>,
}

register_web_handlers!(web_dashboard);

register_public_web_handlers!(web_admin_users);

register_api_handlers!(api_get_users);

async fn web_dashboard(
    _req: crate::api::EmptyRequest,
    op: Identity,
    sc: &ServerContext,
) -> WebResponse<DashboardResponse> {
    debug!("Web dashboard for {}", op.id);

    let result = sc.db.with_transaction(|tx| {
        let user = tx.get_user(op.id)?;
        let posts = tx.get_posts(GetPostRequest {
            author_id: Some(op.id),
            ..Default::default()
        })?;
        Ok(DashboardResponse { user, posts })
    });

    match result {
        Ok(dashboard) => WebResponse::page(dashboard),
        Err(e) => {
            error!("Failed to load dashboard: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

/// Admin account list on the web surface.
async fn web_admin_users(
    req: GetUserRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<ListResponse<User>> {
    if require_roles(op.as_ref(), &[Role::Admin]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }

    match list_users(req, sc) {
        Ok(list) => WebResponse::page(list),
        Err(e) => {
            error!("Failed to list users: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn api_get_users(
    req: GetUserRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<ListResponse<User>> {
    if !op.is_admin() {
        return Response::forbidden("Admin role required");
    }
    debug!("Api list users by {}: {req:?}", op.id);

    match list_users(req, sc) {
        Ok(list) => Response::with_data(list),
        Err(e) => {
            error!("Failed to list users: {e:#}");
            Response::database_error()
        }
    }
}

fn list_users(req: GetUserRequest, sc: &ServerContext) -> anyhow::Result<ListResponse<User>> {
    sc.db.with_transaction(|tx| {
        let total = tx.count_users(req.clone())?;
        let users = tx.get_users(req)?;
        Ok(ListResponse {
            items: users,
            total,
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::db::types::CreateUserParams;
    use crate::roles;

    use super::*;

    fn seed_user(sc: &ServerContext, name: &str, email: &str, user_roles: &[Role]) -> u64 {
        sc.db
            .with_transaction(|tx| {
                tx.create_user(CreateUserParams {
                    name: String::from(name),
                    email: String::from(email),
                    password: String::from("hash"),
                    salt: String::from("salt"),
                    roles: roles::join_roles(user_roles),
                    create_time: 100,
                })
            })
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_user_list_admin_only() {
        let sc = ServerContext::new_test();
        let admin_id = seed_user(&sc, "admin", "admin@example.com", &[Role::Admin]);
        let user_id = seed_user(&sc, "bob", "bob@example.com", &[Role::User]);

        let admin = Identity {
            id: admin_id,
            name: String::from("admin"),
            roles: vec![Role::Admin],
        };
        let user = Identity {
            id: user_id,
            name: String::from("bob"),
            roles: vec![Role::User],
        };

        let resp = api_get_users(GetUserRequest::default(), user, &sc).await;
        assert_eq!(resp.code, 403);

        let resp = api_get_users(GetUserRequest::default(), admin, &sc).await;
        assert_eq!(resp.code, 200);
        let list = resp.data.unwrap();
        assert_eq!(list.total, 2);
        // The public view never carries password material.
        for user in list.items {
            assert!(!user.email.is_empty());
        }
    }

    #[actix_rt::test]
    async fn test_dashboard() {
        let sc = ServerContext::new_test();
        let id = seed_user(&sc, "alice", "alice@example.com", &[Role::User]);
        let op = Identity {
            id,
            name: String::from("alice"),
            roles: vec![Role::User],
        };

        let resp = web_dashboard(crate::api::EmptyRequest, op, &sc).await;
        match resp {
            WebResponse::Page(page) => {
                let data = page.data.unwrap();
                assert_eq!(data.user.email, "alice@example.com");
                assert!(data.posts.is_empty());
            }
            WebResponse::Redirect(_) => panic!("expected page"),
        }
    }
}
