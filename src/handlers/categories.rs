use chrono::Utc;
use log::{debug, error};

use crate::api::category::{
    Category, DeleteCategoryRequest, GetCategoryRequest, PatchCategoryRequest, PutCategoryRequest,
};
use crate::api::{ListResponse, Response, WebResponse};
use crate::auth::{Identity, DASHBOARD_ROUTE};
use crate::authz::require_roles;
use crate::context::ServerContext;
use crate::db::types::CreateCategoryParams;
use crate::roles::Role;
use crate::{register_api_handlers, register_public_web_handlers};

const CATEGORIES_ROUTE: &str = "/categories";

register_public_web_handlers!(web_get_categories, web_add_category, web_delete_category);

register_api_handlers!(
    api_get_categories,
    api_put_category,
    api_patch_category,
    api_delete_category,
);

async fn web_get_categories(
    req: GetCategoryRequest,
    _op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<ListResponse<Category>> {
    match list_categories(req, sc) {
        Ok(list) => WebResponse::page(list),
        Err(e) => {
            error!("Failed to list categories: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_add_category(
    req: PutCategoryRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Category> {
    if require_roles(op.as_ref(), &[Role::Admin]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }
    debug!("Web create category: {req:?}");

    match create_category(req, sc) {
        Ok(true) => WebResponse::redirect(CATEGORIES_ROUTE),
        Ok(false) => WebResponse::error("Category name already exists"),
        Err(e) => {
            error!("Failed to create category: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn web_delete_category(
    req: DeleteCategoryRequest,
    op: Option<Identity>,
    sc: &ServerContext,
) -> WebResponse<Category> {
    if require_roles(op.as_ref(), &[Role::Admin]).is_deny() {
        return WebResponse::redirect(DASHBOARD_ROUTE);
    }

    match delete_category(req.id, sc) {
        Ok(true) => WebResponse::redirect(CATEGORIES_ROUTE),
        Ok(false) => WebResponse::Page(Response::resource_not_found()),
        Err(e) => {
            error!("Failed to delete category: {e:#}");
            WebResponse::error("Database error")
        }
    }
}

async fn api_get_categories(
    req: GetCategoryRequest,
    _op: Identity,
    sc: &ServerContext,
) -> Response<ListResponse<Category>> {
    match list_categories(req, sc) {
        Ok(list) => Response::with_data(list),
        Err(e) => {
            error!("Failed to list categories: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_put_category(
    req: PutCategoryRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<()> {
    if !op.is_admin() {
        return Response::forbidden("Admin role required");
    }
    debug!("Api create category by {}: {req:?}", op.id);

    match create_category(req, sc) {
        Ok(true) => Response::ok(),
        Ok(false) => Response::bad_request("Category name already exists"),
        Err(e) => {
            error!("Failed to create category: {e:#}");
            Response::database_error()
        }
    }
}

async fn api_patch_category(
    req: PatchCategoryRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<()> {
    if !op.is_admin() {
        return Response::forbidden("Admin role required");
    }
    debug!("Api patch category by {}: {req:?}", op.id);

    let result = sc.db.with_transaction(|tx| {
        if !tx.has_category(req.id)? {
            return Ok(false);
        }

        if let Some(ref name) = req.name {
            if tx.has_category_name(name)? {
                let existing = tx.get_categories(GetCategoryRequest {
                    id: Some(req.id),
                    ..Default::default()
                })?;
                // Renaming to its own current name is allowed.
                if existing.first().map(|c| c.name.as_str()) != Some(name.as_str()) {
                    anyhow::bail!("category name already exists");
                }
            }
        }

        let now = Utc::now().timestamp() as u64;
        tx.update_category(req, now)?;
        Ok(true)
    });

    match result {
        Ok(true) => Response::ok(),
        Ok(false) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to patch category: {e:#}");
            Response::bad_request(format!("{e:#}"))
        }
    }
}

async fn api_delete_category(
    req: DeleteCategoryRequest,
    op: Identity,
    sc: &ServerContext,
) -> Response<()> {
    if !op.is_admin() {
        return Response::forbidden("Admin role required");
    }

    match delete_category(req.id, sc) {
        Ok(true) => Response::ok(),
        Ok(false) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to delete category: {e:#}");
            Response::database_error()
        }
    }
}

fn list_categories(
    req: GetCategoryRequest,
    sc: &ServerContext,
) -> anyhow::Result<ListResponse<Category>> {
    sc.db.with_transaction(|tx| {
        let total = tx.count_categories(req.clone())?;
        let categories = tx.get_categories(req)?;
        Ok(ListResponse {
            items: categories,
            total,
        })
    })
}

fn create_category(req: PutCategoryRequest, sc: &ServerContext) -> anyhow::Result<bool> {
    sc.db.with_transaction(move |tx| {
        if tx.has_category_name(&req.name)? {
            return Ok(false);
        }

        let now = Utc::now().timestamp() as u64;
        tx.create_category(CreateCategoryParams {
            name: req.name,
            description: req.description,
            update_time: now,
        })?;
        Ok(true)
    })
}

fn delete_category(id: u64, sc: &ServerContext) -> anyhow::Result<bool> {
    sc.db.with_transaction(|tx| {
        if !tx.has_category(id)? {
            return Ok(false);
        }
        tx.delete_category(id)?;
        Ok(true)
    })
}
