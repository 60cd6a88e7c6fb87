use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use crate::api::Response;
use crate::context::ServerContext;
use crate::handlers::auth::{
    api_login_handler, web_login_handler, web_logout_handler, web_profile_handler,
    web_register_handler,
};
use crate::handlers::categories::{
    api_delete_category_handler, api_get_categories_handler, api_patch_category_handler,
    api_put_category_handler, web_add_category_handler, web_delete_category_handler,
    web_get_categories_handler,
};
use crate::handlers::comments::{
    api_delete_comment_handler, api_get_comments_handler, api_moderate_comment_handler,
    api_put_comment_handler, web_add_comment_handler, web_admin_comments_handler,
    web_delete_comment_handler, web_toggle_comment_handler,
};
use crate::handlers::healthz::get_healthz_handler;
use crate::handlers::posts::{
    api_delete_post_handler, api_get_posts_handler, api_patch_post_handler, api_put_post_handler,
    web_add_post_handler, web_delete_post_handler, web_get_post_detail_handler,
    web_get_posts_handler, web_update_post_handler,
};
use crate::handlers::users::{api_get_users_handler, web_admin_users_handler, web_dashboard_handler};

pub struct RestfulServer {
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<ServerContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,

    payload_limit_mib: u64,
}

impl RestfulServer {
    const DEFAULT_PAYLOAD_LIMIT_MIB: u64 = 10;

    pub fn new(bind: String, ctx: Arc<ServerContext>) -> Self {
        Self {
            ssl: None,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
            payload_limit_mib: Self::DEFAULT_PAYLOAD_LIMIT_MIB,
        }
    }

    pub fn set_ssl(&mut self, ssl: SslAcceptorBuilder) {
        self.ssl = Some(ssl);
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub fn set_payload_limit_mib(&mut self, payload_limit_mib: u64) {
        self.payload_limit_mib = payload_limit_mib;
    }

    pub async fn run(mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let payload_limit = (self.payload_limit_mib * 1024 * 1024) as usize;
        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(Data::new(ctx.clone()))
                .app_data(PayloadConfig::new(payload_limit))
                .service(
                    web::scope("/api")
                        .route("/auth/login", web::post().to(api_login_handler))
                        .route("/users", web::get().to(api_get_users_handler))
                        .route("/categories", web::get().to(api_get_categories_handler))
                        .route("/categories", web::put().to(api_put_category_handler))
                        .route("/categories", web::patch().to(api_patch_category_handler))
                        .route("/categories", web::delete().to(api_delete_category_handler))
                        .route("/posts", web::get().to(api_get_posts_handler))
                        .route("/posts", web::put().to(api_put_post_handler))
                        .route("/posts", web::patch().to(api_patch_post_handler))
                        .route("/posts", web::delete().to(api_delete_post_handler))
                        .route("/comments", web::get().to(api_get_comments_handler))
                        .route("/comments", web::put().to(api_put_comment_handler))
                        .route("/comments", web::patch().to(api_moderate_comment_handler))
                        .route("/comments", web::delete().to(api_delete_comment_handler)),
                )
                .route("/healthz", web::get().to(get_healthz_handler))
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(web_login_handler))
                        .route("/register", web::post().to(web_register_handler))
                        .route("/logout", web::get().to(web_logout_handler)),
                )
                .route("/", web::get().to(web_get_posts_handler))
                .route("/dashboard", web::get().to(web_dashboard_handler))
                .route("/profile", web::post().to(web_profile_handler))
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(web_get_posts_handler))
                        .route("/detail", web::get().to(web_get_post_detail_handler))
                        .route("/add", web::post().to(web_add_post_handler))
                        .route("/update", web::post().to(web_update_post_handler))
                        .route("/delete", web::post().to(web_delete_post_handler)),
                )
                .service(
                    web::scope("/comments")
                        .route("/add", web::post().to(web_add_comment_handler))
                        .route("/delete", web::post().to(web_delete_comment_handler)),
                )
                .route("/categories", web::get().to(web_get_categories_handler))
                .service(
                    web::scope("/admin")
                        .route("/users", web::get().to(web_admin_users_handler))
                        .route("/comments", web::get().to(web_admin_comments_handler))
                        .route("/comments/toggle", web::post().to(web_toggle_comment_handler))
                        .route("/categories/add", web::post().to(web_add_category_handler))
                        .route(
                            "/categories/delete",
                            web::post().to(web_delete_category_handler),
                        ),
                )
                .default_service(web::route().to(Self::default_handler))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL). THIS IS DANGEROUS, DO NOT USE IN PRODUCTION");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting restful server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn default_handler(req: HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        let message = format!("No route to {method} {path}");
        let ret: Response<()> = Response::not_found(message);
        HttpResponse::NotFound().json(ret)
    }
}
