use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::auth::session::SessionStore;
use crate::config::ServerConfig;
use crate::db::Database;

/// Shared server state, built once at startup and handed to every handler.
pub struct ServerContext {
    pub db: Database,

    pub jwt_generator: JwtTokenGenerator,
    pub jwt_validator: JwtTokenValidator,

    pub sessions: SessionStore,

    pub cfg: ServerConfig,
}

impl ServerContext {
    #[cfg(test)]
    pub fn new_test() -> Self {
        Self {
            db: Database::new_test(),
            jwt_generator: JwtTokenGenerator::new_test(),
            jwt_validator: JwtTokenValidator::new_test(),
            sessions: SessionStore::new(60 * 60),
            cfg: ServerConfig::default(),
        }
    }

    /// Creates the bootstrap admin account if no user holds the configured
    /// admin email yet.
    pub fn ensure_admin_user(&self) -> Result<()> {
        let now = Utc::now().timestamp() as u64;
        let params = self.cfg.admin_user_params(now);

        self.db.with_transaction(|tx| {
            if tx.has_user_email(&params.email)? {
                return Ok(());
            }

            info!("Admin user not found, creating one with email {}", params.email);
            tx.create_user(params)?;
            Ok(())
        })
    }
}
