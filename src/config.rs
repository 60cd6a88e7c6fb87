use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::warn;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslMethod};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::auth::session::SessionStore;
use crate::context::ServerContext;
use crate::db::config::DbConfig;
use crate::db::types::CreateUserParams;
use crate::dirs;
use crate::logs::LogsConfig;
use crate::restful::RestfulServer;
use crate::secret;

/// Common command line arguments to locate configuration and data.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Override the configuration directory.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Override the data directory.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let ps = PathSet::new(self.config_dir.clone(), self.data_dir.clone())?;
        ps.load_config(name, default_func)
    }
}

pub struct PathSet {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub pki_dir: PathBuf,
}

impl PathSet {
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = if let Some(path) = config_dir {
            path
        } else if let Ok(path) = env::var("NEWSHUB_CONFIG") {
            PathBuf::from(path)
        } else {
            dirs::config_dir()?
        };

        let data_dir = if let Some(path) = data_dir {
            path
        } else if let Ok(path) = env::var("NEWSHUB_DATA") {
            PathBuf::from(path)
        } else {
            dirs::data_dir()?
        };

        // PKI directory is always under the config directory.
        let pki_dir = config_dir.join("pki");

        dirs::ensure_dir_exists(&config_dir)
            .with_context(|| format!("ensure config directory: {}", config_dir.display()))?;
        dirs::ensure_dir_exists(&data_dir)
            .with_context(|| format!("ensure data directory: {}", data_dir.display()))?;
        dirs::ensure_dir_exists(&pki_dir)
            .with_context(|| format!("ensure pki directory: {}", pki_dir.display()))?;

        Ok(Self {
            config_dir,
            data_dir,
            pki_dir,
        })
    }

    pub fn load_config<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_dir.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s).context("parse config toml")?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                default_func()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }
}

pub trait CommonConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    #[serde(default)]
    pub ssl: bool,

    /// Secret used to sign and verify api tokens. Override this in any real
    /// deployment.
    #[serde(default = "ServerConfig::default_token_secret")]
    pub token_secret: String,

    #[serde(default = "ServerConfig::default_token_expiration_secs")]
    pub token_expiration_secs: u64,

    #[serde(default = "ServerConfig::default_session_max_age_hours")]
    pub session_max_age_hours: u64,

    #[serde(default = "ServerConfig::default_salt_length")]
    pub salt_length: usize,

    #[serde(default = "ServerConfig::default_admin_email")]
    pub admin_email: String,

    #[serde(default = "ServerConfig::default_admin_password")]
    pub admin_password: String,

    #[serde(default)]
    pub db: DbConfig,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,

    pub payload_limit_mib: Option<u64>,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(skip)]
    pki_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: Self::default_bind(),
            ssl: false,
            token_secret: Self::default_token_secret(),
            token_expiration_secs: Self::default_token_expiration_secs(),
            session_max_age_hours: Self::default_session_max_age_hours(),
            salt_length: Self::default_salt_length(),
            admin_email: Self::default_admin_email(),
            admin_password: Self::default_admin_password(),
            db: DbConfig::default(),
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: None,
            logs: LogsConfig::default(),
            pki_dir: PathBuf::new(),
        }
    }
}

impl CommonConfig for ServerConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind is required");
        }

        if self.token_secret.is_empty() {
            bail!("token_secret is required");
        }

        if self.token_expiration_secs == 0 {
            bail!("token_expiration_secs is required");
        }
        if self.token_expiration_secs < Self::MIN_TOKEN_EXPIRATION_SECS
            || self.token_expiration_secs > Self::MAX_TOKEN_EXPIRATION_SECS
        {
            bail!(
                "token_expiration_secs must be in range [{}, {}]",
                Self::MIN_TOKEN_EXPIRATION_SECS,
                Self::MAX_TOKEN_EXPIRATION_SECS
            );
        }

        if self.session_max_age_hours == 0 {
            bail!("session_max_age_hours is required");
        }
        if self.session_max_age_hours > Self::MAX_SESSION_MAX_AGE_HOURS {
            bail!(
                "session_max_age_hours must not exceed {}",
                Self::MAX_SESSION_MAX_AGE_HOURS
            );
        }

        if self.salt_length == 0 {
            bail!("salt_length is required");
        }
        if self.salt_length < Self::MIN_SALT_LENGTH || self.salt_length > Self::MAX_SALT_LENGTH {
            bail!(
                "salt_length must be in range [{}, {}]",
                Self::MIN_SALT_LENGTH,
                Self::MAX_SALT_LENGTH
            );
        }

        if self.admin_email.is_empty() {
            bail!("admin_email is required");
        }
        if self.admin_password.is_empty() {
            bail!("admin_password is required");
        }

        self.db.complete(ps).context("db")?;

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            if keep_alive_secs == 0 {
                bail!("keep_alive_secs must be greater than 0");
            }
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                bail!("workers must be greater than 0");
            }
        }

        if let Some(payload_limit_mib) = self.payload_limit_mib {
            if payload_limit_mib == 0 {
                bail!("payload_limit_mib must be greater than 0");
            }
        }

        self.logs.complete(ps).context("logs")?;

        self.pki_dir = ps.pki_dir.clone();

        Ok(())
    }
}

impl ServerConfig {
    const MIN_SALT_LENGTH: usize = 8;
    const MAX_SALT_LENGTH: usize = 100;

    const MIN_TOKEN_EXPIRATION_SECS: u64 = 60;
    const MAX_TOKEN_EXPIRATION_SECS: u64 = 60 * 60 * 24 * 365;

    const MAX_SESSION_MAX_AGE_HOURS: u64 = 24 * 30;

    pub fn build_ctx(&self) -> Result<Arc<ServerContext>> {
        let db = self.db.build().context("init database")?;

        let jwt_generator =
            JwtTokenGenerator::new(self.token_secret.as_bytes(), self.token_expiration_secs);
        let jwt_validator = JwtTokenValidator::new(self.token_secret.as_bytes());

        let sessions = SessionStore::new(self.session_max_age_hours * 60 * 60);

        let ctx = ServerContext {
            db,
            jwt_generator,
            jwt_validator,
            sessions,
            cfg: self.clone(),
        };
        ctx.ensure_admin_user().context("ensure admin user")?;

        Ok(Arc::new(ctx))
    }

    pub fn build_restful_server(&self, ctx: Arc<ServerContext>) -> Result<RestfulServer> {
        let mut srv = RestfulServer::new(self.bind.clone(), ctx);
        if self.ssl {
            let ssl = self.build_ssl()?;
            srv.set_ssl(ssl);
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            srv.set_keep_alive_secs(keep_alive_secs);
        }

        if let Some(workers) = self.workers {
            srv.set_workers(workers);
        }

        if let Some(payload_limit_mib) = self.payload_limit_mib {
            srv.set_payload_limit_mib(payload_limit_mib);
        }

        Ok(srv)
    }

    /// Parameters for the bootstrap admin account, built from the configured
    /// credentials with a fresh salt.
    pub fn admin_user_params(&self, create_time: u64) -> CreateUserParams {
        let salt = secret::generate_salt(self.salt_length);
        let password = secret::hash_password(&self.admin_password, &salt);
        CreateUserParams {
            name: String::from("admin"),
            email: self.admin_email.clone(),
            password,
            salt,
            roles: String::from("admin"),
            create_time,
        }
    }

    fn build_ssl(&self) -> Result<SslAcceptorBuilder> {
        let key_path = self.pki_dir.join("key.pem");
        if !key_path.exists() {
            bail!("ssl key file not exists: {:?}", key_path);
        }

        let cert_path = self.pki_dir.join("cert.pem");
        if !cert_path.exists() {
            bail!("ssl cert file not exists: {:?}", cert_path);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&key_path, openssl::ssl::SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&cert_path)
            .context("load ssl cert file")?;

        Ok(builder)
    }

    fn default_bind() -> String {
        String::from("127.0.0.1:3000")
    }

    fn default_token_secret() -> String {
        String::from("newshub_token_secret123")
    }

    fn default_token_expiration_secs() -> u64 {
        60 * 60 // 1 hour
    }

    fn default_session_max_age_hours() -> u64 {
        24
    }

    fn default_salt_length() -> usize {
        24
    }

    fn default_admin_email() -> String {
        String::from("admin@newshub.local")
    }

    fn default_admin_password() -> String {
        String::from("admin_password123")
    }
}
