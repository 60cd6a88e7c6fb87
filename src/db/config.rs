use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::sqlite::config::SqliteConfig;
use super::{Database, UnionConnection};

/// Database configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DbConfig {
    /// Database type to use
    #[serde(default = "DbConfig::default_name")]
    pub name: DbType,

    /// SQLite configuration, only valid when database type is sqlite
    #[serde(default = "SqliteConfig::default")]
    pub sqlite: SqliteConfig,
}

/// Database type
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum DbType {
    /// Use SQLite database
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            sqlite: SqliteConfig::default(),
        }
    }
}

impl CommonConfig for DbConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.sqlite.complete(ps).context("sqlite")?;
        Ok(())
    }
}

impl DbConfig {
    fn default_name() -> DbType {
        DbType::Sqlite
    }

    pub fn build(&self) -> Result<Database> {
        let conn = match self.name {
            DbType::Sqlite => {
                if self.sqlite.memory {
                    warn!("Using in-memory sqlite database, the data will be lost when the server stops");
                } else {
                    info!("Using sqlite database");
                }
                let sqlite = self.sqlite.build().context("build sqlite connection")?;
                UnionConnection::Sqlite(sqlite)
            }
        };

        Ok(Database::new(conn))
    }
}
