use std::path::PathBuf;

use anyhow::{bail, Result};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};
use crate::dirs;

const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S)} {h({l})} {m}{n}";

/// Logging setup for the server. Writes to stdout by default, which suits a
/// systemd unit. The `file` target writes size-rotated files under
/// `<data_dir>/logs` for deployments without a journal.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogsConfig {
    #[serde(default)]
    pub target: LogTarget,

    #[serde(default)]
    pub level: LogLevel,

    /// Rotated files to keep around before the oldest is dropped.
    #[serde(default = "LogsConfig::default_file_keep")]
    pub file_keep: u32,

    #[serde(default = "LogsConfig::default_file_max_size_mib")]
    pub file_max_size_mib: u64,

    #[serde(skip)]
    logs_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl CommonConfig for LogsConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.target != LogTarget::File {
            return Ok(());
        }

        if self.file_keep == 0 {
            bail!("file_keep must be greater than 0");
        }
        if self.file_max_size_mib == 0 {
            bail!("file_max_size_mib must be greater than 0");
        }

        self.logs_dir = ps.data_dir.join("logs");
        dirs::ensure_dir_exists(&self.logs_dir)?;

        Ok(())
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        LogsConfig {
            target: LogTarget::default(),
            level: LogLevel::default(),
            file_keep: LogsConfig::default_file_keep(),
            file_max_size_mib: LogsConfig::default_file_max_size_mib(),
            logs_dir: PathBuf::new(),
        }
    }
}

impl LogsConfig {
    /// Installs the global logger. Must run once, before anything logs.
    pub fn init(&self, name: &str) -> Result<()> {
        let appender: Box<dyn Append> = match self.target {
            LogTarget::Stdout => Box::new(
                ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                    .build(),
            ),
            LogTarget::File => Box::new(self.build_file_appender(name)?),
        };

        let config = Config::builder()
            .appender(Appender::builder().build("main", appender))
            .build(Root::builder().appender("main").build(self.level.to_filter()))?;
        log4rs::init_config(config)?;

        Ok(())
    }

    fn build_file_appender(&self, name: &str) -> Result<RollingFileAppender> {
        let path = self.logs_dir.join(format!("{name}.log"));
        let archived = self.logs_dir.join(format!("{name}.{{}}.log"));

        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(&archived.display().to_string(), self.file_keep)?;
        let trigger = SizeTrigger::new(self.file_max_size_mib * 1024 * 1024);
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path, Box::new(policy))?;
        Ok(appender)
    }

    fn default_file_keep() -> u32 {
        3
    }

    fn default_file_max_size_mib() -> u64 {
        32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(LogLevel::Debug.to_filter(), LevelFilter::Debug);
        assert_eq!(LogLevel::Info.to_filter(), LevelFilter::Info);
        assert_eq!(LogLevel::Warning.to_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Error.to_filter(), LevelFilter::Error);
    }

    #[test]
    fn test_parse_config() {
        let cfg: LogsConfig = toml::from_str(
            r#"
            target = "file"
            level = "warning"
            file_keep = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.target, LogTarget::File);
        assert_eq!(cfg.level, LogLevel::Warning);
        assert_eq!(cfg.file_keep, 10);
        assert_eq!(cfg.file_max_size_mib, 32);

        let cfg: LogsConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.target, LogTarget::Stdout);
        assert_eq!(cfg.level, LogLevel::Info);
    }
}
