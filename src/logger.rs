//! Process logging via log4rs.
//!
//! Application logs go to `app.log`; mutations are also written to `audit.log` through the
//! `plp_bookstore::audit` target. Bench lines (`dev6!`) can optionally be routed to `dev6.log`.

use crate::config::{ENV_LOG_DIR, ENV_LOG_LEVEL};
use crate::errors::DbError;
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

/// Target for audit records of writes.
pub const AUDIT_TARGET: &str = "plp_bookstore::audit";

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Parse a level name; unknown names fall back to `info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling_appender(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, DbError> {
    let pattern = base.join(format!("{stem}.{{}}.log"));
    let roller = FixedWindowRoller::builder()
        .build(&pattern.display().to_string(), keep)
        .map_err(|e| DbError::Config(format!("log roller: {e}")))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE_BYTES)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Build the log4rs config without installing it.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be created.
pub fn build_config(
    dir: &Path,
    level: LevelFilter,
    retention: Option<u32>,
    enable_dev6: bool,
) -> Result<Config, DbError> {
    std::fs::create_dir_all(dir)?;
    let keep = retention.unwrap_or(DEFAULT_RETENTION);
    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling_appender(dir, "app", keep)?)))
        .appender(
            Appender::builder().build("audit", Box::new(rolling_appender(dir, "audit", keep)?)),
        )
        .logger(Logger::builder().appender("audit").additive(true).build(AUDIT_TARGET, level));
    builder = if enable_dev6 {
        builder
            .appender(
                Appender::builder().build("dev6", Box::new(rolling_appender(dir, "dev6", keep)?)),
            )
            .logger(
                Logger::builder()
                    .appender("dev6")
                    .additive(false)
                    .build(crate::utils::devlog::DEV_TARGET, LevelFilter::Trace),
            )
    } else {
        builder.logger(
            Logger::builder().additive(false).build(crate::utils::devlog::DEV_TARGET, LevelFilter::Off),
        )
    };
    builder
        .build(Root::builder().appender("app").build(level))
        .map_err(|e| DbError::Config(format!("log config: {e}")))
}

/// Configure logging globally for the process.
/// - dir: base directory for logs; if None, current directory.
/// - level: off|error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the config cannot be built or a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_dev6: bool,
) -> Result<(), DbError> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = build_config(&base, parse_level(level), retention, enable_dev6)?;
    log4rs::init_config(config).map_err(|e| DbError::Config(format!("logger: {e}")))?;
    log::info!("logging to {}", base.display());
    Ok(())
}

pub const ENV_LOG_RETENTION: &str = "BOOKSTORE_LOG_RETENTION";
pub const ENV_DEV6: &str = "BOOKSTORE_DEV6";

/// Logging settings read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvLogSettings {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<u32>,
    pub dev6: bool,
}

impl EnvLogSettings {
    /// Read `BOOKSTORE_LOG_DIR`, `BOOKSTORE_LOG_LEVEL`, `BOOKSTORE_LOG_RETENTION` and
    /// `BOOKSTORE_DEV6` through `lookup`. Unparsable retention counts are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dir: lookup(ENV_LOG_DIR).map(PathBuf::from),
            level: lookup(ENV_LOG_LEVEL),
            retention: lookup(ENV_LOG_RETENTION).and_then(|s| s.parse::<u32>().ok()),
            dev6: lookup(ENV_DEV6)
                .is_some_and(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// Fill unset fields from `fallback`; `dev6` is on if either side enables it.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            dir: self.dir.or(fallback.dir),
            level: self.level.or(fallback.level),
            retention: self.retention.or(fallback.retention),
            dev6: self.dev6 || fallback.dev6,
        }
    }
}

/// Configure logging from the process environment with `overrides` taking precedence.
/// Logging stays off when neither side names a directory.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env(overrides: EnvLogSettings) -> Result<(), DbError> {
    let s = overrides.or(EnvLogSettings::from_lookup(|k| std::env::var(k).ok()));
    match s.dir.as_deref() {
        Some(dir) => configure_logging(Some(dir), s.level.as_deref(), s.retention, s.dev6),
        None => Ok(()),
    }
}
