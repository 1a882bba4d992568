//! Connection target and logging settings.
//!
//! Precedence: CLI flags > environment > TOML files > defaults. Files are searched in
//! order (`--config`, `BOOKSTORE_CONFIG`, `~/.config/bookstore.toml`, `./bookstore.toml`);
//! a field set by an earlier file is not overwritten by a later one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DbError;

pub const DEFAULT_CONNECTION_STRING: &str = "mongodb://127.0.0.1:27017/plp_bookstore";
pub const DEFAULT_DATABASE: &str = "plp_bookstore";
pub const DEFAULT_COLLECTION: &str = "books";
pub const CONFIG_FILE_NAME: &str = "bookstore.toml";

pub const ENV_URI: &str = "BOOKSTORE_URI";
pub const ENV_DB: &str = "BOOKSTORE_DB";
pub const ENV_COLLECTION: &str = "BOOKSTORE_COLLECTION";
pub const ENV_LOG_DIR: &str = "BOOKSTORE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "BOOKSTORE_LOG_LEVEL";
pub const ENV_CONFIG: &str = "BOOKSTORE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            connection_string: DEFAULT_CONNECTION_STRING.to_owned(),
            database: DEFAULT_DATABASE.to_owned(),
            collection: DEFAULT_COLLECTION.to_owned(),
            log_dir: None,
            log_level: None,
        }
    }
}

/// One layer of settings; unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub connection_string: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigLayer {
    /// # Errors
    /// Returns `DbError::Toml` when the text is not a valid config table.
    pub fn from_toml(text: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    /// Returns `DbError::Io` if the file cannot be read, `DbError::Toml` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Environment layer read through `lookup`, so callers and tests control the source.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            connection_string: lookup(ENV_URI),
            database: lookup(ENV_DB),
            collection: lookup(ENV_COLLECTION),
            log_dir: lookup(ENV_LOG_DIR).map(PathBuf::from),
            log_level: lookup(ENV_LOG_LEVEL),
        }
    }

    /// Fill fields still unset from `lower`.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            connection_string: self.connection_string.or(lower.connection_string),
            database: self.database.or(lower.database),
            collection: self.collection.or(lower.collection),
            log_dir: self.log_dir.or(lower.log_dir),
            log_level: self.log_level.or(lower.log_level),
        }
    }
}

/// Database name from the path of a connection string, e.g. `plp_bookstore` from
/// `mongodb://host:27017/plp_bookstore?retryWrites=true`.
#[must_use]
pub fn database_from_uri(uri: &str) -> Option<String> {
    let rest = uri.split_once("://").map_or(uri, |(_, r)| r);
    let (_, path) = rest.split_once('/')?;
    let name = path.split(['?', '/']).next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_owned())
}

/// Connection string with any password replaced by `****`, for logs.
#[must_use]
pub fn redact_connection_string(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_owned();
    };
    let host_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..host_end].rfind('@') else {
        return uri.to_owned();
    };
    match rest[..at].split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****{}", &rest[at..]),
        None => uri.to_owned(),
    }
}

impl CatalogConfig {
    /// Merge layers (highest precedence first) over the defaults and validate.
    ///
    /// # Errors
    /// Returns `DbError::Config` for an unsupported connection string or an empty name.
    pub fn resolve(layers: impl IntoIterator<Item = ConfigLayer>) -> Result<Self, DbError> {
        let merged = layers.into_iter().fold(ConfigLayer::default(), ConfigLayer::or);
        let connection_string = merged.connection_string.unwrap_or_else(|| DEFAULT_CONNECTION_STRING.to_owned());
        let database = merged
            .database
            .or_else(|| database_from_uri(&connection_string))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        let cfg = Self {
            connection_string,
            database,
            collection: merged.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_owned()),
            log_dir: merged.log_dir,
            log_level: merged.log_level,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `DbError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<(), DbError> {
        if !(self.connection_string.starts_with("mongodb://") || self.connection_string.starts_with("mongodb+srv://")) {
            return Err(DbError::Config(format!(
                "connection string must start with mongodb:// or mongodb+srv://: {}",
                redact_connection_string(&self.connection_string)
            )));
        }
        if self.database.is_empty() || self.database.contains(['/', '.', ' ', '$']) {
            return Err(DbError::Config(format!("invalid database name {:?}", self.database)));
        }
        if self.collection.is_empty() || self.collection.starts_with("system.") || self.collection.contains('$') {
            return Err(DbError::Config(format!("invalid collection name {:?}", self.collection)));
        }
        Ok(())
    }

    /// `database.collection`.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

/// Candidate config files in precedence order. The first two are explicit and must exist.
pub fn config_search_paths(cli: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Vec<(PathBuf, bool)> {
    let mut paths = Vec::new();
    if let Some(p) = cli {
        paths.push((p.to_path_buf(), true));
    }
    if let Some(p) = lookup(ENV_CONFIG) {
        paths.push((PathBuf::from(p), true));
    }
    if let Some(home) = dirs_next::home_dir() {
        paths.push((home.join(".config").join(CONFIG_FILE_NAME), false));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push((cur.join(CONFIG_FILE_NAME), false));
    }
    paths
}

/// Load the effective configuration.
///
/// # Errors
/// Returns `DbError::Config` for a missing explicit config file or invalid settings, and
/// `DbError::Toml` for a file that does not parse.
pub fn load_config_with(
    cli_path: Option<&Path>,
    cli: ConfigLayer,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CatalogConfig, DbError> {
    let mut layers = vec![cli, ConfigLayer::from_env(&lookup)];
    for (path, explicit) in config_search_paths(cli_path, &lookup) {
        if path.is_file() {
            log::debug!("reading config {}", path.display());
            layers.push(ConfigLayer::from_file(&path)?);
        } else if explicit {
            return Err(DbError::Config(format!("config file not found: {}", path.display())));
        }
    }
    let cfg = CatalogConfig::resolve(layers)?;
    log::info!(
        "config: {} on {}",
        cfg.namespace(),
        redact_connection_string(&cfg.connection_string)
    );
    Ok(cfg)
}

/// [`load_config_with`] over the process environment.
///
/// # Errors
/// See [`load_config_with`].
pub fn load_config(cli_path: Option<&Path>, cli: ConfigLayer) -> Result<CatalogConfig, DbError> {
    load_config_with(cli_path, cli, |k| std::env::var(k).ok())
}
