//! Connection configuration loaded from a TOML file.
//!
//! The file holds exactly one backend table:
//!
//! ```toml
//! [database]
//! host = "localhost"
//! user = "shop_user"
//! password = "secret"
//! database = "shop"
//! ```
//!
//! or
//!
//! ```toml
//! [api]
//! url = "https://admin.example.com/api"
//! username = "deployer"
//! password = "secret"
//! app = "shop"
//! schema = "shop"
//! ```
pub mod validation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::operations::FileSystemOps;

pub use validation::{ConfigValidator, ValidationWarning};

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default schema holding the registration functions.
pub const DEFAULT_ADMIN_SCHEMA: &str = "ng_rest";

/// Default whole-request timeout for API calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default response `code` that marks a successful API call.
pub const DEFAULT_SUCCESS_CODE: u16 = 200;

/// Suffix stripped from a database user name to derive its schema.
const USER_SUFFIX: &str = "_user";

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_admin_schema() -> String {
    DEFAULT_ADMIN_SCHEMA.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_success_code() -> u16 {
    DEFAULT_SUCCESS_CODE
}

/// `[database]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Database name; the server default (the user name) when absent.
    #[serde(default)]
    pub database: Option<String>,
    /// Application schema; derived from `user` when absent.
    #[serde(default)]
    pub schema: Option<String>,
    /// Schema holding the `register_*` functions.
    #[serde(default = "default_admin_schema")]
    pub admin_schema: String,
}

impl DatabaseConfig {
    /// The application schema: `schema` if set, otherwise the user name
    /// without a trailing `_user`.
    #[must_use]
    pub fn effective_schema(&self) -> String {
        self.schema.clone().unwrap_or_else(|| {
            self.user
                .strip_suffix(USER_SUFFIX)
                .unwrap_or(&self.user)
                .to_string()
        })
    }

    /// The session search path: application schema, `public`, admin schema.
    #[must_use]
    pub fn search_path(&self) -> String {
        format!(
            "{}, public, {}",
            self.effective_schema(),
            self.admin_schema
        )
    }
}

/// `[api]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Endpoint every request is posted to.
    pub url: String,
    /// Login user name.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Application name sent with every request.
    #[serde(default)]
    pub app: String,
    /// Schema sent with every request.
    #[serde(default)]
    pub schema: String,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Response `code` that marks success.
    #[serde(default = "default_success_code")]
    pub success_code: u16,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    database: Option<DatabaseConfig>,
    api: Option<ApiConfig>,
}

/// The one backend a run talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Direct PostgreSQL connection.
    Database(DatabaseConfig),
    /// Remote administrative API.
    Api(ApiConfig),
}

impl BackendConfig {
    /// Short name used in log messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Api(_) => "api",
        }
    }
}

/// A loaded and validated configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File the configuration was read from.
    pub path: PathBuf,
    /// Selected backend.
    pub backend: BackendConfig,
}

impl Config {
    /// Read and validate the configuration at `path` through `fs`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// TOML of the expected shape, names no backend or both backends, or a
    /// required field is unusable.
    pub fn load(fs: &dyn FileSystemOps, path: &Path) -> Result<Self, ConfigError> {
        let text = fs.read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse configuration text; `path` is recorded and used in messages.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus I/O errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::InvalidSyntax {
            file: path.display().to_string(),
            message: e.message().to_string(),
        })?;

        let backend = match (file.database, file.api) {
            (Some(db), None) => BackendConfig::Database(db),
            (None, Some(api)) => BackendConfig::Api(api),
            (None, None) => return Err(ConfigError::MissingBackend),
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousBackend),
        };

        validation::check_required(&backend)?;

        Ok(Self {
            path: path.to_path_buf(),
            backend,
        })
    }

    /// Non-fatal issues worth reporting before the run starts.
    #[must_use]
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        match &self.backend {
            BackendConfig::Database(db) => db.validate(),
            BackendConfig::Api(api) => api.validate(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::operations::SystemFileSystemOps;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::parse(text, Path::new("apipush.toml"))
    }

    fn database(text: &str) -> DatabaseConfig {
        match parse(text).unwrap().backend {
            BackendConfig::Database(db) => db,
            BackendConfig::Api(api) => panic!("expected database, got {api:?}"),
        }
    }

    #[test]
    fn database_defaults_are_applied() {
        let db = database("[database]\nhost = \"localhost\"\nuser = \"shop_user\"\n");
        assert_eq!(db.port, 5432);
        assert_eq!(db.admin_schema, "ng_rest");
        assert_eq!(db.database, None);
        assert_eq!(db.effective_schema(), "shop");
        assert_eq!(db.search_path(), "shop, public, ng_rest");
    }

    #[test]
    fn explicit_schema_wins() {
        let db = database(
            "[database]\nhost = \"h\"\nuser = \"shop_user\"\nschema = \"sales\"\nadmin_schema = \"admin\"\n",
        );
        assert_eq!(db.search_path(), "sales, public, admin");
    }

    #[test]
    fn user_without_suffix_is_schema() {
        let db = database("[database]\nhost = \"h\"\nuser = \"reporting\"\n");
        assert_eq!(db.effective_schema(), "reporting");
    }

    #[test]
    fn api_defaults_are_applied() {
        let config = parse("[api]\nurl = \"https://x.example/api\"\nusername = \"u\"\n").unwrap();
        let BackendConfig::Api(api) = config.backend else {
            panic!("expected api backend");
        };
        assert_eq!(api.timeout(), Duration::from_secs(30));
        assert_eq!(api.success_code, 200);
    }

    #[test]
    fn missing_backend_is_rejected() {
        assert!(matches!(parse(""), Err(ConfigError::MissingBackend)));
    }

    #[test]
    fn both_backends_are_rejected() {
        let text = "[database]\nhost = \"h\"\nuser = \"u\"\n[api]\nurl = \"https://x\"\n";
        assert!(matches!(parse(text), Err(ConfigError::AmbiguousBackend)));
    }

    #[test]
    fn unknown_field_is_syntax_error() {
        let err = parse("[database]\nhost = \"h\"\nuser = \"u\"\nhots = \"typo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
        assert!(err.to_string().contains("apipush.toml"));
    }

    #[test]
    fn malformed_toml_is_syntax_error() {
        assert!(matches!(
            parse("[database\nhost = "),
            Err(ConfigError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apipush.toml");
        std::fs::write(&path, "[database]\nhost = \"db\"\nuser = \"app_user\"\n").unwrap();

        let config = Config::load(&SystemFileSystemOps, &path).unwrap();
        assert_eq!(config.path, path);
        assert_eq!(config.backend.name(), "database");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(&SystemFileSystemOps, &dir.path().join("nope.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
