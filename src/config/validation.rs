//! Configuration checks applied after a config file parses.
//!
//! Missing connection details are errors; values that still allow a run but
//! are probably mistakes are collected as [`ValidationWarning`]s.
use super::{ApiConfig, BackendConfig, DatabaseConfig};
use crate::error::ConfigError;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration table (`database` or `api`).
    pub source: String,
    /// The field that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning about `source.item`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.source, self.item, self.message)
    }
}

/// Trait for configuration validators.
///
/// Implementations report questionable but usable values; unusable values
/// are rejected earlier by [`check_required`].
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;
}

impl ConfigValidator for DatabaseConfig {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.password.is_empty() {
            warnings.push(ValidationWarning::new(
                "database",
                "password",
                "password is empty",
            ));
        }

        if self.schema.as_deref().is_some_and(|s| s.trim().is_empty()) {
            warnings.push(ValidationWarning::new(
                "database",
                "schema",
                "schema is empty; only public and the admin schema will be searched",
            ));
        }

        warnings
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.password.is_empty() {
            warnings.push(ValidationWarning::new("api", "password", "password is empty"));
        }

        if self.url.to_ascii_lowercase().starts_with("http://") {
            warnings.push(ValidationWarning::new(
                "api",
                "url",
                format!("{} is not encrypted; credentials are sent in clear text", self.url),
            ));
        }

        if self.schema.trim().is_empty() {
            warnings.push(ValidationWarning::new("api", "schema", "schema is empty"));
        }

        warnings
    }
}

fn require(table: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: format!("{table}.{field}"),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Reject values no backend could connect with.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for an empty host, user, or URL, or a
/// zero port.
pub fn check_required(backend: &BackendConfig) -> Result<(), ConfigError> {
    match backend {
        BackendConfig::Database(db) => {
            require("database", "host", &db.host)?;
            require("database", "user", &db.user)?;
            if db.port == 0 {
                return Err(ConfigError::Invalid {
                    field: "database.port".to_string(),
                    message: "must be between 1 and 65535".to_string(),
                });
            }
        }
        BackendConfig::Api(api) => {
            require("api", "url", &api.url)?;
        }
    }
    Ok(())
}
