//! CLI error types and result alias.

use erd_migrate::MigrationError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(erd::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(erd::config))]
    Config(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(erd::migration))]
    Migration(#[from] MigrationError),

    /// Command error
    #[error("Command error: {0}")]
    #[diagnostic(code(erd::command))]
    Command(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config(format!("Failed to serialize TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Command(format!("Failed to render JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_error_message_passes_through() {
        let err: CliError = MigrationError::InvalidVersionFormat("abc_foo.rb".to_string()).into();
        assert!(err.to_string().contains("abc_foo.rb"));
        assert!(err.to_string().starts_with("Invalid version format"));
    }

    #[test]
    fn test_toml_error_is_config_error() {
        let err: CliError = toml::from_str::<toml::Value>("[broken").unwrap_err().into();
        assert!(matches!(err, CliError::Config(_)));
    }
}
