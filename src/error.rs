use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for `parity`
#[derive(Error, Debug)]
pub enum ParityError {
    /// Tool settings are invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message details
        message: String,
    },

    /// The development database name could not be read
    #[error("Cannot read development database from {}: {reason}", path.display())]
    DatabaseConfig {
        /// Path of the database config file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A restore was requested without naming the environment to restore from
    #[error("`{command}` needs a source environment, e.g. `parity {environment} {command} production`")]
    MissingSource {
        /// Subcommand as typed by the user
        command: String,
        /// Destination environment
        environment: String,
    },

    /// A quick restore found no previously downloaded backup
    #[error("No backup found at {}; run a full restore first", path.display())]
    MissingArtifact {
        /// Expected artifact location
        path: PathBuf,
    },

    /// The platform app behind an environment could not be determined
    #[error("Could not determine the app name for `{environment}`; is the git remote configured?")]
    AppNameUnavailable {
        /// Environment whose app was looked up
        environment: String,
    },

    /// An external program could not be launched at all
    #[error("Failed to launch `{program}`: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying launch error
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error wrapper
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ParityError {
    /// Build a configuration error from any message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error stems from bad or missing configuration
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::DatabaseConfig { .. } | Self::Toml(_)
        )
    }
}

/// Result type alias for `parity` operations
pub type Result<T> = std::result::Result<T, ParityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_message_suggests_usage() {
        let error = ParityError::MissingSource {
            command: "restore".to_string(),
            environment: "staging".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("`restore` needs a source environment"));
        assert!(message.contains("parity staging restore production"));
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_database_config_is_configuration_error() {
        let error = ParityError::DatabaseConfig {
            path: PathBuf::from("config/database.yml"),
            reason: "missing `development.database`".to_string(),
        };

        assert!(error.is_configuration());
        assert!(error.to_string().contains("config/database.yml"));
    }
}
