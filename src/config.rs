//! Tool settings loaded from `parity.toml`
//!
//! Every value has a default, so the file is optional. Paths are kept as
//! given and resolved against the working directory by the caller.

use crate::error::{ParityError, Result};
use crate::pipeline::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "parity.toml";

/// Main configuration structure for `parity`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// YAML file holding the development database name
    pub database_config: PathBuf,
    /// What to do when a pipeline step fails
    pub failure_policy: FailurePolicy,
    /// Environment role names
    pub environments: EnvironmentSettings,
    /// Platform CLI invocation
    pub platform: PlatformSettings,
    /// Git deploy settings
    pub deploy: DeploySettings,
    /// Restore pipeline settings
    pub restore: RestoreSettings,
}

/// Names that give environments their special roles
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// The local environment
    pub development: String,
    /// The environment behind the `--force` gate
    pub production: String,
    /// Destinations that never get a `--confirm` argument appended
    pub protected: Vec<String>,
}

/// How the platform CLI is called
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PlatformSettings {
    /// Executable name
    pub program: String,
    /// Flag that selects the app by git remote name
    pub app_flag: String,
    /// Config var holding the Redis URL
    pub redis_url_var: String,
    /// Command started by `console`
    pub console_command: Vec<String>,
    /// Command started by `migrate`
    pub migrate_command: Vec<String>,
}

/// Git deploy settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DeploySettings {
    /// Branch pushed to the platform
    pub branch: String,
}

/// Restore pipeline settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RestoreSettings {
    /// Directory holding the downloaded backup
    pub temp_dir: PathBuf,
    /// File name of the downloaded backup inside `temp_dir`
    pub artifact_name: String,
    /// `pg_restore --jobs` value.
    ///
    /// Defaults to 1: parallel restores were seen to fail intermittently.
    pub jobs: u32,
    /// Leave materialized view data out of the restore; a hook refreshes them
    pub skip_materialized_view_data: bool,
    /// Commands run against the local database after a restore
    pub hooks: Vec<HookConfig>,
}

/// A post-restore command, e.g. masking test data
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Label used in logs and reports
    pub name: String,
    /// Program followed by its arguments
    pub command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_config: PathBuf::from("config/database.yml"),
            failure_policy: FailurePolicy::default(),
            environments: EnvironmentSettings::default(),
            platform: PlatformSettings::default(),
            deploy: DeploySettings::default(),
            restore: RestoreSettings::default(),
        }
    }
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            development: "development".to_string(),
            production: "production".to_string(),
            protected: vec!["development".to_string(), "production".to_string()],
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            program: "heroku".to_string(),
            app_flag: "--remote".to_string(),
            redis_url_var: "REDIS_URL".to_string(),
            console_command: vec!["rails".to_string(), "console".to_string()],
            migrate_command: vec!["rake".to_string(), "db:migrate".to_string()],
        }
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            branch: "master".to_string(),
        }
    }
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("tmp"),
            artifact_name: "quick_restore.backup".to_string(),
            jobs: 1,
            skip_materialized_view_data: true,
            hooks: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings for this invocation.
    ///
    /// An explicit path must exist. Without one, `parity.toml` in the working
    /// directory is used when present and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ParityError::configuration(format!(
                    "settings file {} does not exist",
                    path.display()
                )));
            }
            debug!("Loading settings from {}", path.display());
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_SETTINGS_FILE);
        if default_path.exists() {
            debug!("Loading settings from {}", DEFAULT_SETTINGS_FILE);
            Self::from_file(default_path)
        } else {
            debug!("No {} found, using defaults", DEFAULT_SETTINGS_FILE);
            Ok(Self::default())
        }
    }

    /// Apply `--halt-on-failure`. The flag only ever tightens the configured
    /// policy.
    pub fn apply_halt_on_failure(&mut self, halt_on_failure: bool) {
        if halt_on_failure {
            self.failure_policy = FailurePolicy::Halt;
        }
    }

    /// Reject settings that would produce broken command lines
    pub fn validate(&self) -> Result<()> {
        if self.platform.program.trim().is_empty() {
            return Err(ParityError::configuration("platform.program cannot be empty"));
        }
        if self.platform.console_command.is_empty() {
            return Err(ParityError::configuration(
                "platform.console_command cannot be empty",
            ));
        }
        if self.platform.migrate_command.is_empty() {
            return Err(ParityError::configuration(
                "platform.migrate_command cannot be empty",
            ));
        }
        if self.restore.jobs == 0 {
            return Err(ParityError::configuration("restore.jobs must be at least 1"));
        }
        if self.restore.artifact_name.trim().is_empty() {
            return Err(ParityError::configuration(
                "restore.artifact_name cannot be empty",
            ));
        }
        if let Some(hook) = self.restore.hooks.iter().find(|hook| hook.command.is_empty()) {
            return Err(ParityError::configuration(format!(
                "restore hook `{}` has an empty command",
                hook.name
            )));
        }
        let environments = &self.environments;
        if let Some(role) = [&environments.development, &environments.production]
            .into_iter()
            .find(|role| !environments.protected.contains(role))
        {
            return Err(ParityError::configuration(format!(
                "environments.protected must include `{role}`"
            )));
        }
        if self.environments.development == self.environments.production {
            return Err(ParityError::configuration(
                "environments.development and environments.production must differ",
            ));
        }
        Ok(())
    }
}
