//! Platform CLI command templates for remote environments

use crate::config::PlatformSettings;
use crate::environment::EnvironmentName;
use crate::error::{ParityError, Result};
use crate::process::{CommandRunner, CommandSpec};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Builds platform CLI invocations and resolves app names
pub struct Platform<'a> {
    settings: &'a PlatformSettings,
    runner: &'a dyn CommandRunner,
    app_names: Mutex<HashMap<String, String>>,
}

impl<'a> Platform<'a> {
    /// Create a platform handle
    #[must_use]
    pub fn new(settings: &'a PlatformSettings, runner: &'a dyn CommandRunner) -> Self {
        Self {
            settings,
            runner,
            app_names: Mutex::new(HashMap::new()),
        }
    }

    /// Runner used for every platform call
    #[must_use]
    pub fn runner(&self) -> &'a dyn CommandRunner {
        self.runner
    }

    /// Platform settings in use
    #[must_use]
    pub const fn settings(&self) -> &PlatformSettings {
        self.settings
    }

    /// `heroku <parts...> --remote <environment>`
    #[must_use]
    pub fn command<I, S>(&self, environment: &EnvironmentName, parts: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.settings.program)
            .args(parts)
            .arg(&self.settings.app_flag)
            .arg(environment.as_str())
    }

    /// `heroku <parts...> --remote <environment> <extra...>`
    #[must_use]
    pub fn command_with_extra<I, S>(
        &self,
        environment: &EnvironmentName,
        parts: I,
        extra: &[String],
    ) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(environment, parts).args(extra.iter().cloned())
    }

    /// Command that prints the URL of the environment's latest backup
    #[must_use]
    pub fn backup_url(&self, environment: &EnvironmentName) -> CommandSpec {
        self.command(environment, ["pg:backups:url"])
    }

    /// Command that prints a config var of the environment
    #[must_use]
    pub fn config_get(&self, environment: &EnvironmentName, var: &str) -> CommandSpec {
        self.command(environment, ["config:get", var])
    }

    /// Name of the platform app the environment's git remote points at.
    ///
    /// Looked up once per environment and cached for the rest of the run.
    pub async fn app_name(&self, environment: &EnvironmentName) -> Result<String> {
        if let Some(name) = self.cached_app_name(environment) {
            return Ok(name);
        }

        let output = self
            .runner
            .output(&self.command(environment, ["info"]))
            .await?;
        let name = if output.status.success() {
            parse_app_name(&output.stdout)
        } else {
            None
        };
        let name = name.ok_or_else(|| ParityError::AppNameUnavailable {
            environment: environment.to_string(),
        })?;

        debug!("Environment {} is app {}", environment, name);
        if let Ok(mut cache) = self.app_names.lock() {
            cache.insert(environment.to_string(), name.clone());
        }
        Ok(name)
    }

    fn cached_app_name(&self, environment: &EnvironmentName) -> Option<String> {
        self.app_names
            .lock()
            .ok()
            .and_then(|cache| cache.get(environment.as_str()).cloned())
    }
}

/// Extract the app name from the `=== app-name` header of `heroku info`
#[must_use]
pub fn parse_app_name(info: &str) -> Option<String> {
    let name: String = info
        .lines()
        .next()?
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// First non-empty line of a captured command, e.g. a URL
#[must_use]
pub fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_name() {
        let info = "=== acme-staging\nAddons: heroku-postgresql:mini\nDynos: web: 1\n";
        assert_eq!(parse_app_name(info), Some("acme-staging".to_string()));
        assert_eq!(parse_app_name("==="), None);
        assert_eq!(parse_app_name(""), None);
    }

    #[test]
    fn test_first_line() {
        assert_eq!(
            first_line("\n  https://example.com/b001  \n"),
            Some("https://example.com/b001".to_string())
        );
        assert_eq!(first_line("   \n"), None);
    }
}
