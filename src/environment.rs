//! Environment names and the roles some of them play
//!
//! Only two names are special: the local development environment and the
//! production environment. Everything else is a generic remote.

use crate::config::EnvironmentSettings;
use std::fmt;

/// A named deployment target, e.g. `staging`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    /// Wrap a raw environment name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as passed on the command line
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnvironmentName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Classifies environment names using the configured role names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRoles {
    development: String,
    production: String,
    protected: Vec<String>,
}

impl EnvironmentRoles {
    /// Build the role table from settings
    #[must_use]
    pub fn from_settings(settings: &EnvironmentSettings) -> Self {
        Self {
            development: settings.development.clone(),
            production: settings.production.clone(),
            protected: settings.protected.clone(),
        }
    }

    /// The local environment's name
    #[must_use]
    pub fn development(&self) -> &str {
        &self.development
    }

    /// The production environment's name
    #[must_use]
    pub fn production(&self) -> &str {
        &self.production
    }

    /// Whether `name` is the local environment
    #[must_use]
    pub fn is_development(&self, name: &EnvironmentName) -> bool {
        name.as_str() == self.development
    }

    /// Whether `name` is production
    #[must_use]
    pub fn is_production(&self, name: &EnvironmentName) -> bool {
        name.as_str() == self.production
    }

    /// Whether `name` is exempt from restore confirmation
    #[must_use]
    pub fn is_protected(&self, name: &EnvironmentName) -> bool {
        self.protected.iter().any(|protected| protected == name.as_str())
    }
}

impl Default for EnvironmentRoles {
    fn default() -> Self {
        Self::from_settings(&EnvironmentSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roles() {
        let roles = EnvironmentRoles::default();

        assert!(roles.is_development(&"development".into()));
        assert!(roles.is_production(&"production".into()));
        assert!(roles.is_protected(&"development".into()));
        assert!(roles.is_protected(&"production".into()));
        assert!(!roles.is_protected(&"staging".into()));
        assert!(!roles.is_production(&"Production".into()));
    }

    #[test]
    fn test_custom_role_names() {
        let roles = EnvironmentRoles::from_settings(&EnvironmentSettings {
            development: "local".to_string(),
            production: "live".to_string(),
            protected: vec!["local".to_string(), "live".to_string(), "demo".to_string()],
        });

        assert!(roles.is_development(&"local".into()));
        assert!(!roles.is_development(&"development".into()));
        assert!(roles.is_production(&"live".into()));
        assert!(roles.is_protected(&"demo".into()));
    }
}
