//! Handlers for the non-restore subcommands

use crate::config::Settings;
use crate::environment::{EnvironmentName, EnvironmentRoles};
use crate::pipeline::{Pipeline, PipelineReport, StepStatus};
use crate::remote::Platform;

/// Backup capture command functionality
pub mod backup;
/// Git deploy command functionality
pub mod deploy;
/// Remote console, migrate, tail, redis-cli and passthrough functionality
pub mod remote;

/// How a subcommand ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every step succeeded
    Success,
    /// A safety check blocked the operation; nothing was run
    Refused {
        /// Message shown to the user
        message: String,
    },
    /// A step failed
    Failed {
        /// Name of the first failed step
        step: String,
        /// Its exit code, if it had one
        code: Option<i32>,
    },
}

impl Outcome {
    /// Whether the subcommand completed successfully
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Process exit code for this outcome
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Refused { .. } => 1,
            Self::Failed { code, .. } => code.filter(|code| *code != 0).unwrap_or(1),
        }
    }
}

impl From<PipelineReport> for Outcome {
    fn from(report: PipelineReport) -> Self {
        match report.first_failure() {
            None => Self::Success,
            Some(step) => Self::Failed {
                step: step.name.clone(),
                code: match step.status {
                    StepStatus::Failed { code } => code,
                    _ => None,
                },
            },
        }
    }
}

/// Everything a handler needs for one invocation
pub struct CommandContext<'a> {
    /// Tool settings
    pub settings: &'a Settings,
    /// Environment role table
    pub roles: &'a EnvironmentRoles,
    /// Platform CLI access
    pub platform: &'a Platform<'a>,
    /// Target environment
    pub environment: &'a EnvironmentName,
    /// Arguments after the subcommand
    pub args: &'a [String],
}

impl<'a> CommandContext<'a> {
    /// A fresh pipeline honouring the configured failure policy
    #[must_use]
    pub fn pipeline(&self) -> Pipeline<'a> {
        Pipeline::new(self.platform.runner(), self.settings.failure_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepRecord;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(
            Outcome::Refused {
                message: "no".to_string()
            }
            .exit_code(),
            1
        );
        assert_eq!(
            Outcome::Failed {
                step: "push".to_string(),
                code: Some(128)
            }
            .exit_code(),
            128
        );
        assert_eq!(
            Outcome::Failed {
                step: "download".to_string(),
                code: None
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_outcome_from_report() {
        let report = PipelineReport {
            steps: vec![
                StepRecord {
                    name: "migrate".to_string(),
                    command: None,
                    status: StepStatus::Failed { code: Some(2) },
                },
                StepRecord {
                    name: "restart".to_string(),
                    command: None,
                    status: StepStatus::Skipped,
                },
            ],
        };

        assert_eq!(
            Outcome::from(report),
            Outcome::Failed {
                step: "migrate".to_string(),
                code: Some(2)
            }
        );
        assert!(Outcome::from(PipelineReport::default()).is_success());
    }
}
