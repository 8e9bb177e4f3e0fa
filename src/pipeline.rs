//! Sequential step execution with a failure policy
//!
//! Each step is one external command. Its status is recorded whether or not
//! the run continues, so callers can report exactly what happened.

use crate::process::{CapturedOutput, CommandRunner, CommandSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// What to do after a step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep running the remaining steps
    #[default]
    Continue,
    /// Skip every remaining step
    Halt,
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Exited with code 0
    Succeeded,
    /// Exited non-zero, was killed, or could not be launched
    Failed {
        /// Exit code if there was one
        code: Option<i32>,
    },
    /// Not run, because of the failure policy or a missing input
    Skipped,
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// Short step name, e.g. `wipe-drop`
    pub name: String,
    /// Rendered command, if the step had one
    pub command: Option<String>,
    /// How it went
    pub status: StepStatus,
}

/// All steps of one run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Recorded steps
    pub steps: Vec<StepRecord>,
}

impl PipelineReport {
    /// Whether no step failed
    #[must_use]
    pub fn success(&self) -> bool {
        self.first_failure().is_none()
    }

    /// The first failed step
    #[must_use]
    pub fn first_failure(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|step| matches!(step.status, StepStatus::Failed { .. }))
    }

    /// Names of the steps that ran, in order
    #[must_use]
    pub fn executed(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|step| step.status != StepStatus::Skipped)
            .map(|step| step.name.as_str())
            .collect()
    }

    /// Status of the named step
    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<StepStatus> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| step.status)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "ok"),
            Self::Failed { code: Some(code) } => write!(f, "failed (exit {code})"),
            Self::Failed { code: None } => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Runs steps in order against a [`CommandRunner`]
pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    policy: FailurePolicy,
    halted: bool,
    report: PipelineReport,
}

impl<'a> Pipeline<'a> {
    /// Start an empty pipeline
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner, policy: FailurePolicy) -> Self {
        Self {
            runner,
            policy,
            halted: false,
            report: PipelineReport::default(),
        }
    }

    /// Whether a failure has stopped the run
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.halted
    }

    /// Run `spec` with inherited stdio. Returns whether it succeeded.
    pub async fn run(&mut self, name: &str, spec: CommandSpec) -> bool {
        if self.halted {
            self.skip(name, Some(&spec));
            return false;
        }

        info!("▶ {}: {}", name, spec);
        let status = match self.runner.status(&spec).await {
            Ok(report) if report.success() => StepStatus::Succeeded,
            Ok(report) => StepStatus::Failed { code: report.code },
            Err(e) => {
                warn!("{}: {}", name, e);
                StepStatus::Failed { code: None }
            }
        };
        self.record(name, Some(spec.to_string()), status)
    }

    /// Run `spec` with captured stdout. Returns the output only on success.
    pub async fn capture(&mut self, name: &str, spec: CommandSpec) -> Option<CapturedOutput> {
        if self.halted {
            self.skip(name, Some(&spec));
            return None;
        }

        info!("▶ {}: {}", name, spec);
        match self.runner.output(&spec).await {
            Ok(output) if output.status.success() => {
                self.record(name, Some(spec.to_string()), StepStatus::Succeeded);
                Some(output)
            }
            Ok(output) => {
                self.record(
                    name,
                    Some(spec.to_string()),
                    StepStatus::Failed {
                        code: output.status.code,
                    },
                );
                None
            }
            Err(e) => {
                warn!("{}: {}", name, e);
                self.record(name, Some(spec.to_string()), StepStatus::Failed { code: None });
                None
            }
        }
    }

    /// Record an in-process step, e.g. creating a directory
    pub fn local<E, F>(&mut self, name: &str, step: F) -> bool
    where
        E: fmt::Display,
        F: FnOnce() -> Result<(), E>,
    {
        if self.halted {
            self.skip(name, None);
            return false;
        }

        info!("▶ {}", name);
        let status = match step() {
            Ok(()) => StepStatus::Succeeded,
            Err(e) => {
                warn!("{}: {}", name, e);
                StepStatus::Failed { code: None }
            }
        };
        self.record(name, None, status)
    }

    /// Record a step that was not run
    pub fn skip(&mut self, name: &str, spec: Option<&CommandSpec>) {
        info!("⏭ {}: skipped", name);
        self.report.steps.push(StepRecord {
            name: name.to_string(),
            command: spec.map(ToString::to_string),
            status: StepStatus::Skipped,
        });
    }

    /// Stop the pipeline and hand back what happened
    #[must_use]
    pub fn finish(self) -> PipelineReport {
        self.report
    }

    fn record(&mut self, name: &str, command: Option<String>, status: StepStatus) -> bool {
        let succeeded = status == StepStatus::Succeeded;
        if !succeeded {
            warn!("✗ {}: {}", name, status);
            if self.policy == FailurePolicy::Halt {
                self.halted = true;
            }
        }
        self.report.steps.push(StepRecord {
            name: name.to_string(),
            command,
            status,
        });
        succeeded
    }
}
