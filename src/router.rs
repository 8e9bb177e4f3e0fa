//! Subcommand dispatch for a single environment
//!
//! Known subcommands map to a closed set of handlers; anything else is
//! passed through to the platform CLI. Restores into production are refused
//! unless `--force` is given.

use crate::commands::{self, CommandContext, Outcome};
use crate::config::Settings;
use crate::environment::{EnvironmentName, EnvironmentRoles};
use crate::error::{ParityError, Result};
use crate::process::CommandRunner;
use crate::remote::Platform;
use crate::restore::{strip_force, RestoreOrchestrator, RestoreRequest};
use tracing::{debug, info, warn};

const FORCE_FLAG: &str = "--force";

/// Subcommands with their own handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// `backup`
    Backup,
    /// `deploy`
    Deploy,
    /// `console`
    Console,
    /// `migrate`
    Migrate,
    /// `tail`
    Tail,
    /// `redis-cli`
    RedisCli,
    /// `restore` and its alias `restore-from`
    Restore,
    /// `quick-restore`
    QuickRestore,
}

impl Handler {
    /// Find the handler for a subcommand; `None` means passthrough
    #[must_use]
    pub fn lookup(subcommand: &str) -> Option<Self> {
        match normalize(subcommand).as_str() {
            "backup" => Some(Self::Backup),
            "deploy" => Some(Self::Deploy),
            "console" => Some(Self::Console),
            "migrate" => Some(Self::Migrate),
            "tail" => Some(Self::Tail),
            "redis_cli" => Some(Self::RedisCli),
            "restore" | "restore_from" => Some(Self::Restore),
            "quick_restore" => Some(Self::QuickRestore),
            _ => None,
        }
    }

    /// Whether the handler overwrites a database and sits behind the gate
    #[must_use]
    pub const fn is_restore(self) -> bool {
        matches!(self, Self::Restore | Self::QuickRestore)
    }
}

/// Turn a subcommand into its lookup key (`quick-restore` → `quick_restore`)
#[must_use]
pub fn normalize(subcommand: &str) -> String {
    subcommand.replace('-', "_")
}

/// Whether the arguments contain `--force`
#[must_use]
pub fn is_forced(args: &[String]) -> bool {
    args.iter().any(|arg| arg == FORCE_FLAG)
}

/// Dispatches subcommands for one environment
pub struct EnvironmentCommandRouter<'a> {
    settings: &'a Settings,
    roles: EnvironmentRoles,
    runner: &'a dyn CommandRunner,
}

impl<'a> EnvironmentCommandRouter<'a> {
    /// Create a router
    #[must_use]
    pub fn new(settings: &'a Settings, runner: &'a dyn CommandRunner) -> Self {
        Self {
            settings,
            roles: EnvironmentRoles::from_settings(&settings.environments),
            runner,
        }
    }

    /// Run `subcommand` against `environment`
    pub async fn run(
        &self,
        environment: &EnvironmentName,
        subcommand: &str,
        args: &[String],
    ) -> Result<Outcome> {
        let platform = Platform::new(&self.settings.platform, self.runner);
        let ctx = CommandContext {
            settings: self.settings,
            roles: &self.roles,
            platform: &platform,
            environment,
            args,
        };

        let Some(handler) = Handler::lookup(subcommand) else {
            debug!("No handler for `{}`, passing through", subcommand);
            return commands::remote::handle_passthrough(&ctx, subcommand).await;
        };
        debug!("Dispatching `{}` to {:?}", subcommand, handler);

        if handler.is_restore() {
            if let Some(refusal) = self.gate(handler, environment, args) {
                return Ok(refusal);
            }
        }

        let outcome = match handler {
            Handler::Backup => commands::backup::handle_backup(&ctx).await,
            Handler::Deploy => commands::deploy::handle_deploy(&ctx).await,
            Handler::Console => commands::remote::handle_console(&ctx).await,
            Handler::Migrate => commands::remote::handle_migrate(&ctx).await,
            Handler::Tail => commands::remote::handle_tail(&ctx).await,
            Handler::RedisCli => commands::remote::handle_redis_cli(&ctx).await,
            Handler::Restore => {
                let request = self
                    .restore_request(&platform, environment, subcommand, args)
                    .await?;
                RestoreOrchestrator::new(self.settings, &platform)
                    .restore(&request)
                    .await?
                    .into()
            }
            Handler::QuickRestore => {
                let additional_args = quick_restore_args(args);
                RestoreOrchestrator::new(self.settings, &platform)
                    .quick_restore(environment, &additional_args)
                    .await?
                    .into()
            }
        };
        Ok(outcome)
    }

    /// The production gate. Returns the refusal when `handler` may not run.
    #[must_use]
    pub fn gate(
        &self,
        handler: Handler,
        environment: &EnvironmentName,
        args: &[String],
    ) -> Option<Outcome> {
        if !self.roles.is_production(environment) || is_forced(args) {
            return None;
        }

        warn!("Refusing {:?} into {} without {}", handler, environment, FORCE_FLAG);
        let message = match handler {
            Handler::QuickRestore => format!(
                "quick-restore only loads backups into {}. Use `{FORCE_FLAG}` to override.",
                self.roles.development()
            ),
            _ => format!(
                "Parity does not support restoring backups into your {environment} \
                 environment. Use `{FORCE_FLAG}` to override."
            ),
        };
        Some(Outcome::Refused { message })
    }

    /// Whether a restore from `from` into `to` must carry `--confirm <app>`.
    ///
    /// Restores into development never reset a remote, so they never confirm.
    #[must_use]
    pub fn confirmation_required(&self, from: &EnvironmentName, to: &EnvironmentName) -> bool {
        !self.roles.is_development(to)
            && !self.roles.is_protected(to)
            && !self.roles.is_development(from)
    }

    /// Build the restore request from raw arguments.
    ///
    /// `--force` is dropped, the first remaining argument names the source,
    /// and the rest are handed to the restore tools together with the
    /// confirmation argument when one is required.
    pub async fn restore_request(
        &self,
        platform: &Platform<'_>,
        environment: &EnvironmentName,
        subcommand: &str,
        args: &[String],
    ) -> Result<RestoreRequest> {
        let mut remaining = strip_force(args.to_vec()).into_iter();
        let from = match remaining.next() {
            Some(source) if !source.starts_with('-') => EnvironmentName::new(source),
            _ => {
                return Err(ParityError::MissingSource {
                    command: subcommand.to_string(),
                    environment: environment.to_string(),
                })
            }
        };

        let mut additional_args: Vec<String> = remaining.collect();
        if self.confirmation_required(&from, environment) {
            let app = platform.app_name(environment).await?;
            additional_args.push("--confirm".to_string());
            additional_args.push(app);
        }

        info!("Restore request: {} -> {}", from, environment);
        Ok(RestoreRequest::new(from, environment.clone(), additional_args))
    }
}

/// Extra arguments for a quick restore. A leading source name is ignored
/// because the backup is already local.
fn quick_restore_args(args: &[String]) -> Vec<String> {
    let mut remaining = strip_force(args.to_vec());
    if remaining.first().is_some_and(|first| !first.starts_with('-')) {
        let source = remaining.remove(0);
        debug!("quick-restore reuses the local backup; ignoring source {}", source);
    }
    remaining
}
