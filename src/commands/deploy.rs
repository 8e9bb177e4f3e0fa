//! Git deploys to the platform

use super::{CommandContext, Outcome};
use crate::process::CommandSpec;
use tracing::info;

/// Handle the deploy command.
///
/// Production only ever gets a plain push of the deploy branch, so a
/// diverged history fails loudly. Every other environment is force-pushed
/// from `HEAD`.
pub async fn handle_deploy(ctx: &CommandContext<'_>) -> Outcome {
    let spec = deploy_command(ctx);
    info!("Deploying to {}", ctx.environment);

    let mut pipeline = ctx.pipeline();
    pipeline.run("deploy", spec).await;
    pipeline.finish().into()
}

/// The `git push` used for the context's environment
#[must_use]
pub fn deploy_command(ctx: &CommandContext<'_>) -> CommandSpec {
    let branch = &ctx.settings.deploy.branch;
    let git = CommandSpec::new("git").args(["push", ctx.environment.as_str()]);

    if ctx.roles.is_production(ctx.environment) {
        git.arg(branch)
    } else {
        git.arg(format!("HEAD:{branch}")).arg("--force")
    }
}
