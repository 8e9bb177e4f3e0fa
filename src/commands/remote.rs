//! Remote commands run through the platform CLI

use super::{CommandContext, Outcome};
use crate::error::Result;
use crate::process::CommandSpec;
use crate::remote::first_line;
use tracing::{info, warn};

/// Handle the console command
pub async fn handle_console(ctx: &CommandContext<'_>) -> Outcome {
    let console = &ctx.platform.settings().console_command;
    let spec = ctx.platform.command(
        ctx.environment,
        std::iter::once("run").chain(console.iter().map(String::as_str)),
    );

    let mut pipeline = ctx.pipeline();
    pipeline.run("console", spec).await;
    pipeline.finish().into()
}

/// Handle the migrate command. The app is restarted only after a
/// successful migration.
pub async fn handle_migrate(ctx: &CommandContext<'_>) -> Outcome {
    let migrate = &ctx.platform.settings().migrate_command;
    let migrate_spec = ctx.platform.command(
        ctx.environment,
        std::iter::once("run").chain(migrate.iter().map(String::as_str)),
    );
    let restart_spec = ctx.platform.command(ctx.environment, ["restart"]);

    let mut pipeline = ctx.pipeline();
    if pipeline.run("migrate", migrate_spec).await {
        pipeline.run("restart", restart_spec).await;
    } else {
        warn!("Migration on {} failed; not restarting", ctx.environment);
        pipeline.skip("restart", Some(&restart_spec));
    }
    pipeline.finish().into()
}

/// Handle the tail command
pub async fn handle_tail(ctx: &CommandContext<'_>) -> Outcome {
    let spec = ctx.platform.command(
        ctx.environment,
        ["logs", "--tail"]
            .into_iter()
            .chain(ctx.args.iter().map(String::as_str)),
    );

    let mut pipeline = ctx.pipeline();
    pipeline.run("tail", spec).await;
    pipeline.finish().into()
}

/// Handle the redis-cli command: connect a local `redis-cli` to the
/// environment's Redis
pub async fn handle_redis_cli(ctx: &CommandContext<'_>) -> Outcome {
    let var = &ctx.platform.settings().redis_url_var;

    let mut pipeline = ctx.pipeline();
    let url = pipeline
        .capture("redis-url", ctx.platform.config_get(ctx.environment, var))
        .await
        .map(|output| first_line(&output.stdout));

    match url {
        Some(Some(url)) => {
            pipeline
                .run("redis-cli", CommandSpec::new("redis-cli").args(["-u", url.as_str()]))
                .await;
        }
        Some(None) => {
            pipeline.local("redis-cli", || {
                Err(format!("{var} is not set on {}", ctx.environment))
            });
        }
        None => pipeline.skip("redis-cli", None),
    }
    pipeline.finish().into()
}

/// Run any other subcommand through the platform CLI and pass its exit code
/// through
pub async fn handle_passthrough(ctx: &CommandContext<'_>, subcommand: &str) -> Result<Outcome> {
    let spec = ctx.platform.command(
        ctx.environment,
        std::iter::once(subcommand).chain(ctx.args.iter().map(String::as_str)),
    );
    info!("Passing through: {}", spec);

    let status = ctx.platform.runner().status(&spec).await?;
    Ok(if status.success() {
        Outcome::Success
    } else {
        Outcome::Failed {
            step: subcommand.to_string(),
            code: status.code,
        }
    })
}
