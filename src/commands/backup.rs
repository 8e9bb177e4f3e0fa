use super::{CommandContext, Outcome};
use tracing::info;

/// Handle the backup command: capture a fresh platform backup
pub async fn handle_backup(ctx: &CommandContext<'_>) -> Outcome {
    info!("Capturing a new backup of {}", ctx.environment);

    let mut pipeline = ctx.pipeline();
    pipeline
        .run(
            "backup",
            ctx.platform
                .command_with_extra(ctx.environment, ["pg:backups:capture"], ctx.args),
        )
        .await;
    pipeline.finish().into()
}
