//! Restore orchestration between development and remote environments
//!
//! The (from, to) pair picks one of three fixed step sequences. Destructive
//! resets always come before the restore they prepare for, and only restores
//! into development touch local files or rewrite the environment marker.

use crate::backup::BackupWorkspace;
use crate::config::Settings;
use crate::database;
use crate::environment::{EnvironmentName, EnvironmentRoles};
use crate::error::{ParityError, Result};
use crate::pipeline::{Pipeline, PipelineReport};
use crate::process::CommandSpec;
use crate::remote::{first_line, Platform};
use std::fmt;
use tracing::{debug, info, warn};

const FORCE_FLAG: &str = "--force";
const CONFIRM_FLAG: &str = "--confirm";

/// How a restore is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    /// Download a remote backup and load it into the local database
    ToDevelopment,
    /// Push the local database to a remote
    FromDevelopment,
    /// Have the platform restore one remote's backup into another
    RemoteToRemote,
}

impl RestoreStrategy {
    /// Pick the strategy. Restoring into development wins over restoring
    /// from it.
    #[must_use]
    pub const fn select(from_is_development: bool, to_is_development: bool) -> Self {
        if to_is_development {
            Self::ToDevelopment
        } else if from_is_development {
            Self::FromDevelopment
        } else {
            Self::RemoteToRemote
        }
    }
}

impl fmt::Display for RestoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToDevelopment => write!(f, "to-development"),
            Self::FromDevelopment => write!(f, "from-development"),
            Self::RemoteToRemote => write!(f, "remote-to-remote"),
        }
    }
}

/// A restore from one environment into another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Environment whose data is copied
    pub from: EnvironmentName,
    /// Environment that is overwritten
    pub to: EnvironmentName,
    additional_args: Vec<String>,
}

impl RestoreRequest {
    /// Create a request. `--force` is removed from `additional_args`.
    #[must_use]
    pub fn new(from: EnvironmentName, to: EnvironmentName, additional_args: Vec<String>) -> Self {
        Self {
            from,
            to,
            additional_args: strip_force(additional_args),
        }
    }

    /// Extra arguments passed to the restore tools
    #[must_use]
    pub fn additional_args(&self) -> &[String] {
        &self.additional_args
    }

    /// Strategy for this request under the given roles
    #[must_use]
    pub fn strategy(&self, roles: &EnvironmentRoles) -> RestoreStrategy {
        RestoreStrategy::select(roles.is_development(&self.from), roles.is_development(&self.to))
    }
}

/// Remove every `--force` from an argument list
#[must_use]
pub fn strip_force(args: Vec<String>) -> Vec<String> {
    args.into_iter().filter(|arg| arg != FORCE_FLAG).collect()
}

/// The SQL that marks a restored database as belonging to `environment`
#[must_use]
pub fn environment_marker_sql(environment: &str) -> String {
    let value = environment.replace('\'', "''");
    format!(
        "CREATE TABLE IF NOT EXISTS public.ar_internal_metadata (\
         key character varying NOT NULL, \
         value character varying, \
         created_at timestamp without time zone NOT NULL, \
         updated_at timestamp without time zone NOT NULL, \
         CONSTRAINT ar_internal_metadata_pkey PRIMARY KEY (key)); \
         INSERT INTO public.ar_internal_metadata (key, value, created_at, updated_at) \
         VALUES ('environment', '{value}', NOW(), NOW()) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at"
    )
}

/// Runs restore pipelines
pub struct RestoreOrchestrator<'a> {
    settings: &'a Settings,
    roles: EnvironmentRoles,
    platform: &'a Platform<'a>,
}

impl<'a> RestoreOrchestrator<'a> {
    /// Create an orchestrator
    #[must_use]
    pub fn new(settings: &'a Settings, platform: &'a Platform<'a>) -> Self {
        Self {
            settings,
            roles: EnvironmentRoles::from_settings(&settings.environments),
            platform,
        }
    }

    /// Run the full restore for `request`
    pub async fn restore(&self, request: &RestoreRequest) -> Result<PipelineReport> {
        let strategy = request.strategy(&self.roles);
        info!(
            "Restoring {} into {} ({})",
            request.from, request.to, strategy
        );

        match strategy {
            RestoreStrategy::ToDevelopment => self.restore_to_development(request).await,
            RestoreStrategy::FromDevelopment => self.restore_from_development(request).await,
            RestoreStrategy::RemoteToRemote => self.restore_to_remote(request).await,
        }
    }

    /// Reload the local database from the previously downloaded backup
    pub async fn quick_restore(
        &self,
        to: &EnvironmentName,
        additional_args: &[String],
    ) -> Result<PipelineReport> {
        if !self.roles.is_development(to) {
            warn!(
                "quick-restore always loads into the local {} database, not {}",
                self.roles.development(),
                to
            );
        }

        let database = self.development_database()?;
        let workspace = self.workspace();
        if !workspace.artifact().exists() {
            return Err(ParityError::MissingArtifact {
                path: workspace.artifact().to_path_buf(),
            });
        }
        info!(
            "Quick restore of {} into {}",
            workspace.artifact().display(),
            database
        );

        let mut pipeline = self.pipeline();
        pipeline.local("temp-dir", || workspace.ensure_dir());
        self.wipe_development_database(&mut pipeline, &database).await;
        self.restore_from_local_backup(&mut pipeline, &workspace, &database, additional_args)
            .await;
        self.mark_as_development(&mut pipeline, &database).await;
        self.run_hooks(&mut pipeline).await;
        Ok(pipeline.finish())
    }

    async fn restore_to_development(&self, request: &RestoreRequest) -> Result<PipelineReport> {
        let database = self.development_database()?;
        let workspace = self.workspace();

        let mut pipeline = self.pipeline();
        pipeline.local("temp-dir", || workspace.ensure_dir());
        if self
            .download_backup(&mut pipeline, &request.from, &workspace)
            .await
        {
            self.wipe_development_database(&mut pipeline, &database).await;
            self.restore_from_local_backup(
                &mut pipeline,
                &workspace,
                &database,
                request.additional_args(),
            )
            .await;
        } else {
            // Whatever sits at the artifact path belongs to an earlier run.
            warn!("No fresh backup of {}; leaving {} as it is", request.from, database);
            for step in ["wipe-drop", "wipe-create", "restore"] {
                pipeline.skip(step, None);
            }
        }
        pipeline.local("cleanup", || workspace.remove_artifact());
        self.mark_as_development(&mut pipeline, &database).await;
        self.run_hooks(&mut pipeline).await;
        Ok(pipeline.finish())
    }

    async fn restore_from_development(&self, request: &RestoreRequest) -> Result<PipelineReport> {
        let database = self.development_database()?;
        let app = self.platform.app_name(&request.to).await?;

        let mut pipeline = self.pipeline();
        self.reset_remote_database(&mut pipeline, request, &app).await;
        pipeline
            .run(
                "push",
                self.platform.command_with_extra(
                    &request.to,
                    ["pg:push", database.as_str(), "DATABASE_URL"],
                    request.additional_args(),
                ),
            )
            .await;
        Ok(pipeline.finish())
    }

    async fn restore_to_remote(&self, request: &RestoreRequest) -> Result<PipelineReport> {
        let app = self.platform.app_name(&request.to).await?;

        let mut pipeline = self.pipeline();
        // Resolve the backup before resetting so a missing backup leaves the
        // destination untouched.
        let url = pipeline
            .capture("backup-url", self.platform.backup_url(&request.from))
            .await
            .and_then(|output| first_line(&output.stdout));
        let Some(url) = url else {
            warn!("No backup URL for {}; leaving {} untouched", request.from, request.to);
            pipeline.skip("reset", None);
            pipeline.skip("remote-restore", None);
            return Ok(pipeline.finish());
        };

        self.reset_remote_database(&mut pipeline, request, &app).await;
        pipeline
            .run(
                "remote-restore",
                self.platform.command_with_extra(
                    &request.to,
                    ["pg:backups:restore", url.as_str(), "DATABASE"],
                    request.additional_args(),
                ),
            )
            .await;
        Ok(pipeline.finish())
    }

    async fn reset_remote_database(
        &self,
        pipeline: &mut Pipeline<'_>,
        request: &RestoreRequest,
        app: &str,
    ) -> bool {
        let mut spec =
            self.platform
                .command_with_extra(&request.to, ["pg:reset"], request.additional_args());
        if !request.additional_args().iter().any(|arg| arg == CONFIRM_FLAG) {
            spec = spec.arg(CONFIRM_FLAG).arg(app);
        }
        pipeline.run("reset", spec).await
    }

    async fn download_backup(
        &self,
        pipeline: &mut Pipeline<'_>,
        from: &EnvironmentName,
        workspace: &BackupWorkspace,
    ) -> bool {
        let Some(output) = pipeline
            .capture("backup-url", self.platform.backup_url(from))
            .await
        else {
            pipeline.skip("download", None);
            return false;
        };

        match first_line(&output.stdout) {
            Some(url) => {
                let spec = CommandSpec::new("curl")
                    .args(["--fail", "--location", "-o"])
                    .arg(workspace.artifact().to_string_lossy())
                    .arg(url);
                pipeline.run("download", spec).await
            }
            None => pipeline.local("download", || {
                Err(format!("{from} returned no backup URL"))
            }),
        }
    }

    async fn wipe_development_database(&self, pipeline: &mut Pipeline<'_>, database: &str) -> bool {
        let drop = CommandSpec::new("dropdb").args(["--if-exists", database]);
        let create = CommandSpec::new("createdb").arg(database);

        if pipeline.run("wipe-drop", drop).await {
            pipeline.run("wipe-create", create).await
        } else {
            pipeline.skip("wipe-create", Some(&create));
            false
        }
    }

    async fn restore_from_local_backup(
        &self,
        pipeline: &mut Pipeline<'_>,
        workspace: &BackupWorkspace,
        database: &str,
        additional_args: &[String],
    ) -> bool {
        let restore = &self.settings.restore;
        let artifact = workspace.artifact().to_string_lossy().into_owned();
        let mut options: Vec<String> = [
            "--verbose",
            "--clean",
            "--no-acl",
            "--no-owner",
            "--dbname",
            database,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        options.push(format!("--jobs={}", restore.jobs));
        options.extend(additional_args.iter().cloned());

        if !restore.skip_materialized_view_data {
            return pipeline
                .run("restore", CommandSpec::new("pg_restore").arg(artifact).args(options))
                .await;
        }

        // Materialized view data is refreshed by a hook after the restore.
        let Some(toc) = pipeline
            .capture("restore-list", CommandSpec::new("pg_restore").args(["-l", artifact.as_str()]))
            .await
        else {
            pipeline.skip("restore", None);
            return false;
        };

        let mut list = None;
        pipeline.local("restore-list-write", || {
            list = Some(workspace.write_restore_list(&toc.stdout)?);
            Ok::<(), std::io::Error>(())
        });
        let Some(list) = list else {
            pipeline.skip("restore", None);
            return false;
        };

        debug!("Restore list written to {}", list.path().display());
        let spec = CommandSpec::new("pg_restore")
            .arg("-L")
            .arg(list.path().to_string_lossy())
            .arg(artifact)
            .args(options);
        pipeline.run("restore", spec).await
    }

    async fn mark_as_development(&self, pipeline: &mut Pipeline<'_>, database: &str) -> bool {
        let spec = CommandSpec::new("psql")
            .args(["--dbname", database, "-c"])
            .arg(environment_marker_sql(self.roles.development()));
        pipeline.run("metadata", spec).await
    }

    async fn run_hooks(&self, pipeline: &mut Pipeline<'_>) {
        for hook in &self.settings.restore.hooks {
            let name = format!("hook:{}", hook.name);
            match CommandSpec::from_argv(&hook.command) {
                Some(spec) => {
                    pipeline.run(&name, spec).await;
                }
                None => {
                    pipeline.local(&name, || Err("empty hook command"));
                }
            }
        }
    }

    fn development_database(&self) -> Result<String> {
        database::development_database(&self.settings.database_config, self.roles.development())
    }

    fn workspace(&self) -> BackupWorkspace {
        BackupWorkspace::from_settings(&self.settings.restore)
    }

    fn pipeline(&self) -> Pipeline<'a> {
        Pipeline::new(self.platform.runner(), self.settings.failure_policy)
    }
}
