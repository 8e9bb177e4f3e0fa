use anyhow::Context;
use parity::cli::Cli;
use parity::{EnvironmentCommandRouter, EnvironmentName, Outcome, Settings, SystemRunner};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// Allow println in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    tracing::debug!("parity {} initialized", parity::VERSION);

    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Refused { message }) => {
            println!("{message}");
            ExitCode::FAILURE
        }
        Ok(outcome @ Outcome::Failed { .. }) => {
            if let Outcome::Failed { step, code } = &outcome {
                match code {
                    Some(code) => eprintln!("❌ {step} failed with exit code {code}"),
                    None => eprintln!("❌ {step} failed"),
                }
            }
            exit_code(outcome.exit_code())
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load parity settings")?;
    settings.apply_halt_on_failure(cli.halt_on_failure);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let runner = SystemRunner;
    let router = EnvironmentCommandRouter::new(&settings, &runner);
    let environment = EnvironmentName::new(cli.environment);

    let outcome = runtime.block_on(router.run(&environment, &cli.subcommand, &cli.args))?;
    Ok(outcome)
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Default to INFO level, can be overridden by RUST_LOG environment variable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parity=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
