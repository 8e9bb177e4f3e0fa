use clap::Parser;
use std::path::PathBuf;

/// Main CLI interface for `parity`
#[derive(Parser, Debug)]
#[command(name = "parity")]
#[command(version = crate::VERSION)]
#[command(about = "Parity - backup, restore and deploy across Heroku environments")]
#[command(
    long_about = "Run platform commands against a named environment. \
                  `backup`, `deploy`, `restore`, `restore-from`, `quick-restore`, `console`, \
                  `migrate`, `tail` and `redis-cli` have dedicated handlers; anything else is \
                  passed to the platform CLI with the environment's remote appended."
)]
pub struct Cli {
    /// Settings file (defaults to ./parity.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the remaining steps after the first failed one
    #[arg(long)]
    pub halt_on_failure: bool,

    /// Target environment, e.g. development, staging or production
    #[arg(value_name = "ENVIRONMENT")]
    pub environment: String,

    /// Subcommand to run against the environment
    #[arg(value_name = "SUBCOMMAND")]
    pub subcommand: String,

    /// Arguments for the subcommand, passed through verbatim (including --force)
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_args_keep_force() {
        let cli = Cli::try_parse_from(["parity", "production", "restore", "staging", "--force"])
            .unwrap();

        assert_eq!(cli.environment, "production");
        assert_eq!(cli.subcommand, "restore");
        assert_eq!(cli.args, vec!["staging", "--force"]);
        assert!(!cli.halt_on_failure);
    }

    #[test]
    fn test_global_options_before_environment() {
        let cli = Cli::try_parse_from([
            "parity",
            "--halt-on-failure",
            "--config",
            "ops/parity.toml",
            "staging",
            "tail",
            "--dyno",
            "web",
        ])
        .unwrap();

        assert!(cli.halt_on_failure);
        assert_eq!(cli.config, Some(PathBuf::from("ops/parity.toml")));
        assert_eq!(cli.args, vec!["--dyno", "web"]);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["parity", "staging"]).is_err());
    }
}
