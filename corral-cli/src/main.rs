//! corral CLI - Command-line interface
//!
//! Builds, starts, resizes, stops and inspects long-running application
//! instances on a cluster resource manager. The process exit code reports
//! the outcome of each command.

mod commands;
mod error;
mod runner;

use clap::Parser;
use std::process;

use commands::{Commands, GlobalArgs};

#[derive(Parser)]
#[command(name = "corral")]
#[command(version)]
#[command(about = "Manage long-running application instances on a cluster", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    match commands::run(cli.global, cli.command) {
        Ok(code) => process::exit(code),
        Err(e) => e.exit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "corral",
            "freeze",
            "demo",
            "--manager",
            "http://rm:8088",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.global.manager.as_deref(), Some("http://rm:8088"));
        assert!(matches!(cli.command, Commands::Freeze { force: true, .. }));
    }

    #[test]
    fn test_parses_build_pairs() {
        let cli = Cli::try_parse_from([
            "corral",
            "build",
            "demo",
            "--component",
            "worker",
            "3",
            "--component",
            "master",
            "1",
            "-O",
            "site.fs.defaultFS",
            "hdfs://nn:8020",
        ])
        .unwrap();
        let Commands::Build(build) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build.component, vec!["worker", "3", "master", "1"]);
        assert_eq!(build.option.len(), 2);
    }

    #[test]
    fn test_image_conflicts_with_app_home() {
        let result = Cli::try_parse_from([
            "corral",
            "build",
            "demo",
            "--image",
            "hdfs://images/app.tar.gz",
            "--app-home",
            "/opt/app",
        ]);
        assert!(result.is_err());
    }
}
