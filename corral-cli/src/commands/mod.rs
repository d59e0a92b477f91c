//! CLI command implementations.
//!
//! This module implements the Command Pattern with trait-based dependency
//! injection, providing a clean separation of concerns:
//!
//! - `traits`: Core interfaces (`Output`, `LifecycleService`, `CommandHandler`)
//! - `services`: Concrete implementations of the traits
//! - `args`: CLI argument types and parsing (clap-derived)
//! - `handlers`: Command handlers, one per lifecycle intent
//!
//! # Example
//!
//! ```ignore
//! // Production usage (in main dispatch)
//! let output = ConsoleOutput::new();
//! let service = DefaultLifecycleService::new(&session);
//! let ctx = CommandContext::new(&output, &service);
//! let code = FreezeHandler::execute(args, &ctx)?;
//!
//! // Test usage
//! let output = MockOutput::new();
//! let service = MockLifecycleService::default();
//! let ctx = CommandContext::new(&output, &service);
//! FreezeHandler::execute(args, &ctx)?;
//! assert!(output.contains("not running"));
//! ```

mod args;
mod handlers;
mod services;
mod traits;


pub use args::{Commands, GlobalArgs};

use args::{
    freeze_options, parse_flex_counts, AmSuicideArgs, BuildArgs, CreateArgs, DestroyArgs,
    EchoArgs, ExistsArgs, FlexArgs, FreezeArgs, GetconfArgs, KillContainerArgs, ListArgs,
    StatusArgs, ThawArgs,
};
use handlers::{
    AmSuicideHandler, BuildHandler, CreateHandler, DestroyHandler, EchoHandler, ExistsHandler,
    FlexHandler, FreezeHandler, GetconfHandler, KillContainerHandler, ListHandler,
    StatusHandler, ThawHandler,
};
use services::{ConsoleOutput, DefaultLifecycleService};
use traits::{CommandContext, CommandHandler, Output};

use corral::config::ClientSettings;
use corral::error::exit_codes::EXIT_SUCCESS;
use corral::lifecycle::ConfFormat;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run a subcommand and return the process exit code.
///
/// `init` and `version` run without a session; every other command opens
/// one against the configured resource manager and dispatches to its
/// handler.
pub fn run(global: GlobalArgs, command: Commands) -> Result<i32, CliError> {
    let output = ConsoleOutput::new();

    match command {
        Commands::Version => {
            output.println(&format!("corral {}", corral::VERSION));
            return Ok(EXIT_SUCCESS);
        }
        Commands::Init => {
            let path = match &global.config {
                Some(path) if path.exists() => path.clone(),
                Some(path) => {
                    ClientSettings::default().save_to(path)?;
                    path.clone()
                }
                None => ClientSettings::ensure_exists()?,
            };
            output.println(&format!("Configuration file: {}", path.display()));
            return Ok(EXIT_SUCCESS);
        }
        _ => {}
    }

    let runner = CliRunner::new(&global)?;
    runner.log_startup(command_name(&command));

    // Reject malformed arguments before contacting anything.
    let command = Dispatch::try_from_command(command, global.debug)?;

    let session = runner.session()?;
    let service = DefaultLifecycleService::new(&session);
    let ctx = CommandContext::new(&output, &service);
    command.execute(&ctx)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Build(_) => "build",
        Commands::Create { .. } => "create",
        Commands::Thaw { .. } => "thaw",
        Commands::Freeze { .. } => "freeze",
        Commands::Destroy { .. } => "destroy",
        Commands::Exists { .. } => "exists",
        Commands::Flex { .. } => "flex",
        Commands::List { .. } => "list",
        Commands::Status { .. } => "status",
        Commands::Getconf { .. } => "getconf",
        Commands::KillContainer { .. } => "kill-container",
        Commands::AmSuicide { .. } => "am-suicide",
        Commands::Echo { .. } => "echo",
        Commands::Version => "version",
    }
}

/// A parsed command with handler arguments ready to run.
enum Dispatch {
    Build(BuildArgs),
    Create(CreateArgs),
    Thaw(ThawArgs),
    Freeze(FreezeArgs),
    Destroy(DestroyArgs),
    Exists(ExistsArgs),
    Flex(FlexArgs),
    List(ListArgs),
    Status(StatusArgs),
    Getconf(GetconfArgs),
    KillContainer(KillContainerArgs),
    AmSuicide(AmSuicideArgs),
    Echo(EchoArgs),
}

impl Dispatch {
    fn try_from_command(command: Commands, debug: bool) -> Result<Self, CliError> {
        Ok(match command {
            Commands::Build(build) => {
                let (name, request) = build.into_request();
                Self::Build(BuildArgs { name, request })
            }
            Commands::Create { build, launch } => {
                let (name, request) = build.into_request();
                Self::Create(CreateArgs {
                    name,
                    request,
                    launch: launch.options(debug),
                })
            }
            Commands::Thaw { name, launch } => Self::Thaw(ThawArgs {
                name,
                launch: launch.options(debug),
            }),
            Commands::Freeze {
                name,
                force,
                message,
                wait,
            } => Self::Freeze(FreezeArgs {
                name,
                options: freeze_options(force, message, wait),
            }),
            Commands::Destroy { name } => Self::Destroy(DestroyArgs { name }),
            Commands::Exists { name, live } => Self::Exists(ExistsArgs { name, live }),
            Commands::Flex { name, components } => Self::Flex(FlexArgs {
                name,
                counts: parse_flex_counts(&components)?,
            }),
            Commands::List { name } => Self::List(ListArgs { name }),
            Commands::Status { name, out } => Self::Status(StatusArgs { name, out }),
            Commands::Getconf { name, format, out } => Self::Getconf(GetconfArgs {
                name,
                format: format.parse::<ConfFormat>()?,
                out,
            }),
            Commands::KillContainer { name, id } => {
                Self::KillContainer(KillContainerArgs { name, id })
            }
            Commands::AmSuicide {
                name,
                message,
                exitcode,
                delay,
            } => Self::AmSuicide(AmSuicideArgs {
                name,
                message,
                exit_code: exitcode,
                delay_ms: delay,
            }),
            Commands::Echo { name, message } => Self::Echo(EchoArgs { name, message }),
            Commands::Init | Commands::Version => {
                return Err(CliError::Corral(corral::CorralError::Internal(
                    "command needs no session".into(),
                )))
            }
        })
    }

    fn execute(self, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        match self {
            Self::Build(args) => BuildHandler::execute(args, ctx),
            Self::Create(args) => CreateHandler::execute(args, ctx),
            Self::Thaw(args) => ThawHandler::execute(args, ctx),
            Self::Freeze(args) => FreezeHandler::execute(args, ctx),
            Self::Destroy(args) => DestroyHandler::execute(args, ctx),
            Self::Exists(args) => ExistsHandler::execute(args, ctx),
            Self::Flex(args) => FlexHandler::execute(args, ctx),
            Self::List(args) => ListHandler::execute(args, ctx),
            Self::Status(args) => StatusHandler::execute(args, ctx),
            Self::Getconf(args) => GetconfHandler::execute(args, ctx),
            Self::KillContainer(args) => KillContainerHandler::execute(args, ctx),
            Self::AmSuicide(args) => AmSuicideHandler::execute(args, ctx),
            Self::Echo(args) => EchoHandler::execute(args, ctx),
        }
    }
}
