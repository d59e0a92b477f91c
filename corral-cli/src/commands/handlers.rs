//! Command handlers for lifecycle commands.
//!
//! Each handler implements the `CommandHandler` trait, runs one lifecycle
//! intent and reports its outcome.

use std::path::Path;

use corral::error::exit_codes::{EXIT_FALSE, EXIT_SUCCESS};
use corral::lifecycle::{ExistsOutcome, FreezeOutcome, LaunchOutcome};
use corral::platform::AppReport;

use super::args::{
    AmSuicideArgs, BuildArgs, CreateArgs, DestroyArgs, EchoArgs, ExistsArgs, FlexArgs,
    FreezeArgs, GetconfArgs, KillContainerArgs, ListArgs, StatusArgs, ThawArgs,
};
use super::traits::{CommandContext, CommandHandler, Output};
use crate::error::CliError;

// ============================================================================
// Build, Create, Thaw
// ============================================================================

/// Handler for the `build` command.
pub struct BuildHandler;

impl CommandHandler for BuildHandler {
    type Args = BuildArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        ctx.service.build(&args.name, &args.request)?;
        ctx.output
            .success(&format!("Instance \"{}\" built", args.name));
        ctx.output
            .indented(&format!("Start it with: corral thaw {}", args.name));
        Ok(EXIT_SUCCESS)
    }
}

/// Handler for the `create` command.
pub struct CreateHandler;

impl CommandHandler for CreateHandler {
    type Args = CreateArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let outcome = ctx
            .service
            .create(&args.name, &args.request, &args.launch)?;
        Ok(report_launch(ctx.output, &args.name, &outcome))
    }
}

/// Handler for the `thaw` command.
pub struct ThawHandler;

impl CommandHandler for ThawHandler {
    type Args = ThawArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let outcome = ctx.service.launch(&args.name, &args.launch)?;
        Ok(report_launch(ctx.output, &args.name, &outcome))
    }
}

fn report_launch(output: &dyn Output, name: &str, outcome: &LaunchOutcome) -> i32 {
    match &outcome.report {
        Some(report) => {
            output.println(&format!(
                "Instance \"{}\" submitted as {}: {}",
                name, outcome.app_id, report.state
            ));
            if let Some(url) = &report.tracking_url {
                output.indented(&format!("Tracking URL: {}", url));
            }
            if !report.diagnostics.is_empty() {
                output.indented(&format!("Diagnostics: {}", report.diagnostics));
            }
        }
        None => {
            output.warning(&format!(
                "Instance \"{}\" ({}) did not start in time",
                name, outcome.app_id
            ));
            if outcome.killed {
                output.indented("The application was killed");
            }
        }
    }
    outcome.exit_code()
}

// ============================================================================
// Freeze, Destroy, Flex
// ============================================================================

/// Handler for the `freeze` command.
pub struct FreezeHandler;

impl CommandHandler for FreezeHandler {
    type Args = FreezeArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let outcome = ctx.service.freeze(&args.name, &args.options)?;
        let message = match &outcome {
            FreezeOutcome::NotRunning => format!("Instance \"{}\" is not running", args.name),
            FreezeOutcome::AlreadyTerminated(state) => {
                format!("Instance \"{}\" already terminated: {}", args.name, state)
            }
            FreezeOutcome::Stopped(app_id) => {
                format!("Instance \"{}\" ({}) frozen", args.name, app_id)
            }
            FreezeOutcome::StopFailed { app_id, reason } => {
                ctx.output.warning(&format!(
                    "Failed to stop instance \"{}\" ({}): {}",
                    args.name, app_id, reason
                ));
                return Ok(outcome.exit_code());
            }
            FreezeOutcome::WaitTimedOut(app_id) => {
                ctx.output.warning(&format!(
                    "Instance \"{}\" ({}) did not shut down in time",
                    args.name, app_id
                ));
                return Ok(outcome.exit_code());
            }
        };
        ctx.output.println(&message);
        Ok(outcome.exit_code())
    }
}

/// Handler for the `destroy` command.
pub struct DestroyHandler;

impl CommandHandler for DestroyHandler {
    type Args = DestroyArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        if ctx.service.destroy(&args.name)? {
            ctx.output
                .success(&format!("Instance \"{}\" destroyed", args.name));
        } else {
            ctx.output
                .println(&format!("Instance \"{}\" already destroyed", args.name));
        }
        Ok(EXIT_SUCCESS)
    }
}

/// Handler for the `flex` command.
pub struct FlexHandler;

impl CommandHandler for FlexHandler {
    type Args = FlexArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let outcome = ctx.service.flex(&args.name, &args.counts)?;

        if !outcome.saved {
            ctx.output
                .warning("The instance definition is locked; the new size was not saved");
        }
        if outcome.changed {
            ctx.output
                .println(&format!("Instance \"{}\" resized:", args.name));
            for (component, count) in &args.counts {
                ctx.output.indented(&format!("{}: {}", component, count));
            }
        } else {
            ctx.output.println(&format!(
                "Requested size of \"{}\" is the same as the current size",
                args.name
            ));
        }
        if !outcome.pushed_live {
            ctx.output
                .indented("Instance not running; takes effect on next thaw");
        }
        Ok(outcome.exit_code())
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Handler for the `exists` command.
pub struct ExistsHandler;

impl CommandHandler for ExistsHandler {
    type Args = ExistsArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let outcome = ctx.service.exists(&args.name, args.live)?;
        let message = match &outcome {
            ExistsOutcome::Defined => format!("Instance \"{}\" exists", args.name),
            ExistsOutcome::Live(report) => format!(
                "Instance \"{}\" is running as {}: {}",
                args.name, report.id, report.state
            ),
            ExistsOutcome::NotLive(Some(state)) => {
                format!("Instance \"{}\" is not running: {}", args.name, state)
            }
            ExistsOutcome::NotLive(None) => format!("Instance \"{}\" is not running", args.name),
        };
        ctx.output.println(&message);
        Ok(outcome.exit_code())
    }
}

/// Handler for the `list` command.
pub struct ListHandler;

impl CommandHandler for ListHandler {
    type Args = ListArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let reports = ctx.service.list(args.name.as_deref())?;

        if reports.is_empty() {
            ctx.output.println("No instances found.");
            return Ok(EXIT_SUCCESS);
        }

        ctx.output.header(&format!("Instances ({})", reports.len()));
        for report in &reports {
            ctx.output.println(&describe_report(report));
        }
        Ok(EXIT_SUCCESS)
    }
}

fn describe_report(report: &AppReport) -> String {
    let mut line = format!(
        "  {} {} {} user={} queue={}",
        report.name, report.id, report.state, report.user, report.queue
    );
    if let Some(url) = &report.tracking_url {
        line.push_str(&format!(" {}", url));
    }
    line
}

/// Handler for the `status` command.
pub struct StatusHandler;

impl CommandHandler for StatusHandler {
    type Args = StatusArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let description = ctx.service.status(&args.name)?;
        let json = description.to_json()?;
        emit(ctx.output, args.out.as_deref(), &json)?;
        Ok(EXIT_SUCCESS)
    }
}

/// Handler for the `getconf` command.
pub struct GetconfHandler;

impl CommandHandler for GetconfHandler {
    type Args = GetconfArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let rendered = ctx.service.getconf(&args.name, args.format)?;
        emit(ctx.output, args.out.as_deref(), &rendered)?;
        Ok(EXIT_SUCCESS)
    }
}

/// Print `content`, or write it to `out` when given.
fn emit(output: &dyn Output, out: Option<&Path>, content: &str) -> Result<(), CliError> {
    match out {
        Some(path) => {
            std::fs::write(path, content).map_err(|error| CliError::FileWrite {
                path: path.to_path_buf(),
                error,
            })?;
            output.println(&format!("Written to {}", path.display()));
        }
        None => output.println(content.trim_end()),
    }
    Ok(())
}

// ============================================================================
// Coordinator control
// ============================================================================

/// Handler for the `kill-container` command.
pub struct KillContainerHandler;

impl CommandHandler for KillContainerHandler {
    type Args = KillContainerArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        ctx.service.kill_container(&args.name, &args.id)?;
        ctx.output.println(&format!(
            "Container {} of instance \"{}\" killed",
            args.id, args.name
        ));
        Ok(EXIT_SUCCESS)
    }
}

/// Handler for the `am-suicide` command.
pub struct AmSuicideHandler;

impl CommandHandler for AmSuicideHandler {
    type Args = AmSuicideArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        ctx.service
            .am_suicide(&args.name, &args.message, args.exit_code, args.delay_ms)?;
        ctx.output.println(&format!(
            "Coordinator of \"{}\" asked to exit with code {} in {} ms",
            args.name, args.exit_code, args.delay_ms
        ));
        Ok(EXIT_SUCCESS)
    }
}

/// Handler for the `echo` command.
pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    type Args = EchoArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError> {
        let reply = ctx.service.echo(&args.name, &args.message)?;
        ctx.output.println(&reply);
        if reply == args.message {
            Ok(EXIT_SUCCESS)
        } else {
            ctx.output
                .warning("The coordinator reply differs from the message sent");
            Ok(EXIT_FALSE)
        }
    }
}
