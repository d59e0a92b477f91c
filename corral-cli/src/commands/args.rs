//! Argument types and CLI definitions for lifecycle commands.
//!
//! This module contains the clap-derived argument types and their
//! conversion into the request structs handlers work with.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use corral::conf::OptionMap;
use corral::lifecycle::{BuildRequest, ConfFormat, FreezeOptions, LaunchOptions};
use corral::CorralError;

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Resource manager URL (default: [platform] url from config)
    #[arg(long, global = true)]
    pub manager: Option<String>,

    /// Directory holding instance definitions (default: [store] directory from config)
    #[arg(long, global = true)]
    pub basepath: Option<PathBuf>,

    /// Client configuration file (default: ~/.corral/config.ini)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Lifecycle subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file if none exists
    Init,

    /// Build and persist an instance definition without starting it
    Build(BuildCliArgs),

    /// Build an instance definition and start it
    Create {
        #[command(flatten)]
        build: BuildCliArgs,

        #[command(flatten)]
        launch: LaunchCliArgs,
    },

    /// Start a built instance
    Thaw {
        /// Instance name
        name: String,

        #[command(flatten)]
        launch: LaunchCliArgs,
    },

    /// Stop a running instance, keeping its definition
    Freeze {
        /// Instance name
        name: String,

        /// Kill through the resource manager instead of asking the coordinator
        #[arg(long)]
        force: bool,

        /// Message passed along with the stop request
        #[arg(long, default_value = "stopping")]
        message: String,

        /// Seconds to wait for the application to terminate
        #[arg(long, default_value = "0")]
        wait: u64,
    },

    /// Delete an instance definition
    Destroy {
        /// Instance name
        name: String,
    },

    /// Check whether an instance is defined (and running, with --live)
    Exists {
        /// Instance name
        name: String,

        /// Also require a live application
        #[arg(long)]
        live: bool,
    },

    /// Change component instance counts
    Flex {
        /// Instance name
        name: String,

        /// New counts as COMPONENT=COUNT
        #[arg(required = true)]
        components: Vec<String>,
    },

    /// List applications of this type, or the latest one with a name
    List {
        /// Instance name
        name: Option<String>,
    },

    /// Print the live status of a running instance as JSON
    Status {
        /// Instance name
        name: String,

        /// Write the status to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the client configuration of a running instance
    Getconf {
        /// Instance name
        name: String,

        /// Output format: xml or properties
        #[arg(long, default_value = "xml")]
        format: String,

        /// Write the configuration to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Kill one container of a running instance
    KillContainer {
        /// Instance name
        name: String,

        /// Container id
        id: String,
    },

    /// Ask the coordinator of a running instance to exit
    AmSuicide {
        /// Instance name
        name: String,

        /// Message logged by the coordinator
        #[arg(long, default_value = "stopping")]
        message: String,

        /// Exit code the coordinator exits with
        #[arg(long, default_value = "1")]
        exitcode: i32,

        /// Milliseconds to wait before exiting
        #[arg(long, default_value = "0")]
        delay: u64,
    },

    /// Round-trip text through the coordinator of a running instance
    Echo {
        /// Instance name
        name: String,

        /// Text to send
        #[arg(long, default_value = "ping")]
        message: String,
    },

    /// Print the version
    Version,
}

/// Options shared by `build` and `create`.
#[derive(Debug, Clone, Args)]
pub struct BuildCliArgs {
    /// Instance name
    pub name: String,

    /// Application provider (default: agent)
    #[arg(long)]
    pub provider: Option<String>,

    /// Resources definition file (JSON)
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Application configuration template file (JSON)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Local configuration directory copied into the instance snapshot
    #[arg(long)]
    pub confdir: Option<PathBuf>,

    /// Archive containing the application
    #[arg(long, conflicts_with = "app_home")]
    pub image: Option<String>,

    /// Directory where the application is pre-installed
    #[arg(long)]
    pub app_home: Option<String>,

    /// Component and count, repeatable
    #[arg(long, num_args = 2, value_names = ["COMPONENT", "COUNT"])]
    pub component: Vec<String>,

    /// Global application option, repeatable
    #[arg(long = "option", short = 'O', num_args = 2, value_names = ["KEY", "VALUE"])]
    pub option: Vec<String>,

    /// Component application option, repeatable
    #[arg(long, num_args = 3, value_names = ["COMPONENT", "KEY", "VALUE"])]
    pub compopt: Vec<String>,

    /// Global resource option, repeatable
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
    pub resopt: Vec<String>,

    /// Component resource option, repeatable
    #[arg(long, num_args = 3, value_names = ["COMPONENT", "KEY", "VALUE"])]
    pub rescompopt: Vec<String>,

    /// ZooKeeper quorum hosts
    #[arg(long)]
    pub zkhosts: Option<String>,

    /// ZooKeeper port
    #[arg(long)]
    pub zkport: Option<u16>,

    /// ZooKeeper path for the instance
    #[arg(long)]
    pub zkpath: Option<String>,

    /// Application package path
    #[arg(long)]
    pub package: Option<String>,
}

/// Options shared by `create` and `thaw`.
#[derive(Debug, Clone, Copy, Args)]
pub struct LaunchCliArgs {
    /// Seconds to wait for the application to run after it is accepted
    #[arg(long, default_value = "0")]
    pub wait: u64,
}

// ============================================================================
// Conversions
// ============================================================================

impl BuildCliArgs {
    /// Convert into the library request, returning the instance name with it.
    pub fn into_request(self) -> (String, BuildRequest) {
        let mut component_counts = BTreeMap::new();
        for pair in self.component.chunks(2) {
            if let [component, count] = pair {
                component_counts.insert(component.clone(), count.clone());
            }
        }

        let request = BuildRequest {
            provider: self.provider,
            resources_file: self.resources,
            app_conf_file: self.template,
            conf_dir: self.confdir,
            image: self.image,
            app_home: self.app_home,
            app_options: pairs_to_map(&self.option),
            component_options: triples_to_map(&self.compopt),
            resource_options: pairs_to_map(&self.resopt),
            resource_component_options: triples_to_map(&self.rescompopt),
            component_counts,
            zookeeper_hosts: self.zkhosts,
            zookeeper_port: self.zkport,
            zookeeper_path: self.zkpath,
            package_path: self.package,
        };
        (self.name, request)
    }
}

impl LaunchCliArgs {
    pub fn options(self, debug: bool) -> LaunchOptions {
        LaunchOptions {
            wait: Duration::from_secs(self.wait),
            debug,
        }
    }
}

fn pairs_to_map(values: &[String]) -> OptionMap {
    values
        .chunks(2)
        .filter_map(|pair| match pair {
            [key, value] => Some((key.clone(), value.clone())),
            _ => None,
        })
        .collect()
}

fn triples_to_map(values: &[String]) -> BTreeMap<String, OptionMap> {
    let mut out: BTreeMap<String, OptionMap> = BTreeMap::new();
    for triple in values.chunks(3) {
        if let [component, key, value] = triple {
            out.entry(component.clone())
                .or_default()
                .insert(key.clone(), value.clone());
        }
    }
    out
}

/// Parse `COMPONENT=COUNT` arguments of `flex`.
pub fn parse_flex_counts(components: &[String]) -> Result<BTreeMap<String, i64>, CliError> {
    let mut counts = BTreeMap::new();
    for arg in components {
        let (component, count) = arg
            .split_once('=')
            .filter(|(component, _)| !component.is_empty())
            .ok_or_else(|| {
                CorralError::bad_args(format!("Expected COMPONENT=COUNT, got \"{}\"", arg))
            })?;
        let count: i64 = count.trim().parse().map_err(|_| {
            CorralError::bad_args(format!(
                "Requested number of {} instances is not a number: {}",
                component, count
            ))
        })?;
        counts.insert(component.to_string(), count);
    }
    Ok(counts)
}

/// Build freeze options from command-line values.
pub fn freeze_options(force: bool, message: String, wait_secs: u64) -> FreezeOptions {
    FreezeOptions {
        force,
        message,
        wait: Duration::from_secs(wait_secs),
    }
}

// ============================================================================
// Handler Argument Structs
// ============================================================================

/// Arguments for the build command.
pub struct BuildArgs {
    pub name: String,
    pub request: BuildRequest,
}

/// Arguments for the create command.
pub struct CreateArgs {
    pub name: String,
    pub request: BuildRequest,
    pub launch: LaunchOptions,
}

/// Arguments for the thaw command.
pub struct ThawArgs {
    pub name: String,
    pub launch: LaunchOptions,
}

/// Arguments for the freeze command.
pub struct FreezeArgs {
    pub name: String,
    pub options: FreezeOptions,
}

/// Arguments for the destroy command.
pub struct DestroyArgs {
    pub name: String,
}

/// Arguments for the exists command.
pub struct ExistsArgs {
    pub name: String,
    pub live: bool,
}

/// Arguments for the flex command.
pub struct FlexArgs {
    pub name: String,
    pub counts: BTreeMap<String, i64>,
}

/// Arguments for the list command.
pub struct ListArgs {
    pub name: Option<String>,
}

/// Arguments for the status command.
pub struct StatusArgs {
    pub name: String,
    pub out: Option<PathBuf>,
}

/// Arguments for the getconf command.
pub struct GetconfArgs {
    pub name: String,
    pub format: ConfFormat,
    pub out: Option<PathBuf>,
}

/// Arguments for the kill-container command.
pub struct KillContainerArgs {
    pub name: String,
    pub id: String,
}

/// Arguments for the am-suicide command.
pub struct AmSuicideArgs {
    pub name: String,
    pub message: String,
    pub exit_code: i32,
    pub delay_ms: u64,
}

/// Arguments for the echo command.
pub struct EchoArgs {
    pub name: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flex_counts() {
        let counts = parse_flex_counts(&strings(&["worker=5", "master=1"])).unwrap();
        assert_eq!(counts.get("worker"), Some(&5));
        assert_eq!(counts.get("master"), Some(&1));
    }

    #[test]
    fn test_parse_flex_counts_rejects_malformed() {
        for bad in ["worker", "=5", "worker=five"] {
            let err = parse_flex_counts(&strings(&[bad])).unwrap_err();
            assert_eq!(err.exit_code(), 40, "{}", bad);
        }
    }

    #[test]
    fn test_build_args_into_request() {
        let args = BuildCliArgs {
            name: "demo".into(),
            provider: Some("generic".into()),
            resources: None,
            template: None,
            confdir: None,
            image: None,
            app_home: Some("/opt/app".into()),
            component: strings(&["worker", "3", "master", "1"]),
            option: strings(&["site.fs.defaultFS", "hdfs://nn:8020"]),
            compopt: strings(&["worker", "jvm.heapsize", "256M"]),
            resopt: Vec::new(),
            rescompopt: strings(&["worker", "component.priority", "2"]),
            zkhosts: Some("zk1".into()),
            zkport: None,
            zkpath: None,
            package: None,
        };

        let (name, request) = args.into_request();
        assert_eq!(name, "demo");
        assert_eq!(request.component_counts.get("worker").map(String::as_str), Some("3"));
        assert_eq!(request.component_counts.get("master").map(String::as_str), Some("1"));
        assert_eq!(
            request.app_options.get("site.fs.defaultFS").map(String::as_str),
            Some("hdfs://nn:8020")
        );
        assert_eq!(
            request.component_options["worker"].get("jvm.heapsize").map(String::as_str),
            Some("256M")
        );
        assert_eq!(
            request.resource_component_options["worker"]
                .get("component.priority")
                .map(String::as_str),
            Some("2")
        );
        assert_eq!(request.zookeeper_hosts.as_deref(), Some("zk1"));
    }
}
