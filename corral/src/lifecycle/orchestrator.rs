//! Instance lifecycle intents.
//!
//! Each public method of [`LifecycleOrchestrator`] is one intent. Intents that
//! change cluster or durable state check for a live instance immediately
//! before their mutating step. The check narrows the race with concurrent
//! clients but cannot close it; `destroy` re-checks afterwards and reports a
//! detected race as an in-use error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::builder::{assemble_definition, BuildRequest, InstancePaths};
use super::naming::validate_instance_name;
use super::outcome::{ConfFormat, ExistsOutcome, FlexOutcome, FreezeOutcome, LaunchOutcome};
use super::session::Session;
use crate::conf::{keys, AggregateConf, ClusterDescription};
use crate::error::{CorralError, CorralResult};
use crate::platform::{monitor_to_state, AppId, AppReport, AppState, LaunchRequest, APP_TYPE};
use crate::provider::{LaunchArtifacts, LaunchContext, DEFAULT_PROVIDER};
use crate::rpc::CoordinatorChannel;
use crate::store::copy_dir;
use crate::time::Deadline;

/// File in the generated directory holding provider site options.
pub const SITE_OPTIONS_FILE: &str = "site-options.json";

/// Reason given to the platform when a launch wait runs out.
const LAUNCH_TIMEOUT_REASON: &str = "Reached client specified timeout for application";

/// Options for launching (or thawing) an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// After acceptance, wait this long for the application to run.
    /// Zero returns as soon as the platform accepts it.
    pub wait: Duration,
    /// Start the coordinator with debugging enabled.
    pub debug: bool,
}

/// Options for freezing an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeOptions {
    /// Kill through the platform instead of asking the coordinator to stop.
    pub force: bool,
    /// Message passed to the coordinator or platform.
    pub message: String,
    /// Wait this long for the application to terminate. Zero does not wait.
    pub wait: Duration,
}

impl Default for FreezeOptions {
    fn default() -> Self {
        Self {
            force: false,
            message: "stopping".to_string(),
            wait: Duration::ZERO,
        }
    }
}

/// Executes lifecycle intents against one [`Session`].
pub struct LifecycleOrchestrator<'s> {
    session: &'s Session,
}

impl<'s> LifecycleOrchestrator<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    // =========================================================================
    // Liveness
    // =========================================================================

    /// Fail with an in-use error if any live application has this name.
    pub fn verify_no_live_instances(&self, name: &str) -> CorralResult<()> {
        let live = self.session.platform().find_live_instances(name)?;
        match live.first() {
            Some(report) => Err(CorralError::InstanceInUse {
                name: name.to_string(),
                detail: format!(
                    "Application Instance already running: {} ({})",
                    report.id, report.state
                ),
            }),
            None => Ok(()),
        }
    }

    fn connect_live(&self, name: &str) -> CorralResult<(AppReport, Box<dyn CoordinatorChannel>)> {
        validate_instance_name(name)?;
        let report = self
            .session
            .platform()
            .find_instance(name)?
            .filter(AppReport::is_live)
            .ok_or_else(|| CorralError::UnknownInstance(format!("{} is not running", name)))?;
        let channel = self.session.channels().connect(&report)?;
        Ok((report, channel))
    }

    // =========================================================================
    // Build, create, launch
    // =========================================================================

    /// Assemble, validate and persist a new instance definition.
    pub fn build(&self, name: &str, request: &BuildRequest) -> CorralResult<()> {
        validate_instance_name(name)?;
        self.verify_no_live_instances(name)?;

        let store = self.session.store();
        let provider_name = request.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);
        let chain = self.session.providers().chain(provider_name)?;
        let paths = InstancePaths {
            instance_dir: store.instance_dir(name),
            snapshot_dir: store.snapshot_dir(name),
            generated_dir: store.generated_dir(name),
            user: self.session.platform().user(),
        };
        let registry = self.session.registry();
        let definition = assemble_definition(
            name,
            &chain,
            request,
            &paths,
            registry.hosts.as_deref(),
            registry.port,
        )?;

        definition.validate()?;
        for provider in &chain {
            if let Err(e) = provider.validate_instance_definition(&definition) {
                info!(instance = name, error = %e, "Instance definition rejected");
                debug!(?definition, "Rejected definition");
                return Err(e);
            }
        }

        self.verify_no_live_instances(name)?;
        self.persist_new(name, &definition, request.conf_dir.as_deref())?;
        info!(instance = name, provider = provider_name, "Instance definition built");
        Ok(())
    }

    fn persist_new(
        &self,
        name: &str,
        definition: &AggregateConf,
        conf_dir: Option<&Path>,
    ) -> CorralResult<()> {
        let store = self.session.store();
        let dir = store.create_instance_dir(name)?;

        let result = (|| {
            let snapshot = store.snapshot_dir(name);
            match conf_dir {
                Some(src) if !src.is_dir() => {
                    return Err(CorralError::bad_config(format!(
                        "Configuration directory {} not found",
                        src.display()
                    )))
                }
                Some(src) => {
                    let copied = copy_dir(src, &snapshot)?;
                    debug!(instance = name, files = copied, "Configuration snapshot taken");
                }
                None => fs::create_dir_all(&snapshot).map_err(|e| CorralError::io(&snapshot, e))?,
            }
            let generated = store.generated_dir(name);
            fs::create_dir_all(&generated).map_err(|e| CorralError::io(&generated, e))?;

            store.save(name, definition).map_err(|e| {
                if e.is_lock_failure() {
                    warn!(dir = %dir.display(), error = %e, "Failed to get a lock");
                    CorralError::BadClusterState(format!("Failed to save {}: {}", name, e))
                } else {
                    e
                }
            })
        })();

        if result.is_err() {
            if let Err(e) = store.destroy(name) {
                warn!(instance = name, error = %e, "Failed to clean up partial instance");
            }
        }
        result
    }

    /// Build an instance and launch it.
    pub fn create(
        &self,
        name: &str,
        request: &BuildRequest,
        options: &LaunchOptions,
    ) -> CorralResult<LaunchOutcome> {
        self.build(name, request)?;
        self.launch(name, options)
    }

    /// Submit a persisted instance to the platform and wait for it to start.
    ///
    /// If a bounded wait runs out the application is force-killed once and
    /// the outcome carries no report.
    pub fn launch(&self, name: &str, options: &LaunchOptions) -> CorralResult<LaunchOutcome> {
        validate_instance_name(name)?;
        let definition = self.session.store().load(name)?;
        self.verify_no_live_instances(name)?;

        let request = self.prepare_launch(name, &definition, options.debug)?;

        self.verify_no_live_instances(name)?;
        let app_id = self.session.platform().submit(&request)?;
        info!(instance = name, app = %app_id, "Submitted application");

        self.await_launch(app_id, options.wait)
    }

    fn prepare_launch(
        &self,
        name: &str,
        definition: &AggregateConf,
        debug: bool,
    ) -> CorralResult<LaunchRequest> {
        let resolved = definition.resolved()?;
        let internal = resolved.internal()?;
        let provider_name = internal.mandatory_option(keys::INTERNAL_PROVIDER_NAME)?;
        let chain = self.session.providers().chain(provider_name)?;
        for provider in &chain {
            provider.validate_instance_definition(&resolved)?;
        }

        let snapshot_dir = PathBuf::from(internal.mandatory_option(keys::INTERNAL_SNAPSHOT_CONF_PATH)?);
        let generated_dir =
            PathBuf::from(internal.mandatory_option(keys::INTERNAL_GENERATED_CONF_PATH)?);
        fs::create_dir_all(&snapshot_dir).map_err(|e| CorralError::io(&snapshot_dir, e))?;
        copy_dir(&snapshot_dir, &generated_dir)?;

        let context = LaunchContext {
            name: name.to_string(),
            instance_dir: self.session.store().instance_dir(name),
            snapshot_dir,
            generated_dir,
            debug,
        };
        let mut artifacts = LaunchArtifacts::default();
        for provider in &chain {
            provider.prepare_launch_artifacts(&resolved, &context, &mut artifacts)?;
        }
        if !artifacts.site_options.is_empty() {
            write_site_options(&context.generated_dir, &artifacts)?;
        }

        debug!(instance = name, "Preflight validation of generated configuration");
        for provider in &chain {
            provider.preflight_validate_cluster_configuration(&resolved, &context.generated_dir)?;
        }

        let policy = self.session.launch_policy();
        debug!(command = ?artifacts.command, env = ?artifacts.env, "Coordinator launch");
        Ok(LaunchRequest {
            name: name.to_string(),
            app_type: APP_TYPE.to_string(),
            queue: policy.queue.clone(),
            priority: policy.priority,
            max_attempts: policy.restart_limit,
            keep_containers_over_restarts: true,
            memory: artifacts.memory,
            cores: artifacts.cores,
            command: artifacts.command,
            env: artifacts.env,
            resources: artifacts.resources,
        })
    }

    fn await_launch(&self, app_id: AppId, wait: Duration) -> CorralResult<LaunchOutcome> {
        let platform = self.session.platform();
        let policy = self.session.launch_policy();

        let accepted = monitor_to_state(
            platform,
            &app_id,
            AppState::Accepted,
            Deadline::after(policy.accept_timeout),
            policy.poll,
        )?;
        let Some(report) = accepted else {
            return self.kill_after_timeout(app_id, AppState::Accepted);
        };
        if report.state.is_terminal() || wait.is_zero() {
            return Ok(LaunchOutcome {
                app_id,
                report: Some(report),
                killed: false,
            });
        }

        match monitor_to_state(
            platform,
            &app_id,
            AppState::Running,
            Deadline::after(wait),
            policy.poll,
        )? {
            Some(report) => Ok(LaunchOutcome {
                app_id,
                report: Some(report),
                killed: false,
            }),
            None => self.kill_after_timeout(app_id, AppState::Running),
        }
    }

    fn kill_after_timeout(&self, app_id: AppId, awaited: AppState) -> CorralResult<LaunchOutcome> {
        warn!(app = %app_id, "Application did not reach {} in time, killing it", awaited);
        self.session.platform().kill(&app_id, LAUNCH_TIMEOUT_REASON)?;
        Ok(LaunchOutcome {
            app_id,
            report: None,
            killed: true,
        })
    }

    // =========================================================================
    // Flex, freeze, destroy
    // =========================================================================

    /// Change component instance counts.
    ///
    /// The durable definition is read, updated and saved under one write
    /// lock. If that lock cannot be taken, the current definition is read
    /// without it, the save is skipped with a warning and the live push still
    /// happens. A live coordinator decides whether anything changed; without
    /// one, the change is judged against the durable counts.
    pub fn flex(&self, name: &str, counts: &BTreeMap<String, i64>) -> CorralResult<FlexOutcome> {
        validate_instance_name(name)?;
        if let Some((component, count)) = counts.iter().find(|(_, count)| **count < 0) {
            return Err(CorralError::bad_args(format!(
                "Requested number of {} instances is out of range: {}",
                component, count
            )));
        }

        let store = self.session.store();
        let lock = match store.lock_for_update(name) {
            Ok(lock) => Some(lock),
            Err(e) if e.is_lock_failure() => {
                warn!(
                    instance = name,
                    error = %e,
                    "Instance definition is locked; new size will not be saved"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let mut definition = store.read_unlocked(name)?;
        let mut changed = false;
        {
            let resources = definition.resources_mut();
            for (component, count) in counts {
                let options = resources.get_or_add_component(component);
                let requested = count.to_string();
                if options.get(keys::COMPONENT_INSTANCES) != Some(&requested) {
                    changed = true;
                }
                options.insert(keys::COMPONENT_INSTANCES.to_string(), requested);
                debug!(instance = name, component = component.as_str(), count, "Flexed component");
            }
        }

        let saved = match &lock {
            Some(lock) => {
                store.save_locked(name, &definition, lock)?;
                true
            }
            None => false,
        };
        drop(lock);

        let live = self
            .session
            .platform()
            .find_instance(name)?
            .filter(AppReport::is_live);
        let Some(report) = live else {
            info!(instance = name, "No running instance to update");
            return Ok(FlexOutcome {
                changed,
                pushed_live: false,
                saved,
            });
        };

        info!(instance = name, app = %report.id, "Flexing running instance");
        let channel = self.session.channels().connect(&report)?;
        let changed = channel.flex(definition.resources()?)?;
        if changed {
            info!(instance = name, "Instance size updated");
        } else {
            info!(instance = name, "Requested size is the same as current size: no change");
        }
        Ok(FlexOutcome {
            changed,
            pushed_live: true,
            saved,
        })
    }

    /// Stop a running instance, keeping its definition.
    ///
    /// Nothing remote is contacted unless a live application is found.
    pub fn freeze(&self, name: &str, options: &FreezeOptions) -> CorralResult<FreezeOutcome> {
        validate_instance_name(name)?;
        let platform = self.session.platform();

        let Some(report) = platform.find_instance(name)? else {
            info!(instance = name, "Instance not running");
            return Ok(FreezeOutcome::NotRunning);
        };
        if report.state.is_terminal() {
            info!(instance = name, state = %report.state, "Instance already terminated");
            return Ok(FreezeOutcome::AlreadyTerminated(report.state));
        }

        let app_id = report.id.clone();
        if options.force {
            platform.kill(
                &app_id,
                &format!("Forced freeze of {}: {}", name, options.message),
            )?;
        } else {
            let stopped = self
                .session
                .channels()
                .connect(&report)
                .and_then(|channel| channel.stop_cluster(&options.message));
            if let Err(e) = stopped {
                warn!(instance = name, error = %e, "Failed to stop instance");
                return Ok(FreezeOutcome::StopFailed {
                    app_id,
                    reason: e.to_string(),
                });
            }
            debug!(instance = name, "Stop command issued");
        }

        if !options.wait.is_zero() {
            match monitor_to_state(
                platform,
                &app_id,
                AppState::Finished,
                Deadline::after(options.wait),
                self.session.launch_policy().poll,
            ) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!(instance = name, "Application did not shut down in time");
                    return Ok(FreezeOutcome::WaitTimedOut(app_id));
                }
                Err(e) => {
                    warn!(instance = name, error = %e, "Error waiting for shutdown");
                }
            }
        }
        Ok(FreezeOutcome::Stopped(app_id))
    }

    /// Delete an instance definition.
    ///
    /// Returns whether a definition existed. Fails with an in-use error if a
    /// live instance appears after the deletion.
    pub fn destroy(&self, name: &str) -> CorralResult<bool> {
        validate_instance_name(name)?;
        self.verify_no_live_instances(name)?;

        let store = self.session.store();
        let existed = store.destroy(name)?;
        if existed {
            info!(instance = name, dir = %store.instance_dir(name).display(), "Destroying instance");
        } else {
            info!(instance = name, "Instance already destroyed");
        }

        let live = self.session.platform().find_live_instances(name)?;
        if let Some(report) = live.first() {
            return Err(CorralError::InstanceInUse {
                name: name.to_string(),
                detail: format!(
                    "Destroy raced with a create, instance now live: {} ({})",
                    report.id, report.state
                ),
            });
        }
        info!(instance = name, "Destroyed instance");
        Ok(existed)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check for a durable definition and, optionally, a live application.
    pub fn exists(&self, name: &str, live: bool) -> CorralResult<ExistsOutcome> {
        validate_instance_name(name)?;
        if !self.session.store().exists(name) {
            return Err(CorralError::UnknownInstance(name.to_string()));
        }
        if !live {
            info!(instance = name, "Instance is defined");
            return Ok(ExistsOutcome::Defined);
        }

        match self.session.platform().find_instance(name)? {
            None => {
                info!(instance = name, "Instance not running");
                Ok(ExistsOutcome::NotLive(None))
            }
            Some(report) if report.state.is_terminal() => {
                info!(instance = name, state = %report.state, "Instance found but not running");
                Ok(ExistsOutcome::NotLive(Some(report.state)))
            }
            Some(report) => {
                info!(instance = name, app = %report.id, "Instance is running");
                Ok(ExistsOutcome::Live(report))
            }
        }
    }

    /// Applications of this type, or the latest one with the given name.
    pub fn list(&self, name: Option<&str>) -> CorralResult<Vec<AppReport>> {
        let platform = self.session.platform();
        match name.filter(|n| !n.is_empty()) {
            None => {
                let reports = platform.list_instances(APP_TYPE)?;
                info!(user = %platform.user(), count = reports.len(), "Listed instances");
                Ok(reports)
            }
            Some(name) => {
                validate_instance_name(name)?;
                platform
                    .find_instance(name)?
                    .map(|report| vec![report])
                    .ok_or_else(|| CorralError::UnknownInstance(name.to_string()))
            }
        }
    }

    /// The persisted definition of an instance.
    pub fn instance_definition(&self, name: &str) -> CorralResult<AggregateConf> {
        validate_instance_name(name)?;
        self.session.store().load(name)
    }

    /// Live status of a running instance.
    pub fn status(&self, name: &str) -> CorralResult<ClusterDescription> {
        let (_, channel) = self.connect_live(name)?;
        channel.get_cluster_description()
    }

    /// Client configuration of a running instance in the requested format.
    pub fn getconf(&self, name: &str, format: ConfFormat) -> CorralResult<String> {
        let description = self.status(name)?;
        Ok(format.render(&description))
    }

    // =========================================================================
    // Coordinator control
    // =========================================================================

    /// Kill one container of a running instance.
    pub fn kill_container(&self, name: &str, id: &str) -> CorralResult<()> {
        if id.trim().is_empty() {
            return Err(CorralError::bad_args("Missing container id"));
        }
        info!(instance = name, container = id, "Killing container");
        let (_, channel) = self.connect_live(name)?;
        channel.kill_container(id).map_err(|e| match e {
            CorralError::NoSuchNode(_) => CorralError::BadClusterState(format!(
                "Container {} not found in instance {}",
                id, name
            )),
            other => other,
        })
    }

    /// Ask the coordinator to exit with `exit_code` after `delay_ms`.
    pub fn am_suicide(
        &self,
        name: &str,
        message: &str,
        exit_code: i32,
        delay_ms: u64,
    ) -> CorralResult<()> {
        let (_, channel) = self.connect_live(name)?;
        channel.am_suicide(message, exit_code, delay_ms)
    }

    /// Round-trip text through the coordinator.
    pub fn echo(&self, name: &str, text: &str) -> CorralResult<String> {
        let (_, channel) = self.connect_live(name)?;
        channel.echo(text)
    }
}

fn write_site_options(dir: &Path, artifacts: &LaunchArtifacts) -> CorralResult<()> {
    let path = dir.join(SITE_OPTIONS_FILE);
    let json = serde_json::to_string_pretty(&artifacts.site_options)
        .map_err(|e| CorralError::Internal(format!("site options: {}", e)))?;
    fs::write(&path, json).map_err(|e| CorralError::io(&path, e))
}
