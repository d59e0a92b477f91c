//! Integration tests for the instance lifecycle.
//!
//! These tests drive the orchestrator through in-memory platform and
//! coordinator fakes, covering:
//! - Building, racing and persisting instance definitions
//! - Launch monitoring, timeouts and the kill that follows them
//! - Flexing durable and live instances
//! - Freezing and destroying
//! - Status queries and coordinator control

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use corral::conf::{keys, AggregateConf, ClusterDescription, ConfTree};
use corral::error::exit_codes::*;
use corral::error::{CorralError, CorralResult};
use corral::lifecycle::{
    BuildRequest, ConfFormat, ExistsOutcome, FreezeOptions, FreezeOutcome, LaunchOptions,
    LaunchPolicy, LifecycleOrchestrator, RegistryBinding, Session,
};
use corral::platform::{
    AppId, AppReport, AppState, FinalStatus, LaunchRequest, Platform, PollPolicy, APP_TYPE,
};
use corral::provider::{ProviderRegistry, ResourceLimits, GENERIC_PROVIDER};
use corral::rpc::{ChannelFactory, ClusterNode, CoordinatorChannel};
use corral::store::InstanceStore;
use tempfile::TempDir;

// =============================================================================
// Fake platform
// =============================================================================

#[derive(Default)]
struct PlatformState {
    apps: Vec<AppReport>,
    list_calls: usize,
    /// Make an application of this name live once `list_calls` exceeds the count.
    inject_live: Option<(usize, String)>,
    /// State newly submitted applications report.
    submitted_state: Option<AppState>,
    submissions: Vec<LaunchRequest>,
    kills: Vec<(AppId, String)>,
    report_calls: usize,
}

#[derive(Default)]
struct FakePlatform {
    state: Mutex<PlatformState>,
}

fn app(id: &str, name: &str, state: AppState, start_time: i64) -> AppReport {
    AppReport {
        id: AppId::new(id),
        name: name.to_string(),
        app_type: APP_TYPE.to_string(),
        user: "alice".to_string(),
        queue: "default".to_string(),
        state,
        final_status: FinalStatus::Undefined,
        diagnostics: String::new(),
        rpc_address: Some(format!("http://{}:4500", id)),
        tracking_url: None,
        start_time,
        finish_time: 0,
    }
}

impl FakePlatform {
    fn with_app(self, report: AppReport) -> Self {
        self.state.lock().unwrap().apps.push(report);
        self
    }

    fn submitted_state(self, state: AppState) -> Self {
        self.state.lock().unwrap().submitted_state = Some(state);
        self
    }

    fn inject_live_after(&self, list_calls: usize, name: &str) {
        self.state.lock().unwrap().inject_live = Some((list_calls, name.to_string()));
    }

    fn kills(&self) -> Vec<(AppId, String)> {
        self.state.lock().unwrap().kills.clone()
    }

    fn submissions(&self) -> Vec<LaunchRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    fn report_calls(&self) -> usize {
        self.state.lock().unwrap().report_calls
    }
}

impl Platform for FakePlatform {
    fn user(&self) -> String {
        "alice".to_string()
    }

    fn list_instances(&self, app_type: &str) -> CorralResult<Vec<AppReport>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if let Some((after, name)) = state.inject_live.clone() {
            if state.list_calls > after {
                state.inject_live = None;
                state.apps.push(app("application_raced", &name, AppState::Running, 99));
            }
        }
        Ok(state
            .apps
            .iter()
            .filter(|r| r.app_type == app_type)
            .cloned()
            .collect())
    }

    fn report(&self, id: &AppId) -> CorralResult<Option<AppReport>> {
        let mut state = self.state.lock().unwrap();
        state.report_calls += 1;
        Ok(state.apps.iter().find(|r| &r.id == id).cloned())
    }

    fn submit(&self, request: &LaunchRequest) -> CorralResult<AppId> {
        let mut state = self.state.lock().unwrap();
        let id = format!("application_{}", state.submissions.len() + 1);
        let submitted = state.submitted_state.unwrap_or(AppState::Running);
        state.submissions.push(request.clone());
        state.apps.push(app(&id, &request.name, submitted, 10));
        Ok(AppId::new(id))
    }

    fn kill(&self, id: &AppId, reason: &str) -> CorralResult<()> {
        let mut state = self.state.lock().unwrap();
        state.kills.push((id.clone(), reason.to_string()));
        if let Some(report) = state.apps.iter_mut().find(|r| &r.id == id) {
            report.state = AppState::Killed;
            report.final_status = FinalStatus::Killed;
        }
        Ok(())
    }
}

// =============================================================================
// Fake coordinator
// =============================================================================

#[derive(Default)]
struct CoordinatorState {
    sizes: BTreeMap<String, i64>,
    containers: BTreeSet<String>,
    stops: Vec<String>,
    suicides: Vec<(String, i32, u64)>,
    description: ClusterDescription,
    fail_stop: bool,
}

#[derive(Default)]
struct FakeChannels {
    connects: AtomicUsize,
    state: Arc<Mutex<CoordinatorState>>,
}

impl FakeChannels {
    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ChannelFactory for FakeChannels {
    fn connect(&self, _report: &AppReport) -> CorralResult<Box<dyn CoordinatorChannel>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeChannel {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeChannel {
    state: Arc<Mutex<CoordinatorState>>,
}

impl CoordinatorChannel for FakeChannel {
    fn stop_cluster(&self, message: &str) -> CorralResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_stop {
            return Err(CorralError::Rpc("connection refused".into()));
        }
        state.stops.push(message.to_string());
        Ok(())
    }

    fn flex(&self, resources: &ConfTree) -> CorralResult<bool> {
        let mut state = self.state.lock().unwrap();
        let mut changed = false;
        for name in resources.component_names() {
            let count = resources.component_opt_int(&name, keys::COMPONENT_INSTANCES, 0)?;
            if state.sizes.insert(name, count) != Some(count) {
                changed = true;
            }
        }
        Ok(changed)
    }

    fn get_cluster_description(&self) -> CorralResult<ClusterDescription> {
        Ok(self.state.lock().unwrap().description.clone())
    }

    fn get_instance_definition(&self) -> CorralResult<AggregateConf> {
        Ok(AggregateConf::new("live"))
    }

    fn list_nodes(&self, _role: &str) -> CorralResult<Vec<String>> {
        Ok(self.state.lock().unwrap().containers.iter().cloned().collect())
    }

    fn get_node(&self, id: &str) -> CorralResult<ClusterNode> {
        Ok(ClusterNode {
            name: id.to_string(),
            ..Default::default()
        })
    }

    fn kill_container(&self, id: &str) -> CorralResult<()> {
        if self.state.lock().unwrap().containers.remove(id) {
            Ok(())
        } else {
            Err(CorralError::NoSuchNode(id.to_string()))
        }
    }

    fn am_suicide(&self, message: &str, exit_code: i32, delay_ms: u64) -> CorralResult<()> {
        self.state
            .lock()
            .unwrap()
            .suicides
            .push((message.to_string(), exit_code, delay_ms));
        Ok(())
    }

    fn echo(&self, text: &str) -> CorralResult<String> {
        Ok(text.to_string())
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

struct Harness {
    _dir: TempDir,
    app_home: PathBuf,
    platform: Arc<FakePlatform>,
    channels: Arc<FakeChannels>,
    session: Session,
}

impl Harness {
    fn new(platform: FakePlatform) -> Self {
        let dir = TempDir::new().unwrap();
        let app_home = dir.path().join("app");
        std::fs::create_dir_all(app_home.join("bin")).unwrap();

        let platform = Arc::new(platform);
        let channels = Arc::new(FakeChannels::default());
        let store =
            InstanceStore::new(dir.path().join("instances")).with_lock_timeout(Duration::from_millis(200));
        let session = Session::new(
            store,
            platform.clone(),
            channels.clone(),
            ProviderRegistry::with_defaults(ResourceLimits::default()),
        )
        .with_launch_policy(LaunchPolicy {
            accept_timeout: Duration::from_millis(100),
            poll: PollPolicy {
                initial: Duration::from_millis(5),
                max: Duration::from_millis(20),
            },
            ..LaunchPolicy::default()
        })
        .with_registry(RegistryBinding {
            hosts: Some("zk1,zk2".into()),
            port: Some(2181),
        });

        Self {
            _dir: dir,
            app_home,
            platform,
            channels,
            session,
        }
    }

    fn orchestrator(&self) -> LifecycleOrchestrator<'_> {
        LifecycleOrchestrator::new(&self.session)
    }

    fn request(&self) -> BuildRequest {
        let mut request = BuildRequest {
            provider: Some(GENERIC_PROVIDER.to_string()),
            app_home: Some(self.app_home.display().to_string()),
            ..Default::default()
        };
        request.component_counts.insert("worker".into(), "3".into());
        request
    }

    fn store(&self) -> &InstanceStore {
        self.session.store()
    }

    fn worker_count(&self, name: &str) -> String {
        let definition = self.store().load(name).unwrap();
        definition
            .resources()
            .unwrap()
            .component_opt("worker", keys::COMPONENT_INSTANCES, "")
            .to_string()
    }
}

fn no_wait() -> LaunchOptions {
    LaunchOptions::default()
}

// =============================================================================
// Build
// =============================================================================

#[test]
fn test_build_persists_definition() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let dir = h.store().instance_dir("demo");
    for file in ["internal.json", "resources.json", "app_conf.json"] {
        assert!(dir.join(file).is_file(), "missing {}", file);
    }
    assert!(h.store().snapshot_dir("demo").is_dir());
    assert_eq!(h.worker_count("demo"), "3");

    let definition = h.store().load("demo").unwrap();
    let internal = definition.internal().unwrap();
    assert_eq!(internal.get(keys::INTERNAL_PROVIDER_NAME), Some(GENERIC_PROVIDER));
    assert_eq!(
        definition.app_conf().unwrap().get(keys::ZOOKEEPER_HOSTS),
        Some("zk1,zk2")
    );
}

#[test]
fn test_build_copies_configuration_directory() {
    let h = Harness::new(FakePlatform::default());
    let conf = h.app_home.join("conf");
    std::fs::create_dir_all(conf.join("nested")).unwrap();
    std::fs::write(conf.join("log4j.properties"), "root=INFO").unwrap();
    std::fs::write(conf.join("nested").join("site.xml"), "<configuration/>").unwrap();

    let mut request = h.request();
    request.conf_dir = Some(conf);
    h.orchestrator().build("demo", &request).unwrap();

    let snapshot = h.store().snapshot_dir("demo");
    assert!(snapshot.join("log4j.properties").is_file());
    assert!(snapshot.join("nested").join("site.xml").is_file());
}

#[test]
fn test_build_rejects_existing_definition() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let mut request = h.request();
    request.component_counts.insert("worker".into(), "7".into());
    let err = h.orchestrator().build("demo", &request).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_INSTANCE_EXISTS);
    assert_eq!(h.worker_count("demo"), "3");
}

#[test]
fn test_build_rejects_live_instance() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_7", "demo", AppState::Running, 1)));
    let err = h.orchestrator().build("demo", &h.request()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
    assert!(!h.store().exists("demo"));
}

#[test]
fn test_build_race_with_live_instance_is_in_use() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    // The first build made two liveness checks; the second build's first
    // check passes and its second sees the injected live instance.
    h.platform.inject_live_after(3, "demo");
    let mut request = h.request();
    request.component_counts.insert("worker".into(), "9".into());
    let err = h.orchestrator().build("demo", &request).unwrap_err();

    assert!(matches!(err, CorralError::InstanceInUse { .. }));
    assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
    assert_eq!(h.worker_count("demo"), "3");
}

#[test]
fn test_build_duplicate_priorities_rejected() {
    let h = Harness::new(FakePlatform::default());
    let mut request = h.request();
    request.component_counts.insert("master".into(), "1".into());
    for (component, priority) in [("master", "5"), ("worker", "5")] {
        request
            .resource_component_options
            .entry(component.to_string())
            .or_default()
            .insert(keys::COMPONENT_PRIORITY.to_string(), priority.to_string());
    }

    let err = h.orchestrator().build("demo", &request).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_BAD_CONFIGURATION);
    let text = err.to_string();
    assert!(text.contains("master") && text.contains("worker"));
    assert!(!h.store().exists("demo"));

    request
        .resource_component_options
        .get_mut("worker")
        .unwrap()
        .insert(keys::COMPONENT_PRIORITY.to_string(), "6".to_string());
    h.orchestrator().build("demo", &request).unwrap();
}

#[test]
fn test_build_rejects_bad_name() {
    let h = Harness::new(FakePlatform::default());
    let err = h.orchestrator().build("Bad Name", &h.request()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_COMMAND_ARGUMENT_ERROR);
}

#[test]
fn test_build_unknown_provider() {
    let h = Harness::new(FakePlatform::default());
    let mut request = h.request();
    request.provider = Some("hbase".into());
    let err = h.orchestrator().build("demo", &request).unwrap_err();
    assert!(err.to_string().contains("hbase"));
}

#[test]
fn test_launch_of_write_locked_definition_fails() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    let lock = h.store().instance_dir("demo").join("writelock");
    std::fs::write(&lock, "pid=1").unwrap();

    let err = h.orchestrator().launch("demo", &no_wait()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_BAD_STATE);
    assert!(err.to_string().contains("locked for reading"));
    assert!(h.platform.submissions().is_empty());

    std::fs::remove_file(&lock).unwrap();
    h.orchestrator().launch("demo", &no_wait()).unwrap();
}

// =============================================================================
// Launch
// =============================================================================

#[test]
fn test_create_launches_and_waits_for_running() {
    let h = Harness::new(FakePlatform::default());
    let options = LaunchOptions {
        wait: Duration::from_millis(200),
        debug: true,
    };
    let outcome = h.orchestrator().create("demo", &h.request(), &options).unwrap();

    assert!(outcome.is_running());
    assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
    assert!(!outcome.killed);

    let submissions = h.platform.submissions();
    assert_eq!(submissions.len(), 1);
    let request = &submissions[0];
    assert_eq!(request.name, "demo");
    assert_eq!(request.app_type, APP_TYPE);
    assert_eq!(request.memory, 1024);
    assert!(request.command.iter().any(|arg| arg == "--debug"));
    assert!(request.env.contains_key("CORRAL_LAUNCH_SCRIPT"));
    assert!(h.store().generated_dir("demo").is_dir());
}

#[test]
fn test_launch_accept_timeout_kills_exactly_once() {
    let h = Harness::new(FakePlatform::default().submitted_state(AppState::Submitted));
    h.orchestrator().build("demo", &h.request()).unwrap();

    let outcome = h.orchestrator().launch("demo", &no_wait()).unwrap();

    assert!(outcome.report.is_none());
    assert!(outcome.killed);
    assert_eq!(outcome.exit_code(), EXIT_TIMED_OUT);
    let kills = h.platform.kills();
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].0, outcome.app_id);
    assert!(h.platform.report_calls() >= 1);
}

#[test]
fn test_launch_running_timeout_kills_once() {
    let h = Harness::new(FakePlatform::default().submitted_state(AppState::Accepted));
    h.orchestrator().build("demo", &h.request()).unwrap();

    let options = LaunchOptions {
        wait: Duration::from_millis(50),
        debug: false,
    };
    let outcome = h.orchestrator().launch("demo", &options).unwrap();
    assert_eq!(outcome.exit_code(), EXIT_TIMED_OUT);
    assert_eq!(h.platform.kills().len(), 1);
}

#[test]
fn test_launch_accepted_without_wait_succeeds() {
    let h = Harness::new(FakePlatform::default().submitted_state(AppState::Accepted));
    h.orchestrator().build("demo", &h.request()).unwrap();

    let outcome = h.orchestrator().launch("demo", &no_wait()).unwrap();
    assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
    assert!(h.platform.kills().is_empty());
}

#[test]
fn test_launch_failed_application_maps_exit_code() {
    let h = Harness::new(FakePlatform::default().submitted_state(AppState::Failed));
    h.orchestrator().build("demo", &h.request()).unwrap();

    let outcome = h.orchestrator().launch("demo", &no_wait()).unwrap();
    assert_eq!(outcome.exit_code(), EXIT_SERVICE_FAILED);
    assert!(h.platform.kills().is_empty());
}

#[test]
fn test_launch_unknown_instance() {
    let h = Harness::new(FakePlatform::default());
    let err = h.orchestrator().launch("ghost", &no_wait()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_UNKNOWN_INSTANCE);
    assert!(h.platform.submissions().is_empty());
}

#[test]
fn test_launch_refuses_live_instance() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    h.orchestrator().launch("demo", &no_wait()).unwrap();

    let err = h.orchestrator().launch("demo", &no_wait()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
    assert_eq!(h.platform.submissions().len(), 1);
}

#[test]
fn test_launch_revalidates_hand_edited_definition() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let resources = h.store().instance_dir("demo").join("resources.json");
    std::fs::write(
        &resources,
        r#"{"components": {
            "master": {"component.instances": "1", "component.priority": "1"},
            "worker": {"component.instances": "2", "component.priority": "1"}
        }}"#,
    )
    .unwrap();

    let err = h.orchestrator().launch("demo", &no_wait()).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_BAD_CONFIGURATION);
    assert!(err.to_string().contains("worker"));
    assert!(h.platform.submissions().is_empty());
}

#[test]
fn test_launch_checks_application_home() {
    let h = Harness::new(FakePlatform::default());
    let mut request = h.request();
    request.app_home = Some("/nonexistent/corral/home".into());
    h.orchestrator().build("demo", &request).unwrap();

    let err = h.orchestrator().launch("demo", &no_wait()).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/corral/home"));
    assert!(h.platform.submissions().is_empty());
}

// =============================================================================
// Flex
// =============================================================================

#[test]
fn test_flex_live_reports_change_once() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().create("demo", &h.request(), &no_wait()).unwrap();
    h.channels
        .state
        .lock()
        .unwrap()
        .sizes
        .insert("worker".into(), 3);

    let counts = BTreeMap::from([("worker".to_string(), 5)]);
    let first = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(first.changed);
    assert!(first.pushed_live);
    assert_eq!(first.exit_code(), EXIT_SUCCESS);

    let second = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(!second.changed);
    assert_eq!(second.exit_code(), EXIT_FALSE);
    assert_eq!(h.worker_count("demo"), "5");
}

#[test]
fn test_flex_durable_only() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let counts = BTreeMap::from([("worker".to_string(), 5)]);
    let first = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(first.changed);
    assert!(first.saved);
    assert!(!first.pushed_live);

    let second = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(!second.changed);
    assert_eq!(h.channels.connects(), 0);
}

#[test]
fn test_flex_pushes_live_when_definition_is_locked() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().create("demo", &h.request(), &no_wait()).unwrap();
    let lock = h.store().instance_dir("demo").join("writelock");
    std::fs::write(&lock, "pid=1").unwrap();

    let counts = BTreeMap::from([("worker".to_string(), 5)]);
    let outcome = h.orchestrator().flex("demo", &counts).unwrap();

    assert!(outcome.changed);
    assert!(outcome.pushed_live);
    assert!(!outcome.saved);
    assert_eq!(h.channels.connects(), 1);
    assert_eq!(h.channels.state.lock().unwrap().sizes.get("worker"), Some(&5));

    std::fs::remove_file(&lock).unwrap();
    assert_eq!(h.worker_count("demo"), "3");
}

#[test]
fn test_flex_holds_write_lock_across_update() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    let read_lock = h.store().instance_dir("demo").join("readlock");
    std::fs::write(&read_lock, "pid=1").unwrap();

    let counts = BTreeMap::from([("worker".to_string(), 5)]);
    let outcome = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(outcome.changed);
    assert!(!outcome.saved);

    std::fs::remove_file(&read_lock).unwrap();
    let outcome = h.orchestrator().flex("demo", &counts).unwrap();
    assert!(outcome.saved);
    assert_eq!(h.worker_count("demo"), "5");
    assert!(!h.store().instance_dir("demo").join("writelock").exists());
}

#[test]
fn test_flex_negative_count_rejected() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let counts = BTreeMap::from([("worker".to_string(), -1)]);
    let err = h.orchestrator().flex("demo", &counts).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_COMMAND_ARGUMENT_ERROR);
    assert_eq!(h.worker_count("demo"), "3");
}

// =============================================================================
// Freeze
// =============================================================================

#[test]
fn test_freeze_without_live_instance_contacts_nothing() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();

    let outcome = h
        .orchestrator()
        .freeze("demo", &FreezeOptions::default())
        .unwrap();
    assert_eq!(outcome, FreezeOutcome::NotRunning);
    assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
    assert_eq!(h.channels.connects(), 0);
    assert!(h.platform.kills().is_empty());
}

#[test]
fn test_freeze_terminated_instance_is_noop() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Finished, 1)));
    let outcome = h
        .orchestrator()
        .freeze("demo", &FreezeOptions::default())
        .unwrap();
    assert_eq!(outcome, FreezeOutcome::AlreadyTerminated(AppState::Finished));
    assert_eq!(h.channels.connects(), 0);
}

#[test]
fn test_freeze_sends_stop() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    let options = FreezeOptions {
        message: "maintenance".into(),
        ..Default::default()
    };
    let outcome = h.orchestrator().freeze("demo", &options).unwrap();
    assert_eq!(outcome, FreezeOutcome::Stopped(AppId::new("application_3")));
    assert_eq!(h.channels.state.lock().unwrap().stops, vec!["maintenance"]);
}

#[test]
fn test_freeze_force_kills() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    let options = FreezeOptions {
        force: true,
        wait: Duration::from_millis(100),
        ..Default::default()
    };
    let outcome = h.orchestrator().freeze("demo", &options).unwrap();
    assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
    let kills = h.platform.kills();
    assert_eq!(kills.len(), 1);
    assert!(kills[0].1.contains("Forced freeze of demo"));
    assert_eq!(h.channels.connects(), 0);
}

#[test]
fn test_freeze_stop_failure_reported() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    h.channels.state.lock().unwrap().fail_stop = true;

    let outcome = h
        .orchestrator()
        .freeze("demo", &FreezeOptions::default())
        .unwrap();
    assert!(matches!(outcome, FreezeOutcome::StopFailed { .. }));
    assert_eq!(outcome.exit_code(), EXIT_FALSE);
    assert!(h.platform.kills().is_empty());
}

#[test]
fn test_freeze_wait_timeout_reported() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    let options = FreezeOptions {
        wait: Duration::from_millis(30),
        ..Default::default()
    };
    let outcome = h.orchestrator().freeze("demo", &options).unwrap();
    assert_eq!(outcome, FreezeOutcome::WaitTimedOut(AppId::new("application_3")));
    assert_eq!(outcome.exit_code(), EXIT_FALSE);
}

// =============================================================================
// Destroy
// =============================================================================

#[test]
fn test_destroy_absent_instance_succeeds() {
    let h = Harness::new(FakePlatform::default());
    assert!(!h.orchestrator().destroy("ghost").unwrap());
}

#[test]
fn test_destroy_removes_definition() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    assert!(h.orchestrator().destroy("demo").unwrap());
    assert!(!h.store().exists("demo"));
    assert!(!h.orchestrator().destroy("demo").unwrap());
}

#[test]
fn test_destroy_refuses_live_instance() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    let err = h.orchestrator().destroy("demo").unwrap_err();
    assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
}

#[test]
fn test_destroy_detects_create_race() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    h.platform.inject_live_after(3, "demo");

    let err = h.orchestrator().destroy("demo").unwrap_err();
    assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
    assert!(err.to_string().contains("raced"));
    assert!(!h.store().exists("demo"));
}

// =============================================================================
// Queries and coordinator control
// =============================================================================

#[test]
fn test_exists() {
    let h = Harness::new(FakePlatform::default());
    let err = h.orchestrator().exists("demo", false).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_UNKNOWN_INSTANCE);

    h.orchestrator().build("demo", &h.request()).unwrap();
    assert_eq!(h.orchestrator().exists("demo", false).unwrap(), ExistsOutcome::Defined);
    assert_eq!(
        h.orchestrator().exists("demo", true).unwrap(),
        ExistsOutcome::NotLive(None)
    );

    h.orchestrator().launch("demo", &no_wait()).unwrap();
    let live = h.orchestrator().exists("demo", true).unwrap();
    assert!(matches!(live, ExistsOutcome::Live(_)));
    assert_eq!(live.exit_code(), EXIT_SUCCESS);
}

#[test]
fn test_list() {
    let h = Harness::new(
        FakePlatform::default()
            .with_app(app("application_1", "alpha", AppState::Finished, 1))
            .with_app(app("application_2", "alpha", AppState::Running, 2))
            .with_app(app("application_3", "beta", AppState::Running, 3)),
    );
    assert_eq!(h.orchestrator().list(None).unwrap().len(), 3);

    let alpha = h.orchestrator().list(Some("alpha")).unwrap();
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0].id, AppId::new("application_2"));

    let err = h.orchestrator().list(Some("gamma")).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_UNKNOWN_INSTANCE);
}

#[test]
fn test_status_and_getconf() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    {
        let mut state = h.channels.state.lock().unwrap();
        state.description.name = "demo".into();
        state
            .description
            .client_properties
            .insert("fs.defaultFS".into(), "hdfs://nn:8020".into());
    }

    let status = h.orchestrator().status("demo").unwrap();
    assert_eq!(status.name, "demo");

    let xml = h.orchestrator().getconf("demo", ConfFormat::Xml).unwrap();
    assert!(xml.contains("<name>fs.defaultFS</name>"));
    let text = h.orchestrator().getconf("demo", ConfFormat::Properties).unwrap();
    assert!(text.contains("fs.defaultFS"));
}

#[test]
fn test_status_of_stopped_instance_is_unknown() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Killed, 1)));
    let err = h.orchestrator().status("demo").unwrap_err();
    assert_eq!(err.exit_code(), EXIT_UNKNOWN_INSTANCE);
    assert_eq!(h.channels.connects(), 0);
}

#[test]
fn test_kill_container() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    h.channels
        .state
        .lock()
        .unwrap()
        .containers
        .insert("container_01".into());

    h.orchestrator().kill_container("demo", "container_01").unwrap();

    let err = h.orchestrator().kill_container("demo", "container_01").unwrap_err();
    assert_eq!(err.exit_code(), EXIT_BAD_STATE);
    assert!(err.to_string().contains("container_01"));

    let err = h.orchestrator().kill_container("demo", " ").unwrap_err();
    assert_eq!(err.exit_code(), EXIT_COMMAND_ARGUMENT_ERROR);
}

#[test]
fn test_am_suicide_and_echo() {
    let h = Harness::new(FakePlatform::default().with_app(app("application_3", "demo", AppState::Running, 1)));
    h.orchestrator().am_suicide("demo", "bye", 3, 500).unwrap();
    assert_eq!(
        h.channels.state.lock().unwrap().suicides,
        vec![("bye".to_string(), 3, 500)]
    );
    assert_eq!(h.orchestrator().echo("demo", "ping").unwrap(), "ping");
}

#[test]
fn test_instance_definition_round_trip() {
    let h = Harness::new(FakePlatform::default());
    h.orchestrator().build("demo", &h.request()).unwrap();
    let definition = h.orchestrator().instance_definition("demo").unwrap();
    assert_eq!(definition.name.as_deref(), Some("demo"));
    assert!(definition.is_complete());
    assert!(Path::new(
        definition
            .internal()
            .unwrap()
            .get(keys::INTERNAL_SNAPSHOT_CONF_PATH)
            .unwrap()
    )
    .is_dir());
}
