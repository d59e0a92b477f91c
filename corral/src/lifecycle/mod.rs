//! Instance lifecycle orchestration.
//!
//! A [`Session`] bundles the store, platform, coordinator channels and
//! providers for one invocation; a [`LifecycleOrchestrator`] runs intents
//! against it.
//!
//! ```ignore
//! use corral::config::ClientSettings;
//! use corral::lifecycle::{FreezeOptions, LifecycleOrchestrator, Session};
//!
//! let session = Session::connect(&ClientSettings::load()?)?;
//! let outcome = LifecycleOrchestrator::new(&session).freeze("demo", &FreezeOptions::default())?;
//! std::process::exit(outcome.exit_code());
//! ```

mod builder;
mod naming;
mod orchestrator;
mod outcome;
mod session;

pub use builder::BuildRequest;
pub use naming::{default_registry_path, default_zookeeper_path, validate_instance_name};
pub use orchestrator::{FreezeOptions, LaunchOptions, LifecycleOrchestrator, SITE_OPTIONS_FILE};
pub use outcome::{ConfFormat, ExistsOutcome, FlexOutcome, FreezeOutcome, LaunchOutcome};
pub use session::{LaunchPolicy, RegistryBinding, Session};
