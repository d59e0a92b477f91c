//! Client configuration loaded from `~/.corral/config.ini`.
//!
//! The file is INI with one section per concern. Missing files and missing
//! keys fall back to the defaults in [`defaults`].
//!
//! # Example
//!
//! ```
//! use corral::config::ClientSettings;
//!
//! let settings = ClientSettings::default();
//! assert_eq!(settings.platform.queue, "default");
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, SettingsError};
pub use settings::{
    ClientSettings, LaunchSettings, LoggingSettings, PlatformSettings, RegistrySettings,
    RpcSettings, StoreSettings,
};
