//! Instance names and the paths derived from them.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CorralError, CorralResult};
use crate::platform::APP_TYPE;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid name pattern"))
}

/// Check an instance name: a lowercase ASCII letter followed by lowercase
/// letters, digits, `-` or `_`.
pub fn validate_instance_name(name: &str) -> CorralResult<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(CorralError::bad_args(format!(
            "Illegal application instance name \"{}\": names must start with a lowercase \
             letter and contain only lowercase letters, digits, '-' and '_'",
            name
        )))
    }
}

/// Default ZooKeeper root for an instance.
pub fn default_zookeeper_path(user: &str, name: &str) -> String {
    format!("/yarnapps_{}_{}_{}", APP_TYPE, user, name)
}

/// Service registry path for an instance.
pub fn default_registry_path(user: &str, name: &str) -> String {
    format!("/services/{}/{}/{}", APP_TYPE, user, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_codes::EXIT_COMMAND_ARGUMENT_ERROR;

    #[test]
    fn test_valid_names() {
        for name in ["a", "hbase1", "my-cluster", "db_2"] {
            assert!(validate_instance_name(name).is_ok(), "{} rejected", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1abc", "-x", "Upper", "has space", "dot.ted", "_x"] {
            let err = validate_instance_name(name).unwrap_err();
            assert_eq!(err.exit_code(), EXIT_COMMAND_ARGUMENT_ERROR, "{}", name);
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(default_zookeeper_path("alice", "db"), "/yarnapps_corral_alice_db");
        assert_eq!(default_registry_path("alice", "db"), "/services/corral/alice/db");
    }
}
