//! Helpers shared by the client providers.

use std::path::{Path, PathBuf};

use crate::conf::{decode_int, keys, OptionMap};
use crate::error::{CorralError, CorralResult};

/// Resolve a resource requirement.
///
/// An absent value yields `default`; the literal `max` yields `ceiling`;
/// anything else must parse as a signed integer and is used verbatim.
///
/// # Example
///
/// ```
/// use corral::provider::resource_requirement;
///
/// assert_eq!(resource_requirement(None, 256, 4096).unwrap(), 256);
/// assert_eq!(resource_requirement(Some("max"), 256, 4096).unwrap(), 4096);
/// assert_eq!(resource_requirement(Some("512"), 256, 4096).unwrap(), 512);
/// assert!(resource_requirement(Some("lots"), 256, 4096).is_err());
/// ```
pub fn resource_requirement(raw: Option<&str>, default: i64, ceiling: i64) -> CorralResult<i64> {
    match raw {
        None => Ok(default),
        Some(keys::RESOURCE_MAX) => Ok(ceiling),
        Some(value) => decode_int(value).ok_or_else(|| {
            CorralError::bad_config(format!(
                "Unparseable resource requirement \"{}\"",
                value
            ))
        }),
    }
}

/// Check a requested node count against a minimum and an optional maximum.
///
/// A `max` of zero or less means unbounded.
pub fn validate_node_count(name: &str, count: i64, min: i64, max: i64) -> CorralResult<()> {
    if count < min {
        return Err(CorralError::bad_args(format!(
            "requested no of {} nodes: {} is below the minimum of {}",
            name, count, min
        )));
    }
    if max > 0 && count > max {
        return Err(CorralError::bad_args(format!(
            "requested no of {} nodes: {} is above the maximum of {}",
            name, count, max
        )));
    }
    Ok(())
}

/// Extract site options from an option map.
///
/// Keys starting with `site.` (or `site.<config_name>.` when a config name is
/// given) are copied with the prefix stripped. Each token in `tokens` is
/// replaced in the values.
pub fn propagate_site_options(
    options: &OptionMap,
    config_name: Option<&str>,
    tokens: &[(&str, &str)],
) -> OptionMap {
    let prefix = match config_name {
        Some(name) if !name.is_empty() => format!("{}{}.", keys::SITE_XML_PREFIX, name),
        _ => keys::SITE_XML_PREFIX.to_string(),
    };

    options
        .iter()
        .filter_map(|(k, v)| {
            let site_key = k.strip_prefix(prefix.as_str())?;
            if site_key.is_empty() {
                return None;
            }
            let value = tokens
                .iter()
                .fold(v.clone(), |acc, (token, replacement)| {
                    acc.replace(token, replacement)
                });
            Some((site_key.to_string(), value))
        })
        .collect()
}

/// Pair artifact names with their sources.
///
/// Mismatched lengths indicate a programming error, not bad user input.
pub fn pair_artifacts(names: &[&str], sources: &[PathBuf]) -> CorralResult<Vec<(String, PathBuf)>> {
    if names.len() != sources.len() {
        return Err(CorralError::Internal(format!(
            "Artifact list mismatch: {} names but {} sources",
            names.len(),
            sources.len()
        )));
    }
    Ok(names
        .iter()
        .map(|n| n.to_string())
        .zip(sources.iter().cloned())
        .collect())
}

/// Fail with a configuration error unless `path` exists.
pub fn require_path_exists(what: &str, path: &Path) -> CorralResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CorralError::bad_config(format!(
            "{} not found: {}",
            what,
            path.display()
        )))
    }
}

/// Fail with a configuration error unless `path` is a directory.
pub fn require_directory(what: &str, path: &Path) -> CorralResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CorralError::bad_config(format!(
            "{} is not a directory: {}",
            what,
            path.display()
        )))
    }
}

/// The local file behind a path option, if it names one.
///
/// `file://` URIs and plain paths are local; any other scheme is remote and
/// cannot be checked from here.
pub fn local_path(raw: &str) -> Option<PathBuf> {
    if let Some(path) = raw.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if raw.contains("://") {
        return None;
    }
    Some(PathBuf::from(raw))
}

/// Directory an application image is expanded into on the far side.
pub const IMAGE_INSTALL_SUBDIR: &str = "image";

/// Build the path to a script under the application home.
///
/// With an image the path is relative to the expanded archive; otherwise it
/// is under the pre-installed home directory.
pub fn build_path_to_home_dir(
    image_path: Option<&str>,
    application_home: Option<&str>,
    bin_dir: &str,
    script: &str,
) -> CorralResult<String> {
    match (image_path, application_home) {
        (Some(_), _) => Ok(format!("{}/{}/{}", IMAGE_INSTALL_SUBDIR, bin_dir, script)),
        (None, Some(home)) => Ok(format!(
            "{}/{}/{}",
            home.trim_end_matches('/'),
            bin_dir,
            script
        )),
        (None, None) => Err(CorralError::bad_config(format!(
            "Neither {} nor {} is set",
            keys::INTERNAL_APPLICATION_IMAGE_PATH,
            keys::INTERNAL_APPLICATION_HOME
        ))),
    }
}

/// Environment variables from `env.`-prefixed options, prefix stripped.
pub fn build_env_map(options: &OptionMap) -> OptionMap {
    options
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix(keys::ENV_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_string(), v.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_codes::*;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resource_requirement_examples() {
        assert_eq!(resource_requirement(None, 256, 2048).unwrap(), 256);
        assert_eq!(resource_requirement(Some("max"), 256, 2048).unwrap(), 2048);
        assert_eq!(resource_requirement(Some("512"), 256, 2048).unwrap(), 512);
        assert_eq!(resource_requirement(Some("0x100"), 0, 0).unwrap(), 256);
        assert_eq!(resource_requirement(Some("-1"), 0, 0).unwrap(), -1);
    }

    #[test]
    fn test_resource_requirement_max_is_case_sensitive() {
        let err = resource_requirement(Some("MAX"), 256, 2048).unwrap_err();
        assert!(err.to_string().contains("MAX"));
        assert_eq!(err.exit_code(), EXIT_BAD_CONFIGURATION);
    }

    #[test]
    fn test_validate_node_count() {
        assert!(validate_node_count("node", 0, 0, -1).is_ok());
        assert!(validate_node_count("node", 100, 0, 0).is_ok());
        let err = validate_node_count("node", -1, 0, -1).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_COMMAND_ARGUMENT_ERROR);
        assert!(err.to_string().contains("below the minimum"));
        let err = validate_node_count("node", 5, 0, 4).unwrap_err();
        assert!(err.to_string().contains("above the maximum"));
    }

    #[test]
    fn test_propagate_site_options() {
        let options = map(&[
            ("site.fs.defaultFS", "hdfs://${NN}:8020"),
            ("site.hbase.root", "/hbase"),
            ("site.", "ignored"),
            ("other", "x"),
        ]);

        let site = propagate_site_options(&options, None, &[("${NN}", "namenode")]);
        assert_eq!(site.get("fs.defaultFS").map(String::as_str), Some("hdfs://namenode:8020"));
        assert_eq!(site.get("hbase.root").map(String::as_str), Some("/hbase"));
        assert_eq!(site.len(), 2);

        let hbase = propagate_site_options(&options, Some("hbase"), &[]);
        assert_eq!(hbase.get("root").map(String::as_str), Some("/hbase"));
        assert_eq!(hbase.len(), 1);
    }

    #[test]
    fn test_pair_artifacts_mismatch_is_internal() {
        let err = pair_artifacts(&["a", "b"], &[PathBuf::from("/a")]).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INTERNAL_ERROR);

        let pairs = pair_artifacts(&["a"], &[PathBuf::from("/a")]).unwrap();
        assert_eq!(pairs, vec![("a".to_string(), PathBuf::from("/a"))]);
    }

    #[test]
    fn test_build_path_to_home_dir() {
        assert_eq!(
            build_path_to_home_dir(Some("/img.tar.gz"), None, "bin", "run").unwrap(),
            "image/bin/run"
        );
        assert_eq!(
            build_path_to_home_dir(None, Some("/opt/app/"), "bin", "run").unwrap(),
            "/opt/app/bin/run"
        );
        assert!(build_path_to_home_dir(None, None, "bin", "run").is_err());
    }

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/a/b"), Some(PathBuf::from("/a/b")));
        assert_eq!(local_path("file:///a/b"), Some(PathBuf::from("/a/b")));
        assert_eq!(local_path("hdfs://nn/a"), None);
    }

    #[test]
    fn test_build_env_map() {
        let env = build_env_map(&map(&[("env.JAVA_HOME", "/jdk"), ("env.", "x"), ("jvm.heapsize", "1G")]));
        assert_eq!(env, map(&[("JAVA_HOME", "/jdk")]));
    }
}
