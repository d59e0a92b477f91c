//! Typed access to flat option maps.
//!
//! Every level of a [`ConfTree`](super::ConfTree) (the global map and each
//! component map) is a plain `BTreeMap<String, String>`. [`OptionMapExt`]
//! layers lookups with defaults, mandatory lookups and integer parsing on top.

use std::collections::BTreeMap;

use crate::error::{CorralError, CorralResult};

/// A flat map of option keys to string values.
pub type OptionMap = BTreeMap<String, String>;

/// Parse a signed integer the way configuration files write them.
///
/// Accepts decimal (`42`, `-7`, `+3`), `0x`/`0X` hexadecimal and `#`
/// hexadecimal. A leading `0` followed by more digits is read as octal.
pub fn decode_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.is_empty() || body.starts_with('-') || body.starts_with('+') {
        return None;
    }

    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_prefix('#'))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };
    // The sign belongs before the radix prefix, never after it.
    if digits.is_empty() || digits.starts_with('-') || digits.starts_with('+') {
        return None;
    }

    if negative {
        i64::from_str_radix(&format!("-{}", digits), radix).ok()
    } else {
        i64::from_str_radix(digits, radix).ok()
    }
}

/// Lookup helpers for option maps.
pub trait OptionMapExt {
    /// Get an option value.
    fn option(&self, key: &str) -> Option<&str>;

    /// Get an option value or a default.
    fn option_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.option(key).unwrap_or(default)
    }

    /// Get an option, failing with a configuration error naming the key.
    fn mandatory_option(&self, key: &str) -> CorralResult<&str> {
        self.option(key)
            .ok_or_else(|| CorralError::bad_config(format!("Missing option {}", key)))
    }

    /// Get an integer option or a default. A value that does not parse is an error.
    fn option_int(&self, key: &str, default: i64) -> CorralResult<i64> {
        match self.option(key) {
            None => Ok(default),
            Some(raw) => parse_option_int(key, raw),
        }
    }

    /// Get a mandatory integer option.
    fn mandatory_option_int(&self, key: &str) -> CorralResult<i64> {
        let raw = self.mandatory_option(key)?;
        parse_option_int(key, raw)
    }

    /// Get a boolean option or a default.
    fn option_bool(&self, key: &str, default: bool) -> bool {
        match self.option(key) {
            Some(v) => v.trim().eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    /// Set a value only if the key is absent.
    fn put_if_unset(&mut self, key: &str, value: impl Into<String>);

    /// Copy all keys starting with `prefix` from `source`.
    ///
    /// When `overwrite` is false, existing keys are kept.
    fn merge_prefixed(&mut self, source: &OptionMap, prefix: &str, overwrite: bool);

    /// Keys starting with `prefix`.
    fn prefixed(&self, prefix: &str) -> OptionMap;
}

fn parse_option_int(key: &str, raw: &str) -> CorralResult<i64> {
    decode_int(raw).ok_or_else(|| {
        CorralError::bad_config(format!(
            "Option {} has a non-integer value \"{}\"",
            key, raw
        ))
    })
}

impl OptionMapExt for OptionMap {
    fn option(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn put_if_unset(&mut self, key: &str, value: impl Into<String>) {
        self.entry(key.to_string()).or_insert_with(|| value.into());
    }

    fn merge_prefixed(&mut self, source: &OptionMap, prefix: &str, overwrite: bool) {
        for (k, v) in source.iter().filter(|(k, _)| k.starts_with(prefix)) {
            if overwrite || !self.contains_key(k) {
                self.insert(k.clone(), v.clone());
            }
        }
    }

    fn prefixed(&self, prefix: &str) -> OptionMap {
        self.iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Merge `source` into `target`, keeping whatever `target` already holds.
///
/// Returns the keys of `source` that were shadowed by an existing entry.
pub fn merge_ignore_duplicate_keys(target: &mut OptionMap, source: &OptionMap) -> Vec<String> {
    let mut shadowed = Vec::new();
    for (k, v) in source {
        if target.contains_key(k) {
            shadowed.push(k.clone());
        } else {
            target.insert(k.clone(), v.clone());
        }
    }
    shadowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_int_forms() {
        assert_eq!(decode_int("42"), Some(42));
        assert_eq!(decode_int("-7"), Some(-7));
        assert_eq!(decode_int("+3"), Some(3));
        assert_eq!(decode_int("0x10"), Some(16));
        assert_eq!(decode_int("#ff"), Some(255));
        assert_eq!(decode_int("-0x10"), Some(-16));
        assert_eq!(decode_int("010"), Some(8));
        assert_eq!(decode_int("0"), Some(0));
    }

    #[test]
    fn test_decode_int_rejects_garbage() {
        assert_eq!(decode_int(""), None);
        assert_eq!(decode_int("-"), None);
        assert_eq!(decode_int("--1"), None);
        assert_eq!(decode_int("lots"), None);
        assert_eq!(decode_int("0xZZ"), None);
        assert_eq!(decode_int("MAX"), None);
    }

    #[test]
    fn test_decode_int_rejects_sign_after_prefix() {
        assert_eq!(decode_int("0x-5"), None);
        assert_eq!(decode_int("0x+5"), None);
        assert_eq!(decode_int("#-1"), None);
        assert_eq!(decode_int("0-5"), None);
        assert_eq!(decode_int("-0x-8000000000000000"), None);
    }

    #[test]
    fn test_decode_int_extremes() {
        assert_eq!(decode_int("-0x8000000000000000"), Some(i64::MIN));
        assert_eq!(decode_int("0x7fffffffffffffff"), Some(i64::MAX));
        assert_eq!(decode_int("0x8000000000000000"), None);
    }

    #[test]
    fn test_mandatory_option_names_key() {
        let m = map(&[("a", "1")]);
        assert_eq!(m.mandatory_option("a").unwrap(), "1");
        let err = m.mandatory_option("missing.key").unwrap_err();
        assert!(err.to_string().contains("missing.key"));
        assert_eq!(err.exit_code(), crate::error::exit_codes::EXIT_BAD_CONFIGURATION);
    }

    #[test]
    fn test_option_int() {
        let m = map(&[("n", "12"), ("bad", "twelve")]);
        assert_eq!(m.option_int("n", 0).unwrap(), 12);
        assert_eq!(m.option_int("absent", 5).unwrap(), 5);
        assert!(m.option_int("bad", 0).is_err());
        assert!(m.mandatory_option_int("absent").is_err());
    }

    #[test]
    fn test_put_if_unset_keeps_existing() {
        let mut m = map(&[("a", "1")]);
        m.put_if_unset("a", "2");
        m.put_if_unset("b", "3");
        assert_eq!(m.option("a"), Some("1"));
        assert_eq!(m.option("b"), Some("3"));
    }

    #[test]
    fn test_merge_prefixed() {
        let mut target = map(&[("site.a", "old")]);
        let source = map(&[("site.a", "new"), ("site.b", "2"), ("other", "x")]);

        target.merge_prefixed(&source, "site.", false);
        assert_eq!(target.option("site.a"), Some("old"));
        assert_eq!(target.option("site.b"), Some("2"));
        assert!(target.option("other").is_none());

        target.merge_prefixed(&source, "site.", true);
        assert_eq!(target.option("site.a"), Some("new"));
    }

    #[test]
    fn test_merge_ignore_duplicate_keys_first_writer_wins() {
        let mut target = map(&[("a", "first")]);
        let shadowed = merge_ignore_duplicate_keys(&mut target, &map(&[("a", "second"), ("b", "2")]));
        assert_eq!(target.option("a"), Some("first"));
        assert_eq!(target.option("b"), Some("2"));
        assert_eq!(shadowed, vec!["a".to_string()]);
    }
}
