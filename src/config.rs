//! Dotenv files as a source for hierarchical configuration.
//!
//! Keys are mapped onto configuration paths by replacing every `__` with
//! [`KEY_DELIMITER`], so `Database__Host` becomes `Database:Host`. A
//! provider can be restricted to keys starting with a prefix, matched
//! case-insensitively and stripped from the exposed keys.

use std::io::{self, Read};
use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::Error;
use crate::env::EnvMap;
use crate::parser::parse_reader;

/// Separator between configuration path segments.
pub const KEY_DELIMITER: &str = ":";

/// Replace every `__` in `key` with [`KEY_DELIMITER`].
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.replace("__", KEY_DELIMITER)
}

/// Flat configuration table with case-insensitive keys.
///
/// The spelling of the first insertion is kept; later insertions of the
/// same key only replace the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    entries: IndexMap<String, (String, String)>,
}

impl ConfigData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&fold(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, key: String, value: String) {
        let folded = fold(&key);
        if let Some(entry) = self.entries.get_mut(&folded) {
            entry.1 = value;
        } else {
            self.entries.insert(folded, (key, value));
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Entries below `section`, with `section:` stripped from their keys.
    #[must_use]
    pub fn section(&self, section: &str) -> Self {
        let prefix = format!("{section}{KEY_DELIMITER}");
        let mut data = Self::new();
        for (key, value) in self.iter() {
            if let Some(rest) = strip_prefix_ignore_case(key, &prefix) {
                data.insert(rest.to_string(), value.to_string());
            }
        }
        data
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// Turns dotenv input into [`ConfigData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigProvider {
    prefix: String,
    normalized_prefix: String,
}

impl ConfigProvider {
    /// Provider exposing every key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider exposing only keys that start with `prefix`.
    ///
    /// The prefix is normalized like the keys before matching.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let normalized_prefix = normalize_key(&prefix);
        Self {
            prefix,
            normalized_prefix,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse UTF-8 dotenv text from `reader`.
    ///
    /// # Errors
    ///
    /// As [`parse_reader`].
    pub fn load<R: Read>(&self, reader: R) -> Result<ConfigData, Error> {
        let env = parse_reader(reader)?;
        Ok(self.normalize_env(&env))
    }

    /// Parse the file at `path`. When `optional` is set a missing file
    /// yields empty data.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` when the file cannot be opened, otherwise as
    /// [`ConfigProvider::load`].
    pub fn load_file(&self, path: impl AsRef<Path>, optional: bool) -> Result<ConfigData, Error> {
        let path = path.as_ref();
        match std::fs::File::open(path) {
            Ok(file) => self.load(file),
            Err(err) if optional && err.kind() == io::ErrorKind::NotFound => {
                debug!("optional env file {} not found", path.display());
                Ok(ConfigData::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Normalize keys and apply the prefix filter to parsed variables.
    #[must_use]
    pub fn normalize_env(&self, env: &EnvMap) -> ConfigData {
        let mut data = ConfigData::new();
        for (key, value) in env {
            let key = normalize_key(key);
            if let Some(rest) = strip_prefix_ignore_case(&key, &self.normalized_prefix) {
                data.insert(rest.to_string(), value.clone());
            }
        }
        data
    }
}

fn strip_prefix_ignore_case<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = key.chars();
    for expected in prefix.chars() {
        let actual = chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_underscores_become_delimiters() {
        assert_eq!(normalize_key("Nested__Path__With__Keys"), "Nested:Path:With:Keys");
        assert_eq!(normalize_key("single_underscore"), "single_underscore");
        assert_eq!(normalize_key("a___b"), "a:_b");
    }

    #[test]
    fn prefix_match_ignores_case() {
        assert_eq!(strip_prefix_ignore_case("PREFIX_rest", "prefix_"), Some("rest"));
        assert_eq!(strip_prefix_ignore_case("other", "prefix_"), None);
        assert_eq!(strip_prefix_ignore_case("pre", "prefix_"), None);
        assert_eq!(strip_prefix_ignore_case("anything", ""), Some("anything"));
    }

    #[test]
    fn lookup_ignores_case() {
        let mut data = ConfigData::new();
        data.insert("Database:Host".to_string(), "a".to_string());
        data.insert("DATABASE:HOST".to_string(), "b".to_string());
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("database:host"), Some("b"));
        assert_eq!(data.iter().next(), Some(("Database:Host", "b")));
    }

    #[test]
    fn section_strips_parent_path() {
        let env: EnvMap = [("App__Nested__Value", "v"), ("Other", "o")]
            .into_iter()
            .collect();
        let data = ConfigProvider::new().normalize_env(&env);
        let section = data.section("app");
        assert_eq!(section.get("Nested:Value"), Some("v"));
        assert_eq!(section.len(), 1);
    }
}
