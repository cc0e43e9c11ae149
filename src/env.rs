use std::ffi::OsStr;
use std::ops::Index;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};
use log::debug;

/// Variables parsed from a dotenv source.
///
/// Keys compare case-sensitively. Iteration follows first-insertion order;
/// re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    vars: IndexMap<String, String>,
}

/// Outcome of [`EnvMap::apply_to_process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped_existing: usize,
}

impl EnvMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Set `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.vars.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Entries whose process environment value is missing or different.
    pub fn differing_from_process(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|(key, value)| {
                std::env::var_os(key.as_str())
                    .is_none_or(|current| current.as_os_str() != OsStr::new(value.as_str()))
            })
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Write every entry into the process environment.
    ///
    /// Variables that are already set are left alone unless `overwrite` is
    /// true.
    ///
    /// # Safety
    ///
    /// This calls [`std::env::set_var`]. The caller must ensure no other
    /// thread reads or writes the process environment concurrently.
    pub unsafe fn apply_to_process(&self, overwrite: bool) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (key, value) in &self.vars {
            if !overwrite && std::env::var_os(key).is_some() {
                debug!("skipping {key}: already set");
                report.skipped_existing += 1;
                continue;
            }
            debug!("setting {key}");
            // SAFETY: upheld by the caller.
            unsafe { std::env::set_var(key, value) };
            report.applied += 1;
        }
        report
    }
}

impl Index<&str> for EnvMap {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        self.vars[key].as_str()
    }
}

impl<'a> IntoIterator for &'a EnvMap {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

impl IntoIterator for EnvMap {
    type Item = (String, String);
    type IntoIter = IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.vars
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
