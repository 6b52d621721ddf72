//! Per-run compiler configuration.
//!
//! Created once per run by the caller, written by `setenv` scopes during
//! closure dispatch and read by the serializer and the CLI.

use serde::Serialize;
use std::collections::BTreeMap;

/// Key enabling lexicographic output order.
pub const SORTED: &str = "sorted";
/// Key naming the output path used when the caller gives none.
pub const OUTPUT: &str = "output";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config {
    entries: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(SORTED.to_owned(), "false".to_owned());
        Config { entries }
    }
}

impl Config {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn set_sorted(&mut self, sorted: bool) {
        self.set(SORTED, sorted.to_string());
    }

    /// True when `sorted` is any case-insensitive spelling of `true`.
    pub fn is_sorted(&self) -> bool {
        self.get(SORTED)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    pub fn output(&self) -> Option<&str> {
        self.get(OUTPUT).filter(|p| !p.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
