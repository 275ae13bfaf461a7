//! Data-source binding table
//!
//! Maps display-local path names to canonical identifiers and holds the
//! latest [`DataSourceStatus`] per canonical identifier. Entries are only
//! ever overwritten in place; the table itself is never replaced while a
//! formula is installed.

use crate::types::DataSourceStatus;
use std::collections::HashMap;

/// Prefix of names handed out by [`BindingTable::next_synthetic_name`]
pub const SYNTHETIC_PREFIX: &str = "__formula_";

#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    /// path name -> canonical identifier
    path_names: HashMap<String, String>,
    /// canonical identifier -> latest status
    statuses: HashMap<String, DataSourceStatus>,
    /// Counter for synthetic names of anonymous formulas
    synthetic_counter: u64,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a path name mapping (last write wins)
    pub fn register_mapping(&mut self, path_name: impl Into<String>, canonical: impl Into<String>) {
        let path_name = path_name.into();
        let canonical = canonical.into();
        tracing::trace!("Mapping path name {} -> {}", path_name, canonical);
        self.path_names.insert(path_name, canonical);
    }

    /// Canonical identifier registered for `path_name`
    pub fn resolve(&self, path_name: &str) -> Option<&str> {
        self.path_names.get(path_name).map(String::as_str)
    }

    /// Canonical identifier for `name`, treating unmapped names as canonical already
    pub fn resolve_or_self<'a>(&'a self, name: &'a str) -> &'a str {
        self.resolve(name).unwrap_or(name)
    }

    /// All registered path name mappings
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path_names
            .iter()
            .map(|(path, canonical)| (path.as_str(), canonical.as_str()))
    }

    /// Store the latest status of a canonical identifier
    pub fn update(&mut self, canonical: &str, status: DataSourceStatus) {
        match self.statuses.get_mut(canonical) {
            Some(existing) => *existing = status,
            None => {
                self.statuses.insert(canonical.to_string(), status);
            }
        }
    }

    /// Latest status of a canonical identifier
    pub fn status(&self, canonical: &str) -> Option<&DataSourceStatus> {
        self.statuses.get(canonical)
    }

    /// Forget every received status, keeping path name mappings
    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    /// Forget statuses and mappings
    pub fn clear(&mut self) {
        self.path_names.clear();
        self.statuses.clear();
    }

    /// Number of canonical identifiers with a known status
    pub fn status_count(&self) -> usize {
        self.statuses.len()
    }

    /// Unique name for a formula that has no PV name of its own
    pub fn next_synthetic_name(&mut self) -> String {
        self.synthetic_counter += 1;
        format!("{}{}", SYNTHETIC_PREFIX, self.synthetic_counter)
    }
}
