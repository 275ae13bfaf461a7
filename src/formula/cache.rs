use crate::error::Result;
use crate::formula::ast::{Dialect, Formula};
use crate::formula::parser::{parse_with, ParseOptions, DEFAULT_MAX_DEPTH};
use std::collections::HashMap;
use std::sync::Arc;

/// Cache of parsed formulas so identical sources are parsed once
#[derive(Debug)]
pub struct FormulaCache {
    /// Map from (dialect, source) to parsed formula
    cache: HashMap<(Dialect, String), Arc<Formula>>,
    max_depth: usize,
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create a cache whose parses use the given nesting limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            cache: HashMap::new(),
            max_depth,
        }
    }

    /// Get a cached formula or parse and cache it.
    ///
    /// Syntax errors are not cached.
    pub fn get_or_parse(&mut self, source: &str, dialect: Dialect) -> Result<Arc<Formula>> {
        let key = (dialect, source.to_string());
        if let Some(formula) = self.cache.get(&key) {
            return Ok(formula.clone());
        }

        let options = ParseOptions {
            dialect,
            max_depth: self.max_depth,
        };
        let formula = Arc::new(parse_with(source, &options)?);
        tracing::trace!("Parsed and cached formula '{}'", source);
        self.cache.insert(key, formula.clone());
        Ok(formula)
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Remove a specific formula from the cache
    pub fn invalidate(&mut self, source: &str, dialect: Dialect) {
        self.cache.remove(&(dialect, source.to_string()));
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_reuses_parsed_formula() {
        let mut cache = FormulaCache::new();
        let a = cache.get_or_parse("1 + x", Dialect::Simplified).unwrap();
        let b = cache.get_or_parse("1 + x", Dialect::Simplified).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_on_dialect() {
        let mut cache = FormulaCache::new();
        let simplified = cache.get_or_parse("[x]", Dialect::Simplified).unwrap();
        let legacy = cache.get_or_parse("[x]", Dialect::Legacy).unwrap();
        assert!(!Arc::ptr_eq(&simplified, &legacy));
        assert_eq!(legacy.dialect, Dialect::Legacy);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_syntax_errors_not_cached() {
        let mut cache = FormulaCache::new();
        assert!(cache.get_or_parse("1 +", Dialect::Simplified).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = FormulaCache::new();
        cache.get_or_parse("a", Dialect::Simplified).unwrap();
        cache.get_or_parse("b", Dialect::Simplified).unwrap();
        cache.invalidate("a", Dialect::Simplified);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_max_depth_applies() {
        let mut cache = FormulaCache::with_max_depth(4);
        assert!(cache.get_or_parse("((((((1))))))", Dialect::Simplified).is_err());
    }
}
