//! Formulas of one display
//!
//! Widgets whose PV name starts with `=` are driven by a formula. Widgets
//! with the same PV name share one compiled formula. Each referenced
//! identifier triggers the formulas that depend on it, and a delivery of
//! new values re-executes every triggered formula once.

use crate::error::{Result, ResultExt};
use crate::formula::ast::Dialect;
use crate::formula::bindings::BindingTable;
use crate::formula::cache::FormulaCache;
use crate::formula::compiled::CompiledFormula;
use crate::formula::parser::ParseOptions;
use crate::types::{DataSourceStatus, Value};
use std::collections::HashMap;

/// Whether a PV name denotes a formula rather than a plain parameter
pub fn is_formula_pv(pv_name: &str) -> bool {
    pv_name.starts_with('=')
}

#[derive(Debug)]
struct Installed {
    pv_name: String,
    formula: CompiledFormula,
}

#[derive(Debug)]
pub struct DisplayFormulas {
    dialect: Dialect,
    cache: FormulaCache,
    installed: Vec<Installed>,
    by_name: HashMap<String, usize>,
    /// canonical identifier -> formulas to update when it changes
    triggers: HashMap<String, Vec<usize>>,
    parameter_ids: Vec<String>,
    /// Display-wide mappings and the synthetic name counter
    bindings: BindingTable,
}

impl Default for DisplayFormulas {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl DisplayFormulas {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            dialect: options.dialect,
            cache: FormulaCache::with_max_depth(options.max_depth),
            installed: Vec::new(),
            by_name: HashMap::new(),
            triggers: HashMap::new(),
            parameter_ids: Vec::new(),
            bindings: BindingTable::new(),
        }
    }

    /// Compile and install the formula behind `pv_name`.
    ///
    /// Registering a PV name twice is a no-op. On a syntax error nothing
    /// is installed and the other formulas keep running.
    pub fn register(&mut self, pv_name: &str) -> Result<()> {
        if self.by_name.contains_key(pv_name) {
            return Ok(());
        }
        self.install(pv_name.to_string(), pv_name)?;
        tracing::debug!("Installed formula {}", pv_name);
        Ok(())
    }

    /// Install a formula that has no PV name of its own; returns its synthetic name
    pub fn register_anonymous(&mut self, source: &str) -> Result<String> {
        let name = self.bindings.next_synthetic_name();
        self.install(name.clone(), source)?;
        Ok(name)
    }

    /// Apply a path name mapping to every formula of the display
    pub fn register_mapping(&mut self, path_name: &str, canonical: &str) {
        self.bindings.register_mapping(path_name, canonical);
        for installed in &mut self.installed {
            installed
                .formula
                .register_data_source_mapping(path_name, canonical);
        }
        self.rebuild_triggers();
    }

    /// Every identifier the display must subscribe to, in registration order
    pub fn parameter_ids(&self) -> &[String] {
        &self.parameter_ids
    }

    pub fn formula(&self, pv_name: &str) -> Option<&CompiledFormula> {
        self.by_name
            .get(pv_name)
            .map(|&index| &self.installed[index].formula)
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    /// Feed delivered values to the formulas they trigger, then execute
    /// each affected formula once. Results are in first-triggered order.
    pub fn process_delivery(
        &mut self,
        delivery: &[(String, DataSourceStatus)],
    ) -> Vec<(String, Value)> {
        let mut dirty: Vec<usize> = Vec::new();
        for (id, status) in delivery {
            let Some(indices) = self.triggers.get(id) else {
                continue;
            };
            for &index in indices {
                self.installed[index]
                    .formula
                    .update_data_source(id, status.clone());
                if !dirty.contains(&index) {
                    dirty.push(index);
                }
            }
        }

        dirty
            .into_iter()
            .map(|index| {
                let installed = &mut self.installed[index];
                (installed.pv_name.clone(), installed.formula.execute())
            })
            .collect()
    }

    /// Reset the environment of every formula
    pub fn clear_state(&mut self) {
        for installed in &mut self.installed {
            installed.formula.clear_state();
        }
    }

    fn install(&mut self, name: String, pv_name: &str) -> Result<()> {
        let source = pv_name.strip_prefix('=').unwrap_or(pv_name);
        let parsed = self
            .cache
            .get_or_parse(source, self.dialect)
            .with_context(|| format!("Formula {} not installed", name))?;

        let mut formula = CompiledFormula::from_formula(source, parsed);
        for (path, canonical) in self.bindings.mappings() {
            formula.register_data_source_mapping(path, canonical);
        }

        let index = self.installed.len();
        self.by_name.insert(name.clone(), index);
        self.installed.push(Installed {
            pv_name: name,
            formula,
        });
        self.index_triggers(index);
        Ok(())
    }

    fn index_triggers(&mut self, index: usize) {
        for id in self.installed[index].formula.get_parameters() {
            let formulas = self.triggers.entry(id.clone()).or_default();
            if !formulas.contains(&index) {
                formulas.push(index);
            }
            if !self.parameter_ids.contains(&id) {
                self.parameter_ids.push(id);
            }
        }
    }

    fn rebuild_triggers(&mut self) {
        self.triggers.clear();
        self.parameter_ids.clear();
        for index in 0..self.installed.len() {
            self.index_triggers(index);
        }
    }
}
