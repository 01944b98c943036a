//! Symbol pre-scan
//!
//! Device calls may reference subcircuits and models that are declared further
//! down the file, so one forward pass over the raw lines collects every
//! declaration before the main conversion starts.

use fxhash::{FxHashMap, FxHashSet};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SUBCKT_DECL: Regex =
        Regex::new(r"^(?:inline\s+)?subckt\s+([^\s(]+)|^(?i:\.subckt)\s+([^\s(]+)").unwrap();
    static ref MODEL_DECL: Regex =
        Regex::new(r"^(?:model|(?i:\.model))\s+(\S+)\s+([^\s{(]+)").unwrap();
    static ref BINNED_NAME: Regex = Regex::new(r"^(.+)\.(\d+)$").unwrap();
}

/// Every subcircuit and model declared in one file
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    subcircuits: FxHashSet<String>,
    models: FxHashMap<String, String>,
}

impl SymbolTable {
    /// Collect declarations from raw (unjoined) input
    pub fn scan(input: &str) -> Self {
        let mut table = SymbolTable::default();

        for raw in input.lines() {
            let line = raw.trim();
            if line.is_empty()
                || line.starts_with('*')
                || line.starts_with("//")
                || line.starts_with('+')
            {
                continue;
            }

            if let Some(caps) = SUBCKT_DECL.captures(line) {
                if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                    table.subcircuits.insert(name.as_str().to_ascii_lowercase());
                }
                continue;
            }

            if let Some(caps) = MODEL_DECL.captures(line) {
                let name = caps[1].to_ascii_lowercase();
                let kind = caps[2].to_ascii_lowercase();
                if let Some(bin) = BINNED_NAME.captures(&name) {
                    table
                        .models
                        .entry(bin[1].to_string())
                        .or_insert_with(|| kind.clone());
                }
                table.models.insert(name, kind);
            }
        }

        log::debug!(
            "pre-scan found {} subcircuit(s) and {} model(s)",
            table.subcircuits.len(),
            table.models.len()
        );
        table
    }

    pub fn is_subcircuit(&self, name: &str) -> bool {
        self.subcircuits.contains(&name.to_ascii_lowercase())
    }

    /// Declared type keyword of a model, if the file declares one by this name
    pub fn model_type(&self, name: &str) -> Option<&str> {
        self.models
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// True if `name` is any declared subcircuit or model
    pub fn is_known(&self, name: &str) -> bool {
        self.is_subcircuit(name) || self.model_type(name).is_some()
    }

    pub fn subcircuit_count(&self) -> usize {
        self.subcircuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subcircuits.is_empty() && self.models.is_empty()
    }
}
