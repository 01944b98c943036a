//! Spectre/CDL to SPICE converter
//!
//! Conversion is a single streaming pass over logical statements. A symbol
//! pre-scan runs first so that device calls can be resolved against
//! subcircuits and models declared anywhere in the file. Assembled output
//! then goes through a few textual normalizers.

mod assembler;
pub mod classify;
pub mod context;
pub mod model;
mod normalize;
pub mod params;
pub mod prefix;
pub mod prescan;
pub mod source;

use std::path::Path;

pub use context::{Dialect, RawKeyword, S2SOptions};
pub use prescan::SymbolTable;

use crate::utils::error::ConversionOutput;
use assembler::Assembler;

/// Netlist converter configured by [`S2SOptions`]
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    options: S2SOptions,
}

impl Transpiler {
    pub fn new(options: S2SOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &S2SOptions {
        &self.options
    }

    /// Convert netlist text, starting in the configured dialect
    pub fn convert(&self, input: &str) -> ConversionOutput {
        self.convert_with_dialect(input, self.options.initial_dialect(None))
    }

    /// Convert netlist text read from `path`; the extension picks the dialect
    pub fn convert_for_path(&self, input: &str, path: &Path) -> ConversionOutput {
        self.convert_with_dialect(input, self.options.initial_dialect(Some(path)))
    }

    pub fn convert_with_dialect(&self, input: &str, dialect: Dialect) -> ConversionOutput {
        let lines = source::split_lines(input);
        let symbols = SymbolTable::scan(input);
        log::debug!(
            "pre-scan: {} subcircuit(s), starting in {:?}",
            symbols.subcircuit_count(),
            dialect
        );

        let mut assembler = Assembler::new(&symbols, &self.options, dialect);
        for item in source::join_statements(lines) {
            assembler.push(item);
        }
        let (mut lines, warnings) = assembler.finish();

        if self.options.normalize {
            lines = normalize::normalize(lines, &self.options.multiplicity_var);
        }

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        ConversionOutput::with_warnings(content, warnings)
    }
}
