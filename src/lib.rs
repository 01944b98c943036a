//! spicebridge - Spectre/CDL to ngspice netlist transpiler
//!
//! Converts netlists written in Spectre syntax (and the CDL/SPICE-like
//! dialect that can be mixed into them with `simulator lang=spice`) into
//! plain SPICE that ngspice accepts.
//!
//! ## Example
//!
//! ```rust
//! use spicebridge::spectre_to_spice;
//!
//! let spice = spectre_to_spice("subckt inv (a y)\nends inv\n");
//! assert_eq!(spice, ".subckt inv a y\n\n.ends inv\n");
//! ```
//!
//! Conversion never fails on netlist content. Constructs that cannot be
//! converted are passed through and reported as warnings, see
//! [`spectre_to_spice_with_options`].

pub mod core;
pub mod utils;

pub use crate::core::spectre2spice::{Dialect, RawKeyword, S2SOptions, SymbolTable, Transpiler};
pub use utils::error::{ConversionOutput, ConversionResult, ConversionWarning, ConvertError, WarningKind};
pub use utils::files::{convert_directory, convert_file, convert_path};
pub use utils::report::{ConversionReport, FileReport, FileStatus};

/// Convert Spectre netlist text to SPICE with default options
pub fn spectre_to_spice(input: &str) -> String {
    Transpiler::default().convert(input).content
}

/// Convert with explicit options, returning the warnings as well
pub fn spectre_to_spice_with_options(input: &str, options: S2SOptions) -> ConversionOutput {
    Transpiler::new(options).convert(input)
}
