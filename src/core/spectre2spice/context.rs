//! Conversion options
//!
//! Everything foundry- or flow-specific lives here rather than in the
//! converter itself, so a PDK can override it from a TOML file.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::error::{ConversionResult, ConvertError};

/// Input dialect of the statements currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Spectre syntax (`subckt`, `parameters`, `model ... {`)
    #[default]
    Spectre,
    /// SPICE or CDL syntax (`.subckt`, `.param`, `.model`)
    Spice,
}

impl Dialect {
    /// Dialect implied by a file extension, if any
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "cdl" | "sp" | "spi" | "spice" | "cir" | "ckt" => Some(Dialect::Spice),
            "scs" | "spectre" => Some(Dialect::Spectre),
            _ => None,
        }
    }

    /// Parse the value of a `simulator lang=` statement
    pub fn from_lang(lang: &str) -> Option<Self> {
        match lang.to_ascii_lowercase().as_str() {
            "spectre" => Some(Dialect::Spectre),
            "spice" => Some(Dialect::Spice),
            _ => None,
        }
    }
}

/// Device reference keyword that is not declared in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyword {
    /// Instance prefix letter
    pub prefix: char,
    /// Built-in element: the keyword itself is dropped from the call
    #[serde(default)]
    pub primitive: bool,
}

impl RawKeyword {
    pub fn new(prefix: char, primitive: bool) -> Self {
        Self { prefix, primitive }
    }
}

/// Options for Spectre to SPICE conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S2SOptions {
    /// Starting dialect; `None` picks one from the file extension
    /// Default: None
    pub dialect: Option<Dialect>,

    /// Fallback prefixes for raw dialect keywords used as device references
    /// Default: resistor/capacitor/inductor primitives, `resbody`, `n`/`p`
    pub raw_keywords: IndexMap<String, RawKeyword>,

    /// Switch parameters whose `yes`/`no` values become `1`/`0`
    /// Default: `sw_stat_global`, `sw_stat_mismatch`
    pub yes_no_switches: Vec<String>,

    /// Informal multiplicity variable of the vendor dialect
    /// Default: `m`
    pub multiplicity_var: String,

    /// File extensions left alone in directory mode
    /// Default: HDL sources (`v`, `va`, `vams`, `sv`)
    pub skip_extensions: Vec<String>,

    /// Run the post-pass normalizers
    /// Default: true
    pub normalize: bool,
}

impl Default for S2SOptions {
    fn default() -> Self {
        let mut raw_keywords = IndexMap::new();
        raw_keywords.insert("resistor".to_string(), RawKeyword::new('r', true));
        raw_keywords.insert("capacitor".to_string(), RawKeyword::new('c', true));
        raw_keywords.insert("inductor".to_string(), RawKeyword::new('l', true));
        raw_keywords.insert("resbody".to_string(), RawKeyword::new('r', false));
        raw_keywords.insert("n".to_string(), RawKeyword::new('m', false));
        raw_keywords.insert("p".to_string(), RawKeyword::new('m', false));

        Self {
            dialect: None,
            raw_keywords,
            yes_no_switches: vec!["sw_stat_global".to_string(), "sw_stat_mismatch".to_string()],
            multiplicity_var: "m".to_string(),
            skip_extensions: ["v", "va", "vams", "sv"].iter().map(|s| s.to_string()).collect(),
            normalize: true,
        }
    }
}

impl S2SOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the starting dialect
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Options without the post-pass normalizers
    pub fn raw() -> Self {
        Self {
            normalize: false,
            ..Self::default()
        }
    }

    /// Parse options from TOML text; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> ConversionResult<Self> {
        let options: S2SOptions =
            toml::from_str(text).map_err(|e| ConvertError::config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load(path: &Path) -> ConversionResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConvertError::read(path, e))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> ConversionResult<()> {
        let var = &self.multiplicity_var;
        let valid_ident = var
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_ident {
            return Err(ConvertError::config(format!(
                "multiplicity_var '{}' is not an identifier",
                var
            )));
        }
        for (keyword, raw) in &self.raw_keywords {
            if !raw.prefix.is_ascii_alphabetic() {
                return Err(ConvertError::config(format!(
                    "prefix '{}' for raw keyword '{}' is not a letter",
                    raw.prefix, keyword
                )));
            }
        }
        Ok(())
    }

    /// Dialect to start a file in
    pub fn initial_dialect(&self, path: Option<&Path>) -> Dialect {
        self.dialect
            .or_else(|| path.and_then(Dialect::from_extension))
            .unwrap_or_default()
    }

    /// Raw keyword fallback for a device reference
    pub fn raw_keyword(&self, reference: &str) -> Option<&RawKeyword> {
        self.raw_keywords.get(reference).or_else(|| {
            self.raw_keywords
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(reference))
                .map(|(_, v)| v)
        })
    }

    pub fn is_yes_no_switch(&self, name: &str) -> bool {
        self.yes_no_switches
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name))
    }

    pub fn skips(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.skip_extensions
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}
