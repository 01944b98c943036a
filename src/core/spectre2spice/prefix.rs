//! Device prefix resolution
//!
//! The target simulator identifies a device's category by the first letter of
//! its instance name. Spectre names instances freely and puts the category in
//! the referenced model's type keyword instead.

use phf::phf_map;

use super::context::S2SOptions;
use super::params::{ParamLine, TailLine};
use super::prescan::SymbolTable;
use crate::utils::error::ConversionWarning;

/// Device category implied by a model type keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    Mos,
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    Bipolar,
    Subcircuit,
}

/// Type keyword prefixes, matched longest first
static FAMILIES: phf::Map<&'static str, DeviceFamily> = phf_map! {
    "nmos" => DeviceFamily::Mos,
    "pmos" => DeviceFamily::Mos,
    "bsim" => DeviceFamily::Mos,
    "psp" => DeviceFamily::Mos,
    "hisim" => DeviceFamily::Mos,
    "mos" => DeviceFamily::Mos,
    "ekv" => DeviceFamily::Mos,
    "r" => DeviceFamily::Resistor,
    "res" => DeviceFamily::Resistor,
    "c" => DeviceFamily::Capacitor,
    "cap" => DeviceFamily::Capacitor,
    "ind" => DeviceFamily::Inductor,
    "d" => DeviceFamily::Diode,
    "dio" => DeviceFamily::Diode,
    "juncap" => DeviceFamily::Diode,
    "npn" => DeviceFamily::Bipolar,
    "pnp" => DeviceFamily::Bipolar,
    "bjt" => DeviceFamily::Bipolar,
    "vbic" => DeviceFamily::Bipolar,
    "hicum" => DeviceFamily::Bipolar,
    "mextram" => DeviceFamily::Bipolar,
};

/// Type keywords the target simulator spells differently
static CANONICAL_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "resistor" => "r",
    "res" => "r",
    "capacitor" => "c",
    "cap" => "c",
    "diode" => "d",
    "dio" => "d",
    "inductor" => "l",
    "ind" => "l",
};

impl DeviceFamily {
    /// Family of a model type keyword; anything unrecognised is a subcircuit
    pub fn of(type_keyword: &str) -> Self {
        let keyword = type_keyword.to_ascii_lowercase();
        (1..=keyword.len())
            .rev()
            .filter(|&len| keyword.is_char_boundary(len))
            .find_map(|len| FAMILIES.get(&keyword[..len]).copied())
            .unwrap_or(DeviceFamily::Subcircuit)
    }

    pub fn prefix(self) -> char {
        match self {
            DeviceFamily::Mos => 'm',
            DeviceFamily::Resistor => 'r',
            DeviceFamily::Capacitor => 'c',
            DeviceFamily::Inductor => 'l',
            DeviceFamily::Diode => 'd',
            DeviceFamily::Bipolar => 'q',
            DeviceFamily::Subcircuit => 'x',
        }
    }
}

/// True for a transistor type keyword that does not fix the polarity
pub fn is_placeholder(type_keyword: &str) -> bool {
    let keyword = type_keyword.to_ascii_lowercase();
    match DeviceFamily::of(&keyword) {
        DeviceFamily::Mos => keyword != "nmos" && keyword != "pmos",
        DeviceFamily::Bipolar => keyword != "npn" && keyword != "pnp",
        _ => false,
    }
}

/// Spelling of a known type keyword in the output
pub fn canonical_type(type_keyword: &str) -> String {
    let keyword = type_keyword.to_ascii_lowercase();
    match CANONICAL_TYPES.get(keyword.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => type_keyword.to_string(),
    }
}

/// Outcome of resolving one device reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub prefix: char,
    /// The reference is a built-in element keyword and is not emitted
    pub drop_reference: bool,
    pub warning: Option<ConversionWarning>,
}

impl Resolution {
    fn family(family: DeviceFamily) -> Self {
        Self {
            prefix: family.prefix(),
            drop_reference: false,
            warning: None,
        }
    }
}

/// Maps device references to instance prefixes
pub struct PrefixResolver<'a> {
    symbols: &'a SymbolTable,
    options: &'a S2SOptions,
}

impl<'a> PrefixResolver<'a> {
    pub fn new(symbols: &'a SymbolTable, options: &'a S2SOptions) -> Self {
        Self { symbols, options }
    }

    /// Resolve `reference` for instance `instance`.
    ///
    /// `local` is the family of a model of that name buffered in the open
    /// subcircuit, which wins over anything declared elsewhere.
    pub fn resolve(&self, instance: &str, reference: &str, local: Option<DeviceFamily>) -> Resolution {
        if let Some(family) = local {
            return Resolution::family(family);
        }
        if self.symbols.is_subcircuit(reference) {
            return Resolution::family(DeviceFamily::Subcircuit);
        }
        if let Some(kind) = self.symbols.model_type(reference) {
            return Resolution::family(DeviceFamily::of(kind));
        }
        if let Some(raw) = self.options.raw_keyword(reference) {
            return Resolution {
                prefix: raw.prefix.to_ascii_lowercase(),
                drop_reference: raw.primitive,
                warning: None,
            };
        }
        Resolution {
            prefix: DeviceFamily::Subcircuit.prefix(),
            drop_reference: false,
            warning: Some(ConversionWarning::unresolved_device(instance, reference)),
        }
    }
}

/// Instance name carrying `prefix` exactly once
pub fn prefixed(instance: &str, prefix: char) -> String {
    let has_prefix = instance
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&prefix));
    if has_prefix {
        instance.to_string()
    } else {
        format!("{}{}", prefix, instance)
    }
}

/// A device instantiation waiting for its prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCall {
    pub instance: String,
    pub pins: Vec<String>,
    pub reference: String,
    /// Parameters on the head line
    pub params: ParamLine,
    /// Continuation and interleaved comment lines
    pub tail: Vec<TailLine>,
    pub line: usize,
}

impl DeviceCall {
    /// Output lines for this call once its prefix is known
    pub fn render(&self, resolution: &Resolution) -> Vec<String> {
        let mut head = vec![prefixed(&self.instance, resolution.prefix)];
        head.extend(self.pins.iter().cloned());
        if !resolution.drop_reference {
            head.push(self.reference.clone());
        }
        let params = self.params.render();
        if !params.is_empty() {
            head.push(params);
        }

        let mut lines = vec![head.join(" ")];
        lines.extend(self.tail.iter().map(TailLine::render));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spectre2spice::params::{Lead, OpenValue};

    #[test]
    fn test_longest_prefix_match() {
        assert_eq!(DeviceFamily::of("bsim4"), DeviceFamily::Mos);
        assert_eq!(DeviceFamily::of("NMOS"), DeviceFamily::Mos);
        assert_eq!(DeviceFamily::of("resistor"), DeviceFamily::Resistor);
        assert_eq!(DeviceFamily::of("capacitor"), DeviceFamily::Capacitor);
        assert_eq!(DeviceFamily::of("diode"), DeviceFamily::Diode);
        assert_eq!(DeviceFamily::of("juncap200"), DeviceFamily::Diode);
        assert_eq!(DeviceFamily::of("vbic"), DeviceFamily::Bipolar);
        assert_eq!(DeviceFamily::of("vsource"), DeviceFamily::Subcircuit);
        assert_eq!(DeviceFamily::of(""), DeviceFamily::Subcircuit);
    }

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder("bsim4"));
        assert!(is_placeholder("psp103"));
        assert!(is_placeholder("vbic"));
        assert!(!is_placeholder("nmos"));
        assert!(!is_placeholder("PNP"));
        assert!(!is_placeholder("resistor"));
    }

    #[test]
    fn test_canonical_type() {
        assert_eq!(canonical_type("resistor"), "r");
        assert_eq!(canonical_type("Diode"), "d");
        assert_eq!(canonical_type("nmos"), "nmos");
    }

    #[test]
    fn test_resolution_order() {
        let symbols = SymbolTable::scan("subckt inv (a y)\nmodel nch bsim4 {\nmodel rp resistor\n");
        let options = S2SOptions::default();
        let resolver = PrefixResolver::new(&symbols, &options);

        assert_eq!(resolver.resolve("i1", "inv", None).prefix, 'x');
        assert_eq!(resolver.resolve("n1", "nch", None).prefix, 'm');
        assert_eq!(resolver.resolve("r1", "rp", None).prefix, 'r');
        assert_eq!(resolver.resolve("i2", "inv", Some(DeviceFamily::Diode)).prefix, 'd');

        let raw = resolver.resolve("rload", "resistor", None);
        assert_eq!(raw.prefix, 'r');
        assert!(raw.drop_reference);
        assert!(raw.warning.is_none());

        let unknown = resolver.resolve("u1", "mystery", None);
        assert_eq!(unknown.prefix, 'x');
        assert!(unknown.warning.is_some());
    }

    #[test]
    fn test_prefixed() {
        assert_eq!(prefixed("nch_1", 'm'), "mnch_1");
        assert_eq!(prefixed("M1", 'm'), "M1");
        assert_eq!(prefixed("xi1", 'x'), "xi1");
    }

    #[test]
    fn test_render_call() {
        let call = DeviceCall {
            instance: "load".to_string(),
            pins: vec!["n1".to_string(), "n2".to_string()],
            reference: "resistor".to_string(),
            params: ParamLine {
                lead: Lead::None,
                pieces: Vec::new(),
                open: OpenValue::Closed,
            },
            tail: vec![TailLine::Verbatim("* note".to_string())],
            line: 3,
        };
        let resolution = Resolution {
            prefix: 'r',
            drop_reference: true,
            warning: None,
        };
        assert_eq!(call.render(&resolution), vec!["rload n1 n2", "* note"]);
    }
}
