//! Statement classification
//!
//! Several statement shapes overlap (a Spectre device call and a `subckt`
//! line both look like `name (nodes) ...`), so classification is one ordered
//! list of checks and the first match wins.

use lazy_static::lazy_static;
use regex::Regex;

use super::context::{Dialect, S2SOptions};
use super::prescan::SymbolTable;
use super::source::LogicalStatement;

#[cfg(test)]
mod tests;

lazy_static! {
    static ref SIMULATOR: Regex = Regex::new(r"^simulator\b\s*(?:lang\s*=\s*(\w+))?").unwrap();
    static ref SPECTRE_PARAMS: Regex = Regex::new(r"^(?:parameters\b|params?:)").unwrap();
    static ref DOT_PARAM: Regex = Regex::new(r"^(?i:\.param)(?:\s|$)").unwrap();
    static ref STATISTICS: Regex = Regex::new(r"^statistics\s*\{").unwrap();
    static ref SPECTRE_MODEL: Regex =
        Regex::new(r"^model\s+(\S+)\s+([^\s{]+)\s*(\{)?\s*(.*)$").unwrap();
    static ref DOT_MODEL: Regex = Regex::new(r"^(?i:\.model)\s+(\S+)\s+([^\s(]+)\s*(.*)$").unwrap();
    static ref BIN_HEADER: Regex = Regex::new(r"^(\d+)\s*:\s*(.*)$").unwrap();
    static ref SPECTRE_ENDS: Regex = Regex::new(r"^ends\b\s*(\S+)?").unwrap();
    static ref DOT_ENDS: Regex = Regex::new(r"^(?i:\.ends)\b\s*(\S+)?").unwrap();
    static ref SPECTRE_SUBCKT: Regex =
        Regex::new(r"^(?:inline\s+)?subckt\s+([^\s(]+)\s*(.*)$").unwrap();
    static ref DOT_SUBCKT: Regex = Regex::new(r"^(?i:\.subckt)\s+([^\s(]+)\s*(.*)$").unwrap();
    static ref INCLUDE: Regex =
        Regex::new(r#"^include\s+("[^"]*"|\S+)\s*(?:section\s*=\s*(\S+))?\s*$"#).unwrap();
    static ref SECTION: Regex = Regex::new(r"^(section|endsection)\b\s*(\S+)?").unwrap();
    static ref GLOBAL: Regex = Regex::new(r"^global\b\s*(.*)$").unwrap();
    static ref UNSUPPORTED: Regex = Regex::new(r"^(?:ahdl_include|library|endlibrary)\b").unwrap();
    static ref PAREN_CALL: Regex =
        Regex::new(r"^([A-Za-z0-9_][^\s(]*)\s*\(([^)]*)\)\s*(.*)$").unwrap();
    static ref FIRST_ASSIGNMENT: Regex = Regex::new(r"[^\s=]+\s*=").unwrap();
}

/// How a subcircuit header was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubcircuitForm {
    /// `subckt name (pins...)`, the pin list may span lines
    SpectreParen,
    /// `subckt name pins...`
    SpectreBare,
    /// `.subckt name pins... params...`
    Spice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcircuitHead {
    pub name: String,
    /// Head line text after the name
    pub rest: String,
    pub form: SubcircuitForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHead {
    pub name: String,
    pub keyword: String,
    /// Head line text after the type keyword and any opening delimiter
    pub rest: String,
    /// Spectre `model ... {` block
    pub braced: bool,
    /// SPICE `.model name type (params)` with an opening parenthesis removed
    pub parenthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHead {
    pub instance: String,
    pub pins: Vec<String>,
    pub reference: String,
    /// Parameter text following the reference
    pub params: String,
    /// Code lines of the statement used by the head
    pub consumed: usize,
}

/// Kind of one logical statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `simulator lang=...`; `None` for other simulator options
    Simulator(Option<Dialect>),
    Parameters,
    Statistics,
    ModelOpen(ModelHead),
    BinHeader { index: u32, rest: String },
    /// `}` closing a model block
    BlockClose,
    SubcircuitClose { name: Option<String> },
    SubcircuitOpen(SubcircuitHead),
    /// Statement rewritten to its SPICE equivalent
    Directive(String),
    DeviceCall(CallHead),
    Other,
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Simulator(_) => "simulator",
            StatementKind::Parameters => "parameters",
            StatementKind::Statistics => "statistics",
            StatementKind::ModelOpen(_) => "model",
            StatementKind::BinHeader { .. } => "bin header",
            StatementKind::BlockClose => "block close",
            StatementKind::SubcircuitClose { .. } => "subcircuit close",
            StatementKind::SubcircuitOpen(_) => "subcircuit open",
            StatementKind::Directive(_) => "directive",
            StatementKind::DeviceCall(_) => "device call",
            StatementKind::Other => "other",
        }
    }
}

/// Prioritized statement classifier
pub struct Classifier<'a> {
    symbols: &'a SymbolTable,
    options: &'a S2SOptions,
}

impl<'a> Classifier<'a> {
    pub fn new(symbols: &'a SymbolTable, options: &'a S2SOptions) -> Self {
        Self { symbols, options }
    }

    pub fn classify(&self, stmt: &LogicalStatement, dialect: Dialect) -> StatementKind {
        let head = stmt.head.content();
        let spectre = dialect == Dialect::Spectre;

        if let Some(caps) = SIMULATOR.captures(head) {
            return StatementKind::Simulator(caps.get(1).and_then(|m| Dialect::from_lang(m.as_str())));
        }

        if DOT_PARAM.is_match(head) || (spectre && SPECTRE_PARAMS.is_match(head)) {
            return StatementKind::Parameters;
        }

        if spectre && STATISTICS.is_match(head) {
            return StatementKind::Statistics;
        }

        if let Some(model) = model_head(head, spectre) {
            return StatementKind::ModelOpen(model);
        }

        if spectre {
            if let Some((index, rest)) = bin_header(head) {
                return StatementKind::BinHeader {
                    index,
                    rest: rest.to_string(),
                };
            }
            if head == "}" {
                return StatementKind::BlockClose;
            }
        }

        let close = DOT_ENDS
            .captures(head)
            .or_else(|| SPECTRE_ENDS.captures(head).filter(|_| spectre));
        if let Some(caps) = close {
            return StatementKind::SubcircuitClose {
                name: caps.get(1).map(|m| m.as_str().to_string()),
            };
        }

        if let Some(open) = subcircuit_head(head, spectre) {
            return StatementKind::SubcircuitOpen(open);
        }

        if spectre {
            if let Some(directive) = directive(head) {
                return StatementKind::Directive(directive);
            }
            if let Some(call) = paren_call(stmt) {
                return StatementKind::DeviceCall(call);
            }
        }

        if let Some(call) = self.bare_call(stmt, spectre) {
            return StatementKind::DeviceCall(call);
        }

        StatementKind::Other
    }

    /// `inst pins... ref params`, accepted only when `ref` is declared in the
    /// file (or, for Spectre, is a built-in element keyword)
    fn bare_call(&self, stmt: &LogicalStatement, spectre: bool) -> Option<CallHead> {
        if !stmt
            .head
            .content()
            .starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        {
            return None;
        }

        let total = stmt.code_lines();
        let consumed = (1..=total)
            .find(|&k| FIRST_ASSIGNMENT.is_match(&stmt.joined(k)))
            .unwrap_or(total);
        let text = stmt.joined(consumed);
        let split = FIRST_ASSIGNMENT.find(&text).map_or(text.len(), |m| m.start());

        let tokens: Vec<String> = text[..split]
            .split_whitespace()
            .filter_map(strip_cdl_slash)
            .collect();
        if tokens.len() < 2 {
            return None;
        }
        let reference = tokens.last()?;
        let known = self.symbols.is_known(reference)
            || (spectre
                && self
                    .options
                    .raw_keyword(reference)
                    .is_some_and(|raw| raw.primitive));
        if !known {
            return None;
        }

        Some(CallHead {
            instance: tokens[0].clone(),
            pins: tokens[1..tokens.len() - 1].to_vec(),
            reference: reference.clone(),
            params: text[split..].trim().to_string(),
            consumed,
        })
    }
}

/// Split `N: rest` into the bin index and the rest
pub fn bin_header(text: &str) -> Option<(u32, &str)> {
    let caps = BIN_HEADER.captures(text.trim())?;
    let index = caps.get(1)?.as_str().parse().ok()?;
    Some((index, caps.get(2)?.as_str()))
}

/// Drop the CDL `/` separating pins from the subcircuit name
fn strip_cdl_slash(token: &str) -> Option<String> {
    match token.strip_prefix('/') {
        Some("") => None,
        Some(rest) => Some(rest.to_string()),
        None => Some(token.to_string()),
    }
}

fn model_head(head: &str, spectre: bool) -> Option<ModelHead> {
    if spectre {
        if let Some(caps) = SPECTRE_MODEL.captures(head) {
            return Some(ModelHead {
                name: caps[1].to_string(),
                keyword: caps[2].to_string(),
                rest: caps[4].to_string(),
                braced: caps.get(3).is_some(),
                parenthesized: false,
            });
        }
    }

    let caps = DOT_MODEL.captures(head)?;
    let rest = caps[3].trim();
    let (rest, parenthesized) = match rest.strip_prefix('(') {
        Some(inner) => (inner.trim_start(), true),
        None => (rest, false),
    };
    Some(ModelHead {
        name: caps[1].to_string(),
        keyword: caps[2].to_string(),
        rest: rest.to_string(),
        braced: false,
        parenthesized,
    })
}

fn subcircuit_head(head: &str, spectre: bool) -> Option<SubcircuitHead> {
    let (caps, dotted) = match DOT_SUBCKT.captures(head) {
        Some(caps) => (caps, true),
        None if spectre => (SPECTRE_SUBCKT.captures(head)?, false),
        None => return None,
    };
    let rest = caps[2].trim().to_string();
    let form = if rest.starts_with('(') {
        SubcircuitForm::SpectreParen
    } else if dotted {
        SubcircuitForm::Spice
    } else {
        SubcircuitForm::SpectreBare
    };
    Some(SubcircuitHead {
        name: caps[1].to_string(),
        rest,
        form,
    })
}

/// Spectre file-structure statements and their SPICE spelling
fn directive(head: &str) -> Option<String> {
    if let Some(caps) = INCLUDE.captures(head) {
        return Some(match caps.get(2) {
            Some(section) => format!(".lib {} {}", &caps[1], section.as_str()),
            None => format!(".include {}", &caps[1]),
        });
    }
    if let Some(caps) = SECTION.captures(head) {
        let keyword = if &caps[1] == "section" { ".lib" } else { ".endl" };
        return Some(match caps.get(2) {
            Some(name) => format!("{} {}", keyword, name.as_str()),
            None => keyword.to_string(),
        });
    }
    if let Some(caps) = GLOBAL.captures(head) {
        let nodes: Vec<&str> = caps[1].split_whitespace().filter(|n| *n != "0").collect();
        return Some(if nodes.is_empty() {
            "* global 0".to_string()
        } else {
            format!(".global {}", nodes.join(" "))
        });
    }
    if UNSUPPORTED.is_match(head) {
        return Some(format!("* {}", head));
    }
    None
}

/// `inst (pins) ref params`, with the pin list possibly spanning lines
fn paren_call(stmt: &LogicalStatement) -> Option<CallHead> {
    let head = stmt.head.content();
    let open = head.find('(')?;
    if head[..open].trim().contains(char::is_whitespace) {
        return None;
    }

    let total = stmt.code_lines();
    let balanced = (1..=total).find(|&k| {
        let text = stmt.joined(k);
        text.matches('(').count() <= text.matches(')').count()
    })?;

    let mut consumed = balanced;
    let reference_missing = PAREN_CALL
        .captures(&stmt.joined(consumed))?
        .get(3)
        .map_or(true, |m| m.as_str().is_empty());
    if reference_missing && consumed < total {
        // reference on the following line
        consumed += 1;
    }

    let text = stmt.joined(consumed);
    let caps = PAREN_CALL.captures(&text)?;
    let after = caps[3].trim();
    let (reference, params) = match after.find(char::is_whitespace) {
        Some(idx) => (&after[..idx], after[idx..].trim()),
        None => (after, ""),
    };
    if reference.is_empty() || reference.contains('=') {
        return None;
    }

    Some(CallHead {
        instance: caps[1].to_string(),
        pins: caps[2].split_whitespace().map(str::to_string).collect(),
        reference: reference.to_string(),
        params: params.to_string(),
        consumed,
    })
}
