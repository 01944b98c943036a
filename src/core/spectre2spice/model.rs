//! Model declarations
//!
//! A Spectre model block may declare its type with a keyword that does not
//! fix the transistor polarity (`bsim4`, `psp103`, `vbic`) and supply the
//! polarity later through a `type=` parameter, possibly once per bin. The
//! output type is therefore kept as a [`ModelType::Deferred`] value until the
//! model is rendered.

use indexmap::IndexMap;

use super::params::{close_statement, OpenValue, ParamLine, TailLine};
use super::prefix::{canonical_type, is_placeholder, DeviceFamily};
use crate::utils::error::ConversionWarning;

/// Declared type of a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelType {
    Known(String),
    /// Polarity still to come from a `type=` parameter
    Deferred {
        family: DeviceFamily,
        placeholder: String,
        resolved: Option<String>,
    },
}

impl ModelType {
    pub fn from_keyword(keyword: &str) -> Self {
        if is_placeholder(keyword) {
            ModelType::Deferred {
                family: DeviceFamily::of(keyword),
                placeholder: keyword.to_string(),
                resolved: None,
            }
        } else {
            ModelType::Known(canonical_type(keyword))
        }
    }

    pub fn family(&self) -> DeviceFamily {
        match self {
            ModelType::Known(keyword) => DeviceFamily::of(keyword),
            ModelType::Deferred { family, .. } => *family,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ModelType::Deferred { resolved: None, .. })
    }

    /// Keyword written to the output; the placeholder if never resolved
    pub fn emitted(&self) -> &str {
        match self {
            ModelType::Known(keyword) => keyword,
            ModelType::Deferred {
                resolved: Some(keyword),
                ..
            } => keyword,
            ModelType::Deferred { placeholder, .. } => placeholder,
        }
    }

    fn resolve(&mut self, polarity: &str) {
        if let ModelType::Deferred { resolved, .. } = self {
            *resolved = Some(polarity.to_string());
        }
    }
}

/// Output type keyword for a `type=` value
fn polarity(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "n" | "nmos" => Some("nmos"),
        "p" | "pmos" => Some("pmos"),
        "npn" => Some("npn"),
        "pnp" => Some("pnp"),
        _ => None,
    }
}

/// One `.model` statement of the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub base: String,
    pub bin: Option<u32>,
    pub kind: ModelType,
    /// Parameters on the `.model` line itself
    pub inline: Option<ParamLine>,
    pub lines: Vec<TailLine>,
    pub line: usize,
}

impl Model {
    pub fn new(base: impl Into<String>, keyword: &str, line: usize) -> Self {
        Self {
            base: base.into(),
            bin: None,
            kind: ModelType::from_keyword(keyword),
            inline: None,
            lines: Vec::new(),
            line,
        }
    }

    pub fn binned(mut self, bin: u32) -> Self {
        self.bin = Some(bin);
        self
    }

    /// Name as emitted: `base` or `base.bin`
    pub fn name(&self) -> String {
        match self.bin {
            Some(bin) => format!("{}.{}", self.base, bin),
            None => self.base.clone(),
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.kind.family()
    }

    /// Consume a polarity `type=` assignment from `params`
    fn absorb_type(&mut self, params: &mut ParamLine) {
        let value = params.pieces.iter().find_map(|piece| match piece {
            super::params::Piece::Assign(a) if a.name.eq_ignore_ascii_case("type") => {
                polarity(&a.value.text)
            }
            _ => None,
        });
        if let Some(polarity) = value {
            params.take("type");
            self.kind.resolve(polarity);
        }
    }

    pub fn set_inline(&mut self, mut params: ParamLine) {
        self.absorb_type(&mut params);
        self.inline = Some(params);
    }

    pub fn push_params(&mut self, mut params: ParamLine) {
        self.absorb_type(&mut params);
        self.lines.push(TailLine::Params(params));
    }

    pub fn push_verbatim(&mut self, text: impl Into<String>) {
        self.lines.push(TailLine::Verbatim(text.into()));
    }

    /// Close a value left open by the last parameter line
    pub fn close_open_value(&mut self) -> bool {
        let lines = self
            .inline
            .iter_mut()
            .chain(self.lines.iter_mut().filter_map(TailLine::params_mut));
        close_statement(lines)
    }

    /// Output lines, plus a warning if the polarity never arrived
    pub fn render(&self) -> (Vec<String>, Option<ConversionWarning>) {
        let mut head = format!(".model {} {}", self.name(), self.kind.emitted());
        if let Some(inline) = self.inline.as_ref().filter(|l| !l.is_empty()) {
            head.push(' ');
            head.push_str(&inline.render());
        }

        let mut lines = vec![head];
        for line in &self.lines {
            match line {
                TailLine::Params(params) if params.is_empty() => {}
                other => lines.push(other.render()),
            }
        }

        let warning = match &self.kind {
            ModelType::Deferred {
                placeholder,
                resolved: None,
                ..
            } => Some(ConversionWarning::unresolved_polarity(&self.name(), placeholder).at(self.line)),
            _ => None,
        };
        (lines, warning)
    }
}

/// A braced Spectre model block being read
#[derive(Debug, Clone)]
pub struct ModelBlock {
    /// Model for everything before the first bin header
    pub common: Model,
    pub bins: IndexMap<u32, Model>,
    current: Option<u32>,
    keyword: String,
    /// Value left open by the last line read into the block
    pub carry: OpenValue,
}

impl ModelBlock {
    pub fn new(base: &str, keyword: &str, line: usize) -> Self {
        Self {
            common: Model::new(base, keyword, line),
            bins: IndexMap::new(),
            current: None,
            keyword: keyword.to_string(),
            carry: OpenValue::Closed,
        }
    }

    pub fn name(&self) -> &str {
        &self.common.base
    }

    /// Start bin `index`, replacing any earlier bin with the same index
    pub fn open_bin(&mut self, index: u32, params: ParamLine, line: usize) {
        let mut model = Model::new(self.common.base.clone(), &self.keyword, line).binned(index);
        model.set_inline(params);
        if self.bins.insert(index, model).is_some() {
            log::debug!("model {} bin {} redefined", self.common.base, index);
        }
        self.current = Some(index);
    }

    /// Model currently receiving lines
    pub fn current(&mut self) -> &mut Model {
        match self.current.and_then(|idx| self.bins.get_mut(&idx)) {
            Some(model) => model,
            None => &mut self.common,
        }
    }

    /// Close a value still open when the block ends
    pub fn close_open_value(&mut self) -> bool {
        if !std::mem::take(&mut self.carry).is_open() {
            return false;
        }
        self.current().close_open_value()
    }

    /// Finish the block; parameters shared by all bins are copied into each
    pub fn close(self) -> Vec<Model> {
        let ModelBlock { common, bins, .. } = self;
        if bins.is_empty() {
            return vec![common];
        }

        let mut shared = Vec::new();
        if let Some(inline) = common.inline.clone().filter(|l| !l.is_empty()) {
            shared.push(TailLine::Params(inline.with_lead(super::params::Lead::Continuation)));
        }
        shared.extend(common.lines.iter().cloned());

        bins.into_values()
            .map(|mut model| {
                if !model.kind.is_resolved() && common.kind.is_resolved() {
                    model.kind = common.kind.clone();
                }
                let mut lines = shared.clone();
                lines.append(&mut model.lines);
                model.lines = lines;
                model
            })
            .collect()
    }
}
