//! Subcircuit and model assembly
//!
//! The assembler is the driver of a conversion. It owns the subcircuit or
//! model block currently open and moves through four states:
//!
//! - `Top`: statements go straight to the output
//! - `InPinList`: a Spectre pin list is still waiting for its `)`
//! - `InBody`: statements are buffered into the open subcircuit
//! - `InModelBody`: lines feed a braced model block
//!
//! Device calls inside a subcircuit are buffered and only receive their
//! prefix when the subcircuit closes, so that models declared after the call
//! (and their deferred polarity) are known by then.

use std::mem;

use super::classify::{self, CallHead, Classifier, ModelHead, StatementKind, SubcircuitForm, SubcircuitHead};
use super::context::{Dialect, S2SOptions};
use super::model::{Model, ModelBlock};
use super::params::{
    carried, close_statement, first_assignment, Lead, OpenValue, ParamLine, ParamMode, Reformatter, TailLine,
};
use super::prefix::{DeviceCall, DeviceFamily, PrefixResolver};
use super::prescan::SymbolTable;
use super::source::{Item, LogicalStatement, SourceLine};
use crate::utils::error::ConversionWarning;

#[derive(Debug)]
enum CallEntry {
    Call(DeviceCall),
    Verbatim(String),
}

#[derive(Debug)]
enum ModelEntry {
    Model(Model),
    Verbatim(String),
}

/// An open subcircuit and its buffers
#[derive(Debug)]
struct Subcircuit {
    name: String,
    line: usize,
    /// Pin names, one entry per physical line
    pins: Vec<Vec<String>>,
    /// Header parameter and comment lines following the pins
    header: Vec<String>,
    body: Vec<String>,
    calls: Vec<CallEntry>,
    models: Vec<ModelEntry>,
}

impl Subcircuit {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            pins: Vec::new(),
            header: Vec::new(),
            body: Vec::new(),
            calls: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Buffer a line that has no home of its own next to what precedes it
    fn route(&mut self, text: String) {
        if !self.models.is_empty() {
            self.models.push(ModelEntry::Verbatim(text));
        } else if !self.calls.is_empty() {
            self.calls.push(CallEntry::Verbatim(text));
        } else {
            self.body.push(text);
        }
    }

    /// Add a model; one with the same emitted name is replaced in place
    fn add_model(&mut self, model: Model) {
        let name = model.name();
        let existing = self
            .models
            .iter()
            .position(|e| matches!(e, ModelEntry::Model(m) if m.name().eq_ignore_ascii_case(&name)));
        match existing {
            Some(idx) => self.models[idx] = ModelEntry::Model(model),
            None => self.models.push(ModelEntry::Model(model)),
        }
    }

    fn local_family(&self, reference: &str) -> Option<DeviceFamily> {
        self.models.iter().find_map(|entry| match entry {
            ModelEntry::Model(m) if m.base.eq_ignore_ascii_case(reference) => Some(m.family()),
            _ => None,
        })
    }

    fn header_lines(&self) -> Vec<String> {
        let mut pins = self.pins.iter();
        let mut first = format!(".subckt {}", self.name);
        for pin in pins.next().into_iter().flatten() {
            first.push(' ');
            first.push_str(pin);
        }
        let mut lines = vec![first];
        lines.extend(
            pins.filter(|p| !p.is_empty())
                .map(|p| format!("+ {}", p.join(" "))),
        );
        lines.extend(self.header.iter().cloned());
        lines
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Top,
    InPinList(Subcircuit),
    InBody(Subcircuit),
    InModelBody {
        parent: Option<Subcircuit>,
        block: ModelBlock,
    },
}

/// Streaming statement assembler
pub struct Assembler<'a> {
    classifier: Classifier<'a>,
    resolver: PrefixResolver<'a>,
    reformatter: Reformatter,
    dialect: Dialect,
    state: State,
    statistics_depth: usize,
    output: Vec<String>,
    warnings: Vec<ConversionWarning>,
}

impl<'a> Assembler<'a> {
    pub fn new(symbols: &'a SymbolTable, options: &'a S2SOptions, dialect: Dialect) -> Self {
        Self {
            classifier: Classifier::new(symbols, options),
            resolver: PrefixResolver::new(symbols, options),
            reformatter: Reformatter::new(options),
            dialect,
            state: State::Top,
            statistics_depth: 0,
            output: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, item: Item) {
        match item {
            Item::Line(line) => self.passive(line.verbatim()),
            Item::Statement(stmt) => self.statement(stmt),
        }
    }

    /// Close whatever is still open and return the output lines
    pub fn finish(mut self) -> (Vec<String>, Vec<ConversionWarning>) {
        loop {
            match mem::take(&mut self.state) {
                State::Top => break,
                State::InModelBody { parent, block } => {
                    let warning = ConversionWarning::unterminated("model block", block.name(), "end of input")
                        .at(block.common.line);
                    self.warn(warning);
                    self.state = self.close_model(parent, block);
                }
                State::InPinList(sub) | State::InBody(sub) => {
                    let warning =
                        ConversionWarning::unterminated("subcircuit", &sub.name, "end of input").at(sub.line);
                    self.warn(warning);
                    self.flush(sub, None, 0);
                }
            }
        }
        (self.output, self.warnings)
    }

    fn warn(&mut self, warning: ConversionWarning) {
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }

    /// Comment or blank line: goes to whatever buffer is active
    fn passive(&mut self, text: String) {
        match &mut self.state {
            State::Top => self.output.push(text),
            State::InPinList(sub) => sub.header.push(text),
            State::InBody(sub) => sub.route(text),
            State::InModelBody { block, .. } => block.current().push_verbatim(text),
        }
    }

    fn statement(&mut self, stmt: LogicalStatement) {
        if self.statistics_depth > 0 {
            self.comment_out(&stmt);
            return;
        }

        let kind = self.classifier.classify(&stmt, self.dialect);
        log::debug!(
            "line {}: {} ({:?}): {}",
            stmt.line_number(),
            kind.name(),
            self.dialect,
            stmt.head.content()
        );

        match kind {
            StatementKind::Simulator(lang) => {
                if let Some(dialect) = lang {
                    self.dialect = dialect;
                }
            }
            StatementKind::Statistics => self.comment_out(&stmt),
            kind => self.dispatch(stmt, kind),
        }
    }

    fn dispatch(&mut self, stmt: LogicalStatement, kind: StatementKind) {
        self.state = match mem::take(&mut self.state) {
            State::Top => self.at_top(stmt, kind),
            State::InPinList(sub) => self.in_pin_list(sub, stmt, kind),
            State::InBody(sub) => self.in_body(sub, stmt, kind),
            State::InModelBody { parent, block } => self.in_model(parent, block, stmt, kind),
        };
    }

    /// Comment out a `statistics { ... }` block, counting braces
    fn comment_out(&mut self, stmt: &LogicalStatement) {
        let mut depth = self.statistics_depth as isize;
        for line in stmt.lines() {
            if line.is_code() {
                let text = line.text.trim();
                depth += text.matches('{').count() as isize - text.matches('}').count() as isize;
                self.passive(format!("* {}", text));
            } else {
                self.passive(line.verbatim());
            }
        }
        self.statistics_depth = depth.max(0) as usize;
    }

    fn at_top(&mut self, stmt: LogicalStatement, kind: StatementKind) -> State {
        match kind {
            StatementKind::Parameters => {
                let (_, lines) = self.parameter_lines(&stmt, ParamMode::TopLevel);
                self.output.extend(lines);
            }
            StatementKind::ModelOpen(head) => return self.open_model(None, head, &stmt),
            StatementKind::SubcircuitOpen(head) => return self.open_subcircuit(head, &stmt),
            StatementKind::SubcircuitClose { name } => {
                self.warn(ConversionWarning::unmatched_close(name.as_deref()).at(stmt.line_number()));
                self.output.extend(verbatim(&stmt));
            }
            StatementKind::BinHeader { .. } | StatementKind::BlockClose => {
                self.warn(
                    ConversionWarning::malformed(stmt.head.content(), "outside a model block")
                        .at(stmt.line_number()),
                );
                self.output.extend(verbatim(&stmt));
            }
            StatementKind::Directive(text) => {
                self.output.push(text);
                self.output.extend(stmt.tail.iter().map(SourceLine::verbatim));
            }
            StatementKind::DeviceCall(head) => {
                let call = self.build_call(head, &stmt);
                let mut resolution = self.resolver.resolve(&call.instance, &call.reference, None);
                if let Some(warning) = resolution.warning.take() {
                    self.warn(warning.at(call.line));
                }
                self.output.extend(call.render(&resolution));
            }
            _ => {
                self.check_other(&stmt);
                self.output.extend(verbatim(&stmt));
            }
        }
        State::Top
    }

    fn in_pin_list(&mut self, mut sub: Subcircuit, stmt: LogicalStatement, kind: StatementKind) -> State {
        if matches!(kind, StatementKind::SubcircuitClose { .. }) {
            return self.in_body(sub, stmt, kind);
        }
        let mut run = Vec::new();
        let closed = self.pin_lines(&mut sub, stmt.lines(), false, &mut run);
        self.push_header(&mut sub, run, stmt.line_number());
        if closed {
            State::InBody(sub)
        } else {
            State::InPinList(sub)
        }
    }

    fn in_body(&mut self, mut sub: Subcircuit, stmt: LogicalStatement, kind: StatementKind) -> State {
        match kind {
            StatementKind::Parameters => {
                let (lead, lines) = self.parameter_lines(&stmt, ParamMode::SubcircuitLocal);
                if lead == Lead::Param {
                    sub.body.extend(lines);
                } else {
                    sub.header.extend(lines);
                }
            }
            StatementKind::ModelOpen(head) => return self.open_model(Some(sub), head, &stmt),
            StatementKind::SubcircuitClose { name } => {
                self.flush(sub, name.as_deref(), stmt.line_number());
                self.output.extend(stmt.tail.iter().map(SourceLine::verbatim));
                return State::Top;
            }
            StatementKind::SubcircuitOpen(head) => {
                self.warn(ConversionWarning::nested_subcircuit(&head.name, &sub.name).at(stmt.line_number()));
                sub.body.extend(verbatim(&stmt));
            }
            StatementKind::BinHeader { .. } | StatementKind::BlockClose => {
                self.warn(
                    ConversionWarning::malformed(stmt.head.content(), "outside a model block")
                        .at(stmt.line_number()),
                );
                for line in verbatim(&stmt) {
                    sub.route(line);
                }
            }
            StatementKind::Directive(text) => {
                sub.body.push(text);
                sub.body.extend(stmt.tail.iter().map(SourceLine::verbatim));
            }
            StatementKind::DeviceCall(head) => {
                let call = self.build_call(head, &stmt);
                sub.calls.push(CallEntry::Call(call));
            }
            _ => {
                self.check_other(&stmt);
                for line in verbatim(&stmt) {
                    sub.route(line);
                }
            }
        }
        State::InBody(sub)
    }

    fn in_model(
        &mut self,
        parent: Option<Subcircuit>,
        mut block: ModelBlock,
        stmt: LogicalStatement,
        kind: StatementKind,
    ) -> State {
        match kind {
            StatementKind::BlockClose => {
                let state = self.close_model(parent, block);
                self.state = state;
                for line in stmt.tail.iter().map(SourceLine::verbatim) {
                    self.passive(line);
                }
                mem::take(&mut self.state)
            }
            StatementKind::SubcircuitOpen(_)
            | StatementKind::SubcircuitClose { .. }
            | StatementKind::ModelOpen(_) => {
                let warning = ConversionWarning::unterminated("model block", block.name(), kind.name())
                    .at(stmt.line_number());
                self.warn(warning);
                self.state = self.close_model(parent, block);
                self.dispatch(stmt, kind);
                mem::take(&mut self.state)
            }
            _ => {
                let mut closed = false;
                let mut after_close = Vec::new();
                for line in stmt.lines() {
                    if closed {
                        after_close.push(line.verbatim());
                    } else if line.is_code() {
                        closed = self.model_text(&mut block, line.content(), line.number);
                    } else {
                        block.current().push_verbatim(line.verbatim());
                    }
                }
                if !closed {
                    return State::InModelBody { parent, block };
                }
                self.state = self.close_model(parent, block);
                for line in after_close {
                    self.passive(line);
                }
                mem::take(&mut self.state)
            }
        }
    }

    /// One code line of a braced model body; returns true if it closes the block
    fn model_text(&self, block: &mut ModelBlock, text: &str, line: usize) -> bool {
        let (text, closes) = split_block_close(text, block.carry);
        let text = text.trim();
        if text.is_empty() {
            return closes;
        }

        match classify::bin_header(text).filter(|_| !block.carry.is_open()) {
            Some((index, rest)) => {
                let params = self.reformatter.assignments(rest, ParamMode::ModelBody, OpenValue::Closed);
                block.carry = params.open;
                block.open_bin(index, params, line);
            }
            None => {
                let params = self.reformatter.continuation(text, ParamMode::ModelBody, block.carry);
                block.carry = params.open;
                block.current().push_params(params);
            }
        }
        closes
    }

    fn open_subcircuit(&mut self, head: SubcircuitHead, stmt: &LogicalStatement) -> State {
        let mut sub = Subcircuit::new(head.name, stmt.line_number());
        let mut run = Vec::new();
        let closed = match head.form {
            SubcircuitForm::SpectreParen => {
                let closed = self.absorb_pins(&mut sub, &head.rest, &mut run);
                self.pin_lines(&mut sub, stmt.tail.iter(), closed, &mut run)
            }
            SubcircuitForm::Spice | SubcircuitForm::SpectreBare => {
                self.bare_header(&mut sub, &head.rest, &stmt.tail, &mut run);
                true
            }
        };
        self.push_header(&mut sub, run, stmt.line_number());
        if closed {
            State::InBody(sub)
        } else {
            State::InPinList(sub)
        }
    }

    /// Header without parentheses: pins run up to the first assignment
    fn bare_header(&self, sub: &mut Subcircuit, rest: &str, tail: &[SourceLine], run: &mut Vec<TailLine>) {
        let mut in_params = false;
        self.header_text(sub, rest, &mut in_params, run);
        for line in tail {
            if line.is_code() {
                self.header_text(sub, line.content(), &mut in_params, run);
            } else {
                run.push(TailLine::Verbatim(line.verbatim()));
            }
        }
    }

    fn header_text(&self, sub: &mut Subcircuit, text: &str, in_params: &mut bool, run: &mut Vec<TailLine>) {
        let carry = carried(run);
        let split = if *in_params || carry.is_open() {
            0
        } else {
            first_assignment(text).unwrap_or(text.len())
        };
        let (pins, params) = text.split_at(split);
        let pins: Vec<String> = pins.split_whitespace().filter_map(header_pin).collect();
        if !pins.is_empty() || sub.pins.is_empty() {
            sub.pins.push(pins);
        }
        if !params.trim().is_empty() {
            *in_params = true;
            let params = self
                .reformatter
                .assignments(params, ParamMode::SubcircuitLocal, carry)
                .with_lead(Lead::Continuation);
            run.push(TailLine::Params(params));
        }
    }

    /// Feed pin-list lines; returns true once the closing `)` has been seen
    fn pin_lines<'l>(
        &self,
        sub: &mut Subcircuit,
        lines: impl Iterator<Item = &'l SourceLine>,
        mut closed: bool,
        run: &mut Vec<TailLine>,
    ) -> bool {
        for line in lines {
            if !line.is_code() {
                run.push(TailLine::Verbatim(line.verbatim()));
            } else if closed {
                let params = self
                    .reformatter
                    .continuation(&line.text, ParamMode::SubcircuitLocal, carried(run));
                run.push(TailLine::Params(params));
            } else {
                closed = self.absorb_pins(sub, line.content(), run);
            }
        }
        closed
    }

    /// Take pins from one line of a Spectre pin list
    fn absorb_pins(&self, sub: &mut Subcircuit, text: &str, run: &mut Vec<TailLine>) -> bool {
        let (pins, residue) = match text.find(')') {
            Some(idx) => (&text[..idx], Some(text[idx + 1..].trim())),
            None => (text, None),
        };
        sub.pins.push(
            pins.split(|c: char| c.is_whitespace() || c == '(')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        );

        match residue {
            Some(residue) => {
                if !residue.is_empty() {
                    let params = self
                        .reformatter
                        .assignments(residue, ParamMode::SubcircuitLocal, OpenValue::Closed)
                        .with_lead(Lead::Continuation);
                    run.push(TailLine::Params(params));
                }
                true
            }
            None => false,
        }
    }

    /// Buffer the header lines of one statement, closing any open value
    fn push_header(&mut self, sub: &mut Subcircuit, mut run: Vec<TailLine>, line: usize) {
        self.close_params(run.iter_mut().filter_map(TailLine::params_mut), line);
        sub.header.extend(run.iter().map(TailLine::render));
    }

    fn close_params<'p>(&mut self, lines: impl Iterator<Item = &'p mut ParamLine>, line: usize) {
        if close_statement(lines) {
            self.warn(ConversionWarning::unclosed_value().at(line));
        }
    }

    fn open_model(&mut self, parent: Option<Subcircuit>, head: ModelHead, stmt: &LogicalStatement) -> State {
        let line = stmt.line_number();

        if head.braced {
            let mut block = ModelBlock::new(&head.name, &head.keyword, line);
            let mut closed = self.model_text(&mut block, &head.rest, line);
            let mut after_close = Vec::new();
            for source in &stmt.tail {
                if closed {
                    after_close.push(source.verbatim());
                } else if source.is_code() {
                    closed = self.model_text(&mut block, source.content(), source.number);
                } else {
                    block.current().push_verbatim(source.verbatim());
                }
            }
            if !closed {
                return State::InModelBody { parent, block };
            }
            self.state = self.close_model(parent, block);
            for text in after_close {
                self.passive(text);
            }
            return mem::take(&mut self.state);
        }

        let mut texts: Vec<(bool, String)> = vec![(true, head.rest.clone())];
        texts.extend(stmt.tail.iter().map(|l| {
            if l.is_code() {
                (true, l.content().to_string())
            } else {
                (false, l.verbatim())
            }
        }));
        if head.parenthesized {
            strip_closing_paren(&mut texts);
        }

        let mut model = Model::new(head.name, &head.keyword, line);
        let mut texts = texts.into_iter();
        let first = texts.next().map(|(_, text)| text).unwrap_or_default();
        let inline = self
            .reformatter
            .assignments(&first, ParamMode::ModelBody, OpenValue::Closed);
        let mut carry = inline.open;
        model.set_inline(inline);
        for (is_code, text) in texts {
            if is_code {
                let params = self.reformatter.continuation(&text, ParamMode::ModelBody, carry);
                carry = params.open;
                model.push_params(params);
            } else {
                model.push_verbatim(text);
            }
        }
        if model.close_open_value() {
            self.warn(ConversionWarning::unclosed_value().at(line));
        }

        match parent {
            Some(mut sub) => {
                sub.add_model(model);
                State::InBody(sub)
            }
            None => {
                self.emit_model(&model);
                State::Top
            }
        }
    }

    fn close_model(&mut self, parent: Option<Subcircuit>, mut block: ModelBlock) -> State {
        if block.close_open_value() {
            let line = block.current().line;
            self.warn(ConversionWarning::unclosed_value().at(line));
        }
        let models = block.close();
        match parent {
            Some(mut sub) => {
                for model in models {
                    sub.add_model(model);
                }
                State::InBody(sub)
            }
            None => {
                for model in &models {
                    self.emit_model(model);
                }
                State::Top
            }
        }
    }

    fn emit_model(&mut self, model: &Model) {
        let (lines, warning) = model.render();
        self.output.extend(lines);
        if let Some(warning) = warning {
            self.warn(warning);
        }
    }

    /// Emit a closed subcircuit with every buffered call resolved
    fn flush(&mut self, sub: Subcircuit, close_name: Option<&str>, line: usize) {
        if let Some(name) = close_name {
            if !name.eq_ignore_ascii_case(&sub.name) {
                self.warn(ConversionWarning::mismatched_close(&sub.name, name).at(line));
            }
        }

        let mut lines = sub.header_lines();
        lines.extend(sub.body.iter().cloned());

        for entry in &sub.calls {
            match entry {
                CallEntry::Call(call) => {
                    let local = sub.local_family(&call.reference);
                    let mut resolution = self.resolver.resolve(&call.instance, &call.reference, local);
                    if let Some(warning) = resolution.warning.take() {
                        self.warn(warning.at(call.line));
                    }
                    lines.extend(call.render(&resolution));
                }
                CallEntry::Verbatim(text) => lines.push(text.clone()),
            }
        }

        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }

        for entry in &sub.models {
            match entry {
                ModelEntry::Model(model) => {
                    let (rendered, warning) = model.render();
                    lines.extend(rendered);
                    if let Some(warning) = warning {
                        self.warn(warning);
                    }
                }
                ModelEntry::Verbatim(text) => lines.push(text.clone()),
            }
        }

        lines.push(format!(".ends {}", sub.name));
        log::debug!(
            "subcircuit {} closed: {} call(s), {} model entries",
            sub.name,
            sub.calls.len(),
            sub.models.len()
        );
        self.output.extend(lines);
    }

    fn build_call(&mut self, head: CallHead, stmt: &LogicalStatement) -> DeviceCall {
        let mut params = self
            .reformatter
            .assignments(&head.params, ParamMode::DeviceCall, OpenValue::Closed);
        let mut carry = params.open;

        let mut tail = Vec::new();
        let mut code_seen = 0;
        for line in stmt.lines() {
            if !line.is_code() {
                tail.push(TailLine::Verbatim(line.verbatim()));
                continue;
            }
            code_seen += 1;
            if code_seen <= head.consumed {
                continue;
            }
            let line = self.reformatter.continuation(&line.text, ParamMode::DeviceCall, carry);
            carry = line.open;
            tail.push(TailLine::Params(line));
        }
        let lines = std::iter::once(&mut params).chain(tail.iter_mut().filter_map(TailLine::params_mut));
        self.close_params(lines, stmt.line_number());

        DeviceCall {
            instance: head.instance,
            pins: head.pins,
            reference: head.reference,
            params,
            tail,
            line: stmt.line_number(),
        }
    }

    /// Reformat a parameter statement; returns the lead of its head line
    fn parameter_lines(&mut self, stmt: &LogicalStatement, mode: ParamMode) -> (Lead, Vec<String>) {
        let head = match self
            .reformatter
            .statement(stmt.head.content(), mode, OpenValue::Closed)
        {
            Some(head) => head,
            None => return (Lead::None, verbatim(stmt)),
        };

        let lead = head.lead;
        let mode = if lead == Lead::Param { ParamMode::TopLevel } else { mode };
        let mut lines = vec![TailLine::Params(head)];
        for line in &stmt.tail {
            if line.is_code() {
                let params = self.reformatter.continuation(&line.text, mode, carried(&lines));
                lines.push(TailLine::Params(params));
            } else {
                lines.push(TailLine::Verbatim(line.verbatim()));
            }
        }
        self.close_params(lines.iter_mut().filter_map(TailLine::params_mut), stmt.line_number());
        (lead, lines.iter().map(TailLine::render).collect())
    }

    fn check_other(&mut self, stmt: &LogicalStatement) {
        let head = stmt.head.content();
        if head.starts_with(|c: char| c.is_ascii_alphabetic() || c == '.' || c == '_') {
            log::debug!("line {}: passed through unchanged", stmt.line_number());
        } else {
            self.warn(ConversionWarning::malformed(head, "unrecognised statement").at(stmt.line_number()));
        }
    }
}

/// A pin name from a header; drops CDL `/` and the `params:` marker
fn header_pin(token: &str) -> Option<String> {
    let token = token.trim_start_matches('/');
    if token.is_empty() || token.eq_ignore_ascii_case("params:") || token.eq_ignore_ascii_case("param:") {
        None
    } else {
        Some(token.to_string())
    }
}

fn verbatim(stmt: &LogicalStatement) -> Vec<String> {
    stmt.lines().map(SourceLine::verbatim).collect()
}

/// Split off a `}` that closes the enclosing model block
fn split_block_close(text: &str, carry: OpenValue) -> (&str, bool) {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('}') {
        return (text, false);
    }
    let carried = match carry {
        OpenValue::Brace(depth) => depth as isize,
        _ => 0,
    };
    let balance = carried + trimmed.matches('{').count() as isize - trimmed.matches('}').count() as isize;
    if balance < 0 {
        (&trimmed[..trimmed.len() - 1], true)
    } else {
        (text, false)
    }
}

/// Remove the `)` closing a parenthesized `.model` parameter list
fn strip_closing_paren(texts: &mut [(bool, String)]) {
    let balance: isize = texts
        .iter()
        .filter(|(is_code, _)| *is_code)
        .map(|(_, t)| t.matches('(').count() as isize - t.matches(')').count() as isize)
        .sum();
    if balance >= 0 {
        return;
    }
    if let Some((_, text)) = texts.iter_mut().rev().find(|(is_code, t)| *is_code && t.trim_end().ends_with(')')) {
        let trimmed = text.trim_end();
        *text = trimmed[..trimmed.len() - 1].trim_end().to_string();
    }
}
