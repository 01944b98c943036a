//! Parameter expression reformatting
//!
//! Vendor netlists allow undelimited expressions with spaces around
//! operators (`w = 2 * lmin`). The target simulator needs every expression in
//! braces, so each assignment list is re-read here and rendered as
//! `name=value` pieces where only numeric literals and already delimited
//! values stay bare.
//!
//! A value may run across continuation lines. The state left open at the end
//! of a line is returned as an [`OpenValue`] and handed back in for the next
//! line, which then withholds the opening delimiter.

use lazy_static::lazy_static;
use regex::Regex;

use super::context::S2SOptions;

lazy_static! {
    static ref NUMERIC: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?[a-zA-Z]*$").unwrap();
    static ref ASSIGN_HEAD: Regex = Regex::new(r"^([A-Za-z_][\w.\[\]]*)\s*=\s*").unwrap();
    static ref ASSIGN_START: Regex = Regex::new(r"(?:^|\s)([A-Za-z_][\w.\[\]]*\s*=(?:[^=]|$))").unwrap();
    static ref PASSED_NAME: Regex = Regex::new(r"^[A-Za-z_]\w*$").unwrap();
    static ref ROUND_CALL: Regex = Regex::new(r"\bround\s*\(").unwrap();
    static ref INT_TIMES_VAR: Regex = Regex::new(r"^(\d{1,2})\s*\*\s*([A-Za-z_]\w*)$").unwrap();
    static ref VAR_TIMES_INT: Regex = Regex::new(r"^([A-Za-z_]\w*)\s*\*\s*(\d{1,2})$").unwrap();
    static ref SPECTRE_MARKER: Regex = Regex::new(r"^(?:parameters\b|params?:)\s*").unwrap();
    static ref DOT_PARAM_MARKER: Regex = Regex::new(r"^(?i:\.param)(?:\s+|$)").unwrap();
}

/// Operators that leave an expression waiting for another operand
const TRAILING_OPS: &str = "+-*/^(,<>=!&|?:%~";
/// Operators that can only continue an expression started earlier
const LEADING_OPS: &str = "+-*/^),<>=!&|?:%";

/// Where an assignment list appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Top-level block or a dotted `.param` statement
    TopLevel,
    /// Spectre `parameters` statement inside a subcircuit (header defaults)
    SubcircuitLocal,
    /// Parameters after a device call's reference
    DeviceCall,
    /// Parameters inside a model declaration
    ModelBody,
}

/// Value left open at the end of a physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenValue {
    #[default]
    Closed,
    /// Bare expression whose opening brace has been emitted
    Bare { depth: usize },
    /// Brace-delimited value with this many unclosed braces
    Brace(usize),
    /// Quoted value waiting for its closing quote
    Quote(char),
}

impl OpenValue {
    pub fn is_open(&self) -> bool {
        *self != OpenValue::Closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Delimited,
    Bare,
}

/// A value (or the part of one on a single line)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    pub text: String,
    pub kind: ValueKind,
    pub continues_from_previous: bool,
    pub continues_on_next: bool,
}

impl ParamValue {
    fn numeric(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ValueKind::Numeric,
            continues_from_previous: false,
            continues_on_next: false,
        }
    }

    fn delimited(text: impl Into<String>, continues_from_previous: bool, continues_on_next: bool) -> Self {
        Self {
            text: text.into(),
            kind: ValueKind::Delimited,
            continues_from_previous,
            continues_on_next,
        }
    }

    /// Append whatever `open` still owes and stop continuing
    fn close(&mut self, open: OpenValue) {
        match open {
            OpenValue::Closed => {}
            OpenValue::Bare { depth } => self.text.push_str(&")".repeat(depth)),
            OpenValue::Brace(depth) => self.text.push_str(&"}".repeat(depth)),
            OpenValue::Quote(q) => self.text.push(q),
        }
        self.continues_on_next = false;
    }

    fn is_empty_bare(&self) -> bool {
        self.kind == ValueKind::Bare && self.text.is_empty() && !self.continues_from_previous
    }

    pub fn render(&self) -> String {
        match self.kind {
            ValueKind::Numeric | ValueKind::Delimited => self.text.clone(),
            ValueKind::Bare => {
                let open = if self.continues_from_previous { "" } else { "{" };
                let close = if self.continues_on_next { "" } else { "}" };
                format!("{}{}{}", open, self.text, close)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Assign(Assignment),
    /// Rest of a value started on an earlier line
    Fragment(ParamValue),
    /// Inline comment, always starting with `$`
    Comment(String),
}

impl Piece {
    fn render(&self) -> String {
        match self {
            Piece::Assign(a) => format!("{}={}", a.name, a.value.render()),
            Piece::Fragment(v) => v.render(),
            Piece::Comment(c) => c.clone(),
        }
    }
}

/// Leading keyword of a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    /// `.param`
    Param,
    /// `+`
    Continuation,
    None,
}

/// One reformatted physical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLine {
    pub lead: Lead,
    pub pieces: Vec<Piece>,
    /// State to hand to the next physical line
    pub open: OpenValue,
}

impl ParamLine {
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn with_lead(mut self, lead: Lead) -> Self {
        self.lead = lead;
        self
    }

    /// Remove the first assignment named `name` and return its value
    pub fn take(&mut self, name: &str) -> Option<ParamValue> {
        let idx = self.pieces.iter().position(
            |p| matches!(p, Piece::Assign(a) if a.name.eq_ignore_ascii_case(name)),
        )?;
        match self.pieces.remove(idx) {
            Piece::Assign(a) => Some(a.value),
            _ => None,
        }
    }

    /// True if any assignment is named `name`
    pub fn declares(&self, name: &str) -> bool {
        self.pieces
            .iter()
            .any(|p| matches!(p, Piece::Assign(a) if a.name.eq_ignore_ascii_case(name)))
    }

    /// Close a value still open at the end of its statement.
    ///
    /// Returns true if the line was open. A value that never received any
    /// text is turned into a `$` comment instead.
    pub fn close_open_value(&mut self) -> bool {
        let open = std::mem::take(&mut self.open);
        if !open.is_open() {
            return false;
        }
        let last = self
            .pieces
            .iter()
            .rposition(|p| !matches!(p, Piece::Comment(_)));
        let Some(idx) = last else {
            return true;
        };
        let comment = match &mut self.pieces[idx] {
            Piece::Assign(a) if a.value.is_empty_bare() => Some(format!("$ {}=", a.name)),
            Piece::Assign(a) => {
                a.value.close(open);
                None
            }
            Piece::Fragment(v) => {
                v.close(open);
                None
            }
            Piece::Comment(_) => None,
        };
        if let Some(comment) = comment {
            self.pieces[idx] = Piece::Comment(comment);
        }
        true
    }

    pub fn render(&self) -> String {
        let body = self
            .pieces
            .iter()
            .map(Piece::render)
            .collect::<Vec<_>>()
            .join(" ");
        let lead = match self.lead {
            Lead::Param => ".param",
            Lead::Continuation => "+",
            Lead::None => return body,
        };
        if body.is_empty() {
            lead.to_string()
        } else {
            format!("{} {}", lead, body)
        }
    }
}

/// Continuation of a statement: reformatted parameters or a comment kept as is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailLine {
    Params(ParamLine),
    Verbatim(String),
}

impl TailLine {
    pub fn params_mut(&mut self) -> Option<&mut ParamLine> {
        match self {
            TailLine::Params(line) => Some(line),
            TailLine::Verbatim(_) => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            TailLine::Params(line) => line.render(),
            TailLine::Verbatim(text) => text.clone(),
        }
    }
}

/// Open value left by the last parameter line in `lines`
pub fn carried(lines: &[TailLine]) -> OpenValue {
    lines
        .iter()
        .rev()
        .find_map(|line| match line {
            TailLine::Params(params) => Some(params.open),
            TailLine::Verbatim(_) => None,
        })
        .unwrap_or_default()
}

/// Close the value left open by the last parameter line of a statement.
///
/// Returns true if a closing delimiter had to be supplied.
pub fn close_statement<'p>(lines: impl Iterator<Item = &'p mut ParamLine>) -> bool {
    lines.last().is_some_and(ParamLine::close_open_value)
}

/// Byte offset of the first `name=` assignment in `text`
pub fn first_assignment(text: &str) -> Option<usize> {
    ASSIGN_START.captures(text).and_then(|caps| caps.get(1)).map(|m| m.start())
}

/// Parameter expression reformatter
#[derive(Debug, Clone)]
pub struct Reformatter {
    options: S2SOptions,
}

impl Reformatter {
    pub fn new(options: &S2SOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }

    /// Reformat a parameter statement head line.
    ///
    /// Returns `None` if the line does not start with a parameter marker
    /// (`parameters`, `params:`, `param:` or `.param`).
    pub fn statement(&self, line: &str, mode: ParamMode, carry: OpenValue) -> Option<ParamLine> {
        let line = line.trim();
        let (rest, lead, mode) = if let Some(m) = DOT_PARAM_MARKER.find(line) {
            (&line[m.end()..], Lead::Param, ParamMode::TopLevel)
        } else if let Some(m) = SPECTRE_MARKER.find(line) {
            let lead = if mode == ParamMode::SubcircuitLocal {
                Lead::Continuation
            } else {
                Lead::Param
            };
            (&line[m.end()..], lead, mode)
        } else {
            return None;
        };
        Some(self.assignments(rest, mode, carry).with_lead(lead))
    }

    /// Reformat a continuation line; a leading `+` is optional
    pub fn continuation(&self, line: &str, mode: ParamMode, carry: OpenValue) -> ParamLine {
        let line = line.trim();
        let rest = line.strip_prefix('+').unwrap_or(line);
        self.assignments(rest, mode, carry).with_lead(Lead::Continuation)
    }

    /// Reformat a raw assignment list with no leading marker
    pub fn assignments(&self, text: &str, mode: ParamMode, carry: OpenValue) -> ParamLine {
        let mut pieces = Vec::new();
        let mut rest = text.trim();
        let mut open = OpenValue::Closed;

        if carry.is_open() {
            let (fragment, still_open, remainder) = self.continue_value(rest, carry);
            pieces.push(Piece::Fragment(fragment));
            open = still_open;
            rest = remainder;
        }

        let mut passing = mode == ParamMode::SubcircuitLocal;
        let mut empty = Vec::new();
        while !open.is_open() {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if let Some((name, after)) = split_assignment(rest) {
                if after.starts_with('$') || split_assignment(after).is_some() {
                    // `a= b=1`: no value, and `b=1` is not one
                    empty.push(format!("{}=", name));
                    rest = after;
                    passing = false;
                    continue;
                }
                let (value, value_open, remainder) = self.read_value(name, after);
                log::trace!("assignment {}={}", name, value.render());
                pieces.push(Piece::Assign(Assignment {
                    name: name.to_string(),
                    value,
                }));
                open = value_open;
                rest = remainder;
                passing = false;
                continue;
            }

            let (token, after) = split_token(rest);
            if passing && PASSED_NAME.is_match(token) {
                pieces.push(Piece::Assign(Assignment {
                    name: token.to_string(),
                    value: ParamValue::numeric("1"),
                }));
                rest = after;
                continue;
            }

            pieces.push(Piece::Comment(residue_comment(rest)));
            break;
        }

        if !empty.is_empty() {
            if open.is_open() {
                log::debug!("dropping empty assignment(s) {}", empty.join(" "));
            } else {
                pieces.push(Piece::Comment(format!("$ {}", empty.join(" "))));
            }
        }

        ParamLine {
            lead: Lead::None,
            pieces,
            open,
        }
    }

    /// Consume the part of a value carried over from the previous line
    fn continue_value<'s>(&self, s: &'s str, carry: OpenValue) -> (ParamValue, OpenValue, &'s str) {
        match carry {
            OpenValue::Closed => (ParamValue::delimited("", false, false), OpenValue::Closed, s),
            OpenValue::Brace(depth) => match close_brace(s, depth) {
                Ok(end) => (
                    ParamValue::delimited(&s[..=end], true, false),
                    OpenValue::Closed,
                    &s[end + 1..],
                ),
                Err(depth) => (
                    ParamValue::delimited(s, true, true),
                    OpenValue::Brace(depth),
                    "",
                ),
            },
            OpenValue::Quote(q) => match s.find(q) {
                Some(end) => (
                    ParamValue::delimited(&s[..=end], true, false),
                    OpenValue::Closed,
                    &s[end + 1..],
                ),
                None => (ParamValue::delimited(s, true, true), OpenValue::Quote(q), ""),
            },
            OpenValue::Bare { depth } => {
                if s.is_empty() || s.starts_with('$') || split_assignment(s).is_some() {
                    // Nothing continues the expression; close it here
                    let value = ParamValue {
                        text: String::new(),
                        kind: ValueKind::Bare,
                        continues_from_previous: true,
                        continues_on_next: false,
                    };
                    return (value, OpenValue::Closed, s);
                }
                let (text, depth, remainder) = read_bare(String::new(), s, depth);
                let (value, open) = self.finish_bare("", text, depth, true);
                (value, open, remainder)
            }
        }
    }

    fn read_value<'s>(&self, name: &str, s: &'s str) -> (ParamValue, OpenValue, &'s str) {
        match s.chars().next() {
            None => {
                let (value, open) = self.finish_bare(name, String::new(), 0, false);
                (value, open, "")
            }
            Some('{') => match close_brace(s, 0) {
                Ok(end) => {
                    let after = &s[end + 1..];
                    if after.chars().next().is_some_and(|c| LEADING_OPS.contains(c)) {
                        // `{a}*2` is no longer delimited as a whole
                        let text = format!("({})", &s[1..end]);
                        let depth = paren_depth(&text, 0);
                        let (text, depth, remainder) = read_bare(text, after, depth);
                        let (value, open) = self.finish_bare(name, text, depth, false);
                        return (value, open, remainder);
                    }
                    (self.finish_braced(&s[..=end]), OpenValue::Closed, after)
                }
                Err(depth) => (
                    ParamValue::delimited(ROUND_CALL.replace_all(s, "floor(0.5+"), false, true),
                    OpenValue::Brace(depth),
                    "",
                ),
            },
            Some(q @ ('"' | '\'')) => match s[1..].find(q) {
                Some(idx) => {
                    let end = idx + 1;
                    (
                        ParamValue::delimited(&s[..=end], false, false),
                        OpenValue::Closed,
                        &s[end + 1..],
                    )
                }
                None => (ParamValue::delimited(s, false, true), OpenValue::Quote(q), ""),
            },
            Some(_) => {
                let (text, depth, remainder) = read_bare(String::new(), s, 0);
                let (value, open) = self.finish_bare(name, text, depth, false);
                (value, open, remainder)
            }
        }
    }

    fn finish_braced(&self, text: &str) -> ParamValue {
        let inner = &text[1..text.len() - 1];
        if let Some(n) = self.fold_multiplicity(inner.trim()) {
            return ParamValue::numeric(n);
        }
        ParamValue::delimited(ROUND_CALL.replace_all(text, "floor(0.5+"), false, false)
    }

    fn finish_bare(&self, name: &str, text: String, depth: usize, from_previous: bool) -> (ParamValue, OpenValue) {
        let text = ROUND_CALL.replace_all(&text, "floor(0.5+").into_owned();
        if !from_previous {
            if self.options.is_yes_no_switch(name) {
                if text.eq_ignore_ascii_case("yes") {
                    return (ParamValue::numeric("1"), OpenValue::Closed);
                }
                if text.eq_ignore_ascii_case("no") {
                    return (ParamValue::numeric("0"), OpenValue::Closed);
                }
            }
            if NUMERIC.is_match(&text) {
                return (ParamValue::numeric(text), OpenValue::Closed);
            }
            if let Some(n) = self.fold_multiplicity(&text) {
                return (ParamValue::numeric(n), OpenValue::Closed);
            }
        }

        let continues = text.is_empty() || depth > 0 || ends_with_op(&text);
        let open = if continues {
            OpenValue::Bare { depth }
        } else {
            OpenValue::Closed
        };
        let value = ParamValue {
            text,
            kind: ValueKind::Bare,
            continues_from_previous: from_previous,
            continues_on_next: continues,
        };
        (value, open)
    }

    /// `2*m` or `m*2` with the multiplicity variable folds to the integer
    fn fold_multiplicity(&self, text: &str) -> Option<String> {
        if let Some(caps) = INT_TIMES_VAR.captures(text) {
            if caps[2] == *self.options.multiplicity_var {
                return Some(caps[1].to_string());
            }
        }
        if let Some(caps) = VAR_TIMES_INT.captures(text) {
            if caps[1] == *self.options.multiplicity_var {
                return Some(caps[2].to_string());
            }
        }
        None
    }
}

/// Split `name = rest` off the front of `s`
fn split_assignment(s: &str) -> Option<(&str, &str)> {
    let caps = ASSIGN_HEAD.captures(s)?;
    let whole = caps.get(0)?;
    let eq = s[..whole.end()].rfind('=')?;
    if s[eq + 1..].starts_with('=') {
        return None;
    }
    Some((caps.get(1)?.as_str(), &s[whole.end()..]))
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

fn ends_with_op(text: &str) -> bool {
    text.chars().last().is_some_and(|c| TRAILING_OPS.contains(c))
}

fn paren_depth(text: &str, mut depth: usize) -> usize {
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Extend a bare expression greedily across whitespace.
///
/// The first token is always taken. Later tokens join while the text so far
/// ends with an operator or the token starts with one; a `name=` assignment
/// or a `$` comment always ends the expression.
fn read_bare(mut text: String, s: &str, depth: usize) -> (String, usize, &str) {
    let (first, mut rest) = split_token(s);
    text.push_str(first);

    loop {
        let next = rest.trim_start();
        if next.is_empty() || next.starts_with('$') || split_assignment(next).is_some() {
            break;
        }
        let (token, after) = split_token(next);
        let joins = ends_with_op(&text) || token.chars().next().is_some_and(|c| LEADING_OPS.contains(c));
        if !joins {
            break;
        }
        text.push_str(token);
        rest = after;
    }

    let depth = paren_depth(&text, depth);
    (text, depth, rest)
}

/// Byte index of the brace that brings `depth` back to zero, or the depth
/// still open at the end of `s`
fn close_brace(s: &str, mut depth: usize) -> Result<usize, usize> {
    for (idx, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(depth)
}

fn residue_comment(rest: &str) -> String {
    let rest = rest.trim();
    if rest.starts_with('$') {
        rest.to_string()
    } else {
        format!("$ {}", rest)
    }
}
