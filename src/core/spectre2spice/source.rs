//! Netlist source splitting
//!
//! Turns raw netlist text into physical [`SourceLine`]s and then groups them
//! into [`LogicalStatement`]s. This follows the usual netlist rules:
//! - `\r\n` line endings are normalized at the first split
//! - `//` comments become `*` comments, inline `//` becomes `$`
//! - a leading `+`, or a trailing `\` on the previous line, marks a continuation
//! - comments between a statement and its continuation stay inside the statement

/// Classification of a physical line before any parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Code,
    Comment,
    Blank,
}

/// One physical line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the source file
    pub number: usize,
    /// Line text with comment markers translated and trailing `\` removed
    pub text: String,
    pub kind: LineKind,
    /// True if this line extends the previous code line
    pub continuation: bool,
}

impl SourceLine {
    pub fn is_code(&self) -> bool {
        self.kind == LineKind::Code
    }

    /// Text with surrounding whitespace and any leading `+` removed
    pub fn content(&self) -> &str {
        let trimmed = self.text.trim();
        if self.continuation {
            trimmed.strip_prefix('+').unwrap_or(trimmed).trim_start()
        } else {
            trimmed
        }
    }

    /// Text as it should be copied to the output when nothing is changed
    pub fn verbatim(&self) -> String {
        match self.kind {
            LineKind::Code => self.text.clone(),
            LineKind::Comment => self.text.trim().to_string(),
            LineKind::Blank => String::new(),
        }
    }
}

/// A head line plus its continuation lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalStatement {
    pub head: SourceLine,
    /// Continuation lines, with any interleaved comment or blank lines in place
    pub tail: Vec<SourceLine>,
}

impl LogicalStatement {
    pub fn new(head: SourceLine) -> Self {
        Self {
            head,
            tail: Vec::new(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.head.number
    }

    /// All physical lines, head first
    pub fn lines(&self) -> impl Iterator<Item = &SourceLine> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Contents of the head and its code continuations joined by single spaces
    pub fn joined(&self, count: usize) -> String {
        self.lines()
            .filter(|l| l.is_code())
            .take(count)
            .map(|l| l.content())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn code_lines(&self) -> usize {
        self.lines().filter(|l| l.is_code()).count()
    }
}

/// Unit of work handed to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A standalone comment or blank line
    Line(SourceLine),
    Statement(LogicalStatement),
}

/// Split raw input into physical lines
pub fn split_lines(input: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut after_backslash = false;

    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        let raw = raw.trim_end();
        let trimmed = raw.trim_start();

        if trimmed.is_empty() {
            lines.push(SourceLine {
                number,
                text: String::new(),
                kind: LineKind::Blank,
                continuation: false,
            });
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("//") {
            lines.push(SourceLine {
                number,
                text: format!("*{}", rest),
                kind: LineKind::Comment,
                continuation: false,
            });
            continue;
        }

        if trimmed.starts_with('*') {
            lines.push(SourceLine {
                number,
                text: trimmed.to_string(),
                kind: LineKind::Comment,
                continuation: false,
            });
            continue;
        }

        let mut text = translate_inline_comment(raw);
        let continuation = after_backslash || trimmed.starts_with('+');
        after_backslash = false;
        if text.ends_with('\\') {
            text.pop();
            text.truncate(text.trim_end().len());
            after_backslash = true;
        }

        lines.push(SourceLine {
            number,
            text,
            kind: LineKind::Code,
            continuation,
        });
    }

    lines
}

/// Replace the first `//` outside a quoted string by the `$` inline comment marker
fn translate_inline_comment(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut in_quote = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'"' => in_quote = !in_quote,
            b'/' if !in_quote && bytes[i + 1] == b'/' => {
                let left = line[..i].trim_end();
                let right = line[i + 2..].trim();
                return if right.is_empty() {
                    left.to_string()
                } else {
                    format!("{} $ {}", left, right)
                };
            }
            _ => {}
        }
        i += 1;
    }
    line.to_string()
}

/// Group physical lines into standalone comment lines and logical statements
pub fn join_statements(lines: Vec<SourceLine>) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current: Option<LogicalStatement> = None;
    // Comment/blank lines seen after `current`; they only join it if a
    // continuation follows.
    let mut pending: Vec<SourceLine> = Vec::new();

    for line in lines {
        match line.kind {
            LineKind::Comment | LineKind::Blank => {
                if current.is_some() {
                    pending.push(line);
                } else {
                    items.push(Item::Line(line));
                }
            }
            LineKind::Code if line.continuation && current.is_some() => {
                if let Some(stmt) = current.as_mut() {
                    stmt.tail.append(&mut pending);
                    stmt.tail.push(line);
                }
            }
            LineKind::Code => {
                if let Some(stmt) = current.take() {
                    items.push(Item::Statement(stmt));
                }
                items.extend(pending.drain(..).map(Item::Line));
                current = Some(LogicalStatement::new(line));
            }
        }
    }

    if let Some(stmt) = current.take() {
        items.push(Item::Statement(stmt));
    }
    items.extend(pending.into_iter().map(Item::Line));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_translation() {
        let lines = split_lines("// vendor comment\n* spice comment\n\n  r1 (a b) resistor r=1 // trailing\n");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text, "* vendor comment");
        assert_eq!(lines[0].kind, LineKind::Comment);
        assert_eq!(lines[1].text, "* spice comment");
        assert_eq!(lines[2].kind, LineKind::Blank);
        assert_eq!(lines[3].text, "  r1 (a b) resistor r=1 $ trailing");
    }

    #[test]
    fn test_crlf_and_backslash() {
        let lines = split_lines("m1 (d g \\\r\n s b) nch\r\n+ w=1\r\n");
        assert_eq!(lines[0].text, "m1 (d g");
        assert!(!lines[0].continuation);
        assert!(lines[1].continuation);
        assert_eq!(lines[1].content(), "s b) nch");
        assert!(lines[2].continuation);
        assert_eq!(lines[2].content(), "w=1");
    }

    #[test]
    fn test_slashes_in_quotes_survive() {
        let lines = split_lines("include \"models//nfet.scs\"");
        assert_eq!(lines[0].text, "include \"models//nfet.scs\"");
    }

    #[test]
    fn test_join_keeps_interleaved_comments() {
        let items = join_statements(split_lines(
            "parameters a=1\n* note\n+ b=2\n* after\nparameters c=3\n",
        ));
        assert_eq!(items.len(), 3);
        match &items[0] {
            Item::Statement(stmt) => {
                assert_eq!(stmt.head.content(), "parameters a=1");
                assert_eq!(stmt.tail.len(), 2);
                assert_eq!(stmt.tail[0].kind, LineKind::Comment);
                assert_eq!(stmt.code_lines(), 2);
            }
            other => panic!("expected statement, got {:?}", other),
        }
        assert!(matches!(&items[1], Item::Line(l) if l.text == "* after"));
        assert!(matches!(&items[2], Item::Statement(_)));
    }

    #[test]
    fn test_orphan_continuation_starts_statement() {
        let items = join_statements(split_lines("+ w=1\n"));
        assert_eq!(items.len(), 1);
        match &items[0] {
            Item::Statement(stmt) => assert!(stmt.head.continuation),
            other => panic!("expected statement, got {:?}", other),
        }
    }
}
