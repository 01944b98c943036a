//! Error handling for spicebridge conversions
//!
//! Only file-level failures are errors. Everything that goes wrong inside a
//! netlist is reported as a [`ConversionWarning`] and the conversion carries on.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Conversion error type
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Source file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Output file could not be written
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Output directory could not be created
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Input directory could not be listed
    #[error("cannot list directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Input path does not exist
    #[error("no such file or directory: {0}")]
    MissingInput(PathBuf),
    /// Invalid configuration file
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl ConvertError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Write {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ConvertError::Config {
            message: message.into(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConvertError>;

/// Kind of warning generated during conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A close statement names a different subcircuit than the open one
    MismatchedClose,
    /// A close statement was found with no subcircuit open
    UnmatchedClose,
    /// A device call references nothing known; emitted as a subcircuit call
    UnresolvedDevice,
    /// A placeholder model type never received a `type=` parameter
    UnresolvedPolarity,
    /// A subcircuit was opened inside another one
    NestedSubcircuit,
    /// A subcircuit or model block was still open when it had to be closed
    UnterminatedBlock,
    /// A line could not be classified and was passed through
    Malformed,
}

impl WarningKind {
    /// Short tag used in diagnostics and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::MismatchedClose => "mismatched close",
            WarningKind::UnmatchedClose => "unmatched close",
            WarningKind::UnresolvedDevice => "unresolved device",
            WarningKind::UnresolvedPolarity => "unresolved polarity",
            WarningKind::NestedSubcircuit => "nested subcircuit",
            WarningKind::UnterminatedBlock => "unterminated block",
            WarningKind::Malformed => "malformed line",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion warnings (non-fatal issues)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    pub kind: WarningKind,
    pub message: String,
    /// Physical source line the warning refers to
    pub line: Option<usize>,
}

impl ConversionWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn mismatched_close(open: &str, close: &str) -> Self {
        Self::new(
            WarningKind::MismatchedClose,
            format!(
                "close names subcircuit '{}' but '{}' is open; closing '{}'",
                close, open, open
            ),
        )
    }

    pub fn unmatched_close(name: Option<&str>) -> Self {
        let message = match name {
            Some(name) => format!("close of subcircuit '{}' with no subcircuit open", name),
            None => "subcircuit close with no subcircuit open".to_string(),
        };
        Self::new(WarningKind::UnmatchedClose, message)
    }

    pub fn unresolved_device(instance: &str, reference: &str) -> Self {
        Self::new(
            WarningKind::UnresolvedDevice,
            format!(
                "device '{}' references unknown '{}'; emitted as subcircuit call",
                instance, reference
            ),
        )
    }

    pub fn nested_subcircuit(inner: &str, outer: &str) -> Self {
        Self::new(
            WarningKind::NestedSubcircuit,
            format!(
                "subcircuit '{}' opened inside '{}'; line passed through",
                inner, outer
            ),
        )
    }

    pub fn unterminated(what: &str, name: &str, closed_by: &str) -> Self {
        Self::new(
            WarningKind::UnterminatedBlock,
            format!("{} '{}' not closed before {}; closed there", what, name, closed_by),
        )
    }

    pub fn malformed(text: &str, reason: &str) -> Self {
        Self::new(
            WarningKind::Malformed,
            format!("{}: '{}' passed through", reason, text.trim()),
        )
    }

    pub fn unclosed_value() -> Self {
        Self::new(
            WarningKind::Malformed,
            "expression still open at end of statement; delimiter closed there",
        )
    }

    pub fn unresolved_polarity(model: &str, placeholder: &str) -> Self {
        Self::new(
            WarningKind::UnresolvedPolarity,
            format!(
                "model '{}' has no type= parameter; keeping type '{}'",
                model, placeholder
            ),
        )
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(l) = self.line {
            write!(f, "[{}] line {}: {}", self.kind, l, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

/// Conversion output with optional warnings
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The converted content
    pub content: String,
    /// Any warnings generated during conversion
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionOutput {
    pub fn new(content: String) -> Self {
        Self {
            content,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(content: String, warnings: Vec<ConversionWarning>) -> Self {
        Self { content, warnings }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
