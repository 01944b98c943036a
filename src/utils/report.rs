//! Conversion reporting for batch and single-file runs.

use std::path::Path;

use serde::Serialize;

use crate::utils::error::{ConversionResult, ConversionWarning, ConvertError, WarningKind};
use crate::utils::files::write_atomic;

#[derive(Debug, Clone, Serialize)]
pub struct WarningRecord {
    pub kind: WarningKind,
    pub line: Option<usize>,
    pub message: String,
}

impl From<&ConversionWarning> for WarningRecord {
    fn from(warning: &ConversionWarning) -> Self {
        Self {
            kind: warning.kind,
            line: warning.line,
            message: warning.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    Converted,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: String,
    pub output: Option<String>,
    pub status: FileStatus,
    pub warnings: Vec<WarningRecord>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn converted(source: &Path, output: &Path, warnings: &[ConversionWarning]) -> Self {
        Self {
            source: source.display().to_string(),
            output: Some(output.display().to_string()),
            status: FileStatus::Converted,
            warnings: warnings.iter().map(WarningRecord::from).collect(),
            error: None,
        }
    }

    pub fn skipped(source: &Path) -> Self {
        Self {
            source: source.display().to_string(),
            output: None,
            status: FileStatus::Skipped,
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn failed(source: &Path, error: impl Into<String>) -> Self {
        Self {
            source: source.display().to_string(),
            output: None,
            status: FileStatus::Failed,
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub files: Vec<FileReport>,
}

impl ConversionReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        Self { files }
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(FileStatus::Failed) > 0
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.warnings.len()).sum()
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> ConversionResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConvertError::write(path, e.into()))?;
        write_atomic(path, &json)
    }
}
