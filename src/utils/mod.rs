//! Utility modules
//!
//! - Error, warning and result types
//! - Serializable conversion reports
//! - File and directory conversion

pub mod error;
pub mod files;
pub mod report;

// Re-export commonly used items
pub use error::{ConversionOutput, ConversionResult, ConversionWarning, ConvertError, WarningKind};
pub use files::{convert_directory, convert_file, convert_path, default_output_dir};
pub use report::{ConversionReport, FileReport, FileStatus, WarningRecord};
