//! File and directory conversion
//!
//! Output is written to a temporary file next to the destination and then
//! renamed over it, so an in-place conversion never leaves a half-written
//! netlist behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::core::spectre2spice::Transpiler;
use crate::utils::error::{ConversionOutput, ConversionResult, ConvertError};
use crate::utils::report::{ConversionReport, FileReport};

/// Replace `path` with `content` through a temp file in the same directory
pub fn write_atomic(path: &Path, content: &str) -> ConversionResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ConvertError::write(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| ConvertError::write(path, e))?;
    tmp.persist(path).map_err(|e| ConvertError::write(path, e.error))?;
    Ok(())
}

/// Convert one netlist file; `output` may be the input itself
pub fn convert_file(transpiler: &Transpiler, input: &Path, output: &Path) -> ConversionResult<ConversionOutput> {
    let bytes = fs::read(input).map_err(|e| ConvertError::read(input, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let result = transpiler.convert_for_path(&text, input);
    write_atomic(output, &result.content)?;
    log::debug!(
        "{} -> {} ({} warning(s))",
        input.display(),
        output.display(),
        result.warnings.len()
    );
    Ok(result)
}

/// Default batch destination: `<input>_spice` beside the input directory
pub fn default_output_dir(input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push("_spice");
            input.with_file_name(name)
        }
        None => PathBuf::from("netlists_spice"),
    }
}

/// Convert every regular file directly inside `input` into `output`
///
/// Files are converted in parallel. A failure on one file is recorded in the
/// report and does not stop the others.
pub fn convert_directory(transpiler: &Transpiler, input: &Path, output: &Path) -> ConversionResult<ConversionReport> {
    let entries = fs::read_dir(input).map_err(|source| ConvertError::ListDir {
        path: input.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    fs::create_dir_all(output).map_err(|source| ConvertError::CreateDir {
        path: output.to_path_buf(),
        source,
    })?;

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            if transpiler.options().skips(path) {
                log::debug!("skipping {}", path.display());
                return FileReport::skipped(path);
            }
            let Some(name) = path.file_name() else {
                return FileReport::skipped(path);
            };
            let target = output.join(name);
            match convert_file(transpiler, path, &target) {
                Ok(result) => FileReport::converted(path, &target, &result.warnings),
                Err(e) => FileReport::failed(path, e.to_string()),
            }
        })
        .collect();

    Ok(ConversionReport::new(reports))
}

/// Convert a file or a directory
///
/// A single file is converted in place unless `output` is given. A directory
/// goes to `output` or [`default_output_dir`].
pub fn convert_path(
    transpiler: &Transpiler,
    input: &Path,
    output: Option<&Path>,
) -> ConversionResult<ConversionReport> {
    if !input.exists() {
        return Err(ConvertError::MissingInput(input.to_path_buf()));
    }

    if input.is_dir() {
        let target = output.map(Path::to_path_buf).unwrap_or_else(|| default_output_dir(input));
        return convert_directory(transpiler, input, &target);
    }

    let target = output.unwrap_or(input);
    let result = convert_file(transpiler, input, target)?;
    Ok(ConversionReport::new(vec![FileReport::converted(
        input,
        target,
        &result.warnings,
    )]))
}
