//! Batch reports as spreadsheet, comma-separated or PDF files.
//!
//! Rendering is pure: [`render`] turns a [`Report`] into bytes, and
//! [`write_to`] is the only step touching the filesystem.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use engine::Batch;

pub use error::{ReportError, Result};
pub use model::{COLUMNS, Report, ReportOptions, ReportRow, TITLE, format_date};

mod delimited;
mod error;
mod model;
mod pdf;
mod xlsx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A rendered report, ready to be written.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `<batch name>_report.<ext>`, with path separators replaced by `_`.
pub fn file_name(batch_name: &str, format: ExportFormat) -> String {
    let safe: String = batch_name
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\') { '_' } else { ch })
        .collect();
    format!("{safe}_report.{}", format.extension())
}

pub fn render(report: &Report, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => xlsx::render(report),
        ExportFormat::Pdf => pdf::render(report),
        ExportFormat::Csv => delimited::render(report),
    }
}

pub fn export(batch: &Batch, options: &ReportOptions, format: ExportFormat) -> Result<Rendered> {
    let report = Report::from_batch(batch, options);
    let bytes = render(&report, format)?;
    tracing::info!(batch = %batch.id(), %format, size = bytes.len(), "report rendered");
    Ok(Rendered {
        file_name: file_name(batch.name(), format),
        bytes,
    })
}

/// Writes `rendered` into `dir`, creating it if needed.
pub fn write_to(dir: &Path, rendered: &Rendered) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&rendered.file_name);
    fs::write(&path, &rendered.bytes)?;
    Ok(path)
}
