//! File ingestion.
//!
//! Turns the raw bytes of an upload into a polars [`DataFrame`]. The frame
//! still carries whatever dtypes the parser inferred; the normalizer decides
//! the semantic types afterwards.

mod csv;
mod excel;

use crate::error::IngestionError;
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::{debug, info};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xls,
    Xlsx,
}

impl FileFormat {
    /// Resolve a format from an extension hint (`csv`, `.CSV`, `.xlsx`, ...).
    pub fn from_extension(extension: &str) -> Result<Self, IngestionError> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "csv" => Ok(Self::Csv),
            "xls" => Ok(Self::Xls),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(IngestionError::UnsupportedExtension(extension.to_string())),
        }
    }

    /// Resolve a format from a file name.
    pub fn from_path(path: &Path) -> Result<Self, IngestionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| IngestionError::UnsupportedExtension(path.display().to_string()))?;
        Self::from_extension(extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Parse an upload into a frame.
///
/// # Errors
///
/// Any [`IngestionError`] is fatal for the report: unsupported extension,
/// undecodable or unparsable content, or a result without columns.
pub fn load_table(bytes: &[u8], extension: &str) -> Result<DataFrame, IngestionError> {
    let format = FileFormat::from_extension(extension)?;
    debug!("Loading {} bytes as {}", bytes.len(), format.as_str());

    let frame = match format {
        FileFormat::Csv => csv::read_csv(bytes)?,
        FileFormat::Xls | FileFormat::Xlsx => excel::read_workbook(bytes)?,
    };

    if frame.width() == 0 {
        return Err(IngestionError::NoColumns);
    }

    info!(
        "Loaded {} file: {} rows x {} columns",
        format.as_str(),
        frame.height(),
        frame.width()
    );
    Ok(frame)
}
