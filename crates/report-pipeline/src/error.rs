//! Error types for the report pipeline.
//!
//! Failures fall in two classes. Fatal errors ([`IngestionError`] and the
//! sanitizer's [`SanitizeError`]) abort the whole invocation and surface as
//! [`ReportError`]. Degraded errors ([`ComputationError`]) are raised inside
//! optional stages, caught by the pipeline, logged, and turned into an
//! omitted artifact key.
//!
//! All errors carry a stable code from `error_code()` so callers can mark the
//! originating upload as failed without string matching.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The file could not be turned into a table. Always fatal.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// Extension is not one of `.csv`, `.xls`, `.xlsx`.
    #[error("Unsupported file extension '{0}' (expected .csv, .xls or .xlsx)")]
    UnsupportedExtension(String),

    /// CSV content is not valid UTF-8.
    #[error("File is not valid UTF-8 text: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// The parser rejected the content.
    #[error("Failed to parse {format} content: {reason}")]
    Malformed { format: &'static str, reason: String },

    /// The workbook has no worksheet to read.
    #[error("Workbook contains no worksheets")]
    EmptyWorkbook,

    /// Parsing succeeded but produced no columns.
    #[error("File contains no usable columns")]
    NoColumns,

    /// Polars error while building the frame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl IngestionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedExtension(_) => "UNSUPPORTED_EXTENSION",
            Self::InvalidEncoding(_) => "INVALID_ENCODING",
            Self::Malformed { .. } => "MALFORMED_FILE",
            Self::EmptyWorkbook => "EMPTY_WORKBOOK",
            Self::NoColumns => "NO_COLUMNS",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }
}

/// A failure inside an optional stage. Never aborts the pipeline.
#[derive(Error, Debug)]
pub enum ComputationError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Too few usable observations for the computation.
    #[error("Not enough data in '{column}': need {needed}, found {found}")]
    InsufficientData {
        column: String,
        needed: usize,
        found: usize,
    },

    /// A missing or non-finite value reached a model fit.
    #[error("Column '{0}' contains missing or non-finite values")]
    NonFiniteInput(String),

    /// A value in the date column could not be read as a date.
    #[error("Value '{value}' in column '{column}' is not a date")]
    DateParse { column: String, value: String },

    /// The model fit itself failed.
    #[error("Model fit failed: {0}")]
    FitFailed(String),

    /// A cell held a value the report tree cannot represent.
    #[error("Unsupported value of type {dtype} in column '{column}'")]
    UnsupportedValue { column: String, dtype: String },

    /// The narrative enhancement collaborator failed.
    #[error("Insight enhancement failed: {0}")]
    Enhancement(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ComputationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::NonFiniteInput(_) => "NON_FINITE_INPUT",
            Self::DateParse { .. } => "DATE_PARSE_FAILED",
            Self::FitFailed(_) => "FIT_FAILED",
            Self::UnsupportedValue { .. } => "UNSUPPORTED_VALUE",
            Self::Enhancement(_) => "ENHANCEMENT_FAILED",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }
}

/// A value in the assembled artifact has no JSON representation.
///
/// These indicate a bug in a stage, not bad input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizeError {
    #[error("Unsigned integer {0} does not fit in a signed 64-bit JSON integer")]
    IntegerOutOfRange(u64),

    #[error("Duplicate key '{key}' in report object")]
    DuplicateKey { key: String },
}

impl SanitizeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IntegerOutOfRange(_) => "INTEGER_OUT_OF_RANGE",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
        }
    }
}

/// The main error type returned by [`crate::ReportPipeline::generate`].
#[derive(Error, Debug)]
pub enum ReportError {
    /// The upload could not be loaded.
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    /// The artifact violated the JSON contract.
    #[error("Report contract violation: {0}")]
    Contract(#[from] SanitizeError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReportError>,
    },
}

impl ReportError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReportError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for caller handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ingestion(e) => e.error_code(),
            Self::Contract(e) => e.error_code(),
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from loading the file (as opposed to a bug).
    pub fn is_ingestion(&self) -> bool {
        match self {
            Self::Ingestion(_) => true,
            Self::WithContext { source, .. } => source.is_ingestion(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ReportError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReportError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<ReportError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
