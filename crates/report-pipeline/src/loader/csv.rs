use crate::error::IngestionError;
use polars::prelude::*;
use std::io::Cursor;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV bytes with a header row, inferring dtypes over the whole file.
pub(super) fn read_csv(bytes: &[u8]) -> Result<DataFrame, IngestionError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)?;
    if text.trim().is_empty() {
        return Err(IngestionError::NoColumns);
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| IngestionError::Malformed {
            format: "CSV",
            reason: e.to_string(),
        })
}
