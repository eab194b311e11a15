use crate::error::IngestionError;
use crate::utils::format_iso;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::debug;

/// Read the first worksheet of an `.xls`/`.xlsx` workbook.
///
/// The first row is the header. Each column gets the narrowest dtype that
/// holds all of its non-empty cells; date cells become ISO-8601 text so the
/// normalizer treats them like CSV dates.
pub(super) fn read_workbook(bytes: &[u8]) -> Result<DataFrame, IngestionError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| {
            IngestionError::Malformed {
                format: "spreadsheet",
                reason: e.to_string(),
            }
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestionError::EmptyWorkbook)?
        .map_err(|e| IngestionError::Malformed {
            format: "spreadsheet",
            reason: e.to_string(),
        })?;

    let mut rows = range.rows();
    let header = rows.next().ok_or(IngestionError::NoColumns)?;
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();
    debug!("Worksheet has {} data rows", body.len());

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            Column::from(build_series(name, &cells))
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Header cells as unique column names; blanks become `Unnamed: {idx}` and
/// repeats get a `.{n}` suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell_text(cell) {
                Some(text) if !text.trim().is_empty() => text.trim().to_string(),
                _ => format!("Unnamed: {}", idx),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| format_iso(&d))
            .or_else(|| Some(cell.to_string())),
        Data::DateTimeIso(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn whole_number(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(v) => Some(*v),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Some(*v as i64),
        _ => None,
    }
}

fn build_series(name: &str, cells: &[&Data]) -> Series {
    let present: Vec<&Data> = cells
        .iter()
        .copied()
        .filter(|c| !matches!(c, Data::Empty | Data::Error(_)))
        .collect();

    // Workbooks store most numbers as floats; whole ones read back as integers.
    if !present.is_empty() && present.iter().all(|c| whole_number(c).is_some()) {
        let values: Vec<Option<i64>> = cells.iter().map(|c| whole_number(c)).collect();
        return Series::new(name.into(), values);
    }

    if !present.is_empty()
        && present
            .iter()
            .all(|c| matches!(c, Data::Int(_) | Data::Float(_)))
    {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Int(v) => Some(*v as f64),
                Data::Float(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    if !present.is_empty() && present.iter().all(|c| matches!(c, Data::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    let values: Vec<Option<String>> = cells.iter().map(|c| cell_text(c)).collect();
    Series::new(name.into(), values)
}
