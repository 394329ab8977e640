//! Spreadsheet export of cached rows
//!
//! Columns mirror the keys of the first row, in projection order. Header text
//! is the key with underscores shown as spaces; every later row is read back
//! through the same key, so rows missing a key get the placeholder. An empty
//! result yields an empty sheet.

use crate::format::cell_text;
use crate::{ExportError, ExportResult};
use ledgerflow_core::{CachedResult, Row};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;

const SHEET_NAME: &str = "Entries";

/// Header labels derived from the first row
pub fn headers(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().map(|k| k.replace('_', " ")).collect())
        .unwrap_or_default()
}

/// Body cells under `headers(rows)`, one vector per row.
///
/// Each header is mapped back to its key; keys absent from a row give `None`
/// (written as the placeholder) and keys not in the first row are dropped.
pub fn sheet_rows(rows: &[Row]) -> Vec<Vec<Option<&Value>>> {
    let keys: Vec<String> = headers(rows).iter().map(|h| h.replace(' ', "_")).collect();
    rows.iter()
        .map(|row| keys.iter().map(|key| row.get(key)).collect())
        .collect()
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: Option<&Value>) -> Result<(), XlsxError> {
    match value {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => sheet.write_number(row, col, f).map(|_| ()),
            None => sheet.write_string(row, col, n.to_string()).map(|_| ()),
        },
        Some(Value::Bool(b)) => sheet.write_boolean(row, col, *b).map(|_| ()),
        other => sheet.write_string(row, col, cell_text(other)).map(|_| ()),
    }
}

fn build(result: &CachedResult) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let headers = headers(&result.rows);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (c, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, header, &bold)?;
    }

    for (r, cells) in sheet_rows(&result.rows).into_iter().enumerate() {
        for (c, value) in cells.into_iter().enumerate() {
            write_cell(sheet, (r + 1) as u32, c as u16, value)?;
        }
    }

    workbook.save_to_buffer()
}

/// Render a cached result as an `.xlsx` workbook with a single `Entries` sheet
pub fn render_spreadsheet(result: &CachedResult) -> ExportResult<Vec<u8>> {
    let bytes = build(result).map_err(ExportError::spreadsheet)?;
    log::debug!("Rendered spreadsheet for {} ({} rows)", result.token, result.rows.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_headers_follow_first_row() {
        let rows = vec![
            row(json!({"id": 1, "party_name": "Acme", "payment_mode": "Cash"})),
            row(json!({"id": 2, "extra_column": true})),
        ];
        assert_eq!(headers(&rows), vec!["id", "party name", "payment mode"]);
    }

    #[test]
    fn test_headers_empty_rows() {
        assert!(headers(&[]).is_empty());
        assert!(sheet_rows(&[]).is_empty());
    }

    #[test]
    fn test_sheet_rows_placeholder_and_dropped_keys() {
        let rows = vec![
            row(json!({"id": 1, "party_name": "Acme", "amount": 10})),
            row(json!({"id": 2, "amount": 5, "extra_column": true})),
        ];
        let cells = sheet_rows(&rows);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0], vec![Some(&json!(1)), Some(&json!("Acme")), Some(&json!(10))]);
        // Second row: party name missing, extra column ignored.
        assert_eq!(cells[1].len(), headers(&rows).len());
        assert_eq!(cells[1][0], Some(&json!(2)));
        assert_eq!(cells[1][1], None);
        assert_eq!(cell_text(cells[1][1]), "-");
        assert_eq!(cells[1][2], Some(&json!(5)));
    }
}
