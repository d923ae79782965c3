//! Spreadsheet rendering for product exports.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use prodcat_core::{CatalogError, CatalogResult, FieldValue, ProjectedRows};

pub const SHEET_NAME: &str = "Produtos";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_DISPOSITION: &str = "attachment; filename=produtos.xlsx";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes `rows` to a single-sheet workbook and returns the file bytes.
///
/// The first row holds the column names; nulls are left as empty cells.
pub fn render_workbook(rows: &ProjectedRows) -> CatalogResult<Vec<u8>> {
    build(rows).map_err(|e| CatalogError::Export(e.to_string()))
}

fn build(rows: &ProjectedRows) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in rows.header().into_iter().enumerate() {
        worksheet.write_string_with_format(0, cell_col(col)?, name, &header_format)?;
    }

    for (index, cells) in rows.rows().enumerate() {
        let row = cell_row(index + 1)?;
        for (col, cell) in cells.into_iter().enumerate() {
            let col = cell_col(col)?;
            match cell {
                FieldValue::Text(text) => worksheet.write_string(row, col, text),
                FieldValue::Integer(n) => worksheet.write_number(row, col, n as f64),
                FieldValue::Decimal(n) => worksheet.write_number(row, col, n),
                FieldValue::Timestamp(ts) => {
                    worksheet.write_string(row, col, ts.format(TIMESTAMP_FORMAT).to_string())
                }
                FieldValue::Flag(flag) => worksheet.write_boolean(row, col, flag),
                FieldValue::Null => continue,
            }?;
        }
    }

    worksheet.autofit();
    workbook.save_to_buffer()
}

fn cell_row(index: usize) -> Result<u32, XlsxError> {
    u32::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn cell_col(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}
