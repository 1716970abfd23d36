//! Writing a combined table as a single-sheet `.xlsx` file.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::{CellValue, CombinedTable, Error, Result};

/// File name offered for the combined download.
pub const COMBINED_FILE_NAME: &str = "combined_columns.xlsx";

/// MIME type of the combined download.
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Name of the only worksheet.
pub const SHEET_NAME: &str = "Sheet1";

const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    column: u16,
    value: &CellValue,
    date_format: &Format,
) -> Result<()> {
    match value {
        CellValue::Text(s) => worksheet.write_string(row, column, s)?,
        CellValue::Int(i) => worksheet.write_number(row, column, *i as f64)?,
        CellValue::Float(f) if f.is_nan() => return Ok(()),
        CellValue::Float(f) if f.is_infinite() => {
            worksheet.write_string(row, column, f.to_string())?
        }
        CellValue::Float(f) => worksheet.write_number(row, column, *f)?,
        CellValue::Bool(b) => worksheet.write_boolean(row, column, *b)?,
        CellValue::DateTime(serial) => {
            worksheet.write_number_with_format(row, column, *serial, date_format)?
        }
    };
    Ok(())
}

/// Serialize a combined table to `.xlsx` bytes.
///
/// One sheet, a bold header row, then the values; no index column. Padded
/// cells are left blank.
///
/// # Errors
///
/// Fails if the table does not fit on one worksheet or the writer fails.
pub fn write_workbook(table: &CombinedTable) -> Result<Vec<u8>> {
    if table.width() > MAX_COLUMNS {
        return Err(Error::TooManyColumns(table.width()));
    }
    // One row is taken by the header.
    if table.height() >= MAX_ROWS {
        return Err(Error::TooManyRows(table.height()));
    }

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (column, name) in table.column_names().enumerate() {
        worksheet.write_string_with_format(0, column as u16, name, &header_format)?;
    }

    for (column, extracted) in table.columns().iter().enumerate() {
        for (row, value) in extracted.values.iter().enumerate() {
            write_cell(worksheet, row as u32 + 1, column as u16, value, &date_format)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        columns = table.width(),
        rows = table.height(),
        bytes = bytes.len(),
        "wrote workbook"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractedColumn;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    fn column(name: &str, values: Vec<CellValue>) -> ExtractedColumn {
        ExtractedColumn {
            name: name.to_string(),
            source: "test".to_string(),
            values,
        }
    }

    #[test]
    fn test_written_workbook_reads_back() {
        let table = CombinedTable::new(vec![
            column("X", vec![CellValue::Int(1), CellValue::Int(2)]),
            column("Z", vec![CellValue::Text("p".into())]),
        ]);
        let bytes = write_workbook(&table).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names().to_vec(), [SHEET_NAME]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_size(), (3, 2));
        assert_eq!(range.get((0, 0)), Some(&Data::String("X".into())));
        assert_eq!(range.get((0, 1)), Some(&Data::String("Z".into())));
        assert_eq!(range.get((1, 1)), Some(&Data::String("p".into())));
        assert_eq!(range.get((2, 1)), Some(&Data::Empty));
    }

    #[test]
    fn test_booleans_and_floats() {
        let table = CombinedTable::new(vec![column(
            "v",
            vec![CellValue::Bool(true), CellValue::Float(2.5)],
        )]);
        let bytes = write_workbook(&table).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get((1, 0)), Some(&Data::Bool(true)));
        assert_eq!(range.get((2, 0)), Some(&Data::Float(2.5)));
    }

    #[test]
    fn test_non_finite_floats_are_not_written_as_numbers() {
        let table = CombinedTable::new(vec![column(
            "v",
            vec![
                CellValue::Float(f64::INFINITY),
                CellValue::Float(f64::NAN),
                CellValue::Float(5.0),
            ],
        )]);
        let bytes = write_workbook(&table).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get((1, 0)), Some(&Data::String("inf".into())));
        assert_eq!(range.get((2, 0)), Some(&Data::Empty));
        assert_eq!(range.get((3, 0)), Some(&Data::Float(5.0)));
    }

    #[test]
    fn test_datetime_keeps_date_format() {
        let table = CombinedTable::new(vec![column("when", vec![CellValue::DateTime(45366.5)])]);
        let bytes = write_workbook(&table).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        match range.get((1, 0)) {
            Some(Data::DateTime(dt)) => assert!((dt.as_f64() - 45366.5).abs() < 1e-9),
            other => panic!("expected a date cell, got {other:?}"),
        }
    }

    #[test]
    fn test_too_wide() {
        let columns = (0..=MAX_COLUMNS)
            .map(|i| column(&i.to_string(), Vec::new()))
            .collect();
        assert!(matches!(
            write_workbook(&CombinedTable::new(columns)),
            Err(Error::TooManyColumns(_))
        ));
    }
}
