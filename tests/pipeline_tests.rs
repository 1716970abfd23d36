//! End-to-end tests for column extraction and workbook loading.
//!
//! Workbooks are built in memory with `rust_xlsxwriter` and read back with
//! `calamine`, so nothing touches the filesystem.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use quarry::{
    harvest, load_text, sniff_table, write_workbook, CellValue, ColumnSelection, Error,
    FileSelection, HarvestWarning, Retriever, TableKind, TextEncoding, TextSource, Upload,
    SHEET_NAME,
};
use rust_xlsxwriter::{Format, Workbook};

// =============================================================================
// Helpers
// =============================================================================

/// Build an `.xlsx` upload from comma-separated rows. Cells that parse as
/// numbers are written as numbers; empty cells are left blank.
fn xlsx(name: &str, sheets: &[(&str, &[&str])]) -> Upload {
    let mut workbook = Workbook::new();
    for (sheet, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*sheet).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.split(',').enumerate() {
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(n) => worksheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => worksheet.write_string(r as u32, c as u16, cell).unwrap(),
                };
            }
        }
    }
    Upload::new(name, workbook.save_to_buffer().unwrap())
}

fn select(upload: &Upload, sheet: Option<&str>, columns: &[&str]) -> FileSelection {
    let header = sniff_table(upload, sheet).unwrap();
    FileSelection::from_header(&header, columns.iter().map(|c| (*c).to_string()).collect())
}

fn texts(values: &[CellValue]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn read_back(bytes: Vec<u8>) -> calamine::Range<Data> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
    workbook.worksheet_range(SHEET_NAME).unwrap()
}

// =============================================================================
// Sniffing
// =============================================================================

#[test]
fn sniff_lists_sheets_and_reads_first_by_default() {
    let upload = xlsx(
        "staff.xlsx",
        &[
            ("People", &["Name,Age", "Ada,36"]),
            ("Sites", &["City\u{200B}, Count", "London,12"]),
        ],
    );

    let header = sniff_table(&upload, None).unwrap();
    assert_eq!(header.kind, TableKind::Spreadsheet);
    assert_eq!(header.sheets, ["People", "Sites"]);
    assert_eq!(header.sheet.as_deref(), Some("People"));
    assert_eq!(header.columns, ["Name", "Age"]);
    assert!(header.dialect.is_none());

    let header = sniff_table(&upload, Some("Sites")).unwrap();
    assert_eq!(header.columns, ["City", "Count"]);
}

#[test]
fn sniff_unknown_sheet_fails() {
    let upload = xlsx("a.xlsx", &[("Data", &["X"])]);
    assert!(matches!(
        sniff_table(&upload, Some("Missing")),
        Err(Error::SheetNotFound { .. })
    ));
}

#[test]
fn sniff_latin1_semicolon_csv() {
    // "Prénom;Ville" in Latin-1: é is 0xE9, invalid as UTF-8.
    let bytes = b"Pr\xe9nom;Ville\nZo\xe9;Lyon\n".to_vec();
    let upload = Upload::new("people.csv", bytes);

    let header = sniff_table(&upload, None).unwrap();
    let dialect = header.dialect.unwrap();
    assert_eq!(dialect.encoding, TextEncoding::Latin1);
    assert_eq!(dialect.delimiter, ';');
    assert_eq!(header.columns, ["Prénom", "Ville"]);
}

#[test]
fn sniff_rejects_other_extensions() {
    let upload = Upload::new("notes.pdf", b"%PDF".to_vec());
    assert!(matches!(
        sniff_table(&upload, None),
        Err(Error::UnsupportedFileType { .. })
    ));
}

// =============================================================================
// Harvesting
// =============================================================================

#[test]
fn csv_and_xlsx_columns_side_by_side() {
    let a = Upload::new("a.csv", b"X,Y\n1,10\n2,20\n".to_vec());
    let b = xlsx(
        "b.xlsx",
        &[("Data", &["Z", "p", "q", "r", "s"])],
    );

    let selection = ColumnSelection::new()
        .with(select(&a, None, &["X"]))
        .with(select(&b, None, &["Z"]));
    let uploads = vec![a, b];

    let result = harvest(&uploads, &selection).unwrap();
    assert!(result.warnings.is_empty());

    let table = &result.table;
    assert_eq!(table.column_names().collect::<Vec<_>>(), ["X", "Z"]);
    assert_eq!(table.height(), 4);
    assert_eq!(texts(&table.columns()[0].values), ["1", "2"]);
    assert_eq!(texts(&table.columns()[1].values), ["p", "q", "r", "s"]);
    assert_eq!(table.cell(3, 0), None);

    let range = read_back(write_workbook(table).unwrap());
    assert_eq!(range.get_size(), (5, 2));
    assert_eq!(range.get((0, 0)), Some(&Data::String("X".into())));
    assert_eq!(range.get((0, 1)), Some(&Data::String("Z".into())));
    assert_eq!(range.get((4, 1)), Some(&Data::String("s".into())));
    assert_eq!(range.get((3, 0)), Some(&Data::Empty));
}

#[test]
fn missing_column_is_a_warning() {
    let a = Upload::new("a.csv", b"X,Y\n1,2\n".to_vec());
    let mut chosen = select(&a, None, &["X"]);
    chosen.columns.push("Gone".to_string());
    let selection = ColumnSelection::new().with(chosen);

    let result = harvest(&[a], &selection).unwrap();
    assert_eq!(result.table.column_names().collect::<Vec<_>>(), ["X"]);
    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        &result.warnings[0],
        HarvestWarning::ColumnMissing { column, .. } if column == "Gone"
    ));
}

#[test]
fn nulls_are_dropped_before_alignment() {
    let a = Upload::new("a.csv", b"X,W\n1,a\nNA,b\n,c\n3,d\n".to_vec());
    let b = Upload::new("b.csv", b"Z,V\np,1\nq,2\nr,3\n".to_vec());
    let selection = ColumnSelection::new()
        .with(select(&a, None, &["X"]))
        .with(select(&b, None, &["Z"]));

    let table = harvest(&[a, b], &selection).unwrap().table;
    assert_eq!(texts(&table.columns()[0].values), ["1", "3"]);
    assert_eq!(table.height(), 3);
}

#[test]
fn nan_spellings_are_dropped_and_infinity_kept_as_text() {
    let a = Upload::new("a.csv", b"X,Y\nNAN,1\ninf,2\n5,3\n".to_vec());
    let selection = ColumnSelection::new().with(select(&a, None, &["X"]));

    let table = harvest(&[a], &selection).unwrap().table;
    assert_eq!(texts(&table.columns()[0].values), ["inf", "5"]);

    let range = read_back(write_workbook(&table).unwrap());
    assert_eq!(range.get_size(), (3, 1));
    assert_eq!(range.get((1, 0)), Some(&Data::String("inf".into())));
    assert_eq!(range.get((2, 0)), Some(&Data::Float(5.0)));
}

#[test]
fn dates_survive_the_round_trip() {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Log").unwrap();
    worksheet.write_string(0, 0, "When").unwrap();
    worksheet.write_string(0, 1, "What").unwrap();
    worksheet.write_number_with_format(1, 0, 45366.0, &date).unwrap();
    worksheet.write_string(1, 1, "launch").unwrap();
    let upload = Upload::new("log.xlsx", workbook.save_to_buffer().unwrap());

    let selection = ColumnSelection::new().with(select(&upload, None, &["When"]));
    let table = harvest(&[upload], &selection).unwrap().table;
    assert_eq!(table.columns()[0].values, [CellValue::DateTime(45366.0)]);

    let range = read_back(write_workbook(&table).unwrap());
    match range.get((1, 0)) {
        Some(Data::DateTime(dt)) => assert!((dt.as_f64() - 45366.0).abs() < 1e-9),
        other => panic!("expected a date cell, got {other:?}"),
    }
}

#[test]
fn unreadable_file_is_skipped() {
    let good = Upload::new("good.csv", b"X,Y\n1,2\n".to_vec());
    let broken = Upload::new("broken.xlsx", b"not a zip file".to_vec());
    let selection = ColumnSelection::new()
        .with(select(&good, None, &["X"]))
        .with(FileSelection {
            file: "broken.xlsx".to_string(),
            kind: TableKind::Spreadsheet,
            sheet: None,
            columns: vec!["A".to_string()],
            dialect: None,
        });

    let result = harvest(&[good, broken], &selection).unwrap();
    assert_eq!(result.table.width(), 1);
    assert!(matches!(
        &result.warnings[0],
        HarvestWarning::FileSkipped { file, .. } if file == "broken.xlsx"
    ));
}

#[test]
fn second_sheet_selection() {
    let upload = xlsx(
        "book.xlsx",
        &[
            ("First", &["A", "1"]),
            ("Second", &["B", "x", "y"]),
        ],
    );
    let selection = ColumnSelection::new().with(select(&upload, Some("Second"), &["B"]));

    let table = harvest(&[upload], &selection).unwrap().table;
    assert_eq!(texts(&table.columns()[0].values), ["x", "y"]);
}

#[test]
fn empty_selection_has_nothing_to_export() {
    let upload = Upload::new("a.csv", b"X,Y\n1,2\n".to_vec());
    let selection = ColumnSelection::new().with(select(&upload, None, &[]));
    assert!(matches!(
        harvest(&[upload], &selection),
        Err(Error::NothingToExport)
    ));
}

#[test]
fn selection_survives_json() {
    let upload = Upload::new("a.csv", b"X;Y\n1;2\n".to_vec());
    let selection = ColumnSelection::new().with(select(&upload, None, &["Y"]));

    let json = serde_json::to_string(&selection).unwrap();
    let parsed: ColumnSelection = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, selection);

    let table = harvest(&[upload], &parsed).unwrap().table;
    assert_eq!(texts(&table.columns()[0].values), ["2"]);
}

// =============================================================================
// Workbooks as documents
// =============================================================================

#[test]
fn workbook_flattens_to_text() {
    let upload = xlsx(
        "staff.xlsx",
        &[
            ("Staff", &["Name,Role", "Ada,Engineer"]),
            ("Sites", &["City,Count", "London,12"]),
        ],
    );

    let document = load_text(TextSource::Upload(&upload)).unwrap();
    assert_eq!(
        document.text(),
        "Sheet: Staff\nName Role\nAda Engineer\n\nSheet: Sites\nCity Count\nLondon 12"
    );
}

#[test]
fn ask_a_workbook() {
    let upload = xlsx(
        "staff.xlsx",
        &[("Staff", &["Ada leads the compiler team.", "Grace runs payroll."])],
    );

    let document = load_text(TextSource::Upload(&upload)).unwrap();
    let answer = Retriever::new(30).ask(&document, "Who runs payroll?");
    assert_eq!(answer.text(), "Grace runs payroll.");
}

#[test]
fn text_upload_must_be_utf8() {
    let upload = Upload::new("notes.txt", b"caf\xe9".to_vec());
    assert!(matches!(
        load_text(TextSource::Upload(&upload)),
        Err(Error::Decode { .. })
    ));
}
