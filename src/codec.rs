use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::Record;

/// Default name given to the single sheet of an exported workbook.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer is not a readable xlsx container.
    #[error("not a valid spreadsheet: {0}")]
    Decode(String),

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("could not write spreadsheet: {0}")]
    Encode(#[from] XlsxError),

    #[error("cell ({row}, {col}) is outside the sheet limits")]
    OutOfRange { row: usize, col: usize },
}

/// A primitive cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// How the cell reads when shown in a table.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Bool(b) => Cell::Bool(*b),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Integral numbers print without a fractional part, like a spreadsheet would.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Rows of cells, first row conventionally the header.
pub type Grid = Vec<Vec<Cell>>;

/// A decoded workbook: every sheet name in declaration order and the cells
/// of the first sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetDocument {
    pub sheet_names: Vec<String>,
    pub rows: Grid,
}

impl SpreadsheetDocument {
    pub fn sheet_name(&self) -> &str {
        self.sheet_names.first().map(String::as_str).unwrap_or("")
    }

    pub fn header(&self) -> Option<Vec<String>> {
        self.rows
            .first()
            .map(|row| row.iter().map(Cell::display).collect())
    }

    /// The rows after the header as records.
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .skip(1)
            .map(|row| Record::new(row.iter().map(Cell::display)))
            .collect()
    }
}

/// Reads an xlsx buffer. Only the first declared sheet is read.
///
/// The returned grid is anchored at A1: leading blank rows and columns are
/// kept as [`Cell::Empty`] so positions survive the trip. Trailing blank rows
/// and columns are not: the grid ends at the last non-empty cell, and ragged
/// rows come back padded to the sheet width. A workbook that declares no
/// sheet is [`CodecError::NoSheets`].
pub fn decode(bytes: &[u8]) -> Result<SpreadsheetDocument, CodecError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names.first().ok_or(CodecError::NoSheets)?.clone();

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let mut rows = Grid::new();
    if let Some((start_row, start_col)) = range.start() {
        let width = start_col as usize + range.width();
        for _ in 0..start_row {
            rows.push(vec![Cell::Empty; width]);
        }
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; start_col as usize];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }
    }

    log::debug!(
        "decoded sheet '{}' with {} rows ({} sheets declared)",
        first,
        rows.len(),
        sheet_names.len()
    );

    Ok(SpreadsheetDocument { sheet_names, rows })
}

/// Writes `grid` as a single-sheet xlsx workbook and returns the bytes.
///
/// Rows are written as given; ragged rows are not padded. Empty cells and
/// empty strings are left blank, so `Text("")` decodes as [`Cell::Empty`] and
/// a trailing all-empty row or column does not come back at all.
pub fn encode(grid: &[Vec<Cell>], sheet_name: &str) -> Result<Vec<u8>, CodecError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let out_of_range = || CodecError::OutOfRange { row: r, col: c };
            let row_num = u32::try_from(r).map_err(|_| out_of_range())?;
            let col_num = u16::try_from(c).map_err(|_| out_of_range())?;

            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col_num, s.as_str())?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Builds an export grid: a header row followed by one text row per record.
pub fn grid_from_records(header: &[&str], records: &[Record]) -> Grid {
    let mut grid = Vec::with_capacity(records.len() + 1);
    grid.push(header.iter().map(|h| Cell::text(*h)).collect());
    for record in records {
        grid.push(record.fields.iter().map(|f| Cell::text(f.as_str())).collect());
    }
    grid
}

/// The workbook offered for download when a page has no records of its own.
pub fn sample_grid() -> Grid {
    vec![
        vec![Cell::text("Name"), Cell::text("Age"), Cell::text("Email")],
        vec![
            Cell::text("John Doe"),
            Cell::Number(30.0),
            Cell::text("john@example.com"),
        ],
        vec![
            Cell::text("Jane Smith"),
            Cell::Number(25.0),
            Cell::text("jane@example.com"),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_grid_survives_a_round_trip() {
        let grid = sample_grid();
        let bytes = encode(&grid, DEFAULT_SHEET_NAME).unwrap();
        let doc = decode(&bytes).unwrap();

        assert_eq!(doc.sheet_names, vec!["Sheet1".to_string()]);
        assert_eq!(doc.rows, grid);
    }

    #[test]
    fn mixed_primitive_values_round_trip() {
        let grid = vec![
            vec![Cell::text("flag"), Cell::text("ratio")],
            vec![Cell::Bool(true), Cell::Number(0.25)],
            vec![Cell::Bool(false), Cell::Number(-12.0)],
        ];
        let doc = decode(&encode(&grid, "Data").unwrap()).unwrap();
        assert_eq!(doc.sheet_name(), "Data");
        assert_eq!(doc.rows, grid);
    }

    #[test]
    fn leading_blank_row_keeps_positions() {
        let grid = vec![
            vec![],
            vec![Cell::Empty, Cell::text("b2")],
        ];
        let doc = decode(&encode(&grid, DEFAULT_SHEET_NAME).unwrap()).unwrap();
        assert_eq!(
            doc.rows,
            vec![
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::Empty, Cell::text("b2")],
            ]
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    /// An xlsx container whose workbook part lists no sheets.
    fn sheetless_workbook() -> Vec<u8> {
        use std::io::Write;
        use zip::{CompressionMethod, ZipWriter, write::FileOptions};

        let parts: [(&str, &[u8]); 2] = [
            (
                "xl/_rels/workbook.xml.rels",
                br#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#,
            ),
            (
                "xl/workbook.xml",
                br#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets></sheets></workbook>"#,
            ),
        ];

        let mut buf = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, contents) in parts {
                writer.start_file(name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn workbook_without_sheets_is_reported() {
        let err = decode(&sheetless_workbook()).unwrap_err();
        assert!(matches!(err, CodecError::NoSheets));
    }

    #[test]
    fn trailing_blanks_and_empty_text_do_not_survive() {
        let grid = vec![
            vec![Cell::text("a"), Cell::text("")],
            vec![Cell::Empty, Cell::Empty],
        ];
        let doc = decode(&encode(&grid, DEFAULT_SHEET_NAME).unwrap()).unwrap();
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0][0], Cell::text("a"));
        assert!(doc.rows[0][1..].iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn invalid_sheet_name_is_an_encode_error() {
        let err = encode(&sample_grid(), "bad[name]").unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)));
    }

    #[test]
    fn records_skip_the_header() {
        let bytes = encode(&sample_grid(), DEFAULT_SHEET_NAME).unwrap();
        let doc = decode(&bytes).unwrap();

        assert_eq!(
            doc.header(),
            Some(vec!["Name".to_string(), "Age".to_string(), "Email".to_string()])
        );
        let records = doc.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], Record::new(["John Doe", "30", "john@example.com"]));
    }

    #[test]
    fn records_export_as_text() {
        let records = vec![Record::new(["Ann", "0712"])];
        let grid = grid_from_records(&["Name", "Number"], &records);
        let doc = decode(&encode(&grid, DEFAULT_SHEET_NAME).unwrap()).unwrap();
        assert_eq!(doc.records(), records);
    }

    #[test]
    fn numbers_display_like_a_spreadsheet() {
        assert_eq!(Cell::Number(30.0).display(), "30");
        assert_eq!(Cell::Number(2.5).display(), "2.5");
        assert_eq!(Cell::Empty.display(), "");
    }
}
