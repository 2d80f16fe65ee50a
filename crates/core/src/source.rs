use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::SourceError;
use crate::types::Row;

/// Read every row of `path`. No header row is assumed: the first physical
/// row is row 1.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, SourceError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let loader: fn(&Path) -> Result<Vec<Row>, SourceError> = match ext.as_str() {
        "csv" => load_csv,
        "xlsx" | "xlsm" | "xls" => load_workbook,
        _ => return Err(SourceError::Unsupported(format!(".{}", ext))),
    };
    if !path.is_file() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    loader(path)
}

fn load_csv(path: &Path) -> Result<Vec<Row>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if i == 0 {
            if let Some(first) = cells.first_mut() {
                if let Some(stripped) = first.strip_prefix('\u{feff}') {
                    *first = stripped.to_string();
                }
            }
        }
        rows.push(Row::new(cells));
    }
    Ok(rows)
}

fn load_workbook(path: &Path) -> Result<Vec<Row>, SourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SourceError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SourceError::NoSheet)?
        .map_err(|e| SourceError::Workbook(e.to_string()))?;

    // the range starts at the first used cell; keep physical positions
    let (row0, col0) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Row> = (0..row0).map(|_| Row::default()).collect();
    for cells in range.rows() {
        let mut values: Vec<String> = vec![String::new(); col0 as usize];
        values.extend(cells.iter().map(cell_text));
        rows.push(Row::new(values));
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn csv_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn csv_rows_are_ragged_and_headerless() {
        let f = csv_file("\u{feff}code,name\n4101,\"Smith, J\",extra\n\n9\n");
        let rows = load_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cell(1), "code");
        assert_eq!(rows[1].cell(2), "Smith, J");
        assert_eq!(rows[1].cell(3), "extra");
        assert_eq!(rows[2].cell(1), "9");
        assert_eq!(rows[2].cell(2), "");
    }

    #[test]
    fn unsupported_extension_is_checked_first() {
        let err = load_rows(Path::new("/definitely/missing/rows.txt")).unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(ref e) if e == ".txt"));
        let err = load_rows(Path::new("/definitely/missing/rows")).unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_rows(Path::new("/definitely/missing/rows.CSV")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
        assert!(err.to_string().contains("rows.CSV"));
    }

    #[test]
    fn broken_workbook_is_a_source_error() {
        let mut f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        f.write_all(b"not a zip archive").unwrap();
        assert!(matches!(load_rows(f.path()), Err(SourceError::Workbook(_))));
    }

    #[test]
    fn cell_rendering() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(4101.0)), "4101");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(-3)), "-3");
        assert_eq!(cell_text(&Data::String("x".into())), "x");
    }
}
