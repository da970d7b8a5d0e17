//! Data loading and saving utilities

use crate::error::{Result, ZinbError};
use calamine::{open_workbook_auto, Data as Cell, Reader as _};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Input file formats understood by [`DataLoader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    Excel,
}

impl FileFormat {
    /// Detect the format from the file extension; unknown extensions read as CSV
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" => FileFormat::Tsv,
            "parquet" | "pq" => FileFormat::Parquet,
            "json" | "jsonl" => FileFormat::Json,
            "xlsx" | "xls" => FileFormat::Excel,
            _ => FileFormat::Csv,
        }
    }
}

/// Data loader for tabular files
pub struct DataLoader {
    /// Rows used for CSV schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set the number of rows used to infer CSV column types
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a file, picking the reader from its extension
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ZinbError::NotFound(path.to_path_buf()));
        }

        let format = FileFormat::from_path(path);
        debug!(path = %path.display(), ?format, "loading data");
        match format {
            FileFormat::Csv => self.load_delimited(path, b','),
            FileFormat::Tsv => self.load_delimited(path, b'\t'),
            FileFormat::Parquet => self.load_parquet(path),
            FileFormat::Json => self.load_json(path),
            FileFormat::Excel => self.load_excel(path),
        }
    }

    /// Load a delimited text file with a header row
    pub fn load_delimited(&self, path: &Path, delimiter: u8) -> Result<DataFrame> {
        let file = File::open(path)?;
        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader.finish().map_err(|e| ZinbError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| ZinbError::DataError(e.to_string()))
    }

    /// Load a JSON file
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        JsonReader::new(file)
            .finish()
            .map_err(|e| ZinbError::DataError(e.to_string()))
    }

    /// Load the first worksheet of an Excel workbook.
    ///
    /// The first row holds the column names. A column whose cells are all
    /// numbers, booleans or blanks becomes `Float64` with blanks as nulls;
    /// any other column is read as text.
    pub fn load_excel(&self, path: &Path) -> Result<DataFrame> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ZinbError::DataError(e.to_string()))?;
        let sheet = workbook.sheet_names().first().cloned().ok_or_else(|| {
            ZinbError::DataError(format!("{} has no worksheets", path.display()))
        })?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ZinbError::DataError(e.to_string()))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| ZinbError::DataError(format!("sheet {} is empty", sheet)))?
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Cell::Empty => format!("column_{}", idx),
                other => other.to_string(),
            })
            .collect();
        let body: Vec<&[Cell]> = rows.collect();
        debug!(sheet = %sheet, rows = body.len(), columns = header.len(), "read worksheet");

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| sheet_column(name, idx, &body))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn cell_number(cell: Option<&Cell>) -> Option<f64> {
    match cell {
        Some(Cell::Int(v)) => Some(*v as f64),
        Some(Cell::Float(v)) => Some(*v),
        Some(Cell::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn sheet_column(name: &str, idx: usize, rows: &[&[Cell]]) -> Column {
    let numeric = rows.iter().all(|row| {
        matches!(
            row.get(idx),
            None | Some(Cell::Empty | Cell::Int(_) | Cell::Float(_) | Cell::Bool(_))
        )
    });

    if numeric {
        let values: Vec<Option<f64>> = rows.iter().map(|row| cell_number(row.get(idx))).collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|row| match row.get(idx) {
                None | Some(Cell::Empty) => None,
                Some(other) => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), values)
    }
}

/// Save DataFrames to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV, optionally prefixed with a UTF-8 byte-order mark
    pub fn save_csv(df: &mut DataFrame, path: &Path, include_bom: bool) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_bom(include_bom)
            .include_header(true)
            .finish(df)
            .map_err(|e| ZinbError::DataError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "4,5,6").unwrap();
        writeln!(file, "7,8,9").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let df = DataLoader::new().load_auto(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_auto("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ZinbError::NotFound(_)));
    }

    #[test]
    fn test_load_excel_first_sheet() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "ROADNAME").unwrap();
        sheet.write_string(0, 1, "LANES").unwrap();
        sheet.write_string(1, 0, "main").unwrap();
        sheet.write_number(1, 1, 2.0).unwrap();
        sheet.write_string(2, 0, "side").unwrap();
        sheet.write_number(3, 1, 4.0).unwrap();
        workbook.save(file.path()).unwrap();

        let df = DataLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("LANES").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("ROADNAME").unwrap().dtype(), &DataType::String);

        let lanes: Vec<Option<f64>> = df.column("LANES").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(lanes, vec![Some(2.0), None, Some(4.0)]);
    }

    #[test]
    fn test_broken_workbook_is_data_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(file, "not a workbook").unwrap();
        let err = DataLoader::new().load_auto(file.path()).unwrap_err();
        assert!(matches!(err, ZinbError::DataError(_)));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("x.PARQUET")), FileFormat::Parquet);
        assert_eq!(FileFormat::from_path(Path::new("x.tsv")), FileFormat::Tsv);
        assert_eq!(FileFormat::from_path(Path::new("x")), FileFormat::Csv);
    }

    #[test]
    fn test_save_csv_with_bom() {
        let mut df = DataFrame::new(vec![
            Column::new("a".into(), &[1, 2, 3]),
            Column::new("b".into(), &[4, 5, 6]),
        ])
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_csv(&mut df, file.path(), true).unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    }
}
