use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow::util::display::array_value_to_string;
use calamine::{Data, ExcelDateTime, Reader, Xlsx};
use chrono::NaiveTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, DataTable};
use crate::error::LoadError;

/// Text cells treated as missing values when reading delimited files.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Upload handle
// ---------------------------------------------------------------------------

/// Where the uploaded bytes live.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A file handed to the dashboard, by dialog or drag & drop.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Display name; its extension selects the parser.
    pub name: String,
    pub source: UploadSource,
}

impl Upload {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Upload {
            name,
            source: UploadSource::Path(path.to_path_buf()),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Upload {
            name: name.into(),
            source: UploadSource::Bytes(bytes.into()),
        }
    }

    /// Lower-cased extension of the display name ("" when there is none).
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    fn read(&self) -> Result<Cow<'_, [u8]>, LoadError> {
        match &self.source {
            UploadSource::Bytes(bytes) => Ok(Cow::Borrowed(&bytes[..])),
            UploadSource::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| LoadError::Io {
                    name: self.name.clone(),
                    source,
                }),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from an uploaded file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by records
/// * `.xlsx`    – first worksheet, first row is the header
/// * `.parquet` – flat Arrow columns
/// * `.json`    – `[{ "col": value, ... }, ...]`
pub fn load(upload: &Upload) -> Result<DataTable, LoadError> {
    let name = upload.name.as_str();
    let result = match upload.extension().as_str() {
        "csv" => load_csv(name, &upload.read()?),
        "xlsx" => load_xlsx(name, &upload.read()?),
        "json" => load_json(name, &upload.read()?),
        "parquet" | "pq" => match &upload.source {
            UploadSource::Path(path) => load_parquet(name, path),
            UploadSource::Bytes(_) => Err(anyhow::anyhow!(
                "parquet files must be opened from disk"
            )),
        },
        _ => {
            return Err(LoadError::UnsupportedExtension {
                name: name.to_string(),
            });
        }
    };
    result.map_err(|e| LoadError::parse(name, e))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
/// Every record must have as many fields as the header.
fn load_csv(name: &str, bytes: &[u8]) -> Result<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        bail!("no columns to parse from file");
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        for (col, value) in raw.iter_mut().zip(record.iter()) {
            col.push(value.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(header, values)| (header, type_text_column(&values)))
        .collect();

    DataTable::from_columns(name, columns)
}

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Type a column of raw text as a whole: integers, then floats, then
/// booleans, falling back to strings. Missing markers become `Null`.
pub fn type_text_column(values: &[String]) -> Vec<CellValue> {
    let present = || values.iter().filter(|v| !is_missing_marker(v));

    if present().all(|v| v.trim().parse::<i64>().is_ok()) {
        return convert_cells(values, |v| {
            v.parse::<i64>().map_or(CellValue::Null, CellValue::Integer)
        });
    }
    if present().all(|v| v.trim().parse::<f64>().is_ok()) {
        return convert_cells(values, |v| {
            v.parse::<f64>().map_or(CellValue::Null, CellValue::Float)
        });
    }
    if present().all(|v| parse_bool(v).is_some()) {
        return convert_cells(values, |v| parse_bool(v).map_or(CellValue::Null, CellValue::Bool));
    }
    values
        .iter()
        .map(|v| {
            if is_missing_marker(v) {
                CellValue::Null
            } else {
                CellValue::String(v.clone())
            }
        })
        .collect()
}

fn convert_cells(values: &[String], f: impl Fn(&str) -> CellValue) -> Vec<CellValue> {
    values
        .iter()
        .map(|v| {
            if is_missing_marker(v) {
                CellValue::Null
            } else {
                f(v.trim())
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Reads the first worksheet of an `.xlsx` workbook; the first row holds
/// the column names.
fn load_xlsx(name: &str, bytes: &[u8]) -> Result<DataTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect(),
        None => bail!("worksheet is empty"),
    };

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, cell) in columns.iter_mut().zip(row.iter()) {
            col.push(excel_cell(cell));
        }
    }

    DataTable::from_columns(name, headers.into_iter().zip(columns).collect())
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::DateTime(dt) => CellValue::Date(excel_datetime(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
    }
}

/// Serial date/time numbers as text: `2024-01-01` at midnight,
/// `2024-01-01 13:45:00` otherwise, `0 days 01:30:00` for durations.
fn excel_datetime(dt: &ExcelDateTime) -> String {
    let text = if dt.is_duration() {
        dt.as_duration().map(|d| {
            let secs = d.num_seconds();
            let (days, rem) = (secs.div_euclid(86_400), secs.rem_euclid(86_400));
            format!(
                "{days} days {:02}:{:02}:{:02}",
                rem / 3600,
                rem % 3600 / 60,
                rem % 60
            )
        })
    } else {
        dt.as_datetime().map(|d| {
            if d.time() == NaiveTime::MIN {
                d.format("%Y-%m-%d").to_string()
            } else {
                d.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        })
    };
    text.unwrap_or_else(|| dt.as_f64().to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sample": "A", "concentration": 1.5 },
///   ...
/// ]
/// ```
///
/// Columns appear in order of first occurrence; absent keys are missing.
fn load_json(name: &str, bytes: &[u8]) -> Result<DataTable> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    let records = root.as_array().context("expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        bail!("no columns to parse from file");
    }

    let columns = headers
        .into_iter()
        .map(|key| {
            let cells = records
                .iter()
                .map(|rec| rec.get(&key).map_or(CellValue::Null, json_to_cell))
                .collect();
            (key, cells)
        })
        .collect();

    DataTable::from_columns(name, columns)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns (strings, ints, floats, bools,
/// dates and timestamps). Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(name: &str, path: &Path) -> Result<DataTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (cells, array) in columns.iter_mut().zip(batch.columns()) {
            for row in 0..batch.num_rows() {
                cells.push(arrow_cell(array, row));
            }
        }
    }

    DataTable::from_columns(name, headers.into_iter().zip(columns).collect())
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let value = match col.data_type() {
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        DataType::Int8 => int_cell(col.as_primitive_opt::<Int8Type>().map(|a| a.value(row))),
        DataType::Int16 => int_cell(col.as_primitive_opt::<Int16Type>().map(|a| a.value(row))),
        DataType::Int32 => int_cell(col.as_primitive_opt::<Int32Type>().map(|a| a.value(row))),
        DataType::Int64 => int_cell(col.as_primitive_opt::<Int64Type>().map(|a| a.value(row))),
        DataType::UInt8 => int_cell(col.as_primitive_opt::<UInt8Type>().map(|a| a.value(row))),
        DataType::UInt16 => int_cell(col.as_primitive_opt::<UInt16Type>().map(|a| a.value(row))),
        DataType::UInt32 => int_cell(col.as_primitive_opt::<UInt32Type>().map(|a| a.value(row))),
        DataType::UInt64 => col.as_primitive_opt::<UInt64Type>().map(|a| {
            let v = a.value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            array_value_to_string(col.as_ref(), row).ok().map(CellValue::Date)
        }
        _ => array_value_to_string(col.as_ref(), row).ok().map(CellValue::String),
    };
    value.unwrap_or(CellValue::Null)
}

fn int_cell<T: Into<i64>>(v: Option<T>) -> Option<CellValue> {
    v.map(|v| CellValue::Integer(v.into()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::ColumnKind;

    fn csv_upload(text: &str) -> Upload {
        Upload::from_bytes("upload.csv", text.as_bytes().to_vec())
    }

    #[test]
    fn csv_columns_are_typed_as_a_whole() {
        let table = load(&csv_upload(
            "id,city,price,flag\n1,Oslo,10.5,true\n2,Rome,NA,False\n3,,7,true\n",
        ))
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["id", "city", "price", "flag"]);

        let id = table.select_column("id").unwrap();
        assert_eq!(id.kind, ColumnKind::Numeric);
        assert_eq!(id.cells[2], CellValue::Integer(3));

        let price = table.select_column("price").unwrap();
        assert_eq!(price.kind, ColumnKind::Numeric);
        assert_eq!(price.cells[1], CellValue::Null);
        assert_eq!(price.cells[2], CellValue::Float(7.0));

        let city = table.select_column("city").unwrap();
        assert_eq!(city.kind, ColumnKind::Text);
        assert_eq!(city.cells[2], CellValue::Null);

        assert_eq!(table.select_column("flag").unwrap().kind, ColumnKind::Boolean);
    }

    #[test]
    fn ragged_csv_is_a_load_error() {
        let err = load(&csv_upload("a;b;c\n1;2\nnot,a,valid,row\n")).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn empty_csv_is_a_load_error() {
        let err = load(&csv_upload("")).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn binary_csv_is_a_load_error() {
        let upload = Upload::from_bytes("junk.csv", vec![b'a', b',', b'b', b'\n', 0xff, 0xfe, b',', 0x80]);
        assert!(load(&upload).is_err());
    }

    #[test]
    fn header_only_csv_gives_empty_table() {
        let table = load(&csv_upload("a,b\n")).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn unsupported_extension() {
        let upload = Upload::from_bytes("notes.txt", b"hello".to_vec());
        assert!(matches!(
            load(&upload),
            Err(LoadError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn extension_is_case_insensitive() {
        let upload = Upload::from_bytes("DATA.CSV", b"x\n1\n".to_vec());
        assert_eq!(upload.extension(), "csv");
        assert_eq!(load(&upload).unwrap().len(), 1);
    }

    #[test]
    fn malformed_xlsx_is_a_load_error() {
        let upload = Upload::from_bytes("book.xlsx", b"definitely not a zip archive".to_vec());
        assert!(matches!(load(&upload), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn excel_dates_are_formatted() {
        use calamine::{CellErrorType, ExcelDateTimeType};

        let date = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(excel_cell(&Data::DateTime(date)), CellValue::Date("2024-01-01".into()));

        let noon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            excel_cell(&Data::DateTime(noon)),
            CellValue::Date("2024-01-01 12:00:00".into())
        );

        let span = ExcelDateTime::new(1.0625, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(
            excel_cell(&Data::DateTime(span)),
            CellValue::Date("1 days 01:30:00".into())
        );

        assert_eq!(
            excel_cell(&Data::DateTimeIso("2024-02-03T04:05:06".into())),
            CellValue::Date("2024-02-03T04:05:06".into())
        );
        assert_eq!(excel_cell(&Data::Error(CellErrorType::Div0)), CellValue::Null);
    }

    #[test]
    fn xlsx_workbook_from_disk() {
        use rust_xlsxwriter::{ExcelDateTime as XlsxDateTime, Format, Workbook};

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["id", "name", "score", "active", "joined"].iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        let day = Format::new().set_num_format("yyyy-mm-dd");
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        sheet.write_number(1, 0, 1).unwrap();
        sheet.write_string(1, 1, "ann").unwrap();
        sheet.write_number(1, 2, 2.5).unwrap();
        sheet.write_boolean(1, 3, true).unwrap();
        let jan = XlsxDateTime::from_ymd(2024, 1, 1).unwrap();
        sheet.write_datetime_with_format(1, 4, &jan, &day).unwrap();

        sheet.write_number(2, 0, 2).unwrap();
        sheet.write_string(2, 1, "bob").unwrap();
        sheet.write_boolean(2, 3, false).unwrap();
        let march = XlsxDateTime::from_ymd(2024, 3, 15)
            .unwrap()
            .and_hms(12, 0, 0.0)
            .unwrap();
        sheet.write_datetime_with_format(2, 4, &march, &stamp).unwrap();

        // row 3 leaves name and joined blank
        sheet.write_number(3, 0, 3).unwrap();
        sheet.write_number(3, 2, 4).unwrap();
        sheet.write_boolean(3, 3, true).unwrap();
        workbook.save(file.path()).unwrap();

        let table = load(&Upload::from_path(file.path())).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["id", "name", "score", "active", "joined"]);

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Text,
                ColumnKind::Numeric,
                ColumnKind::Boolean,
                ColumnKind::DateTime,
            ]
        );

        let cells = |name: &str| table.select_column(name).unwrap().cells.clone();
        assert_eq!(
            cells("id"),
            vec![CellValue::Float(1.0), CellValue::Float(2.0), CellValue::Float(3.0)]
        );
        assert_eq!(cells("name")[2], CellValue::Null);
        assert_eq!(cells("score"), vec![CellValue::Float(2.5), CellValue::Null, CellValue::Float(4.0)]);
        assert_eq!(cells("active")[1], CellValue::Bool(false));
        assert_eq!(
            cells("joined"),
            vec![
                CellValue::Date("2024-01-01".into()),
                CellValue::Date("2024-03-15 12:00:00".into()),
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn json_records_keep_first_seen_column_order() {
        let upload = Upload::from_bytes(
            "rows.json",
            br#"[{"b": 1, "a": "x"}, {"a": "y", "c": 2.5}]"#.to_vec(),
        );
        let table = load(&upload).unwrap();
        assert_eq!(table.column_names(), vec!["b", "a", "c"]);
        assert_eq!(table.select_column("b").unwrap().cells[1], CellValue::Null);
        assert_eq!(table.numeric_column_names(), vec!["b", "c"]);
    }

    #[test]
    fn csv_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b\n1,2\n3,4").unwrap();
        let table = load(&Upload::from_path(file.path())).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.numeric_column_names(), vec!["a", "b"]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let upload = Upload::from_path(Path::new("/definitely/not/here.csv"));
        assert!(matches!(load(&upload), Err(LoadError::Io { .. })));
    }

    #[test]
    fn parquet_round_trip_from_disk() {
        use arrow::array::{Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("value", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
                Arc::new(Float64Array::from(vec![Some(0.5), Some(1.5), None])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load(&Upload::from_path(file.path())).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.numeric_column_names(), vec!["id", "value"]);
        assert_eq!(table.select_column("name").unwrap().cells[1], CellValue::Null);
        assert_eq!(table.select_column("value").unwrap().cells[2], CellValue::Null);
    }
}
