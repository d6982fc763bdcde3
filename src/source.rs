//! Tabular data source backed by a polars `LazyFrame`.
//!
//! Every derived view (row selection, column slice, single expression) is a
//! new `DataSource` sharing the same lazy plan; the loaded data is never
//! mutated. A hidden row-index column rides along so the renderer can show
//! each row's position in the original table after filtering.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::RangeFrom;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::cli::CompressionFormat;

/// Name of the hidden column holding each row's original position.
pub const ROW_INDEX: &str = "__dbv_row_index__";

/// Options controlling how files are read.
#[derive(Debug, Default, Clone)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_lines: Option<usize>,
    pub skip_rows: Option<usize>,
    pub compression: Option<CompressionFormat>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = Some(skip_lines);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }
}

#[derive(Clone)]
pub struct DataSource {
    lf: LazyFrame,
    schema: SchemaRef,
    /// Keeps a decompressed temp file alive for as long as the lazy scan needs it.
    _backing: Option<Arc<NamedTempFile>>,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

impl DataSource {
    /// Wrap a lazy frame, attaching the hidden row index.
    pub fn new(lf: LazyFrame) -> Result<Self> {
        let lf = lf.with_row_index(ROW_INDEX, None);
        Self::from_indexed(lf, None)
    }

    fn from_indexed(lf: LazyFrame, backing: Option<Arc<NamedTempFile>>) -> Result<Self> {
        let schema = lf.clone().collect_schema()?;
        Ok(Self {
            lf,
            schema,
            _backing: backing,
        })
    }

    /// Derive a view from a new plan, validating its schema.
    fn derive(&self, lf: LazyFrame) -> PolarsResult<Self> {
        let schema = lf.clone().collect_schema()?;
        Ok(Self {
            lf,
            schema,
            _backing: self._backing.clone(),
        })
    }

    /// Data column names in display order (the row index is excluded).
    pub fn columns(&self) -> Vec<String> {
        self.schema
            .iter_names()
            .filter(|name| name.as_str() != ROW_INDEX)
            .map(|name| name.to_string())
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns().len()
    }

    /// Data column names paired with their types.
    pub fn dtypes(&self) -> Vec<(String, DataType)> {
        self.schema
            .iter()
            .filter(|(name, _)| name.as_str() != ROW_INDEX)
            .map(|(name, dtype)| (name.to_string(), dtype.clone()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name != ROW_INDEX && self.schema.get(name).is_some()
    }

    /// The named column as an expression, if it exists.
    pub fn column(&self, name: &str) -> Option<Expr> {
        self.has_column(name).then(|| col(name))
    }

    /// Number of rows. Runs the full plan; may be slow on large inputs.
    pub fn row_count(&self) -> PolarsResult<usize> {
        let df = self.lf.clone().select([len()]).collect()?;
        let count = df
            .get_columns()
            .first()
            .map(|c| c.get(0))
            .transpose()?
            .and_then(|v| v.extract::<u64>())
            .unwrap_or(0);
        Ok(count as usize)
    }

    /// Keep the rows for which `predicate` is true, preserving order.
    pub fn select_rows(&self, predicate: Expr) -> PolarsResult<Self> {
        self.derive(self.lf.clone().filter(predicate))
    }

    /// Drop the data columns before `range.start`.
    pub fn select_columns(&self, range: RangeFrom<usize>) -> PolarsResult<Self> {
        let columns = self.columns();
        if range.start == 0 || columns.is_empty() {
            return Ok(self.clone());
        }
        let start = range.start.min(columns.len());
        let mut exprs = vec![col(ROW_INDEX)];
        exprs.extend(columns[start..].iter().map(|name| col(name.as_str())));
        self.derive(self.lf.clone().select(exprs))
    }

    /// One-column view holding the result of `expr`.
    pub fn select_expr(&self, expr: Expr) -> PolarsResult<Self> {
        self.derive(self.lf.clone().select([col(ROW_INDEX), expr]))
    }

    /// Output type of `expr` evaluated against this source.
    pub fn output_dtype(&self, expr: Expr) -> PolarsResult<DataType> {
        let schema = self.lf.clone().select([expr]).collect_schema()?;
        let dtype = schema
            .iter_values()
            .next()
            .cloned()
            .ok_or_else(|| PolarsError::ComputeError("expression produced no output".into()));
        dtype
    }

    /// Materialize `limit` rows starting at `offset`. The first column is the
    /// row index.
    pub fn iter_rows(&self, offset: usize, limit: usize) -> PolarsResult<DataFrame> {
        let limit = IdxSize::try_from(limit).unwrap_or(IdxSize::MAX);
        self.lf.clone().slice(offset as i64, limit).collect()
    }

    /// Text form of a cell as the table shows it. Strings are verbatim and
    /// nulls read `null`; every other value (numbers, booleans, temporals,
    /// lists) takes the polars `AnyValue` display form.
    pub fn stringify(value: &AnyValue) -> String {
        match value {
            AnyValue::Null => "null".to_string(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

/// Load one or more files of the same format into a single source.
pub fn load_paths(paths: &[impl AsRef<Path>], options: &OpenOptions) -> Result<DataSource> {
    if paths.is_empty() {
        return Err(eyre!("No paths provided"));
    }
    let mut frames = Vec::with_capacity(paths.len());
    let mut backing = None;
    for path in paths {
        let path = path.as_ref();
        info!(path = %path.display(), "loading");
        let (lf, temp) = load_path(path, options)?;
        frames.push(lf);
        if temp.is_some() {
            backing = temp;
        }
    }
    if frames.len() > 1 && backing.is_some() {
        return Err(eyre!(
            "Concatenating several compressed files is not supported; open them one at a time"
        ));
    }
    let lf = if frames.len() == 1 {
        frames.remove(0)
    } else {
        concat(frames.as_slice(), Default::default())?
    };
    let lf = lf.with_row_index(ROW_INDEX, None);
    let source = DataSource::from_indexed(lf, backing.map(Arc::new))?;
    debug!(columns = source.column_count(), "source ready");
    Ok(source)
}

fn load_path(path: &Path, options: &OpenOptions) -> Result<(LazyFrame, Option<NamedTempFile>)> {
    if !path.exists() {
        return Err(eyre!("File not found: {}", path.display()));
    }
    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));

    if let Some(compression) = compression {
        if !is_csv_stem(path) {
            return Err(eyre!(
                "Compressed input is only supported for CSV files: {}",
                path.display()
            ));
        }
        let temp = decompress_to_temp(path, compression, &std::env::temp_dir())?;
        let lf = scan_delimited(temp.path(), options.delimiter.unwrap_or(b','), options)?;
        return Ok((lf, Some(temp)));
    }

    let pl_path = PlPath::Local(Arc::from(path));
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let lf = match extension.as_str() {
        "parquet" => LazyFrame::scan_parquet(pl_path, Default::default())?,
        "csv" => scan_delimited(path, options.delimiter.unwrap_or(b','), options)?,
        "tsv" => scan_delimited(path, options.delimiter.unwrap_or(b'\t'), options)?,
        "psv" => scan_delimited(path, options.delimiter.unwrap_or(b'|'), options)?,
        "json" => {
            let file = File::open(path)?;
            JsonReader::new(file)
                .with_json_format(JsonFormat::Json)
                .finish()?
                .lazy()
        }
        "jsonl" | "ndjson" => LazyJsonLineReader::new(pl_path).finish()?,
        "arrow" | "ipc" | "feather" => {
            LazyFrame::scan_ipc(pl_path, Default::default(), Default::default())?
        }
        _ => return Err(eyre!("Unsupported file type: {}", path.display())),
    };
    Ok((lf, None))
}

fn scan_delimited(path: &Path, delimiter: u8, options: &OpenOptions) -> Result<LazyFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    let mut reader = LazyCsvReader::new(pl_path).with_separator(delimiter);
    if let Some(skip_lines) = options.skip_lines {
        reader = reader.with_skip_lines(skip_lines);
    }
    if let Some(skip_rows) = options.skip_rows {
        reader = reader.with_skip_rows(skip_rows);
    }
    if let Some(has_header) = options.has_header {
        reader = reader.with_has_header(has_header);
    }
    Ok(reader.finish()?)
}

/// `data.csv.gz` and friends: the stem (minus compression suffix) is CSV.
fn is_csv_stem(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_lowercase().ends_with(".csv"))
        .unwrap_or(false)
}

/// Decompress a compressed file to a temp file for lazy CSV scan.
fn decompress_to_temp(
    path: &Path,
    compression: CompressionFormat,
    temp_dir: &Path,
) -> Result<NamedTempFile> {
    debug!(path = %path.display(), ?compression, "decompressing");
    let mut temp = NamedTempFile::new_in(temp_dir)?;
    let out = temp.as_file_mut();
    let f = File::open(path)?;
    let mut reader: Box<dyn Read> = match compression {
        CompressionFormat::Gzip => Box::new(flate2::read::GzDecoder::new(BufReader::new(f))),
        CompressionFormat::Zstd => Box::new(zstd::Decoder::new(BufReader::new(f))?),
        CompressionFormat::Bzip2 => Box::new(bzip2::read::BzDecoder::new(BufReader::new(f))),
        CompressionFormat::Xz => Box::new(xz2::read::XzDecoder::new(BufReader::new(f))),
    };
    std::io::copy(&mut reader, out)?;
    out.sync_all()?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn people() -> DataSource {
        let df = df!(
            "name" => ["ann", "bob", "cat", "dan"],
            "age" => [31i64, 25, 47, 19],
        )
        .unwrap();
        DataSource::new(df.lazy()).unwrap()
    }

    #[test]
    fn test_columns_hide_row_index() {
        let source = people();
        assert_eq!(source.columns(), vec!["name", "age"]);
        assert!(source.has_column("age"));
        assert!(!source.has_column(ROW_INDEX));
        assert!(source.column("missing").is_none());
    }

    #[test]
    fn test_row_count() {
        assert_eq!(people().row_count().unwrap(), 4);
    }

    #[test]
    fn test_select_rows_keeps_original_index() {
        let source = people();
        let view = source.select_rows(col("age").gt(lit(30))).unwrap();
        assert_eq!(view.row_count().unwrap(), 2);
        let page = view.iter_rows(0, 10).unwrap();
        let index = page.column(ROW_INDEX).unwrap();
        assert_eq!(index.get(0).unwrap().extract::<u64>(), Some(0));
        assert_eq!(index.get(1).unwrap().extract::<u64>(), Some(2));
    }

    #[test]
    fn test_select_columns() {
        let source = people();
        let view = source.select_columns(1..).unwrap();
        assert_eq!(view.columns(), vec!["age"]);
        let past_end = source.select_columns(5..).unwrap();
        assert!(past_end.columns().is_empty());
    }

    #[test]
    fn test_iter_rows_past_end_is_empty() {
        let page = people().iter_rows(10, 5).unwrap();
        assert_eq!(page.height(), 0);
    }

    #[test]
    fn test_stringify() {
        assert_eq!(DataSource::stringify(&AnyValue::String("x y")), "x y");
        assert_eq!(DataSource::stringify(&AnyValue::Int64(42)), "42");
        assert_eq!(DataSource::stringify(&AnyValue::Null), "null");
        assert_eq!(DataSource::stringify(&AnyValue::Boolean(true)), "true");
        assert_eq!(DataSource::stringify(&AnyValue::Float64(1.5)), "1.5");
    }

    #[test]
    fn test_load_csv_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("people.csv");
        std::fs::write(&csv_path, "a,b\n1,x\n2,y\n").unwrap();
        let source = load_paths(&[&csv_path], &OpenOptions::new()).unwrap();
        assert_eq!(source.columns(), vec!["a", "b"]);
        assert_eq!(source.row_count().unwrap(), 2);

        let gz_path = dir.path().join("people.csv.gz");
        let file = File::create(&gz_path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"a,b\n1,x\n2,y\n3,z\n").unwrap();
        encoder.finish().unwrap();
        let source = load_paths(&[&gz_path], &OpenOptions::new()).unwrap();
        assert_eq!(source.row_count().unwrap(), 3);
    }

    #[test]
    fn test_load_concatenates_paths() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("one.csv");
        let second = dir.path().join("two.csv");
        std::fs::write(&first, "a\n1\n2\n").unwrap();
        std::fs::write(&second, "a\n3\n").unwrap();
        let source = load_paths(&[&first, &second], &OpenOptions::new()).unwrap();
        assert_eq!(source.row_count().unwrap(), 3);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(load_paths(&[&path], &OpenOptions::new()).is_err());
        assert!(load_paths(&[dir.path().join("missing.csv")], &OpenOptions::new()).is_err());
    }
}
