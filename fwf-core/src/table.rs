//! Text tables for persisted experiment state
//!
//! Every intermediate product of the coupler (sector temperatures, running
//! means, melt anomalies, forcing anomalies, total forcing and the future-forcing
//! ledger) is stored as a small comma-separated table so it can be inspected and
//! read by the usual analysis tools.
//!
//! # File Format
//!
//! ```text
//! # applied: 2
//! # length: 251
//! offset,eais,wedd,amun,ross,apen
//! 0,0.0,0.0,0.0,0.0,0.0
//! 1,0.5,0.1,0.2,0.9,0.0
//! ```
//!
//! Lines starting with `#` carry optional `key: value` metadata. The first other
//! line is the header; the first column is an integer index (year or offset).
//! Empty cells are read as missing values.

use crate::errors::{FWFError, FWFResult};
use crate::series::FloatValue;
use std::fs;
use std::path::Path;

/// A row type that can be stored in a [`Table`]
pub trait TableRow: Sized + Copy {
    /// Names of the value columns, in order
    fn column_names() -> Vec<String>;

    fn to_fields(&self) -> Vec<FloatValue>;

    /// Rebuild a row from values ordered like [`TableRow::column_names`]
    fn from_fields(fields: &[FloatValue]) -> Option<Self>;
}

impl TableRow for FloatValue {
    fn column_names() -> Vec<String> {
        vec!["total".to_string()]
    }

    fn to_fields(&self) -> Vec<FloatValue> {
        vec![*self]
    }

    fn from_fields(fields: &[FloatValue]) -> Option<Self> {
        match fields {
            [v] => Some(*v),
            _ => None,
        }
    }
}

/// An indexed table of floating point columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    metadata: Vec<(String, String)>,
    index_name: String,
    columns: Vec<String>,
    rows: Vec<(i64, Vec<FloatValue>)>,
    header_line: usize,
}

impl Table {
    pub fn new(index_name: &str, columns: Vec<String>) -> Self {
        Self {
            metadata: Vec::new(),
            index_name: index_name.to_string(),
            columns,
            rows: Vec::new(),
            header_line: 1,
        }
    }

    /// Attach a `# key: value` metadata entry
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[(i64, Vec<FloatValue>)] {
        &self.rows
    }

    /// Append a row
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per column
    pub fn push_row(&mut self, index: i64, values: Vec<FloatValue>) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row length must match the number of columns"
        );
        self.rows.push((index, values));
    }

    /// Positions of the requested columns within this table
    ///
    /// Extra columns in the table are ignored, missing ones are reported as a
    /// parse error on the header line.
    pub fn column_positions(&self, names: &[String], path: &Path) -> FWFResult<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| FWFError::Parse {
                        path: path.to_path_buf(),
                        line: self.header_line,
                        message: format!("missing column '{}'", name),
                    })
            })
            .collect()
    }

    /// Parse a table from text. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> FWFResult<Self> {
        let parse_error = |line: usize, message: String| FWFError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut table: Option<Table> = None;
        let mut metadata = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line_no = line_no + 1;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                if let Some((key, value)) = comment.split_once(':') {
                    metadata.push((key.trim().to_string(), value.trim().to_string()));
                }
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            match table.as_mut() {
                None => {
                    let (index_name, columns) = fields
                        .split_first()
                        .ok_or_else(|| parse_error(line_no, "empty header".to_string()))?;
                    let mut new_table = Table::new(
                        index_name,
                        columns.iter().map(|c| c.to_string()).collect(),
                    );
                    new_table.header_line = line_no;
                    table = Some(new_table);
                }
                Some(table) => {
                    if fields.len() != table.columns.len() + 1 {
                        return Err(parse_error(
                            line_no,
                            format!(
                                "expected {} fields, found {}",
                                table.columns.len() + 1,
                                fields.len()
                            ),
                        ));
                    }

                    let index = parse_index(fields[0])
                        .ok_or_else(|| parse_error(line_no, format!("invalid index '{}'", fields[0])))?;
                    let values = fields[1..]
                        .iter()
                        .map(|f| parse_value(f))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| parse_error(line_no, format!("invalid value in '{}'", line)))?;

                    table.rows.push((index, values));
                }
            }
        }

        let mut table = table.ok_or_else(|| parse_error(0, "no header row".to_string()))?;
        table.metadata = metadata;
        Ok(table)
    }

    /// Read and parse a table file
    pub fn read(path: &Path) -> FWFResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| FWFError::io(path, e))?;
        Self::parse(&content, path)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.metadata {
            out.push_str(&format!("# {}: {}\n", key, value));
        }

        out.push_str(&self.index_name);
        for column in &self.columns {
            out.push(',');
            out.push_str(column);
        }
        out.push('\n');

        for (index, values) in &self.rows {
            out.push_str(&index.to_string());
            for v in values {
                out.push(',');
                if !v.is_nan() {
                    out.push_str(&v.to_string());
                }
            }
            out.push('\n');
        }
        out
    }

    /// Write the table, replacing any existing file
    ///
    /// The text is written to a temporary sibling first and then renamed over
    /// `path`, so readers never observe a partially written table.
    pub fn write(&self, path: &Path) -> FWFResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FWFError::io(parent, e))?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, self.to_text()).map_err(|e| FWFError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| FWFError::io(path, e))
    }
}

fn parse_index(field: &str) -> Option<i64> {
    field.parse::<i64>().ok().or_else(|| {
        // Some writers store integer indices as floats ("1850.0")
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })
}

fn parse_value(field: &str) -> Option<FloatValue> {
    if field.is_empty() {
        Some(FloatValue::NAN)
    } else {
        field.parse::<FloatValue>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("table.csv")
    }

    #[test]
    fn parse_with_metadata_and_comments() {
        let content = "# applied: 3\n# free-form comment\n\noffset,a,b\n0,1.5,2\n1,,-3e-2\n";
        let table = Table::parse(content, &path()).unwrap();

        assert_eq!(table.metadata("applied"), Some("3"));
        assert_eq!(table.metadata("length"), None);
        assert_eq!(table.index_name(), "offset");
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.rows()[0], (0, vec![1.5, 2.0]));
        assert!(table.rows()[1].1[0].is_nan());
        assert_eq!(table.rows()[1].1[1], -0.03);
    }

    #[test]
    fn float_indices_are_accepted() {
        let table = Table::parse("year,a\n1850.0,1\n", &path()).unwrap();
        assert_eq!(table.rows()[0].0, 1850);
        assert!(Table::parse("year,a\n1850.5,1\n", &path()).is_err());
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let err = Table::parse("year,a,b\n1850,1,2\n1851,1\n", &path()).unwrap_err();
        match err {
            FWFError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn invalid_value_is_an_error() {
        assert!(matches!(
            Table::parse("year,a\n1850,abc\n", &path()),
            Err(FWFError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(Table::parse("# only: metadata\n", &path()).is_err());
    }

    #[test]
    fn text_round_trip() {
        let mut table = Table::new("year", vec!["x".to_string(), "y".to_string()])
            .with_metadata("length", 2);
        table.push_row(2000, vec![0.1, FloatValue::NAN]);
        table.push_row(2001, vec![1.0 / 3.0, -2.5]);

        let text = table.to_text();
        assert!(text.starts_with("# length: 2\nyear,x,y\n2000,0.1,\n"));

        let parsed = Table::parse(&text, &path()).unwrap();
        assert_eq!(parsed.rows()[1], (2001, vec![1.0 / 3.0, -2.5]));
        assert_eq!(parsed.metadata("length"), Some("2"));
    }

    #[test]
    fn column_positions_ignore_extra_columns() {
        let table = Table::parse("year,b,extra,a\n", &path()).unwrap();
        let positions = table
            .column_positions(&["a".to_string(), "b".to_string()], &path())
            .unwrap();
        assert_eq!(positions, vec![2, 0]);
        assert!(table
            .column_positions(&["c".to_string()], &path())
            .is_err());
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("table.csv");

        let mut table = Table::new("year", vec!["a".to_string()]);
        table.push_row(1, vec![1.0]);
        table.write(&file).unwrap();
        table.push_row(2, vec![2.0]);
        table.write(&file).unwrap();

        let read = Table::read(&file).unwrap();
        assert_eq!(read.rows().len(), 2);
        assert!(!dir.path().join("nested").join("table.csv.tmp").exists());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Table::read(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/table.csv"));
    }
}
