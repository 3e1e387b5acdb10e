// table.rs

use crate::error::{AggregationError, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// One data line of a delimited table, keyed by the table's header.
#[derive(Debug, Clone)]
pub struct RawRow {
    header: Arc<[String]>,
    cells: Vec<String>,
    line_number: usize,
}

impl RawRow {
    /// Builds a row from a header and a delimited line.
    /// Missing trailing cells read as empty strings; surplus cells are dropped.
    pub fn parse(header: Arc<[String]>, line: &str, separator: &str, line_number: usize) -> Self {
        let mut split = line.split(separator);
        let cells = (0..header.len())
            .map(|_| split.next().unwrap_or("").to_string())
            .collect();
        Self {
            header,
            cells,
            line_number,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|name| name == column)
            .map(|idx| self.cells[idx].as_str())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 1-based line number in the source file.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Reads a flat file into rows. The first non-empty line is the header;
/// `required_columns` must all appear in it.
pub fn read_table(
    path: &Path,
    separator: &str,
    source_name: &str,
    required_columns: &[&str],
) -> Result<Vec<RawRow>> {
    let io_err = |source| AggregationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut header: Option<Arc<[String]>> = None;
    let mut rows = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(io_err)?;
        let line = strip_line_ending(&line);
        if line.is_empty() {
            continue;
        }

        match &header {
            None => {
                let names: Arc<[String]> =
                    line.split(separator).map(str::to_string).collect();
                for column in required_columns {
                    if !names.iter().any(|name| name == column) {
                        return Err(AggregationError::MissingColumn {
                            source_name: source_name.to_string(),
                            column: column.to_string(),
                            row: idx + 1,
                        });
                    }
                }
                debug!("{}: header has {} columns", source_name, names.len());
                header = Some(names);
            }
            Some(names) => rows.push(RawRow::parse(names.clone(), line, separator, idx + 1)),
        }
    }

    if header.is_none() {
        return Err(AggregationError::EmptyInput {
            source_name: source_name.to_string(),
        });
    }
    debug!("{}: read {} rows from {}", source_name, rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_table(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_cut() {
        let header: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let short = RawRow::parse(header.clone(), "1", "\t", 2);
        assert_eq!(short.get("a"), Some("1"));
        assert_eq!(short.get("b"), Some(""));

        let long = RawRow::parse(header, "1\t2\t3", "\t", 3);
        assert_eq!(long.get("b"), Some("2"));
        assert_eq!(long.get("c"), None);
    }

    #[test]
    fn skips_blank_lines_and_strips_crlf() {
        let f = write_table("\ngene\tsnp\r\ng1\t3\r\n\ng2\t5\n");
        let rows = read_table(f.path(), "\t", "sample", &["gene", "snp"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("snp"), Some("3"));
        assert_eq!(rows[1].get("gene"), Some("g2"));
        assert_eq!(rows[1].line_number(), 5);
    }

    #[test]
    fn custom_separator() {
        let f = write_table("gene;snp\ng1;4\n");
        let rows = read_table(f.path(), ";", "sample", &["gene", "snp"]).unwrap();
        assert_eq!(rows[0].get("snp"), Some("4"));
    }

    #[test]
    fn missing_header_column_is_reported() {
        let f = write_table("gene\tcount\ng1\t3\n");
        let err = read_table(f.path(), "\t", "sample", &["gene", "snp"]).unwrap_err();
        match err {
            AggregationError::MissingColumn { column, source_name, row } => {
                assert_eq!(column, "snp");
                assert_eq!(source_name, "sample");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_has_no_header() {
        let f = write_table("\n\n");
        let err = read_table(f.path(), "\t", "empty", &["gene"]).unwrap_err();
        assert!(matches!(err, AggregationError::EmptyInput { .. }));
    }
}
