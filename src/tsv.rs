// tsv.rs

use crate::error::{AggregationError, Result};
use crate::matrix::Matrix;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the matrix as tab-separated text: an axis header line, then one line
/// per row starting with its source name.
pub fn write_matrix<W: Write>(writer: &mut W, matrix: &Matrix) -> std::io::Result<()> {
    for value in matrix.axis().values() {
        write!(writer, "\t{}", value)?;
    }
    writeln!(writer)?;

    for (name, cells) in matrix.rows() {
        write!(writer, "{}", name)?;
        for cell in cells.iter() {
            write!(writer, "\t{}", cell)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_matrix_file(path: &Path, matrix: &Matrix) -> Result<()> {
    let io_err = |source| AggregationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = File::create(path).map(BufWriter::new).map_err(io_err)?;
    write_matrix(&mut writer, matrix).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::build_axis;
    use crate::config::AggregationConfig;
    use crate::histogram::{Histogram, Mode};
    use crate::matrix::assemble;
    use std::collections::BTreeMap;

    fn histogram(name: &str, counts: &[(u64, u64)]) -> Histogram {
        let map: BTreeMap<u64, u64> = counts.iter().copied().collect();
        Histogram::from_quantitative(name, map)
    }

    #[test]
    fn header_holds_axis_values_and_rows_hold_names() {
        let hs = [histogram("a", &[(0, 1), (2, 3)]), histogram("b", &[(2, 1)])];
        let cfg = AggregationConfig::new(-1, true, false);
        let axis = build_axis(&hs, Mode::Quantitative, &cfg);
        let matrix = assemble(&hs, &axis, Mode::Quantitative, &cfg);

        let mut out = Vec::new();
        write_matrix(&mut out, &matrix).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\t0\t2\na\t1\t3\nb\t0\t1\n");
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let hs = [histogram("a", &[(1, 2)])];
        let cfg = AggregationConfig::default();
        let axis = build_axis(&hs, Mode::Cumulative, &cfg);
        let matrix = assemble(&hs, &axis, Mode::Cumulative, &cfg);

        let path = dir.path().join("a.tsv");
        write_matrix_file(&path, &matrix).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\t0\t1\na\t2\t2\n");
    }
}
