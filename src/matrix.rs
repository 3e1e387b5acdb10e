// matrix.rs

use crate::axis::Axis;
use crate::config::AggregationConfig;
use crate::histogram::{Histogram, Mode};
use log::warn;
use ndarray::{Array2, ArrayView1, Axis as NdAxis};

/// Files x SNP-counts table of gene counts, aligned on one [`Axis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    axis: Axis,
    mode: Mode,
    row_names: Vec<String>,
    cells: Array2<u64>,
}

impl Matrix {
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    pub fn cells(&self) -> &Array2<u64> {
        &self.cells
    }

    pub fn nrows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.cells.ncols()
    }

    /// Rows in display order as (source name, cells).
    pub fn rows(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, u64>)> + '_ {
        self.row_names
            .iter()
            .map(String::as_str)
            .zip(self.cells.axis_iter(NdAxis(0)))
    }

    pub fn row(&self, source_name: &str) -> Option<ArrayView1<'_, u64>> {
        self.row_names
            .iter()
            .position(|name| name == source_name)
            .map(|idx| self.cells.row(idx))
    }

    /// Largest cell, used to scale heatmap colours.
    pub fn max_value(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// No rows or no columns: the chart has nothing to show.
    pub fn is_degenerate(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Gene count of `histogram` at `count`, ignoring genes above the axis ceiling.
fn cell_value(histogram: &Histogram, mode: Mode, count: u64, ceiling: Option<u64>) -> u64 {
    match mode {
        Mode::Quantitative => histogram.value(Mode::Quantitative, count),
        Mode::Cumulative => {
            let at_least = histogram.value(Mode::Cumulative, count);
            let above_ceiling = ceiling
                .and_then(|c| c.checked_add(1))
                .map(|above| histogram.value(Mode::Cumulative, above))
                .unwrap_or(0);
            at_least - above_ceiling
        }
    }
}

/// Row order of every matrix: input order, or a stable sort by source name.
pub fn row_order<'a>(histograms: &'a [Histogram], config: &AggregationConfig) -> Vec<&'a Histogram> {
    let mut ordered: Vec<&Histogram> = histograms.iter().collect();
    if config.sort_by_name {
        ordered.sort_by(|a, b| a.source_name().cmp(b.source_name()));
    }
    ordered
}

/// Stacks one row per histogram onto `axis`. A single histogram gives the
/// per-file form; several give the global form.
pub fn assemble(histograms: &[Histogram], axis: &Axis, mode: Mode, config: &AggregationConfig) -> Matrix {
    let ordered = row_order(histograms, config);

    let mut cells = Array2::<u64>::zeros((ordered.len(), axis.len()));
    for (row_idx, histogram) in ordered.iter().enumerate() {
        for (col_idx, &count) in axis.values().iter().enumerate() {
            cells[[row_idx, col_idx]] = cell_value(histogram, mode, count, axis.ceiling());
        }
    }

    if axis.is_empty() && !ordered.is_empty() {
        warn!(
            "Matrix for {} file(s) has no columns: no genes to display.",
            ordered.len()
        );
    }

    Matrix {
        axis: axis.clone(),
        mode,
        row_names: ordered.iter().map(|h| h.source_name().to_string()).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::build_axis;
    use std::collections::BTreeMap;

    fn histogram(name: &str, counts: &[(u64, u64)]) -> Histogram {
        let map: BTreeMap<u64, u64> = counts.iter().copied().collect();
        Histogram::from_quantitative(name, map)
    }

    fn row(matrix: &Matrix, name: &str) -> Vec<u64> {
        matrix.row(name).unwrap().to_vec()
    }

    #[test]
    fn missing_axis_values_are_zero_filled() {
        let hs = [histogram("a", &[(0, 1), (2, 3)]), histogram("b", &[(2, 1), (5, 2)])];
        let cfg = AggregationConfig::new(-1, true, false);
        let axis = build_axis(&hs, Mode::Quantitative, &cfg);
        let m = assemble(&hs, &axis, Mode::Quantitative, &cfg);
        assert_eq!((m.nrows(), m.ncols()), (2, 3));
        assert_eq!(row(&m, "a"), vec![1, 3, 0]);
        assert_eq!(row(&m, "b"), vec![0, 1, 2]);
    }

    #[test]
    fn cumulative_rows_follow_suffix_sums() {
        let hs = [histogram("a", &[(2, 2), (5, 1)])];
        let cfg = AggregationConfig::default();
        let axis = build_axis(&hs, Mode::Cumulative, &cfg);
        let m = assemble(&hs, &axis, Mode::Cumulative, &cfg);
        assert_eq!(row(&m, "a"), vec![3, 3, 3, 1, 1, 1]);
    }

    #[test]
    fn outlier_count_is_cut_by_default_limit() {
        let hs = [histogram("a", &[(1, 5), (30_000_000, 1), (u64::MAX, 1)])];
        let cfg = AggregationConfig::new(20, false, false);
        let axis = build_axis(&hs, Mode::Cumulative, &cfg);
        assert_eq!(axis.len(), 20);
        assert_eq!(axis.ceiling(), Some(19));
        let m = assemble(&hs, &axis, Mode::Cumulative, &cfg);
        let mut expected = vec![0; 20];
        expected[0] = 5;
        expected[1] = 5;
        assert_eq!(row(&m, "a"), expected);
    }

    #[test]
    fn truncated_genes_appear_in_no_cell() {
        let hs = [histogram("a", &[(0, 1), (1, 2), (2, 4), (3, 8), (10, 16)])];
        let cfg = AggregationConfig::new(3, false, false);
        let axis = build_axis(&hs, Mode::Quantitative, &cfg);
        assert_eq!(axis.values(), &[0, 1, 2]);

        let quantitative = assemble(&hs, &axis, Mode::Quantitative, &cfg);
        assert_eq!(row(&quantitative, "a"), vec![1, 2, 4]);

        let cumulative = assemble(&hs, &axis, Mode::Cumulative, &cfg);
        assert_eq!(row(&cumulative, "a"), vec![7, 6, 4]);
    }

    #[test]
    fn rows_keep_input_order_unless_sorted() {
        let hs = [
            histogram("zebrafish", &[(1, 1)]),
            histogram("Mouse", &[(1, 1)]),
            histogram("human", &[(1, 1)]),
        ];
        let unsorted = AggregationConfig::new(-1, false, false);
        let axis = build_axis(&hs, Mode::Quantitative, &unsorted);
        let m = assemble(&hs, &axis, Mode::Quantitative, &unsorted);
        assert_eq!(m.row_names(), &["zebrafish", "Mouse", "human"]);

        let sorted = AggregationConfig::new(-1, false, true);
        let m = assemble(&hs, &axis, Mode::Quantitative, &sorted);
        assert_eq!(m.row_names(), &["Mouse", "human", "zebrafish"]);
    }

    #[test]
    fn single_histogram_is_one_row_on_shared_axis() {
        let a = histogram("a", &[(1, 2)]);
        let b = histogram("b", &[(4, 1)]);
        let cfg = AggregationConfig::default();
        let axis = build_axis(&[a.clone(), b], Mode::Cumulative, &cfg);
        let m = assemble(std::slice::from_ref(&a), &axis, Mode::Cumulative, &cfg);
        assert_eq!(m.nrows(), 1);
        assert_eq!(row(&m, "a"), vec![2, 2, 0, 0, 0]);
    }

    #[test]
    fn empty_inputs_give_degenerate_matrix() {
        let cfg = AggregationConfig::default();
        let axis = build_axis(&[], Mode::Quantitative, &cfg);
        let m = assemble(&[], &axis, Mode::Quantitative, &cfg);
        assert!(m.is_degenerate());
        assert_eq!(m.rows().count(), 0);

        let hs = [histogram("a", &[])];
        let axis = build_axis(&hs, Mode::Cumulative, &cfg);
        let m = assemble(&hs, &axis, Mode::Cumulative, &cfg);
        assert!(m.is_degenerate());
        assert_eq!(m.nrows(), 1);
        assert_eq!(m.max_value(), 0);
    }
}
