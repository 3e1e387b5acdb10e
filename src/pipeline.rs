// pipeline.rs

use crate::axis::{build_axis, Axis};
use crate::chart::ChartKind;
use crate::config::AggregationConfig;
use crate::error::{AggregationError, Result};
use crate::gene_table::GeneTable;
use crate::histogram::{Histogram, Mode};
use crate::matrix::{assemble, row_order, Matrix};
use crate::sources::SourceGroup;
use crate::table::read_table;
use log::{debug, info, warn};

/// Column names and separator shared by every input table.
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub gene_column: String,
    pub snp_column: String,
    pub separator: String,
}

/// Reads every file of `group` in order and builds its histogram. Rows of files
/// sharing a name are concatenated before deduplication.
pub fn load_histogram(group: &SourceGroup, options: &TableOptions) -> Result<Histogram> {
    let required = [options.gene_column.as_str(), options.snp_column.as_str()];
    let mut rows = Vec::new();
    for path in &group.paths {
        rows.extend(read_table(path, &options.separator, &group.name, &required)?);
    }

    let table = GeneTable::build(&rows, &options.gene_column, &options.snp_column, &group.name)?;
    let histogram = Histogram::build(&table);
    debug!(
        "{}: {} rows, {} genes, SNP counts {:?}..={:?}",
        group.name,
        rows.len(),
        table.len(),
        histogram.min_count(),
        histogram.max_count()
    );
    Ok(histogram)
}

/// Splits per-file results into histograms and failures, keeping input order.
///
/// Failures are returned as the error unless `skip_invalid` is set, in which
/// case the failed files are left out and the rest go on.
pub fn collect_histograms(
    results: Vec<Result<Histogram>>,
    skip_invalid: bool,
) -> std::result::Result<Vec<Histogram>, Vec<AggregationError>> {
    let mut histograms = Vec::with_capacity(results.len());
    let mut processing_errors = Vec::new();
    for result in results {
        match result {
            Ok(histogram) => histograms.push(histogram),
            Err(e) => processing_errors.push(e),
        }
    }

    if processing_errors.is_empty() {
        return Ok(histograms);
    }
    if !skip_invalid {
        return Err(processing_errors);
    }
    for err in &processing_errors {
        warn!("Skipping {}: {}", err.source_name().unwrap_or("<unknown>"), err);
    }
    Ok(histograms)
}

/// A matrix ready for rendering, tagged with the chart it belongs to.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub kind: ChartKind,
    /// Set for per-file charts.
    pub source_name: Option<String>,
    pub matrix: Matrix,
}

impl ChartRequest {
    pub fn title(&self) -> String {
        self.kind.title(self.source_name.as_deref())
    }

    pub fn file_stem(&self, job_name: &str) -> String {
        self.kind.file_stem(job_name, self.source_name.as_deref())
    }
}

/// Builds the matrices for all requested chart kinds over one shared axis.
///
/// Per-file charts follow the row order of the global matrix.
pub fn plan_charts(
    histograms: &[Histogram],
    kinds: &[ChartKind],
    config: &AggregationConfig,
) -> (Axis, Vec<ChartRequest>) {
    let axis = build_axis(histograms, Mode::Cumulative, config);
    info!(
        "Shared axis over {} file(s): {} SNP-count values",
        histograms.len(),
        axis.len()
    );

    let ordered = row_order(histograms, config);

    let mut requests = Vec::new();
    for &kind in kinds {
        match kind {
            ChartKind::GlobalHeatmap => requests.push(ChartRequest {
                kind,
                source_name: None,
                matrix: assemble(histograms, &axis, kind.mode(), config),
            }),
            _ => {
                for histogram in &ordered {
                    requests.push(ChartRequest {
                        kind,
                        source_name: Some(histogram.source_name().to_string()),
                        matrix: assemble(
                            std::slice::from_ref(*histogram),
                            &axis,
                            kind.mode(),
                            config,
                        ),
                    });
                }
            }
        }
    }
    (axis, requests)
}
