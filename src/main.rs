// main.rs

// --- External Crate Imports ---
use anyhow::{anyhow, Context, Error, Result};
use clap::Parser;
use env_logger;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use num_cpus;
use rayon::prelude::*;
use snp_distribution::{
    chart::{self, ChartKind, ChartStyle, ImageFormat},
    config::AggregationConfig,
    pipeline::{self, TableOptions},
    sources, tsv,
};
use std::time::Instant;

// --- Main Function ---
fn main() -> Result<(), Error> {
    let total_time_start = Instant::now();
    let cli_args = cli::CliArgs::parse();

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    info!("Starting snp_distribution with args: {:?}", cli_args);

    let num_threads = cli_args.threads.unwrap_or_else(num_cpus::get);
    info!("Using {} threads for parallel operations.", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = AggregationConfig::new(
        cli_args.max_length,
        cli_args.simplified,
        cli_args.sort_by_name,
    );
    let kinds = cli_args.chart_kinds();
    let formats = cli_args.output_formats();
    debug!("Aggregation config: {:?}; charts: {:?}; formats: {:?}", config, kinds, formats);

    // --- 1. Resolve input files ---
    let source_files = sources::discover_sources(&cli_args.path)?;
    let groups = sources::group_by_name(source_files);
    if groups.is_empty() {
        return Err(anyhow!(
            "No input tables found at {}. Not enough species.",
            cli_args.path.display()
        ));
    }
    info!(
        "Found {} source(s). Processing order (first 5): {:?}",
        groups.len(),
        groups.iter().take(5).map(|g| g.name.as_str()).collect::<Vec<_>>()
    );

    // --- 2. Parallel table parsing ---
    let table_options = TableOptions {
        gene_column: cli_args.name_column.clone(),
        snp_column: cli_args.snp_column.clone(),
        separator: cli_args.file_separator.clone(),
    };
    let pb_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tables ({percent}%)")
        .map_err(|e| anyhow!("Failed to create progress bar style: {}", e))?
        .progress_chars("=> ");
    let pb = ProgressBar::new(groups.len() as u64).with_style(pb_style);

    let results: Vec<_> = groups
        .par_iter()
        .map(|group| {
            let result = pipeline::load_histogram(group, &table_options);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_with_message("Table parsing complete.");

    let parsed = results.len();
    let histograms = match pipeline::collect_histograms(results, cli_args.skip_invalid) {
        Ok(histograms) => histograms,
        Err(processing_errors) => {
            for err in &processing_errors {
                error!("{}", err);
            }
            return Err(anyhow!(
                "Failed to process {} table(s). See errors above, or pass --skip-invalid.",
                processing_errors.len()
            ));
        }
    };
    if histograms.len() < parsed {
        warn!(
            "Skipped {} invalid table(s); continuing with {}.",
            parsed - histograms.len(),
            histograms.len()
        );
    }
    if histograms.is_empty() {
        return Err(anyhow!("No valid tables left to chart."));
    }

    // --- 3. Axis reconciliation & matrices ---
    let (axis, requests) = pipeline::plan_charts(&histograms, &kinds, &config);
    if axis.is_empty() {
        warn!("No gene carries a SNP count in any table; charts will be empty.");
    }

    // --- 4. Write outputs ---
    let Some(output_dir) = output_writer::prepare_output_dir(
        &cli_args.output_path,
        &cli_args.job_name(),
        !cli_args.no_output_warning,
    )?
    else {
        info!("Job stopped");
        return Ok(());
    };

    let style = ChartStyle {
        show_values: cli_args.show_values,
    };
    let job_name = cli_args.job_name();
    for request in &requests {
        // Names may contain dots, so extensions are appended rather than set.
        let stem = request.file_stem(&job_name);
        let output_file = |extension: &str| output_dir.join(format!("{}.{}", stem, extension));
        if formats.tsv {
            tsv::write_matrix_file(&output_file("tsv"), &request.matrix)?;
        }
        for format in formats.images() {
            let path = output_file(format.extension());
            chart::render_chart(&path, format, request.kind, &request.title(), &request.matrix, &style)
                .with_context(|| format!("Failed to render {}", path.display()))?;
        }
    }

    info!(
        "snp_distribution finished {} chart(s) in {:.2?}.",
        requests.len(),
        total_time_start.elapsed()
    );
    Ok(())
}

// --- Module Implementations ---

mod cli {
    use super::{ChartKind, ImageFormat};
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "SNP-per-gene distributions, bar charts and heatmaps from flat tables.", long_about = None, propagate_version = true)]
    pub(crate) struct CliArgs {
        /// Column holding gene names; duplicated names keep their last row.
        #[arg(short = 'n', long, required = true)]
        pub(crate) name_column: String,

        /// Column holding the number of SNPs of each gene.
        #[arg(short = 's', long, required = true)]
        pub(crate) snp_column: String,

        /// Directory of tables, or a .json file mapping table paths to common names.
        #[arg(short = 'p', long, default_value = "data")]
        pub(crate) path: PathBuf,

        #[arg(short = 'f', long, default_value = "\t")]
        pub(crate) file_separator: String,

        #[arg(short = 'o', long, default_value = "output")]
        pub(crate) output_path: PathBuf,

        #[arg(short = 'j', long = "job-name", default_value = "Unnamed")]
        pub(crate) job_name_arg: String,

        /// Number of SNP counts kept from 0 upwards; 0 or below keeps everything.
        #[arg(short = 'm', long, default_value_t = 20, allow_hyphen_values = true)]
        pub(crate) max_length: i64,

        /// Do not ask before writing into a non-empty job directory.
        #[arg(short = 'w', long)]
        pub(crate) no_output_warning: bool,

        /// Order species by name instead of input order.
        #[arg(short = 'r', long)]
        pub(crate) sort_by_name: bool,

        /// Hide SNP counts that no table has genes at (the axis may become discontinuous).
        #[arg(short = 'i', long)]
        pub(crate) simplified: bool,

        #[arg(short = 'g', long)]
        pub(crate) global_heatmap: bool,

        #[arg(short = 'q', long)]
        pub(crate) quantitative_barchart: bool,

        #[arg(short = 'c', long)]
        pub(crate) cumulative_barchart: bool,

        #[arg(short = 'u', long)]
        pub(crate) cumulative_heatmap: bool,

        #[arg(short = 't', long)]
        pub(crate) tsv: bool,

        #[arg(short = 'k', long)]
        pub(crate) png: bool,

        #[arg(short = 'v', long)]
        pub(crate) svg: bool,

        /// Write values inside heatmap cells with this font size (0 or below: automatic).
        #[arg(short = 'e', long, allow_hyphen_values = true)]
        pub(crate) show_values: Option<i32>,

        /// Leave out tables that fail to parse instead of stopping.
        #[arg(long)]
        pub(crate) skip_invalid: bool,

        #[arg(long)]
        pub(crate) threads: Option<usize>,

        #[arg(long, default_value = "Info")]
        pub(crate) log_level: String,
    }

    #[derive(Debug, Clone, Copy)]
    pub(crate) struct OutputFormats {
        pub(crate) tsv: bool,
        pub(crate) png: bool,
        pub(crate) svg: bool,
    }

    impl OutputFormats {
        pub(crate) fn images(&self) -> impl Iterator<Item = ImageFormat> {
            [(self.png, ImageFormat::Png), (self.svg, ImageFormat::Svg)]
                .into_iter()
                .filter_map(|(on, format)| on.then_some(format))
        }
    }

    impl CliArgs {
        pub(crate) fn job_name(&self) -> String {
            if self.job_name_arg.is_empty() {
                "job_name".to_string()
            } else {
                self.job_name_arg.clone()
            }
        }

        /// Falls back to the global heatmap when no chart is requested.
        pub(crate) fn chart_kinds(&self) -> Vec<ChartKind> {
            let mut kinds: Vec<ChartKind> = [
                (self.quantitative_barchart, ChartKind::QuantitativeBar),
                (self.cumulative_barchart, ChartKind::CumulativeBar),
                (self.cumulative_heatmap, ChartKind::FileHeatmap),
                (self.global_heatmap, ChartKind::GlobalHeatmap),
            ]
            .into_iter()
            .filter_map(|(on, kind)| on.then_some(kind))
            .collect();
            if kinds.is_empty() {
                kinds.push(ChartKind::GlobalHeatmap);
            }
            kinds
        }

        /// Falls back to PNG when no format is requested.
        pub(crate) fn output_formats(&self) -> OutputFormats {
            let any = self.tsv || self.png || self.svg;
            OutputFormats {
                tsv: self.tsv,
                png: self.png || !any,
                svg: self.svg,
            }
        }
    }

}

mod output_writer {
    use super::{info, warn, Context, Result};
    use std::fs;
    use std::io::{self, BufRead, Write};
    use std::path::{Path, PathBuf};

    const YES: [&str; 7] = ["y", "ye", "yes", "t", "tr", "tru", "true"];

    pub(crate) fn is_confirmation(answer: &str) -> bool {
        YES.contains(&answer.trim().to_lowercase().as_str())
    }

    /// Creates `<output_path>/<job_name>/`. Returns `None` when the directory
    /// already holds files and the user declines to continue.
    pub(crate) fn prepare_output_dir(
        output_path: &Path,
        job_name: &str,
        ask_before_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let output_dir = output_path.join(job_name);
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;
            info!("Created output directory: {}", output_dir.display());
            return Ok(Some(output_dir));
        }

        let non_empty = fs::read_dir(&output_dir)
            .with_context(|| format!("Failed to list {}", output_dir.display()))?
            .next()
            .is_some();
        if non_empty && ask_before_overwrite {
            warn!("Folder is not empty. Some files can be lost. ({})", output_dir.display());
            print!("Continue ? (y / n) : ");
            io::stdout().flush()?;
            let mut answer = String::new();
            io::stdin().lock().read_line(&mut answer)?;
            if !is_confirmation(&answer) {
                return Ok(None);
            }
        }
        Ok(Some(output_dir))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn accepts_prefixes_of_yes_and_true() {
            for answer in ["y", "YES\n", " tru ", "True"] {
                assert!(is_confirmation(answer), "{answer}");
            }
            for answer in ["", "n", "no", "yess", "false"] {
                assert!(!is_confirmation(answer), "{answer}");
            }
        }

        #[test]
        fn creates_missing_job_directory() {
            let dir = tempfile::tempdir().unwrap();
            let created = prepare_output_dir(&dir.path().join("out"), "job", true)
                .unwrap()
                .unwrap();
            assert!(created.is_dir());
            assert!(created.ends_with("out/job"));
        }

        #[test]
        fn non_empty_directory_without_warning_is_reused() {
            let dir = tempfile::tempdir().unwrap();
            let job_dir = dir.path().join("job");
            fs::create_dir(&job_dir).unwrap();
            fs::write(job_dir.join("old.png"), b"").unwrap();
            let reused = prepare_output_dir(dir.path(), "job", false).unwrap();
            assert_eq!(reused, Some(job_dir));
        }
    }
}
