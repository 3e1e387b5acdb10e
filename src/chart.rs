// chart.rs

use crate::error::{AggregationError, Result};
use crate::histogram::Mode;
use crate::matrix::Matrix;
use log::{debug, info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// The charts a job can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    QuantitativeBar,
    CumulativeBar,
    /// One cumulative heatmap row per file.
    FileHeatmap,
    /// All files stacked into one cumulative heatmap.
    GlobalHeatmap,
}

impl ChartKind {
    pub fn mode(self) -> Mode {
        match self {
            ChartKind::QuantitativeBar => Mode::Quantitative,
            _ => Mode::Cumulative,
        }
    }

    pub fn title(self, source_name: Option<&str>) -> String {
        let name = source_name.unwrap_or_default();
        match self {
            ChartKind::QuantitativeBar => format!("Number of snp per genes in {}", name),
            ChartKind::CumulativeBar => format!("Number of genes with at least n snp in {}", name),
            ChartKind::FileHeatmap => format!("Number of genes with at least n SNP : {}", name),
            ChartKind::GlobalHeatmap => "Number of genes with at least n SNP".to_string(),
        }
    }

    /// Output file name without extension.
    pub fn file_stem(self, job_name: &str, source_name: Option<&str>) -> String {
        let name = source_name.unwrap_or_default();
        match self {
            ChartKind::QuantitativeBar => format!("{}_QuantitativeBarchart_{}", job_name, name),
            ChartKind::CumulativeBar => format!("{}_CumulativeBarchart_{}", job_name, name),
            ChartKind::FileHeatmap => format!("{}_Heatmap_{}", job_name, name),
            ChartKind::GlobalHeatmap => format!("{}_Heatmap_global", job_name),
        }
    }

    pub fn is_heatmap(self) -> bool {
        matches!(self, ChartKind::FileHeatmap | ChartKind::GlobalHeatmap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Heatmap cell annotation: `None` draws no values, a size of zero or below picks one from the cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartStyle {
    pub show_values: Option<i32>,
}

const UNITS: [&str; 6] = ["", "k", "M", "G", "T", "P"];

/// Three significant digits with a unit suffix, rounded half-up:
/// 1234 -> "1.23k", 123456 -> "123k", 1999 -> "2.00k".
pub fn format_cell_value(value: u64) -> String {
    let exact_len = value.to_string().len();
    if exact_len <= 3 {
        return value.to_string();
    }
    let step = 10u128.pow((exact_len - 3) as u32);
    let rounded = (u128::from(value) + step / 2) / step * step;
    let digits = rounded.to_string();
    let unit_idx = ((digits.len() - 1) / 3).min(UNITS.len() - 1);
    let int_len = digits.len() - unit_idx * 3;
    if int_len >= 3 {
        format!("{}{}", &digits[..int_len], UNITS[unit_idx])
    } else {
        format!("{}.{}{}", &digits[..int_len], &digits[int_len..3], UNITS[unit_idx])
    }
}

/// Jet-like colour for `t` in [0, 1].
fn jet(t: f64) -> RGBColor {
    let channel = |offset: f64| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    RGBColor(channel(3.0), channel(2.0), channel(1.0))
}

/// Zero cells stay blank; 1..=max spans the colour scale.
fn heat_colour(value: u64, max: u64) -> Option<RGBColor> {
    if value == 0 {
        return None;
    }
    let t = if max > 1 {
        (value - 1) as f64 / (max - 1) as f64
    } else {
        1.0
    };
    Some(jet(t))
}

fn chart_err<E: std::fmt::Display>(e: E) -> AggregationError {
    AggregationError::Chart(e.to_string())
}

const BAR_COLOUR: RGBColor = RGBColor(135, 206, 235);
const CELL_TEXT_COLOUR: RGBColor = RGBColor(160, 160, 160);
const HEAT_CELL: i32 = 40;

fn bar_chart_size(matrix: &Matrix) -> (u32, u32) {
    (((matrix.ncols() as u32) * 30 + 160).max(640), 480)
}

fn heatmap_layout(matrix: &Matrix) -> (i32, i32, u32, u32) {
    let longest_name = matrix.row_names().iter().map(|n| n.chars().count()).max().unwrap_or(0);
    let left = 30 + 8 * longest_name as i32;
    let top = 60;
    let width = left + matrix.ncols() as i32 * HEAT_CELL + 160;
    let height = top + (matrix.nrows() as i32 * HEAT_CELL).max(3 * HEAT_CELL) + 80;
    (left, top, width as u32, height as u32)
}

fn draw_bar_chart<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    matrix: &Matrix,
) -> Result<()> {
    root.fill(&WHITE).map_err(chart_err)?;

    let axis_values = matrix.axis().values();
    let row = matrix.cells().row(0);
    let y_max = matrix.max_value();
    let y_top = y_max + y_max / 10 + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..axis_values.len()).into_segmented(), 0u64..y_top)
        .map_err(chart_err)?;

    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => axis_values
            .get(*i)
            .map(|count| count.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(axis_values.len())
        .x_label_formatter(&label)
        .x_desc("Number of snp")
        .y_desc("Number of genes")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOUR.filled())
                .margin(2)
                .data(row.iter().enumerate().map(|(i, &genes)| (i, genes))),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Zero or negative sizes are picked from the cell size.
fn value_font_size(requested: i32) -> i32 {
    if requested <= 0 {
        HEAT_CELL / 4
    } else {
        requested
    }
}

fn draw_heatmap<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    matrix: &Matrix,
    style: &ChartStyle,
) -> Result<()> {
    root.fill(&WHITE).map_err(chart_err)?;
    let (left, top, width, _) = heatmap_layout(matrix);
    let max = matrix.max_value();
    let grid_bottom = top + matrix.nrows() as i32 * HEAT_CELL;

    let centered = |size: i32| {
        ("sans-serif", size)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center))
    };

    root.draw(&Text::new(title.to_string(), (width as i32 / 2, top / 2), centered(22)))
        .map_err(chart_err)?;

    for (row_idx, (name, cells)) in matrix.rows().enumerate() {
        let y0 = top + row_idx as i32 * HEAT_CELL;
        root.draw(&Text::new(
            name.to_string(),
            (left - 8, y0 + HEAT_CELL / 2),
            ("sans-serif", 14)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(chart_err)?;

        for (col_idx, &genes) in cells.iter().enumerate() {
            let x0 = left + col_idx as i32 * HEAT_CELL;
            let corners = [(x0, y0), (x0 + HEAT_CELL, y0 + HEAT_CELL)];
            if let Some(colour) = heat_colour(genes, max) {
                root.draw(&Rectangle::new(corners, colour.filled()))
                    .map_err(chart_err)?;
            }
            root.draw(&Rectangle::new(corners, RGBColor(220, 220, 220).stroke_width(1)))
                .map_err(chart_err)?;

            if let Some(requested) = style.show_values {
                let size = value_font_size(requested);
                root.draw(&Text::new(
                    format_cell_value(genes),
                    (x0 + HEAT_CELL / 2, y0 + HEAT_CELL / 2),
                    ("sans-serif", size)
                        .into_font()
                        .color(&CELL_TEXT_COLOUR)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                ))
                .map_err(chart_err)?;
            }
        }
    }

    for (col_idx, count) in matrix.axis().values().iter().enumerate() {
        let x = left + col_idx as i32 * HEAT_CELL + HEAT_CELL / 2;
        root.draw(&Text::new(count.to_string(), (x, grid_bottom + 12), centered(13)))
            .map_err(chart_err)?;
    }
    let grid_right = left + matrix.ncols() as i32 * HEAT_CELL;
    root.draw(&Text::new(
        "Number of snp",
        ((left + grid_right) / 2, grid_bottom + 40),
        centered(15),
    ))
    .map_err(chart_err)?;

    // Colour bar, 1 at the bottom and max at the top.
    let bar_x = grid_right + 30;
    let bar_height = (grid_bottom - top).max(3 * HEAT_CELL);
    let steps = 50;
    for step in 0..steps {
        let t = step as f64 / (steps - 1) as f64;
        let y1 = top + bar_height - step * bar_height / steps;
        let y0 = top + bar_height - (step + 1) * bar_height / steps;
        root.draw(&Rectangle::new([(bar_x, y0), (bar_x + 20, y1)], jet(t).filled()))
            .map_err(chart_err)?;
    }
    let side = |size: i32| {
        ("sans-serif", size)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center))
    };
    root.draw(&Text::new(format_cell_value(max), (bar_x + 26, top), side(12)))
        .map_err(chart_err)?;
    root.draw(&Text::new("1", (bar_x + 26, top + bar_height), side(12)))
        .map_err(chart_err)?;
    root.draw(&Text::new(
        "Number of genes",
        (bar_x + 26, top + bar_height / 2),
        side(12),
    ))
    .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    kind: ChartKind,
    title: &str,
    matrix: &Matrix,
    style: &ChartStyle,
) -> Result<()> {
    if kind.is_heatmap() {
        draw_heatmap(root, title, matrix, style)
    } else {
        draw_bar_chart(root, title, matrix)
    }
}

/// Renders one chart of `kind` to `path`. Degenerate matrices are skipped with a warning.
pub fn render_chart(
    path: &Path,
    format: ImageFormat,
    kind: ChartKind,
    title: &str,
    matrix: &Matrix,
    style: &ChartStyle,
) -> Result<()> {
    if matrix.is_degenerate() {
        warn!("Nothing to draw for '{}'; {} not written.", title, path.display());
        return Ok(());
    }

    let size = if kind.is_heatmap() {
        let (_, _, w, h) = heatmap_layout(matrix);
        (w, h)
    } else {
        bar_chart_size(matrix)
    };
    debug!("Rendering {:?} {}x{} to {}", kind, size.0, size.1, path.display());

    match format {
        ImageFormat::Png => draw(
            BitMapBackend::new(path, size).into_drawing_area(),
            kind,
            title,
            matrix,
            style,
        )?,
        ImageFormat::Svg => draw(
            SVGBackend::new(path, size).into_drawing_area(),
            kind,
            title,
            matrix,
            style,
        )?,
    }
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::build_axis;
    use crate::config::AggregationConfig;
    use crate::histogram::Histogram as SnpHistogram;
    use crate::matrix::assemble;
    use std::collections::BTreeMap;

    fn matrix(kind: ChartKind) -> Matrix {
        let counts: BTreeMap<u64, u64> = [(0, 3), (2, 1500), (4, 12)].into_iter().collect();
        let hs = [SnpHistogram::from_quantitative("species_a", counts)];
        let cfg = AggregationConfig::default();
        let axis = build_axis(&hs, kind.mode(), &cfg);
        assemble(&hs, &axis, kind.mode(), &cfg)
    }

    #[test]
    fn cell_values_use_three_significant_digits() {
        assert_eq!(format_cell_value(0), "0");
        assert_eq!(format_cell_value(999), "999");
        assert_eq!(format_cell_value(1234), "1.23k");
        assert_eq!(format_cell_value(12345), "12.3k");
        assert_eq!(format_cell_value(123456), "123k");
        assert_eq!(format_cell_value(99_999), "100k");
        assert_eq!(format_cell_value(1999), "2.00k");
        assert_eq!(format_cell_value(1_235), "1.24k");
        assert_eq!(format_cell_value(999_500), "1.00M");
        assert_eq!(format_cell_value(2_500_000), "2.50M");
        assert_eq!(format_cell_value(1_130), "1.13k");
    }

    #[test]
    fn non_positive_font_size_is_automatic() {
        assert_eq!(value_font_size(0), HEAT_CELL / 4);
        assert_eq!(value_font_size(-3), HEAT_CELL / 4);
        assert_eq!(value_font_size(9), 9);
    }

    #[test]
    fn zero_cells_have_no_colour() {
        assert_eq!(heat_colour(0, 10), None);
        assert_eq!(heat_colour(1, 10), Some(jet(0.0)));
        assert_eq!(heat_colour(10, 10), Some(jet(1.0)));
        assert_eq!(heat_colour(1, 1), Some(jet(1.0)));
    }

    #[test]
    fn kinds_map_to_modes_and_file_names() {
        assert_eq!(ChartKind::QuantitativeBar.mode(), Mode::Quantitative);
        assert_eq!(ChartKind::GlobalHeatmap.mode(), Mode::Cumulative);
        assert_eq!(
            ChartKind::CumulativeBar.file_stem("job", Some("E. coli")),
            "job_CumulativeBarchart_E. coli"
        );
        assert_eq!(ChartKind::GlobalHeatmap.file_stem("job", None), "job_Heatmap_global");
        assert_eq!(ChartKind::FileHeatmap.file_stem("job", Some("x")), "job_Heatmap_x");
    }

    #[test]
    fn renders_svg_heatmap_with_values() {
        let dir = tempfile::tempdir().unwrap();
        let kind = ChartKind::GlobalHeatmap;
        let path = dir.path().join("heatmap.svg");
        let style = ChartStyle { show_values: Some(-1) };
        render_chart(&path, ImageFormat::Svg, kind, &kind.title(None), &matrix(kind), &style).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("species_a"));
        assert!(svg.contains("1.51k"));
    }

    #[test]
    fn degenerate_matrix_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AggregationConfig::default();
        let axis = build_axis(&[], Mode::Cumulative, &cfg);
        let empty = assemble(&[], &axis, Mode::Cumulative, &cfg);
        let path = dir.path().join("empty.svg");
        render_chart(&path, ImageFormat::Svg, ChartKind::GlobalHeatmap, "empty", &empty, &ChartStyle::default())
            .unwrap();
        assert!(!path.exists());
    }
}
