//! Per-gene SNP-count tables turned into quantitative and cumulative
//! distributions, aligned across files for bar charts and heatmaps.

pub mod error;

pub mod axis;
pub mod chart;
pub mod config;
pub mod gene_table;
pub mod histogram;
pub mod matrix;
pub mod pipeline;
pub mod sources;
pub mod table;
pub mod tsv;
