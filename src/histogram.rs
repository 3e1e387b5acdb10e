// histogram.rs

use crate::gene_table::GeneTable;
use std::collections::BTreeMap;

/// Which distribution a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Genes with exactly n SNPs.
    Quantitative,
    /// Genes with at least n SNPs.
    Cumulative,
}

/// SNP-count distribution of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    source_name: String,
    quantitative: BTreeMap<u64, u64>,
    cumulative: BTreeMap<u64, u64>,
}

impl Histogram {
    pub fn build(table: &GeneTable) -> Self {
        let mut quantitative: BTreeMap<u64, u64> = BTreeMap::new();
        for &count in table.entries().values() {
            *quantitative.entry(count).or_insert(0) += 1;
        }
        Self::from_quantitative(table.source_name(), quantitative)
    }

    /// Builds a histogram from an already counted distribution. Zero-gene
    /// entries are dropped so the natural range only spans populated counts.
    pub fn from_quantitative(source_name: &str, mut quantitative: BTreeMap<u64, u64>) -> Self {
        quantitative.retain(|_, genes| *genes > 0);

        // Suffix sums stored at populated counts only; a gap takes the value
        // of the next populated count above it.
        let mut cumulative = BTreeMap::new();
        let mut running = 0u64;
        for (&count, &genes) in quantitative.iter().rev() {
            running += genes;
            cumulative.insert(count, running);
        }

        Self {
            source_name: source_name.to_string(),
            quantitative,
            cumulative,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn quantitative(&self) -> &BTreeMap<u64, u64> {
        &self.quantitative
    }

    /// Number of genes at `count` in the given mode; 0 outside the histogram's domain.
    pub fn value(&self, mode: Mode, count: u64) -> u64 {
        match mode {
            Mode::Quantitative => self.quantitative.get(&count).copied().unwrap_or(0),
            Mode::Cumulative => self
                .cumulative
                .range(count..)
                .next()
                .map_or(0, |(_, &genes)| genes),
        }
    }

    /// Largest SNP count carried by at least one gene.
    pub fn max_count(&self) -> Option<u64> {
        self.quantitative.keys().next_back().copied()
    }

    pub fn min_count(&self) -> Option<u64> {
        self.quantitative.keys().next().copied()
    }

    /// Upper end of the histogram's domain for the given mode.
    pub fn natural_max(&self, mode: Mode) -> Option<u64> {
        match mode {
            Mode::Quantitative => self.max_count(),
            Mode::Cumulative => self.cumulative.keys().next_back().copied(),
        }
    }

    pub fn total_genes(&self) -> u64 {
        self.quantitative.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quantitative.is_empty()
    }
}
