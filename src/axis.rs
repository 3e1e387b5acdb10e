// axis.rs

use crate::config::AggregationConfig;
use crate::histogram::{Histogram, Mode};
use log::{debug, warn};

/// Ordered SNP-count values shared by every row of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Axis {
    values: Vec<u64>,
    // Last SNP count of the contiguous range that survived truncation.
    // Genes above it are excluded from every cell.
    ceiling: Option<u64>,
}

impl Axis {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn ceiling(&self) -> Option<u64> {
        self.ceiling
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the values run 0, 1, 2, ... without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.values.iter().enumerate().all(|(i, &v)| v == i as u64)
    }
}

/// Reconciles the histograms' ranges into one axis.
///
/// The candidate axis is every integer in `[0, max]`, where `max` is the largest
/// natural maximum over all histograms. `max_length` then keeps the first values
/// of that contiguous range, and only afterwards does simplified mode drop the
/// values at which no histogram has a single gene. Input order does not matter.
pub fn build_axis(histograms: &[Histogram], mode: Mode, config: &AggregationConfig) -> Axis {
    let Some(max_count) = histograms.iter().filter_map(|h| h.natural_max(mode)).max() else {
        warn!(
            "All {} histogram(s) are empty; the chart axis has no SNP-count values.",
            histograms.len()
        );
        return Axis::default();
    };

    let mut ceiling = max_count;
    if let Some(limit) = config.max_length {
        let candidate_len = max_count.saturating_add(1);
        if candidate_len > limit as u64 {
            ceiling = limit as u64 - 1;
            debug!(
                "Axis truncated to {} values: SNP counts {}..={} are left out.",
                limit,
                ceiling + 1,
                max_count
            );
        }
    }

    let mut values: Vec<u64> = (0..=ceiling).collect();
    if config.simplified {
        // Gaps are judged on exact counts: cumulative values are never zero below the maximum.
        values.retain(|&v| {
            histograms
                .iter()
                .any(|h| h.value(Mode::Quantitative, v) > 0)
        });
    }

    debug!(
        "Axis built from {} histogram(s): {} values, ceiling {}",
        histograms.len(),
        values.len(),
        ceiling
    );
    Axis {
        values,
        ceiling: Some(ceiling),
    }
}
