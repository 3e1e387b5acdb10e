// config.rs

/// Options shared by the axis reconciler and the matrix assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregationConfig {
    /// Keep at most this many SNP-count values, starting from 0.
    pub max_length: Option<usize>,
    /// Drop SNP-count values that no file has genes at.
    pub simplified: bool,
    /// Order matrix rows by source name instead of input order.
    pub sort_by_name: bool,
}

impl AggregationConfig {
    /// A `max_length` of zero or below means no limit.
    pub fn new(max_length: i64, simplified: bool, sort_by_name: bool) -> Self {
        let max_length = usize::try_from(max_length).ok().filter(|&l| l > 0);
        Self {
            max_length,
            simplified,
            sort_by_name,
        }
    }
}
