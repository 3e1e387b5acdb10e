// gene_table.rs

use crate::error::{AggregationError, Result};
use crate::table::RawRow;
use log::debug;
use std::collections::HashMap;

/// Deduplicated gene -> SNP count mapping for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneTable {
    source_name: String,
    entries: HashMap<String, u64>,
}

/// Accepts plain decimal digits only: no sign, no '.' or ',' separator, no blank cell.
fn parse_snp_count(cell: &str) -> Option<u64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

impl GeneTable {
    /// Builds the table from rows in file order. A gene seen twice keeps the
    /// value of its last row.
    pub fn build<'a, I>(rows: I, gene_column: &str, snp_column: &str, source_name: &str) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let mut entries: HashMap<String, u64> = HashMap::new();
        let mut superseded = 0usize;

        for row in rows {
            let missing = |column: &str| AggregationError::MissingColumn {
                source_name: source_name.to_string(),
                column: column.to_string(),
                row: row.line_number(),
            };
            let gene = row.get(gene_column).ok_or_else(|| missing(gene_column))?;
            let cell = row.get(snp_column).ok_or_else(|| missing(snp_column))?;

            let count = parse_snp_count(cell).ok_or_else(|| AggregationError::MalformedCount {
                source_name: source_name.to_string(),
                row: row.line_number(),
                gene: gene.to_string(),
                value: cell.to_string(),
            })?;

            if entries.insert(gene.to_string(), count).is_some() {
                superseded += 1;
            }
        }

        if superseded > 0 {
            debug!(
                "{}: {} duplicated gene rows superseded by later rows",
                source_name, superseded
            );
        }

        Ok(Self {
            source_name: source_name.to_string(),
            entries,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn entries(&self) -> &HashMap<String, u64> {
        &self.entries
    }

    pub fn get(&self, gene: &str) -> Option<u64> {
        self.entries.get(gene).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
