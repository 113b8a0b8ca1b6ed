use std::collections::HashSet;
use std::ops::Range;

use crate::{BulkResponse, InputRow, OutputRow, RowIndex};

/// Number of batches needed for `len` rows: `ceil(len / batch_size)`.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

/// Contiguous position ranges of at most `batch_size`; only the last may be short.
pub fn partition(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    if batch_size == 0 {
        return Vec::new();
    }
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

/// Working table for one batch while bulk responses are merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTable {
    rows: Vec<OutputRow>,
}

impl BatchTable {
    pub fn new(rows: &[InputRow]) -> Self {
        Self {
            rows: rows.iter().cloned().map(OutputRow::new).collect(),
        }
    }

    pub fn indices(&self) -> Vec<RowIndex> {
        self.rows.iter().map(OutputRow::index).collect()
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// Distinct trimmed values of one variant column, in row order.
    pub fn values_for(&self, column: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| row.input().variant(column))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .filter(|value| seen.insert(*value))
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Write each response into every row holding that value in `column`.
    ///
    /// Re-merging the same response with the same timestamp is a no-op.
    pub fn merge(&mut self, column: usize, response: &BulkResponse, timestamp: &str) {
        for row in &mut self.rows {
            let Some(value) = row.input().variant(column).map(str::trim) else {
                continue;
            };
            let Some(outcome) = response.get(value) else {
                continue;
            };
            row.record(column, outcome);
            row.stamp(timestamp);
        }
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }
}
