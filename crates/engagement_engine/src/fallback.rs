use std::io::Write;

use engagement_core::{InputRow, OutputRow, QueryOutcome};
use engine_logging::{engine_debug, engine_info};

use crate::{Clock, FailedIndexSet, GraphClient, OutputError, ProgressSink, ResultWriter, RunEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackReport {
    pub rows: usize,
    pub errors: usize,
}

/// Re-queries rows of failed batches one URL at a time.
pub struct FallbackRetrier<'a> {
    client: &'a dyn GraphClient,
    clock: Clock,
    sink: &'a dyn ProgressSink,
}

impl<'a> FallbackRetrier<'a> {
    pub fn new(client: &'a dyn GraphClient, clock: Clock, sink: &'a dyn ProgressSink) -> Self {
        Self {
            client,
            clock,
            sink,
        }
    }

    /// Query each variant of `row` on its own; a failure only fills that variant's error.
    pub async fn recover_row(&self, row: &InputRow) -> (OutputRow, usize) {
        let mut out = OutputRow::new(row.clone());
        let mut errors = 0;
        for (column, variant) in row.variants().iter().enumerate() {
            let Some(value) = variant.as_deref() else {
                continue;
            };
            match self.client.query_one(value).await {
                Ok(outcome) => out.record(column, &outcome),
                Err(err) => {
                    engine_debug!("Row {} variant {} failed: {}", row.index(), column + 1, err);
                    errors += 1;
                    out.record(column, &QueryOutcome::failed(err.to_string()));
                }
            }
        }
        out.stamp(&(self.clock)());
        (out, errors)
    }

    /// Recover every row in `failed`, appending each one as soon as it is done.
    pub async fn run<W: Write>(
        &self,
        rows: &[InputRow],
        failed: &FailedIndexSet,
        writer: &mut ResultWriter<W>,
    ) -> Result<FallbackReport, OutputError> {
        let mut report = FallbackReport::default();
        if failed.is_empty() {
            return Ok(report);
        }
        engine_info!("Collecting {} failed rows individually", failed.len());
        self.sink.emit(RunEvent::FallbackPlanned { rows: failed.len() });

        for row in rows.iter().filter(|row| failed.contains(&row.index())) {
            let (out, errors) = self.recover_row(row).await;
            writer.append(std::slice::from_ref(&out))?;
            report.rows += 1;
            report.errors += errors;
            self.sink.emit(RunEvent::FallbackRowCompleted {
                index: row.index(),
                errors,
            });
        }
        Ok(report)
    }
}
