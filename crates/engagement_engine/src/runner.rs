use std::io::Write;

use engagement_core::{partition, BatchTable, BulkResponse, InputRow, VariantMode};
use engine_logging::{engine_debug, engine_warn};

use crate::{
    BatchOutcome, Clock, ConfigError, FailedIndexSet, GraphClient, GraphError, OutputError,
    ProgressSink, ResultWriter, RunEvent,
};

/// Largest id list the graph API accepts in one bulk request.
pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    batch_size: usize,
}

impl BatchSettings {
    pub fn new(batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSize {
                got: batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Runs one bulk query per (batch, variant column) and streams finished batches.
pub struct BatchRunner<'a> {
    client: &'a dyn GraphClient,
    mode: VariantMode,
    settings: BatchSettings,
    clock: Clock,
    sink: &'a dyn ProgressSink,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        client: &'a dyn GraphClient,
        mode: VariantMode,
        settings: BatchSettings,
        clock: Clock,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            client,
            mode,
            settings,
            clock,
            sink,
        }
    }

    /// Query every variant column for `rows`.
    ///
    /// The first failing column aborts the batch and drops what was merged so far.
    pub async fn process_batch(&self, rows: &[InputRow]) -> BatchOutcome {
        let mut table = BatchTable::new(rows);
        for (column, name) in self.mode.columns().iter().enumerate() {
            let values = table.values_for(column);
            if values.is_empty() {
                continue;
            }

            let timestamp = (self.clock)();
            match self.query_column(&values).await {
                Ok(response) => {
                    engine_debug!(
                        "Column {} returned {} of {} values",
                        name,
                        response.len(),
                        values.len()
                    );
                    for missing in values.iter().filter(|v| !response.contains_key(*v)) {
                        engine_debug!("Column {} got no result for {}", name, missing);
                    }
                    table.merge(column, &response, &timestamp);
                }
                Err(cause) => {
                    engine_warn!("Bulk query for column {} failed: {}", name, cause);
                    return BatchOutcome::Failed {
                        indices: table.indices(),
                        cause,
                    };
                }
            }
        }
        BatchOutcome::Success(table.into_rows())
    }

    // The bulk endpoint splits its id list on commas, so such values go one at a time.
    async fn query_column(&self, values: &[String]) -> Result<BulkResponse, GraphError> {
        let (single, bulk): (Vec<&String>, Vec<&String>) =
            values.iter().partition(|v| v.contains(','));

        let mut response = if bulk.is_empty() {
            BulkResponse::new()
        } else {
            let bulk: Vec<String> = bulk.into_iter().cloned().collect();
            self.client.query_many(&bulk).await?
        };
        for value in single {
            let outcome = self.client.query_one(value).await?;
            response.insert(value.clone(), outcome);
        }
        Ok(response)
    }

    /// Process all batches in order; only writer errors escape.
    pub async fn run<W: Write>(
        &self,
        rows: &[InputRow],
        writer: &mut ResultWriter<W>,
    ) -> Result<FailedIndexSet, OutputError> {
        let ranges = partition(rows.len(), self.settings.batch_size());
        self.sink.emit(RunEvent::BatchesPlanned {
            batches: ranges.len(),
            rows: rows.len(),
        });

        let mut failed = FailedIndexSet::new();
        for (batch, range) in ranges.into_iter().enumerate() {
            let slice = &rows[range];
            match self.process_batch(slice).await {
                BatchOutcome::Success(out) => {
                    writer.append(&out)?;
                    self.sink.emit(RunEvent::BatchCompleted {
                        batch,
                        rows: out.len(),
                    });
                }
                BatchOutcome::Failed { indices, cause } => {
                    engine_warn!(
                        "Batch {} ({} rows) marked for fallback: {}",
                        batch,
                        indices.len(),
                        cause
                    );
                    self.sink.emit(RunEvent::BatchFailed {
                        batch,
                        rows: indices.len(),
                        cause: cause.to_string(),
                    });
                    failed.extend(indices);
                }
            }
        }
        Ok(failed)
    }
}
