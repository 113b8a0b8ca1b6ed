use std::io::Write;

use engagement_core::{batch_count, InputRow, RowIndex, VariantMode};
use engine_logging::engine_info;

use crate::{
    BatchRunner, BatchSettings, Clock, FallbackRetrier, GraphClient, OutputError, ProgressSink,
    ResultWriter, RunSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("row {index} has {got} variants, expected {expected}")]
    VariantMismatch {
        index: RowIndex,
        got: usize,
        expected: usize,
    },
    #[error("row indices must be unique and increasing: {index} follows {previous}")]
    UnorderedIndex { index: RowIndex, previous: RowIndex },
}

/// Header, batched pass, then the per-row fallback for every failed batch.
///
/// Every row in `rows` is written exactly once.
pub async fn run_pipeline<W: Write>(
    client: &dyn GraphClient,
    rows: &[InputRow],
    mode: VariantMode,
    settings: BatchSettings,
    writer: &mut ResultWriter<W>,
    clock: Clock,
    sink: &dyn ProgressSink,
) -> Result<RunSummary, PipelineError> {
    if let Some(row) = rows.iter().find(|r| r.variants().len() != mode.len()) {
        return Err(PipelineError::VariantMismatch {
            index: row.index(),
            got: row.variants().len(),
            expected: mode.len(),
        });
    }

    if let Some(pair) = rows.windows(2).find(|pair| pair[1].index() <= pair[0].index()) {
        return Err(PipelineError::UnorderedIndex {
            index: pair[1].index(),
            previous: pair[0].index(),
        });
    }

    writer.write_header(mode)?;

    let runner = BatchRunner::new(client, mode, settings, clock.clone(), sink);
    let failed = runner.run(rows, writer).await?;
    let batched_rows = writer.rows_written();

    let retrier = FallbackRetrier::new(client, clock, sink);
    let report = retrier.run(rows, &failed, writer).await?;

    let batch_size = settings.batch_size();
    let summary = RunSummary {
        rows: rows.len(),
        batches: batch_count(rows.len(), batch_size),
        failed_batches: count_failed_batches(rows, &failed, batch_size),
        fallback_rows: report.rows,
        fallback_errors: report.errors,
        rows_written: writer.rows_written(),
    };
    engine_info!(
        "Wrote {} rows ({} via batches, {} via fallback with {} errors)",
        summary.rows_written,
        batched_rows,
        summary.fallback_rows,
        summary.fallback_errors
    );
    Ok(summary)
}

fn count_failed_batches(
    rows: &[InputRow],
    failed: &crate::FailedIndexSet,
    batch_size: usize,
) -> usize {
    rows.chunks(batch_size)
        .filter(|chunk| chunk.iter().any(|row| failed.contains(&row.index())))
        .count()
}
