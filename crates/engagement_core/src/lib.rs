//! Engagement core: pure row model, URL variants and batch merging.
mod batch;
mod outcome;
mod row;
mod variant;

pub use batch::{batch_count, partition, BatchTable};
pub use outcome::{BulkResponse, QueryOutcome};
pub use row::{output_header, InputRow, OutputRow, RowIndex, VariantFields};
pub use variant::{derive_variants, is_http_url, VariantMode};
