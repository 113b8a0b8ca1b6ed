use std::collections::HashMap;

use serde_json::Value;

/// Result of querying one identifier against the graph API.
///
/// The API may return an object, engagement counts, both, or neither even
/// when the call succeeds. `error` is only set for a failure that belongs to
/// this identifier alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub object: Option<Value>,
    pub engagement: Option<Value>,
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Bulk query response keyed by the identifier that was queried.
pub type BulkResponse = HashMap<String, QueryOutcome>;
