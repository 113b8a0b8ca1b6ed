//! Engagement engine: graph API client, batch pipeline and file IO.
mod fallback;
mod graph;
mod input;
mod oauth;
mod output;
mod persist;
mod pipeline;
mod runner;
mod token;
mod types;

pub use fallback::{FallbackReport, FallbackRetrier};
pub use graph::{GraphClient, GraphSettings, ReqwestGraphClient};
pub use input::{load_input_rows, read_input_rows, InputError};
pub use oauth::{AppCredentials, OAuthExchanger, TokenExchanger};
pub use output::{output_path_for, OutputError, ResultWriter};
pub use persist::{read_optional, write_atomic, PersistError};
pub use pipeline::{run_pipeline, PipelineError};
pub use runner::{BatchRunner, BatchSettings, MAX_BATCH_SIZE};
pub use token::{ensure_token, AccessToken, FileTokenStore, TokenError, TokenStore};
pub use types::{
    utc_clock, BatchOutcome, Clock, ConfigError, FailedIndexSet, GraphError, GraphErrorKind,
    NullProgressSink, ProgressSink, RunEvent, RunSummary,
};
