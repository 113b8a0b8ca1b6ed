use std::path::PathBuf;

use clap::Parser;
use engagement_core::VariantMode;
use engagement_engine::MAX_BATCH_SIZE;

#[derive(Debug, Parser)]
#[command(name = "og-harvest")]
#[command(about = "Query Open Graph objects and engagement for article URLs and DOIs")]
pub struct Cli {
    #[arg(short, long, help = "Input CSV with `url` and `doi` columns")]
    pub input: PathBuf,

    #[arg(
        short,
        long,
        default_value_t = MAX_BATCH_SIZE,
        help = "Number of URLs per bulk request (default/max=50)"
    )]
    pub parallel: usize,

    #[arg(
        short = 'd',
        long = "DOI-only",
        help = "Only query the DOI resolver URLs, not the original URL"
    )]
    pub doi_only: bool,

    #[arg(short, long, default_value = "config.ron", help = "RON configuration file")]
    pub config: PathBuf,

    #[arg(long, help = "Token cache file (overrides the config)")]
    pub token_cache: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> VariantMode {
        if self.doi_only {
            VariantMode::DoiOnly
        } else {
            VariantMode::Full
        }
    }
}
