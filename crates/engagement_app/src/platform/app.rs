use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use engagement_engine::{
    ensure_token, load_input_rows, output_path_for, run_pipeline, utc_clock, AccessToken,
    BatchSettings, FileTokenStore, OAuthExchanger, ReqwestGraphClient, ResultWriter,
};
use engine_logging::{engine_info, LogDestination};

use super::cli::Cli;
use super::config::AppConfig;
use super::progress::ProgressBars;

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let level = engine_logging::parse_level(&config.log_level);
    let destination = match &config.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level);

    let settings = BatchSettings::new(cli.parallel)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(run(cli, config, settings))
}

async fn run(cli: Cli, config: AppConfig, settings: BatchSettings) -> anyhow::Result<()> {
    let mode = cli.mode();
    let mut graph = config.graph_settings();

    let token_path = cli.token_cache.clone().unwrap_or_else(|| config.token_cache.clone());
    let store = FileTokenStore::new(token_path)
        .with_tolerance(
            Duration::try_days(config.expiry_tolerance_days.max(0)).unwrap_or(Duration::days(1)),
        );
    let exchanger = OAuthExchanger::new(&graph, config.credentials())?;
    let token = ensure_token(&store, &exchanger, Utc::now())
        .await
        .context("failed to obtain an access token")?;
    log_expiry(&token);

    graph.access_token = token.access_token;
    let client = ReqwestGraphClient::new(graph)?;

    let rows = load_input_rows(&cli.input, mode)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    let output = output_path_for(&cli.input);
    let mut writer = ResultWriter::create(&output)?;
    engine_info!("Writing {} rows to {}", rows.len(), output.display());

    let progress = ProgressBars::new();
    let summary = run_pipeline(
        &client,
        &rows,
        mode,
        settings,
        &mut writer,
        utc_clock(),
        &progress,
    )
    .await?;
    progress.finish();

    engine_info!(
        "Done: {} rows in {} batches, {} failed batches, {} fallback errors",
        summary.rows_written,
        summary.batches,
        summary.failed_batches,
        summary.fallback_errors
    );
    Ok(())
}

fn log_expiry(token: &AccessToken) {
    match (token.expires_at(), token.remaining(Utc::now())) {
        (Some(at), Some(left)) => {
            engine_info!("Token expires {} ({} hours left)", at, left.num_hours())
        }
        _ => engine_info!("Token does not expire"),
    }
}
