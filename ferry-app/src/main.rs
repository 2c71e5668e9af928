//! `leadferry` binary: serve the HTTP API, or run one export end to end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ferry_common::observability::{init_logging, LogConfig};
use ferry_config::{FerryConfig, FerryConfigLoader};
use ferry_driver::{Browser, BrowserSettings, WebDriverBrowser};
use ferry_flow::{AcquireOutcome, VendorWorkflow};
use ferry_server::{BrowserExportService, FerryServer};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "leadferry", about = "Lead-export pipeline", version)]
struct Cli {
    /// YAML config file; environment variables prefixed FERRY_ override it.
    #[arg(long, global = true, default_value = "leadferry.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API until interrupted.
    Serve,
    /// Fetch one export and deliver it to the intake form.
    Run {
        /// Export URL of an already-created order.
        #[arg(long)]
        export_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config: FerryConfig = FerryConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // The one-shot runner narrates on the console; the server logs to
    // file only.
    init_logging(LogConfig {
        emit_stderr: matches!(cli.command, Command::Run { .. }),
        ..LogConfig::default()
    })?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Run { export_url } => run_once(config, &export_url).await,
    }
}

async fn serve(config: FerryConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let service = Arc::new(BrowserExportService::new(config));

    let server = FerryServer::start(&host, port, service).await?;
    info!(port = server.port(), "leadferry serving");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}

async fn run_once(config: FerryConfig, export_url: &str) -> Result<()> {
    let settings = BrowserSettings {
        webdriver_url: config.browser.webdriver_url.clone(),
        headless: config.browser.headless,
        download_dir: Some(config.download.dir.clone()),
        page_load: Some(std::time::Duration::from_secs(
            config.browser.page_load_secs,
        )),
    };
    let browser = WebDriverBrowser::connect(&settings).await?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = run_workflow(&config, &browser, export_url, cancel).await;

    if let Err(err) = browser.close().await {
        warn!("browser session did not close cleanly: {err}");
    }
    result
}

async fn run_workflow(
    config: &FerryConfig,
    browser: &dyn Browser,
    export_url: &str,
    cancel: CancellationToken,
) -> Result<()> {
    let workflow = VendorWorkflow::new(&config.vendor, browser);
    workflow.sign_in().await?;

    match workflow
        .acquire_export(export_url, &config.download, Some(cancel))
        .await?
    {
        AcquireOutcome::Ready(artifact) => {
            info!(path = %artifact.path.display(), size = artifact.size, "export downloaded");
            workflow
                .deliver_to_intake(&config.intake, &artifact.path)
                .await?;
            info!("export delivered to intake form");
            Ok(())
        }
        AcquireOutcome::Processing { reason } => {
            bail!("export not ready: {}", reason.detail())
        }
    }
}
