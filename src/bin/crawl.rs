//! Launcher binary wiring the library's pieces into a runnable
//! crawler. Kept intentionally thin: launcher/CLI wiring is an
//! out-of-scope collaborator per spec §1, but the crate still needs
//! something that runs end to end.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use uci_crawl::analytics::{spawn_checkpoint_task, Analytics};
use uci_crawl::config::Config;
use uci_crawl::downloader::ReqwestDownloader;
use uci_crawl::frontier::Frontier;
use uci_crawl::robots::RobotsCache;
use uci_crawl::simhash::SimhashWindow;
use uci_crawl::worker;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "crawl.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("fatal configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = Arc::new(config);

    let frontier = match Frontier::new((*config).clone()) {
        Ok(frontier) => Arc::new(frontier),
        Err(e) => {
            tracing::error!("fatal store error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let downloader = match ReqwestDownloader::new(&config.user_agent) {
        Ok(downloader) => Arc::new(downloader),
        Err(e) => {
            tracing::error!("fatal downloader init error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let robots = Arc::new(RobotsCache::new(
        match ReqwestDownloader::new(&config.user_agent) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("fatal downloader init error: {e}");
                return ExitCode::FAILURE;
            }
        },
        config.user_agent.clone(),
    ));
    let analytics = Arc::new(Analytics::new());
    let simhash_window = Arc::new(SimhashWindow::from_config(&config));

    let _checkpoint_task = spawn_checkpoint_task(
        analytics.clone(),
        &config,
        "analytics_report.txt".to_string(),
    );

    let _workers = worker::spawn_workers(
        frontier.clone(),
        downloader,
        robots,
        analytics,
        simhash_window,
        config.clone(),
    );

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if frontier.is_drained().await {
            tracing::info!("frontier drained, shutting down cleanly");
            break;
        }
    }

    ExitCode::SUCCESS
}
