//! Worker Pool (spec §4.9): N concurrent tasks pulling from the
//! Frontier, running the Content Pipeline, and feeding discovered
//! links back in.
//!
//! Grounded on `crawler/worker.py`'s try/except-then-complete shape:
//! every terminal branch — success, non-2xx/3xx status, or an
//! internal error — ends in `frontier.complete(url)`, and no branch
//! propagates an exception out of the loop.

use std::sync::Arc;
use std::time::Duration;

use crate::analytics::Analytics;
use crate::config::Config;
use crate::content_pipeline;
use crate::downloader::Downloader;
use crate::frontier::Frontier;
use crate::robots::RobotsCache;
use crate::simhash::SimhashWindow;
use crate::url_normalize::{is_valid, normalize};

/// Spawns `config.worker_count` tasks and returns their join handles.
/// Each task runs until the frontier is permanently starved (callers
/// typically race this against a drained-check loop rather than
/// awaiting these handles directly, since a healthy crawl only ends
/// when the frontier empties).
pub fn spawn_workers<D: Downloader + 'static>(
    frontier: Arc<Frontier>,
    downloader: Arc<D>,
    robots: Arc<RobotsCache<D>>,
    analytics: Arc<Analytics>,
    simhash_window: Arc<SimhashWindow>,
    config: Arc<Config>,
) -> Vec<tokio::task::JoinHandle<()>> {
    (0..config.worker_count)
        .map(|id| {
            let frontier = frontier.clone();
            let downloader = downloader.clone();
            let robots = robots.clone();
            let analytics = analytics.clone();
            let simhash_window = simhash_window.clone();
            let config = config.clone();
            tokio::spawn(run_worker(
                id,
                frontier,
                downloader,
                robots,
                analytics,
                simhash_window,
                config,
            ))
        })
        .collect()
}

async fn run_worker<D: Downloader>(
    worker_id: usize,
    frontier: Arc<Frontier>,
    downloader: Arc<D>,
    robots: Arc<RobotsCache<D>>,
    analytics: Arc<Analytics>,
    simhash_window: Arc<SimhashWindow>,
    config: Arc<Config>,
) {
    loop {
        let Some(url) = frontier.next().await else {
            let wait = Duration::from_millis((config.delay_ms / 2).min(100));
            tokio::time::sleep(wait).await;
            continue;
        };

        process_one(
            worker_id,
            &url,
            &frontier,
            &downloader,
            &robots,
            &analytics,
            &simhash_window,
            &config,
        )
        .await;

        // Unconditional: every terminal branch above already reports
        // its own errors via tracing, so this always runs.
        frontier.complete(&url).await;
    }
}

async fn process_one<D: Downloader>(
    worker_id: usize,
    url: &str,
    frontier: &Frontier,
    downloader: &D,
    robots: &RobotsCache<D>,
    analytics: &Analytics,
    simhash_window: &SimhashWindow,
    config: &Config,
) {
    let Ok(parsed) = normalize(url) else {
        tracing::warn!("worker-{worker_id}: unparseable dispensed URL {url}");
        return;
    };

    let response = match downloader.fetch(&parsed).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!("worker-{worker_id}: fetch failed for {url}: {e}");
            return;
        }
    };

    tracing::info!(
        "worker-{worker_id}: downloaded {url}, status <{}>",
        response.status
    );

    let links = content_pipeline::process(&parsed, &response, config, analytics, simhash_window);

    for link in links {
        add_if_allowed(&link, frontier, robots, config).await;
    }
}

async fn add_if_allowed<D: Downloader>(
    link: &str,
    frontier: &Frontier,
    robots: &RobotsCache<D>,
    config: &Config,
) {
    let Ok(parsed) = normalize(link) else {
        return;
    };
    if !is_valid(&parsed, config) {
        return;
    }
    if !robots.allowed(&parsed).await {
        return;
    }
    frontier.add(parsed.as_str()).await;
}
