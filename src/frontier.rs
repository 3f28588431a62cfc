//! Frontier Scheduler (spec §4.5) — the hard core. Hands out the next
//! URL to fetch subject to per-host politeness (P1/P2), URL uniqueness
//! (P3), and crash-safe no-re-dispense-after-completion (P4).
//!
//! Grounded on the original `crawler/frontier.py`'s single-`RLock`,
//! dict-of-deques design, generalized with an explicit `HostState` per
//! `examples/other_examples/.../sumi__src-crawler-scheduler.rs`'s
//! per-domain state map, and backed by [`crate::store::UrlStore`]
//! instead of a `shelve` file.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::config::{Config, PolitenessGrouping};
use crate::error::StoreError;
use crate::store::{fingerprint, UrlStore};
use crate::url_normalize::{is_valid, normalize};

struct HostState {
    queue: VecDeque<String>,
    last_access: Option<Instant>,
    in_progress_count: u32,
}

impl HostState {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            last_access: None,
            in_progress_count: 0,
        }
    }
}

struct Inner {
    hosts: IndexMap<String, HostState>,
    in_progress: HashSet<u128>,
}

/// The per-host FIFO politeness scheduler described in spec §4.5.
pub struct Frontier {
    config: Config,
    store: UrlStore,
    inner: Mutex<Inner>,
}

impl Frontier {
    /// Opens the persistent store and rebuilds in-memory queues.
    /// `restart = true` wipes the store and reseeds from
    /// `config.seed_urls`; `restart = false` replays every pending
    /// record, seeding only if the store was empty (matching the
    /// Python `Frontier.__init__`'s fallback).
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let store = UrlStore::open(&config.save_file, config.restart)?;
        let frontier = Self {
            config,
            store,
            inner: Mutex::new(Inner {
                hosts: IndexMap::new(),
                in_progress: HashSet::new(),
            }),
        };

        if frontier.config.restart {
            for seed in frontier.config.seed_urls.clone() {
                let _ = frontier.add_sync(&seed);
            }
        } else {
            let records = frontier.store.iterate()?;
            let mut pending = 0usize;
            for (fp, url, completed) in &records {
                if *completed {
                    continue;
                }
                let Ok(parsed) = normalize(url) else { continue };
                if !is_valid(&parsed, &frontier.config) {
                    continue;
                }
                frontier.enqueue_sync(&parsed, *fp);
                pending += 1;
            }
            tracing::info!(
                "Found {pending} urls to be downloaded from {} total urls discovered.",
                records.len()
            );
            if records.is_empty() {
                for seed in frontier.config.seed_urls.clone() {
                    let _ = frontier.add_sync(&seed);
                }
            }
        }

        Ok(frontier)
    }

    fn host_key(&self, url: &Url) -> String {
        let netloc = url.host_str().unwrap_or_default().to_ascii_lowercase();
        match self.config.politeness_grouping {
            PolitenessGrouping::Netloc => netloc,
            PolitenessGrouping::MainDomain => self
                .config
                .allowed_domains
                .iter()
                .find(|d| netloc == d.as_str() || netloc.ends_with(&format!(".{d}")))
                .cloned()
                .unwrap_or(netloc),
        }
    }

    /// Synchronous enqueue used only during startup rebuild, before
    /// any worker can observe the frontier.
    fn enqueue_sync(&self, url: &Url, fp: u128) {
        let mut inner = self.inner.try_lock().expect("uncontended during startup");
        let host = self.host_key(url);
        inner
            .hosts
            .entry(host)
            .or_insert_with(HostState::new)
            .queue
            .push_back(url.as_str().to_string());
        let _ = fp;
    }

    fn add_sync(&self, raw: &str) -> Result<(), StoreError> {
        let Ok(url) = normalize(raw) else {
            return Ok(());
        };
        if !is_valid(&url, &self.config) {
            return Ok(());
        }
        let fp = fingerprint(url.as_str());
        if self.store.contains(fp)? {
            return Ok(());
        }
        self.store.put(fp, url.as_str(), false)?;
        self.enqueue_sync(&url, fp);
        Ok(())
    }

    /// Normalizes and validates `raw`; drops silently if invalid.
    /// Otherwise durably records the URL and appends it to its host's
    /// queue. Idempotent: re-adding an already-seen URL is a no-op.
    pub async fn add(&self, raw: &str) {
        let Ok(url) = normalize(raw) else {
            return;
        };
        if !is_valid(&url, &self.config) {
            return;
        }
        let fp = fingerprint(url.as_str());
        match self.store.contains(fp) {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("store lookup failed for {url}: {e}");
                return;
            }
        }
        if let Err(e) = self.store.put(fp, url.as_str(), false) {
            tracing::warn!("store write failed for {url}, treating as not-added: {e}");
            return;
        }

        let host = self.host_key(&url);
        let mut inner = self.inner.lock().await;
        inner
            .hosts
            .entry(host)
            .or_insert_with(HostState::new)
            .queue
            .push_back(url.as_str().to_string());
    }

    /// Selects the next URL obeying P1 (one outstanding request per
    /// host) and P2 (politeness gap), marks it in-progress, and
    /// returns it. `None` if no host is both non-empty and eligible
    /// right now.
    pub async fn next(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let delay = Duration::from_millis(self.config.delay_ms);

        let mut best_host: Option<String> = None;
        let mut best_last_access: Option<Instant> = None;

        for (host, state) in inner.hosts.iter() {
            if state.queue.is_empty() || state.in_progress_count > 0 {
                continue;
            }
            let eligible = match state.last_access {
                None => true,
                Some(last) => now.duration_since(last) >= delay,
            };
            if !eligible {
                continue;
            }
            let is_better = match best_last_access {
                None => true,
                Some(best) => state.last_access.unwrap_or(now) < best,
            };
            if is_better {
                best_host = Some(host.clone());
                best_last_access = state.last_access;
            }
        }

        let host = best_host?;
        let state = inner.hosts.get_mut(&host)?;
        let url = state.queue.pop_front()?;
        let fp = fingerprint(&url);
        if !inner.in_progress.insert(fp) {
            // Already in progress via some other host bucket; a bug,
            // but fail safe rather than double-dispense.
            tracing::error!("URL {url} was already in progress, dropping duplicate dispense");
            return None;
        }
        let state = inner.hosts.get_mut(&host)?;
        state.last_access = Some(now);
        state.in_progress_count += 1;
        Some(url)
    }

    /// Removes `url` from in-progress and flips its persistent record
    /// to completed. Logs but does not fail if `url` was never seen.
    pub async fn complete(&self, url: &str) {
        let fp = fingerprint(url);
        {
            let mut inner = self.inner.lock().await;
            inner.in_progress.remove(&fp);
            if let Ok(parsed) = normalize(url) {
                let host = self.host_key(&parsed);
                if let Some(state) = inner.hosts.get_mut(&host) {
                    state.in_progress_count = state.in_progress_count.saturating_sub(1);
                }
            }
        }
        match self.store.mark_completed(fp, url) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!("Completed url {url}, but have not seen it before.");
            }
            Err(e) => {
                tracing::warn!("store write failed marking {url} complete: {e}");
            }
        }
    }

    /// Returns true once every host queue is empty and nothing is
    /// in-progress — the clean-shutdown condition from spec §6.
    pub async fn is_drained(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.in_progress.is_empty() && inner.hosts.values().all(|s| s.queue.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("uci_crawl_frontier_test_{name}"))
            .to_string_lossy()
            .into_owned()
    }

    fn config(name: &str, seeds: Vec<&str>, delay_ms: u64) -> Config {
        let path = temp_path(name);
        let _ = rocksdb::DB::destroy(&rocksdb::Options::default(), &path);
        ConfigBuilder::new()
            .with_seed_urls(seeds.into_iter().map(|s| s.to_string()).collect())
            .with_save_file(path)
            .with_delay_ms(delay_ms)
            .with_restart(true)
            .build()
    }

    #[tokio::test]
    async fn politeness_under_contention() {
        let config = config(
            "politeness",
            vec!["http://ics.uci.edu/a", "http://ics.uci.edu/b"],
            500,
        );
        let frontier = Frontier::new(config).unwrap();

        let first = frontier.next().await;
        assert!(first.is_some());
        assert!(frontier.next().await.is_none());

        tokio::time::sleep(Duration::from_millis(520)).await;
        let second = frontier.next().await;
        assert!(second.is_some());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn multi_host_parallelism() {
        let config = config(
            "multihost",
            vec!["http://ics.uci.edu/a", "http://cs.uci.edu/a"],
            500,
        );
        let frontier = Frontier::new(config).unwrap();

        let a = frontier.next().await;
        let b = frontier.next().await;
        assert!(a.is_some());
        assert!(b.is_some());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn uniqueness_no_url_dispensed_twice() {
        let config = config("uniqueness", vec!["http://ics.uci.edu/a"], 0);
        let frontier = Frontier::new(config).unwrap();

        let first = frontier.next().await.unwrap();
        frontier.add("http://ics.uci.edu/a").await; // idempotent re-add
        assert!(frontier.next().await.is_none());
        frontier.complete(&first).await;
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn restart_persistence_across_instances() {
        let path = temp_path("restart_persist");
        let _ = rocksdb::DB::destroy(&rocksdb::Options::default(), &path);
        let seeds: Vec<String> = (1..=10)
            .map(|i| format!("http://ics.uci.edu/u{i}"))
            .collect();

        {
            let config = ConfigBuilder::new()
                .with_seed_urls(seeds.clone())
                .with_save_file(path.clone())
                .with_delay_ms(0)
                .with_restart(true)
                .build();
            let frontier = Frontier::new(config).unwrap();
            for _ in 0..5 {
                let url = frontier.next().await.unwrap();
                frontier.complete(&url).await;
            }
        }

        let config = ConfigBuilder::new()
            .with_seed_urls(seeds)
            .with_save_file(path)
            .with_delay_ms(0)
            .with_restart(false)
            .build();
        let frontier = Frontier::new(config).unwrap();

        let mut remaining = Vec::new();
        while let Some(url) = frontier.next().await {
            remaining.push(url);
        }
        assert_eq!(remaining.len(), 5);
    }

    #[tokio::test]
    async fn complete_on_unknown_url_does_not_panic() {
        let config = config("unknown_complete", vec!["http://ics.uci.edu/a"], 0);
        let frontier = Frontier::new(config).unwrap();
        frontier.complete("http://ics.uci.edu/never-added").await;
    }

    #[tokio::test]
    async fn invalid_seed_is_dropped_silently() {
        let config = config("invalid_seed", vec!["http://example.com/a"], 0);
        let frontier = Frontier::new(config).unwrap();
        assert!(frontier.next().await.is_none());
    }
}
