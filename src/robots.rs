//! Robots Policy Cache (spec §4.3).
//!
//! Grounded on the teacher's `RobotsCache` struct and
//! `robots_cache: RwLock<IndexMap<String, RobotsCache>>` field, pulled
//! out of the recursive `crawl` function into a standalone cache with
//! an `allowed(url)` entry point.

use indexmap::IndexMap;
use robotstxt::DefaultMatcher;
use tokio::sync::RwLock;
use url::Url;

use crate::downloader::Downloader;

#[derive(Debug, Clone)]
struct RobotsEntry {
    content: String,
}

/// Per-host cache of parsed `robots.txt`. No expiry: crawl sessions
/// are bounded, so a host is fetched at most once per run.
pub struct RobotsCache<D: Downloader> {
    downloader: D,
    user_agent: String,
    cache: RwLock<IndexMap<String, RobotsEntry>>,
}

impl<D: Downloader> RobotsCache<D> {
    pub fn new(downloader: D, user_agent: impl Into<String>) -> Self {
        Self {
            downloader,
            user_agent: user_agent.into(),
            cache: RwLock::new(IndexMap::new()),
        }
    }

    /// Answers whether `url` may be fetched under the cached policy
    /// for its host, fetching and parsing `robots.txt` on a cache
    /// miss. Fetch or parse failure is treated as allow-all.
    pub async fn allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let host = host.to_string();

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&host) {
                return self.matches(entry, url);
            }
        }

        let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
        let content = match Url::parse(&robots_url) {
            Ok(robots_url) => match self.downloader.fetch(&robots_url).await {
                Ok(resp) if resp.status == 200 => resp
                    .body
                    .map(|b| String::from_utf8_lossy(&b).into_owned())
                    .unwrap_or_default(),
                _ => {
                    tracing::debug!("robots.txt fetch failed for {host}, defaulting to allow-all");
                    String::new()
                }
            },
            Err(_) => String::new(),
        };

        let mut cache = self.cache.write().await;
        let entry = cache
            .entry(host)
            .or_insert(RobotsEntry { content });
        self.matches(entry, url)
    }

    fn matches(&self, entry: &RobotsEntry, url: &Url) -> bool {
        if entry.content.is_empty() {
            return true;
        }
        DefaultMatcher::default().one_agent_allowed_by_robots(
            &entry.content,
            &self.user_agent,
            url.as_str(),
        )
    }
}
