//! Analytics Aggregator (spec §4.8): corpus-wide counters behind a
//! single lock, checkpointed to disk on an interval.
//!
//! Grounded on the teacher's sibling `search_engine.rs`'s
//! `Mutex<IndexWriter>` locking shape (one lock, short critical
//! sections, write-mostly) and on `scraper.py`'s global counters,
//! collapsed here into one struct instead of four module-level
//! globals (spec §9's "no implicit globals" redesign note).

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;

use url::Url;

use crate::config::Config;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "in", "on", "at", "for", "to", "of", "with", "and", "or", "but", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that", "these",
    "those", "it", "its", "as", "by", "from", "into", "about", "not", "no", "if", "then", "than",
    "so", "such", "just", "also", "which", "who", "whom", "what", "when", "where", "why", "how",
    "all", "each", "few", "more", "most", "other", "some", "any", "both", "own", "same", "too",
    "very", "i", "you", "he", "she", "we", "they", "them", "his", "her", "our", "your", "their",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

#[derive(Default)]
struct AnalyticsState {
    unique_pages: std::collections::HashSet<String>,
    page_word_counts: HashMap<String, usize>,
    word_frequencies: HashMap<String, u64>,
    subdomain_counts: HashMap<String, u64>,
}

/// Thread-safe corpus analytics: unique pages, per-page word counts,
/// global word frequencies (stopword-filtered), subdomain inventory.
pub struct Analytics {
    state: Mutex<AnalyticsState>,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AnalyticsState::default()),
        }
    }

    /// Records one fetched page: inserts into the unique-page set,
    /// sets its total (unfiltered) alphanumeric token count, updates
    /// global word frequencies (stopword-filtered, length > 2), and
    /// bumps the subdomain counter if the host matches an allowed
    /// domain.
    pub fn record_page(&self, url: &str, text: &str) {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut state = self.state.lock().unwrap();
        state.unique_pages.insert(url.to_string());
        state.page_word_counts.insert(url.to_string(), tokens.len());

        for word in &tokens {
            if word.len() > 2 && !is_stopword(word) {
                *state.word_frequencies.entry(word.clone()).or_insert(0) += 1;
            }
        }

        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                *state.subdomain_counts.entry(host.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn unique_page_count(&self) -> usize {
        self.state.lock().unwrap().unique_pages.len()
    }

    /// Renders the checkpoint report text: unique-page count, longest
    /// page by word count, top-50 words by frequency, subdomains
    /// sorted alphabetically with counts.
    pub fn render_report(&self, timestamp: &str) -> String {
        let state = self.state.lock().unwrap();
        let mut out = String::new();
        let _ = writeln!(out, "Analytics report @ {timestamp}");
        let _ = writeln!(out, "Unique pages: {}", state.unique_pages.len());

        if let Some((url, count)) = state
            .page_word_counts
            .iter()
            .max_by_key(|(_, count)| **count)
        {
            let _ = writeln!(out, "Longest page: {url} ({count} words)");
        } else {
            let _ = writeln!(out, "Longest page: (none)");
        }

        let _ = writeln!(out, "Top 50 words:");
        let mut words: Vec<(&String, &u64)> = state.word_frequencies.iter().collect();
        words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (word, freq) in words.into_iter().take(50) {
            let _ = writeln!(out, "  {word}: {freq}");
        }

        let _ = writeln!(out, "Subdomains:");
        let mut subdomains: Vec<(&String, &u64)> = state.subdomain_counts.iter().collect();
        subdomains.sort_by(|a, b| a.0.cmp(b.0));
        for (host, count) in subdomains {
            let _ = writeln!(out, "  {host}: {count}");
        }

        out
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background checkpoint task: every
/// `checkpoint_interval_s` seconds, rewrites `report_path` with the
/// current analytics report.
pub fn spawn_checkpoint_task(
    analytics: std::sync::Arc<Analytics>,
    config: &Config,
    report_path: String,
) -> tokio::task::JoinHandle<()> {
    let interval_s = config.checkpoint_interval_s.max(1);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_s));
        loop {
            ticker.tick().await;
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let report = analytics.render_report(&now.to_string());
            if let Err(e) = tokio::fs::write(&report_path, report).await {
                tracing::warn!("failed to write analytics checkpoint to {report_path}: {e}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn records_unique_pages_and_word_counts() {
        let analytics = Analytics::new();
        analytics.record_page("http://ics.uci.edu/a", "the quick brown fox jumps");
        analytics.record_page("http://ics.uci.edu/b", "one two");
        assert_eq!(analytics.unique_page_count(), 2);

        let report = analytics.render_report("t0");
        assert!(report.contains("Unique pages: 2"));
        assert!(report.contains("Longest page: http://ics.uci.edu/a (5 words)"));
    }

    #[test]
    fn filters_stopwords_from_global_frequencies() {
        let analytics = Analytics::new();
        analytics.record_page("http://ics.uci.edu/a", "the fox and the hound");
        let report = analytics.render_report("t0");
        assert!(report.contains("fox: 1"));
        assert!(!report.contains("the:"));
    }

    #[test]
    fn tracks_subdomain_counts() {
        let analytics = Analytics::new();
        analytics.record_page("http://www.ics.uci.edu/a", "some words here today");
        analytics.record_page("http://www.ics.uci.edu/b", "more words here today");
        let report = analytics.render_report("t0");
        assert!(report.contains("www.ics.uci.edu: 2"));
    }

    #[tokio::test]
    async fn checkpoint_task_writes_report_file() {
        let analytics = std::sync::Arc::new(Analytics::new());
        analytics.record_page("http://ics.uci.edu/a", "alpha beta gamma delta epsilon");
        let mut config = ConfigBuilder::new().build();
        config.checkpoint_interval_s = 1;
        let path = std::env::temp_dir()
            .join("uci_crawl_analytics_checkpoint_test.txt")
            .to_string_lossy()
            .into_owned();

        let handle = spawn_checkpoint_task(analytics, &config, path.clone());
        tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
        handle.abort();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("Unique pages: 1"));
    }
}
