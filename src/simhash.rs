//! SimHash Engine (spec §4.6): a 64-bit locality-sensitive content
//! fingerprint plus a bounded sliding window of recently seen
//! fingerprints for near-duplicate detection.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use url::Url;

use crate::config::Config;

const MIN_TOKEN_LEN: usize = 3;
const MIN_MATCHES_FOR_DUPLICATE: usize = 3;

/// Computes the 64-bit SimHash fingerprint of `text`: lowercase, strip
/// non-word characters, tokenize on whitespace, drop tokens shorter
/// than 3 characters, weight by frequency.
pub fn fingerprint(text: &str) -> u64 {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut freqs: HashMap<&str, i64> = HashMap::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() > MIN_TOKEN_LEN - 1 {
            *freqs.entry(token).or_insert(0) += 1;
        }
    }

    let mut acc = [0i64; 64];
    for (token, freq) in freqs {
        let hash = token_hash(token);
        for (i, slot) in acc.iter_mut().enumerate() {
            if (hash >> i) & 1 == 1 {
                *slot += freq;
            } else {
                *slot -= freq;
            }
        }
    }

    let mut result: u64 = 0;
    for (i, slot) in acc.iter().enumerate() {
        if *slot > 0 {
            result |= 1 << i;
        }
    }
    result
}

fn token_hash(token: &str) -> u64 {
    let mut h: u64 = 0;
    for byte in token.as_bytes() {
        h = h.wrapping_mul(31).wrapping_add(*byte as u64);
    }
    h
}

/// Hamming distance between two fingerprints. Symmetric
/// (`distance(a,b) == distance(b,a)`) and zero on equal inputs
/// (invariant I5).
pub fn distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

struct WindowEntry {
    host: String,
    #[allow(dead_code)]
    url: String,
    fingerprint: u64,
}

/// Bounded sliding window (default capacity 1,000) of `(host, url,
/// fingerprint)` triples. Oldest entries are evicted first.
pub struct SimhashWindow {
    capacity: usize,
    near_dup_distance: u32,
    entries: Mutex<VecDeque<WindowEntry>>,
}

impl SimhashWindow {
    pub fn new(capacity: usize, near_dup_distance: u32) -> Self {
        Self {
            capacity,
            near_dup_distance,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.simhash_window, config.near_dup_distance)
    }

    /// True iff at least 3 window entries for this URL's host are
    /// within `near_dup_distance` Hamming bits of `text`'s
    /// fingerprint. Whitelisted paths (tilde-user, important
    /// prefixes) are never duplicates and are not recorded. On a
    /// negative outcome the fingerprint is appended to the window.
    pub fn is_near_duplicate(&self, text: &str, url: &Url, config: &Config) -> bool {
        let path = url.path();
        if path == "/"
            || path.trim_start_matches('/').starts_with('~')
            || config.important_prefixes.iter().any(|p| path.starts_with(p.as_str()))
        {
            return false;
        }

        let host = url.host_str().unwrap_or_default().to_string();
        let fp = fingerprint(text);

        let mut entries = self.entries.lock().unwrap();
        let matches = entries
            .iter()
            .filter(|e| e.host == host && distance(e.fingerprint, fp) < self.near_dup_distance)
            .count();

        if matches >= MIN_MATCHES_FOR_DUPLICATE {
            return true;
        }

        entries.push_back(WindowEntry {
            host,
            url: url.to_string(),
            fingerprint: fp,
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        false
    }
}
