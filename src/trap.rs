//! Trap Detector (spec §4.2): a stateless-plus-counter predicate
//! rejecting URLs whose shape indicates a spider trap.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::Config;

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/\d{4}/\d{2}(/\d{2})?/").expect("valid regex"))
}

fn wiki_action_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|&)do=(index|revisions|diff|backlink)(?:&|$)").expect("valid regex")
    })
}

fn from_date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|&)from=\d{4}-\d{2}-\d{2}(?:&|$)").expect("valid regex"))
}

fn precision_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|&)precision=(second|minute|hour)(?:&|$)").expect("valid regex")
    })
}

/// True if `path` is the tilde-user convention (`~name/...`).
fn is_tilde_user(path: &str) -> bool {
    path.trim_start_matches('/').starts_with('~')
}

fn is_whitelisted(url: &Url, config: &Config) -> bool {
    let path = url.path();
    if path == "/" || path.is_empty() {
        return true;
    }
    if is_tilde_user(path) {
        return true;
    }
    config
        .important_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// True iff the URL shape looks like a spider trap: date-sequence
/// paths, oversized or repetitive query strings, wiki action params,
/// or a repeated query key. Whitelisted paths (root, important
/// prefixes, tilde-user pages) are never traps.
pub fn is_trap(url: &Url, config: &Config) -> bool {
    if is_whitelisted(url, config) {
        return false;
    }

    if date_pattern().is_match(url.path()) {
        return true;
    }

    let query = url.query().unwrap_or("");
    if query.len() > 100 {
        return true;
    }
    if query.matches('&').count() > 5 {
        return true;
    }
    if wiki_action_pattern().is_match(query) {
        return true;
    }
    if from_date_pattern().is_match(query) || precision_pattern().is_match(query) {
        return true;
    }

    has_repeated_key(query)
}

fn has_repeated_key(query: &str) -> bool {
    let mut seen = std::collections::HashSet::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let key = pair.split('=').next().unwrap_or(pair);
        if !seen.insert(key) {
            return true;
        }
    }
    false
}
