//! Content Pipeline (spec §4.7): orchestrates decode → DOM strip →
//! trap/duplicate gate → analytics update → link extraction for a
//! single fetched response.

use url::Url;

use crate::analytics::Analytics;
use crate::config::Config;
use crate::downloader::Response;
use crate::html::strip_and_extract;
use crate::simhash::SimhashWindow;
use crate::trap::is_trap;

const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// Runs the pipeline for one fetched `response`, returning candidate
/// outbound links. The Worker Pool still has to filter these through
/// `is_valid`/`robots.allowed` before adding them to the Frontier
/// (spec §9's redesign flag on where robots filtering belongs).
pub fn process(
    fetched_url: &Url,
    response: &Response,
    config: &Config,
    analytics: &Analytics,
    simhash_window: &SimhashWindow,
) -> Vec<String> {
    if response.status != 200 && !REDIRECT_STATUSES.contains(&response.status) {
        return Vec::new();
    }

    if REDIRECT_STATUSES.contains(&response.status) {
        return match response.headers.get("location").or_else(|| response.headers.get("Location")) {
            Some(location) => match fetched_url.join(location) {
                Ok(resolved) => vec![resolved.to_string()],
                Err(_) => Vec::new(),
            },
            None => Vec::new(),
        };
    }

    let Some(body) = &response.body else {
        return Vec::new();
    };
    if body.len() > config.max_body_bytes {
        return Vec::new();
    }

    let (text, hrefs) = strip_and_extract(body);

    let word_count = text.split_whitespace().count();
    if word_count < config.min_words {
        return Vec::new();
    }

    if is_trap(fetched_url, config) || simhash_window.is_near_duplicate(&text, fetched_url, config) {
        return Vec::new();
    }

    analytics.record_page(fetched_url.as_str(), &text);

    hrefs
        .into_iter()
        .filter_map(|href| resolve_link(fetched_url, &href))
        .collect()
}

fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let lower = href.trim().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:") {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    let ascii_only: String = resolved.as_str().chars().filter(|c| c.is_ascii()).collect();
    Some(ascii_only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use std::collections::HashMap;

    fn config() -> Config {
        ConfigBuilder::new().build()
    }

    fn response(status: u16, body: Option<&str>) -> Response {
        Response {
            status,
            body: body.map(|b| b.as_bytes().to_vec()),
            headers: HashMap::new(),
            final_url: "http://ics.uci.edu/page".to_string(),
        }
    }

    fn long_body(sentence: &str, repeat: usize) -> String {
        format!(
            "<html><body><p>{}</p></body></html>",
            sentence.repeat(repeat)
        )
    }

    #[test]
    fn non_ok_non_redirect_status_yields_no_links() {
        let config = config();
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/page").unwrap();
        let resp = response(404, Some("<html></html>"));
        assert!(process(&url, &resp, &config, &analytics, &window).is_empty());
    }

    #[test]
    fn redirect_resolves_relative_location() {
        let config = config();
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/old/page").unwrap();
        let mut resp = response(301, None);
        resp.headers.insert("location".to_string(), "/new/page".to_string());
        let links = process(&url, &resp, &config, &analytics, &window);
        assert_eq!(links, vec!["http://ics.uci.edu/new/page".to_string()]);
    }

    #[test]
    fn low_word_count_page_yields_no_links() {
        let config = config();
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/page").unwrap();
        let resp = response(200, Some("<html><body><p>too short</p></body></html>"));
        assert!(process(&url, &resp, &config, &analytics, &window).is_empty());
    }

    #[test]
    fn oversized_body_yields_no_links() {
        let mut config = config();
        config.max_body_bytes = 10;
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/page").unwrap();
        let resp = response(200, Some(&long_body("word ", 100)));
        assert!(process(&url, &resp, &config, &analytics, &window).is_empty());
    }

    #[test]
    fn trap_url_yields_no_links_even_with_good_content() {
        let config = config();
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/2020/03/15/post").unwrap();
        let body = long_body("substantial meaningful word content here ", 20);
        let resp = response(200, Some(&body));
        assert!(process(&url, &resp, &config, &analytics, &window).is_empty());
    }

    #[test]
    fn valid_page_extracts_links_and_records_analytics() {
        let config = config();
        let analytics = Analytics::new();
        let window = SimhashWindow::from_config(&config);
        let url = Url::parse("http://ics.uci.edu/page").unwrap();
        let body = format!(
            "<html><body><p>{}</p><a href=\"/other\">link</a><a href=\"javascript:void(0)\">skip</a></body></html>",
            "meaningful distinct word content ".repeat(20)
        );
        let resp = response(200, Some(&body));
        let links = process(&url, &resp, &config, &analytics, &window);
        assert_eq!(links, vec!["http://ics.uci.edu/other".to_string()]);
        assert_eq!(analytics.unique_page_count(), 1);
    }
}
