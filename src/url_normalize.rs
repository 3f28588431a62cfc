//! URL Normalizer & Validator (spec §4.1).

use url::Url;

use crate::config::Config;
use crate::error::NormalizeError;

/// Canonicalizes a URL string: lowercases scheme and host, strips the
/// fragment, collapses repeated path slashes, trims trailing
/// whitespace. Fails with a typed error if the URL doesn't parse.
///
/// Idempotent: `normalize(normalize(u).as_str()) == normalize(u)`,
/// which is what invariant I6 relies on.
pub fn normalize(raw: &str) -> Result<Url, NormalizeError> {
    let trimmed = raw.trim_end();
    let mut url = Url::parse(trimmed)
        .map_err(|e| NormalizeError::Parse(raw.to_string(), e))?;

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lowered = host.to_ascii_lowercase();
        let _ = url.set_host(Some(&lowered));
    }

    let collapsed = collapse_slashes(url.path());
    if collapsed != url.path() {
        url.set_path(&collapsed);
    }

    Ok(url)
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

/// Decides perimeter membership per spec §4.1: allowed domain suffix,
/// disallowed extension, disallowed path segment, length cap.
pub fn is_valid(url: &Url, config: &Config) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let domain_ok = config
        .allowed_domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")));
    if !domain_ok {
        return false;
    }

    let path = url.path().to_ascii_lowercase();
    if let Some(ext) = final_extension(&path) {
        if config.disallowed_extensions.iter().any(|d| d == ext) {
            return false;
        }
    }

    if config.disallowed_segments.iter().any(|seg| path.contains(seg.as_str())) {
        return false;
    }

    if url.as_str().len() > config.max_url_len {
        return false;
    }

    true
}

fn final_extension(path: &str) -> Option<&str> {
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn cfg() -> Config {
        ConfigBuilder::new().build()
    }

    #[test]
    fn normalize_lowercases_scheme_and_host() {
        let u = normalize("HTTP://WWW.ICS.UCI.EDU/Page").unwrap();
        assert_eq!(u.scheme(), "http");
        assert_eq!(u.host_str(), Some("www.ics.uci.edu"));
    }

    #[test]
    fn normalize_strips_fragment() {
        let u = normalize("http://ics.uci.edu/page#section").unwrap();
        assert_eq!(u.fragment(), None);
    }

    #[test]
    fn normalize_collapses_repeated_slashes() {
        let u = normalize("http://ics.uci.edu//a///b").unwrap();
        assert_eq!(u.path(), "/a/b");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("HTTP://ICS.UCI.EDU//a//b#frag").unwrap();
        let twice = normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_foreign_domain() {
        let u = normalize("http://example.com/").unwrap();
        assert!(!is_valid(&u, &cfg()));
    }

    #[test]
    fn accepts_subdomain() {
        let u = normalize("http://www.ics.uci.edu/about").unwrap();
        assert!(is_valid(&u, &cfg()));
    }

    #[test]
    fn rejects_disallowed_extension() {
        let u = normalize("http://ics.uci.edu/paper.pdf").unwrap();
        assert!(!is_valid(&u, &cfg()));
    }

    #[test]
    fn rejects_disallowed_segment() {
        let u = normalize("http://ics.uci.edu/login").unwrap();
        assert!(!is_valid(&u, &cfg()));
    }

    #[test]
    fn rejects_over_length_url() {
        let long_path = "a".repeat(250);
        let u = normalize(&format!("http://ics.uci.edu/{long_path}")).unwrap();
        assert!(!is_valid(&u, &cfg()));
    }

    #[test]
    fn validator_closure_holds_under_double_normalize() {
        let raw = "HTTP://ICS.UCI.EDU//paper.pdf";
        let once = normalize(raw).unwrap();
        let twice = normalize(once.as_str()).unwrap();
        assert_eq!(is_valid(&once, &cfg()), is_valid(&twice, &cfg()));
    }
}
