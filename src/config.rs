//! Crawler configuration.
//!
//! Generalizes the teacher's [`CrawlerBuilder`] pattern (see the
//! sibling `crawly` lineage this crate descends from) into a
//! file-backed `Config` plus a `ConfigBuilder` for programmatic and
//! test construction.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "ics.uci.edu",
    "cs.uci.edu",
    "informatics.uci.edu",
    "stat.uci.edu",
];

const DEFAULT_DISALLOWED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

const DEFAULT_DISALLOWED_SEGMENTS: &[&str] = &[
    "/calendar/",
    "/events/",
    "/login",
    "/logout",
    "/search",
    "/print/",
    "/feed",
    "/rss",
    "/api/",
    "/cgi-bin/",
    "/wp-content/",
    "/images/",
    "/assets/",
    "/static/",
    "/uploads/",
];

const DEFAULT_IMPORTANT_PREFIXES: &[&str] = &[
    "/people/",
    "/faculty/",
    "/research/",
    "/courses/",
    "/news/",
    "/about/",
];

/// How per-host politeness state is keyed. See DESIGN.md's Open
/// Question resolution for the tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolitenessGrouping {
    Netloc,
    MainDomain,
}

impl Default for PolitenessGrouping {
    fn default() -> Self {
        PolitenessGrouping::Netloc
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seed_urls: Vec<String>,
    pub save_file: String,
    pub delay_ms: u64,
    pub worker_count: usize,
    pub allowed_domains: Vec<String>,
    pub disallowed_extensions: Vec<String>,
    pub disallowed_segments: Vec<String>,
    pub important_prefixes: Vec<String>,
    pub max_body_bytes: usize,
    pub min_words: usize,
    pub simhash_window: usize,
    pub near_dup_distance: u32,
    pub checkpoint_interval_s: u64,
    pub politeness_grouping: PolitenessGrouping,
    pub restart: bool,
    pub user_agent: String,
    pub max_url_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_urls: Vec::new(),
            save_file: "crawl_state.db".to_string(),
            delay_ms: 500,
            worker_count: 8,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|s| s.to_string()).collect(),
            disallowed_extensions: DEFAULT_DISALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            disallowed_segments: DEFAULT_DISALLOWED_SEGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            important_prefixes: DEFAULT_IMPORTANT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_body_bytes: 5 * 1024 * 1024,
            min_words: 50,
            simhash_window: 1000,
            near_dup_distance: 3,
            checkpoint_interval_s: 30,
            politeness_grouping: PolitenessGrouping::Netloc,
            restart: false,
            user_agent: "UciCrawlBot".to_string(),
            max_url_len: 200,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, validating required
    /// fields. Missing or malformed config is a fatal startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_urls.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        for seed in &self.seed_urls {
            url::Url::parse(seed).map_err(|e| ConfigError::BadSeed(seed.clone(), e))?;
        }
        if let Some(parent) = Path::new(&self.save_file).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::Unwritable(self.save_file.clone(), e))?;
            }
        }
        Ok(())
    }
}

/// Builder for programmatic / test construction, mirroring the
/// teacher's `CrawlerBuilder`.
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    pub fn with_seed_urls(mut self, seeds: Vec<String>) -> Self {
        self.config.seed_urls = seeds;
        self
    }

    pub fn with_save_file(mut self, path: impl Into<String>) -> Self {
        self.config.save_file = path.into();
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.config.allowed_domains = domains;
        self
    }

    pub fn with_restart(mut self, restart: bool) -> Self {
        self.config.restart = restart;
        self
    }

    pub fn with_politeness_grouping(mut self, grouping: PolitenessGrouping) -> Self {
        self.config.politeness_grouping = grouping;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
