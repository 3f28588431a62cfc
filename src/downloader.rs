//! HTTP fetch collaborator (spec §6). Deliberately out of the core's
//! scope per spec §1, but the crate needs a concrete default to run
//! end to end, and tests need an in-memory fake (spec §9 REDESIGN
//! FLAGS).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use url::Url;

/// Mirrors spec §6's `Response = { status, raw_response: { content,
/// headers, url } | none }`. `body`/`headers` are `None`/empty when
/// the downloader couldn't retrieve a body at all (network failure
/// surfaced as a non-2xx/3xx status upstream of this type).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Option<Vec<u8>>,
    pub headers: HashMap<String, String>,
    pub final_url: String,
}

/// Safe to call from multiple workers concurrently (spec §6).
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Response>;
}

/// `reqwest`-backed default, grounded on the teacher's `Client`
/// construction in `Crawler::from_config`.
pub struct ReqwestDownloader {
    client: reqwest::Client,
}

impl ReqwestDownloader {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Response> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp.bytes().await.ok().map(|b| b.to_vec());
        Ok(Response {
            status,
            body,
            headers,
            final_url,
        })
    }
}

/// In-memory fake for tests, keyed by exact URL string.
pub struct FakeDownloader {
    responses: Mutex<HashMap<String, Response>>,
    fetches: AtomicUsize,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn insert(&mut self, url: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for FakeDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Response> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().unwrap();
        match responses.get(url.as_str()) {
            Some(resp) => Ok(resp.clone()),
            None => Ok(Response {
                status: 404,
                body: None,
                headers: HashMap::new(),
                final_url: url.to_string(),
            }),
        }
    }
}
