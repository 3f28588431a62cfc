//! A polite, multi-worker web crawler over a fixed set of allowed
//! host-suffix domains.
//!
//! The core of this crate is the politeness-constrained [`frontier`]
//! scheduler and the [`content_pipeline`], which together decide what
//! URL is fetched next, by whom, and when, and whether the fetched
//! content should be incorporated into the corpus (trap detection,
//! SimHash near-duplicate detection). The HTTP fetch client and HTML
//! parser are out-of-scope collaborators behind the [`downloader`] and
//! [`html`] modules respectively.

pub mod analytics;
pub mod config;
pub mod content_pipeline;
pub mod downloader;
pub mod error;
pub mod frontier;
pub mod html;
pub mod robots;
pub mod simhash;
pub mod store;
pub mod trap;
pub mod url_normalize;
pub mod worker;

pub use config::Config;
pub use frontier::Frontier;
