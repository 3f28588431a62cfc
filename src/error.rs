//! Typed errors for the boundaries callers actually branch on.
//!
//! Internal orchestration code (the worker loop, the content pipeline)
//! stays on `anyhow::Result`, matching the teacher crate's own style —
//! those errors are logged and swallowed, never matched on.

use thiserror::Error;

/// Failures from [`crate::url_normalize::normalize`].
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to parse URL {0:?}: {1}")]
    Parse(String, url::ParseError),
}

/// Fatal configuration failures, surfaced before the worker pool starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0:?}: {1}")]
    Read(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no seed URLs configured")]
    NoSeeds,
    #[error("unparseable seed URL {0:?}: {1}")]
    BadSeed(String, url::ParseError),
    #[error("save_file path {0:?} is not writable: {1}")]
    Unwritable(String, std::io::Error),
}

/// Failures from the persistent URL store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("record encoding error: {0}")]
    Encode(#[from] bincode::Error),
}
