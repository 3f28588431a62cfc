//! Persistent URL Store (spec §4.4).
//!
//! Grounded on `examples/other_examples/.../webcrawler-src-url_store.rs`
//! (a RocksDB-backed URL store for a crawler): a single column family
//! keyed by fingerprint, synchronous writes so a `put` is durable
//! before it's acknowledged, and an `iterate` pass to rebuild frontier
//! state at startup.

use std::sync::Arc;

use rocksdb::{Options, WriteOptions, DB};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

use crate::error::StoreError;

/// 128-bit fingerprint of a canonical URL string (spec §3's "URL
/// record" key). Lowercasing and fragment-stripping happen upstream
/// in [`crate::url_normalize::normalize`]; this just hashes the
/// resulting canonical form.
pub fn fingerprint(canonical_url: &str) -> u128 {
    xxh3_128(canonical_url.as_bytes())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    url: String,
    completed: bool,
}

/// Crash-safe `fingerprint -> (url, completed)` mapping. Single-writer
/// discipline: only the Frontier mutates this store.
#[derive(Clone)]
pub struct UrlStore {
    db: Arc<DB>,
}

impl UrlStore {
    /// Opens (creating if missing) the store at `path`. When `restart`
    /// is set, any existing database at `path` is destroyed first,
    /// mirroring the original crawler's `os.remove(save_file)` on
    /// restart.
    pub fn open(path: &str, restart: bool) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        if restart && std::path::Path::new(path).exists() {
            let _ = DB::destroy(&opts, path);
        }

        let db = DB::open(&opts, path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn contains(&self, fp: u128) -> Result<bool, StoreError> {
        Ok(self.db.get(fp.to_be_bytes())?.is_some())
    }

    /// Durably inserts `(fp, url, completed)`. Returns once RocksDB
    /// has acknowledged a synchronous write.
    pub fn put(&self, fp: u128, url: &str, completed: bool) -> Result<(), StoreError> {
        let record = Record {
            url: url.to_string(),
            completed,
        };
        let bytes = bincode::serialize(&record)?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.put_opt(fp.to_be_bytes(), bytes, &write_opts)?;
        Ok(())
    }

    /// Flips an existing record's `completed` flag to `true`. Returns
    /// `Ok(false)` if the fingerprint was never seen (caller logs an
    /// invariant violation but does not fail).
    pub fn mark_completed(&self, fp: u128, url: &str) -> Result<bool, StoreError> {
        match self.db.get(fp.to_be_bytes())? {
            Some(_) => {
                self.put(fp, url, true)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Iterates every stored record, for startup frontier rebuild.
    pub fn iterate(&self) -> Result<Vec<(u128, String, bool)>, StoreError> {
        let mut out = Vec::new();
        for item in self.db.iterator(rocksdb::IteratorMode::Start) {
            let (key, value) = item?;
            if key.len() != 16 {
                continue;
            }
            let mut fp_bytes = [0u8; 16];
            fp_bytes.copy_from_slice(&key);
            let fp = u128::from_be_bytes(fp_bytes);
            let record: Record = bincode::deserialize(&value)?;
            out.push((fp, record.url, record.completed));
        }
        Ok(out)
    }
}
