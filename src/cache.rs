//! Persistent cache of synthesis reports.
//!
//! Uses LMDB (via heed). Reports are keyed by the SHA-256 of the source
//! content plus the emit options fingerprint, so renamed or moved files
//! with identical content still hit.

use anyhow::{Context, Result};
use heed::types::Str;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn};
use std::path::{Path, PathBuf};

pub const REPORTS_DB: &str = "reports";

const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;
const DEFAULT_MAX_DBS: u32 = 4;

type StrDb = Database<Str, Str>;

#[derive(Debug)]
pub struct PersistentCache {
    env: Env,
    db_path: PathBuf,
    reports: StrDb,
}

impl PersistentCache {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let env = open_env(&db_path)?;
        let mut wtxn = env.write_txn()?;
        let reports = env.create_database::<Str, Str>(&mut wtxn, Some(REPORTS_DB))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            db_path,
            reports,
        })
    }

    pub fn key(content_hash: &str, fingerprint: &str) -> String {
        format!("{content_hash}:{fingerprint}")
    }

    pub fn get_report(&self, key: &str) -> Result<Option<String>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.reports.get(&rtxn, key)?.map(|v| v.to_string()))
    }

    pub fn put_reports(&self, entries: &[(String, String)]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut wtxn = self.env.write_txn()?;
        for (k, v) in entries {
            self.reports.put(&mut wtxn, k.as_str(), v.as_str())?;
        }
        wtxn.commit()?;
        Ok(entries.len())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let rtxn = self.env.read_txn()?;
        Ok(CacheStats {
            db_path: self.db_path.to_string_lossy().to_string(),
            report_entries: table_len(&self.reports, &rtxn)?,
        })
    }
}

fn open_env(db_path: &Path) -> Result<Env> {
    let mut options = EnvOpenOptions::new();
    options.map_size(DEFAULT_MAP_SIZE);
    options.max_dbs(DEFAULT_MAX_DBS);
    // SAFETY: We do not use NO_LOCK and keep default LMDB locking guarantees.
    // NO_SUB_DIR keeps the cache a single file at --db.
    unsafe {
        options.flags(EnvFlags::NO_SUB_DIR);
        options
            .open(db_path)
            .with_context(|| format!("Failed to create/open db env: {}", db_path.display()))
    }
}

fn table_len(db: &StrDb, rtxn: &RoTxn<'_>) -> Result<u64> {
    Ok(db.len(rtxn)?)
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub db_path: String,
    pub report_entries: u64,
}
