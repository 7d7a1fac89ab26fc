//! The persisted article collection behind an abstract store contract.
//!
//! Writers treat every write as replace-whole-collection (read current,
//! compute next, write next); the scheduler's at-most-one-in-flight
//! invariant keeps that safe. The backing technology is an implementation
//! detail: a JSON state directory here, browser storage in the original UI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::article::Article;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_all(&self) -> SyncResult<Vec<Article>>;
    /// Replace the whole collection. Id uniqueness is enforced here: later
    /// duplicates of an id are dropped.
    async fn replace_all(&self, articles: Vec<Article>) -> SyncResult<()>;
    async fn last_sync_at(&self) -> SyncResult<Option<DateTime<Utc>>>;
    async fn set_last_sync_at(&self, at: DateTime<Utc>) -> SyncResult<()>;
    async fn load_config(&self) -> SyncResult<Option<SyncConfig>>;
    async fn save_config(&self, config: &SyncConfig) -> SyncResult<()>;
}

pub type DynArticleStore = Arc<dyn ArticleStore>;

fn dedup_by_id(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
    articles
        .into_iter()
        .filter(|a| seen.insert(a.id.clone()))
        .collect()
}

/* ----------------------------
In-memory store (tests, dev)
---------------------------- */

#[derive(Default)]
struct MemoryState {
    articles: Vec<Article>,
    last_sync: Option<DateTime<Utc>>,
    config: Option<SyncConfig>,
}

/// Non-durable store used by tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn get_all(&self) -> SyncResult<Vec<Article>> {
        Ok(self.state.lock().expect("store mutex poisoned").articles.clone())
    }

    async fn replace_all(&self, articles: Vec<Article>) -> SyncResult<()> {
        self.state.lock().expect("store mutex poisoned").articles = dedup_by_id(articles);
        Ok(())
    }

    async fn last_sync_at(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.state.lock().expect("store mutex poisoned").last_sync)
    }

    async fn set_last_sync_at(&self, at: DateTime<Utc>) -> SyncResult<()> {
        self.state.lock().expect("store mutex poisoned").last_sync = Some(at);
        Ok(())
    }

    async fn load_config(&self) -> SyncResult<Option<SyncConfig>> {
        Ok(self.state.lock().expect("store mutex poisoned").config.clone())
    }

    async fn save_config(&self, config: &SyncConfig) -> SyncResult<()> {
        self.state.lock().expect("store mutex poisoned").config = Some(config.clone());
        Ok(())
    }
}

/* ----------------------------
JSON state-directory store
---------------------------- */

const ARTICLES_FILE: &str = "articles.json";
const CONFIG_FILE: &str = "sync_config.json";
const LAST_SYNC_FILE: &str = "last_sync.json";

/// Durable store: one JSON file per concern under a state directory.
/// Writes go through a temp file plus rename so readers never see a
/// half-written collection.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> SyncResult<Option<T>> {
        match tokio::fs::read_to_string(self.path(file)).await {
            Ok(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| SyncError::Store(format!("parse {file}: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Store(format!("read {file}: {e}"))),
        }
    }

    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> SyncResult<()> {
        write_json_atomic(&self.dir, file, value)
            .await
            .map_err(|e| SyncError::Store(format!("write {file}: {e}")))
    }
}

async fn write_json_atomic<T: Serialize>(dir: &Path, file: &str, value: &T) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ArticleStore for JsonFileStore {
    async fn get_all(&self) -> SyncResult<Vec<Article>> {
        Ok(self.read_json(ARTICLES_FILE).await?.unwrap_or_default())
    }

    async fn replace_all(&self, articles: Vec<Article>) -> SyncResult<()> {
        self.write_json(ARTICLES_FILE, &dedup_by_id(articles)).await
    }

    async fn last_sync_at(&self) -> SyncResult<Option<DateTime<Utc>>> {
        self.read_json(LAST_SYNC_FILE).await
    }

    async fn set_last_sync_at(&self, at: DateTime<Utc>) -> SyncResult<()> {
        self.write_json(LAST_SYNC_FILE, &at).await
    }

    async fn load_config(&self) -> SyncResult<Option<SyncConfig>> {
        self.read_json(CONFIG_FILE).await
    }

    async fn save_config(&self, config: &SyncConfig) -> SyncResult<()> {
        self.write_json(CONFIG_FILE, config)
            .await
            .map_err(|e| SyncError::ConfigPersistence(e.to_string()))
    }
}
