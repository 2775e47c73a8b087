//! Flat-file state: processed-release keys and subscriber chat ids.
//!
//! Everything is a small JSON snapshot under the state directory, written
//! atomically (tmp file + rename) so a crash mid-write never truncates
//! state. Corrupt or missing files load as empty with a warning.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;

pub const PROCESSED_FILE: &str = "processed_events.json";
pub const SUBSCRIBERS_FILE: &str = "subscribers.json";

async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt state file, starting empty");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create state dir {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(value).context("serialize state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &body)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename {} over {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Set of dedup keys for releases that were already notified.
#[derive(Debug)]
pub struct ProcessedStore {
    path: PathBuf,
    keys: Mutex<HashSet<String>>,
}

impl ProcessedStore {
    pub async fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(PROCESSED_FILE);
        let keys: Vec<String> = load_json_or_default(&path).await;
        Self {
            path,
            keys: Mutex::new(keys.into_iter().collect()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().expect("processed mutex poisoned").contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().expect("processed mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert the key and persist. Returns false (without touching disk)
    /// when the key was already present.
    pub async fn insert(&self, key: &str) -> Result<bool> {
        let snapshot = {
            let mut guard = self.keys.lock().expect("processed mutex poisoned");
            if !guard.insert(key.to_string()) {
                return Ok(false);
            }
            let mut v: Vec<String> = guard.iter().cloned().collect();
            v.sort();
            v
        };
        write_json_atomic(&self.path, &snapshot).await?;
        Ok(true)
    }
}

/// Ordered list of subscribed chat ids.
#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    chats: Mutex<Vec<i64>>,
}

impl SubscriberStore {
    pub async fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(SUBSCRIBERS_FILE);
        let chats: Vec<i64> = load_json_or_default(&path).await;
        Self {
            path,
            chats: Mutex::new(chats),
        }
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.chats.lock().expect("subscribers mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.chats.lock().expect("subscribers mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a chat id; returns false when it was already subscribed.
    pub async fn add(&self, chat_id: i64) -> Result<bool> {
        let snapshot = {
            let mut guard = self.chats.lock().expect("subscribers mutex poisoned");
            if guard.contains(&chat_id) {
                return Ok(false);
            }
            guard.push(chat_id);
            guard.clone()
        };
        write_json_atomic(&self.path, &snapshot).await?;
        Ok(true)
    }

    /// Remove a chat id; returns false when it was not subscribed.
    pub async fn remove(&self, chat_id: i64) -> Result<bool> {
        let snapshot = {
            let mut guard = self.chats.lock().expect("subscribers mutex poisoned");
            let before = guard.len();
            guard.retain(|&c| c != chat_id);
            if guard.len() == before {
                return Ok(false);
            }
            guard.clone()
        };
        write_json_atomic(&self.path, &snapshot).await?;
        Ok(true)
    }
}
