use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Per-image record of the last successful remote lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    #[serde(default)]
    pub checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RegistryDocument {
    #[serde(default)]
    last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    last_auto_check: Option<DateTime<Utc>>,
    #[serde(default)]
    messages: Vec<StatusMessage>,
    #[serde(default)]
    entries: HashMap<String, RegistryEntry>,
}

/// Registry lookup results persisted as a single JSON document.
///
/// Durability is best-effort: every mutation rewrites the whole file, and a
/// failed write only logs. A missing or unreadable document is an empty store.
pub struct RegistryStore {
    path: PathBuf,
    doc: Mutex<RegistryDocument>,
}

impl RegistryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = Self::load(&path);
        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    fn load(path: &Path) -> RegistryDocument {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(_) => return RegistryDocument::default(),
        };
        match serde_json::from_slice(&data) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "registry store unreadable, starting empty");
                RegistryDocument::default()
            }
        }
    }

    fn save(&self, doc: &RegistryDocument) {
        let data = match serde_json::to_vec_pretty(doc) {
            Ok(data) => data,
            Err(_) => return,
        };
        if let Err(err) = std::fs::write(&self.path, data) {
            tracing::debug!(path = %self.path.display(), error = %err, "registry store write failed");
        }
    }

    pub fn get(&self, repo_tag: &str) -> Option<RegistryEntry> {
        self.doc.lock().unwrap().entries.get(repo_tag).cloned()
    }

    /// Record a remote lookup result and bump `lastCheck`.
    pub fn put(&self, repo_tag: &str, latest_update: Option<DateTime<Utc>>, latest_version: &str) {
        if repo_tag.is_empty() {
            return;
        }
        let mut doc = self.doc.lock().unwrap();
        doc.entries.insert(
            repo_tag.to_string(),
            RegistryEntry {
                checked_at: Some(Utc::now()),
                latest_update,
                latest_version: latest_version.to_string(),
            },
        );
        doc.last_check = Some(Utc::now());
        self.save(&doc);
    }

    pub fn clear(&self, repo_tag: &str) {
        if repo_tag.is_empty() {
            return;
        }
        let mut doc = self.doc.lock().unwrap();
        if doc.entries.remove(repo_tag).is_some() {
            self.save(&doc);
        }
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.doc.lock().unwrap().last_check
    }

    pub fn last_auto_check(&self) -> Option<DateTime<Utc>> {
        self.doc.lock().unwrap().last_auto_check
    }

    pub fn touch_last_check(&self) {
        let mut doc = self.doc.lock().unwrap();
        doc.last_check = Some(Utc::now());
        self.save(&doc);
    }

    pub fn touch_last_auto_check(&self) {
        let mut doc = self.doc.lock().unwrap();
        doc.last_auto_check = Some(Utc::now());
        self.save(&doc);
    }

    /// Append a status line, trimming the oldest entries beyond `limit`.
    pub fn append_message(&self, message: &str, limit: usize) {
        if message.is_empty() {
            return;
        }
        let limit = limit.max(1);
        let mut doc = self.doc.lock().unwrap();
        doc.messages.push(StatusMessage {
            at: Utc::now(),
            message: message.to_string(),
        });
        if doc.messages.len() > limit {
            let excess = doc.messages.len() - limit;
            doc.messages.drain(..excess);
        }
        self.save(&doc);
    }

    /// The last `limit` status lines, oldest first. Zero means all.
    pub fn messages(&self, limit: usize) -> Vec<StatusMessage> {
        let doc = self.doc.lock().unwrap();
        let len = doc.messages.len();
        let take = if limit == 0 || limit > len { len } else { limit };
        doc.messages[len - take..].to_vec()
    }
}
