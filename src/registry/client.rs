use crate::cache::TtlCache;
use crate::command::run_command;
use crate::config::Settings;
use crate::error::{ObserverError, Result};
use crate::registry::store::{RegistryEntry, RegistryStore, StatusMessage};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60 * 60);
const PINNED_DIGEST_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Remote image metadata as reported by `regctl image inspect`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegctlInspect {
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: RegctlInspectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegctlInspectConfig {
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

/// Remote digest and inspect lookups through the `regctl` CLI, with TTL
/// caching, a persistent result store, and a rate-limit latch.
pub struct RegctlClient {
    settings: Settings,
    cache: Arc<TtlCache>,
    store: RegistryStore,
    rate_limit_until: Mutex<Option<DateTime<Utc>>>,
}

impl RegctlClient {
    pub fn new(settings: Settings, cache: Arc<TtlCache>, store_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            settings,
            cache,
            store: RegistryStore::open(store_path),
            rate_limit_until: Mutex::new(None),
        }
    }

    /// Resolve the remote digest for `repo_tag` as `repo@digest`.
    ///
    /// Returns `None` when the reference is already pinned to a digest, or
    /// when the tool reports no digest.
    pub async fn remote_digest(&self, repo_tag: &str, no_cache: bool) -> Result<Option<String>> {
        if repo_tag.contains("@sha256:") {
            return Ok(None);
        }
        self.ensure_not_rate_limited()?;

        let cache_key = format!("digest:{repo_tag}");
        if !no_cache {
            if let Some(cached) = self.cache.get::<String>(&cache_key) {
                return Ok(Some(cached));
            }
        }

        let out = match run_command("regctl", &["image", "digest", repo_tag]).await {
            Ok(out) => out,
            Err(err) => return Err(self.classify(repo_tag, err)),
        };
        let digest = String::from_utf8_lossy(&out).trim().to_string();
        if digest.is_empty() {
            return Ok(None);
        }

        let mut name = repo_tag;
        if let Some(at) = repo_tag.find('@') {
            name = &repo_tag[..at];
        }
        if let Some(colon) = repo_tag.find(':') {
            name = &repo_tag[..colon];
        }
        let resolved = format!("{name}@{digest}");
        if !no_cache {
            self.cache
                .set(&cache_key, resolved.clone(), self.cache_ttl(repo_tag));
        }
        Ok(Some(resolved))
    }

    /// Fetch remote creation time and labels for a reference.
    pub async fn inspect(&self, repo_tag: &str, no_cache: bool) -> Result<RegctlInspect> {
        self.ensure_not_rate_limited()?;

        let cache_key = format!("inspect:{repo_tag}");
        if !no_cache {
            if let Some(cached) = self.cache.get::<RegctlInspect>(&cache_key) {
                return Ok(cached);
            }
        }

        let out = match run_command("regctl", &["image", "inspect", repo_tag]).await {
            Ok(out) => out,
            Err(err) => return Err(self.classify(repo_tag, err)),
        };
        let inspect: RegctlInspect = serde_json::from_slice(&out)?;
        if !no_cache {
            self.cache
                .set(&cache_key, inspect.clone(), self.cache_ttl(repo_tag));
        }
        Ok(inspect)
    }

    // A pinned digest cannot change, so those entries effectively never expire.
    fn cache_ttl(&self, repo_tag: &str) -> Duration {
        if repo_tag.contains("sha256:") {
            PINNED_DIGEST_TTL
        } else {
            Duration::from_secs(self.settings.server.cache_control_max_age_seconds)
        }
    }

    fn classify(&self, repo_tag: &str, err: ObserverError) -> ObserverError {
        if err.looks_rate_limited() {
            tracing::warn!(repo_tag, error = %err, "registry rate limit reached");
            self.set_rate_limited(RATE_LIMIT_BACKOFF);
            return ObserverError::RateLimited;
        }
        err
    }

    fn ensure_not_rate_limited(&self) -> Result<()> {
        let until = *self.rate_limit_until.lock().unwrap();
        match until {
            Some(until) if Utc::now() < until => Err(ObserverError::RateLimited),
            _ => Ok(()),
        }
    }

    /// Latch the rate-limit deadline; it only ever moves forward.
    pub fn set_rate_limited(&self, backoff: Duration) {
        let candidate = Utc::now()
            + ChronoDuration::from_std(backoff).unwrap_or_else(|_| ChronoDuration::hours(1));
        let mut until = self.rate_limit_until.lock().unwrap();
        if until.map_or(true, |current| candidate > current) {
            *until = Some(candidate);
        }
    }

    pub fn rate_limit_until(&self) -> Option<DateTime<Utc>> {
        *self.rate_limit_until.lock().unwrap()
    }

    pub fn cached(&self, repo_tag: &str) -> Option<RegistryEntry> {
        self.store.get(repo_tag)
    }

    pub fn update_cached(
        &self,
        repo_tag: &str,
        latest_update: Option<DateTime<Utc>>,
        latest_version: &str,
    ) {
        self.store.put(repo_tag, latest_update, latest_version);
    }

    pub fn clear_cached(&self, repo_tag: &str) {
        self.store.clear(repo_tag);
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.store.last_check()
    }

    pub fn last_auto_check(&self) -> Option<DateTime<Utc>> {
        self.store.last_auto_check()
    }

    pub fn touch_last_check(&self) {
        self.store.touch_last_check();
    }

    pub fn touch_last_auto_check(&self) {
        self.store.touch_last_auto_check();
    }

    pub fn append_message(&self, message: &str) {
        self.store
            .append_message(message, self.settings.server.message_history_size);
    }

    pub fn messages(&self, limit: usize) -> Vec<StatusMessage> {
        self.store.messages(limit)
    }
}
