use crate::error::{ObserverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SETTINGS_PATH: &str = "/config/settings.yml";
pub const DEFAULT_REGISTRY_STORE_PATH: &str = "/data/registry_cache.json";

/// Controls whether containers without an explicit enable label are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DiscoveryStrategy {
    #[serde(rename = "opt-in")]
    OptIn,
    #[default]
    #[serde(rename = "opt-out")]
    OptOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoUpdaterSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Raw duration string from the settings file (`1d`, `12h`, `90`, ...).
    #[serde(
        rename(deserialize = "interval"),
        default = "default_updater_interval",
        skip_serializing
    )]
    pub interval_raw: String,

    #[serde(
        rename(serialize = "maxConcurrent"),
        default = "default_max_concurrent"
    )]
    pub max_concurrent: usize,

    /// Parsed form of `interval_raw`; computed after load.
    #[serde(rename(serialize = "interval"), skip_deserializing, default)]
    pub interval_seconds: u64,
}

impl Default for AutoUpdaterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_raw: default_updater_interval(),
            max_concurrent: default_max_concurrent(),
            interval_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(
        rename(deserialize = "cache_control_max_age"),
        default = "default_cache_max_age",
        skip_serializing
    )]
    pub cache_control_max_age_raw: String,

    #[serde(rename(serialize = "discoveryStrategy"), default)]
    pub discovery_strategy: DiscoveryStrategy,

    #[serde(rename = "dryrun", default)]
    pub dry_run: bool,

    #[serde(
        rename(serialize = "dryrunUpdateCount", deserialize = "dryrun_update_count"),
        default = "default_dry_run_update_count"
    )]
    pub dry_run_update_count: usize,

    #[serde(
        rename(serialize = "messageHistorySize"),
        default = "default_message_history_size"
    )]
    pub message_history_size: usize,

    // Serialized name kept from the original wire format.
    #[serde(
        rename(serialize = "ignoreLabelFieldName"),
        default = "default_enabled_label"
    )]
    pub enabled_label_field_name: String,

    #[serde(
        rename(
            serialize = "ignoreComposeStackNameKeywords",
            deserialize = "ignore_compose_stack_name_keywords"
        ),
        default = "default_ignore_keywords"
    )]
    pub ignore_stack_name_keywords: Vec<String>,

    #[serde(
        rename(serialize = "possibleHomepageLabels"),
        default = "default_homepage_labels"
    )]
    pub possible_homepage_labels: Vec<String>,

    #[serde(
        rename(
            serialize = "possibleImageVersionLabels",
            deserialize = "possible_image_version_labels"
        ),
        default = "default_image_version_labels"
    )]
    pub possible_image_labels: Vec<String>,

    #[serde(
        rename(
            serialize = "pythonOnWhalesIgnoredImagePrefixes",
            deserialize = "python_on_whales__ignored_image_prefixes"
        ),
        default = "default_ignored_image_prefixes"
    )]
    pub ignored_image_prefixes: Vec<String>,

    #[serde(
        rename(deserialize = "time_until_update_is_mature"),
        default = "default_time_until_mature",
        skip_serializing
    )]
    pub time_until_mature_raw: String,

    #[serde(rename(serialize = "stacksPaths"), default)]
    pub stacks_paths: Vec<String>,

    #[serde(rename(serialize = "cacheControlMaxAge"), skip_deserializing, default)]
    pub cache_control_max_age_seconds: u64,

    #[serde(
        rename(serialize = "timeUntilUpdateIsMature"),
        skip_deserializing,
        default
    )]
    pub time_until_mature_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            cache_control_max_age_raw: default_cache_max_age(),
            discovery_strategy: DiscoveryStrategy::OptOut,
            dry_run: false,
            dry_run_update_count: default_dry_run_update_count(),
            message_history_size: default_message_history_size(),
            enabled_label_field_name: default_enabled_label(),
            ignore_stack_name_keywords: default_ignore_keywords(),
            possible_homepage_labels: default_homepage_labels(),
            possible_image_labels: default_image_version_labels(),
            ignored_image_prefixes: default_ignored_image_prefixes(),
            time_until_mature_raw: default_time_until_mature(),
            stacks_paths: Vec::new(),
            cache_control_max_age_seconds: 0,
            time_until_mature_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(
        rename(serialize = "autoUpdater", deserialize = "auto_updater"),
        default
    )]
    pub auto_updater: AutoUpdaterSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(rename(serialize = "nodeEnv"), skip_deserializing, default)]
    pub node_env: String,

    #[serde(rename(serialize = "serverPort"), skip_deserializing, default)]
    pub server_port: u16,

    #[serde(rename(serialize = "webPort"), skip_deserializing, default)]
    pub web_port: u16,
}

fn default_updater_interval() -> String {
    "1d".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_cache_max_age() -> String {
    "1d".to_string()
}

fn default_dry_run_update_count() -> usize {
    3
}

fn default_message_history_size() -> usize {
    8
}

fn default_enabled_label() -> String {
    "com.dockobserver.enabled".to_string()
}

fn default_ignore_keywords() -> Vec<String> {
    vec!["devcontainer".to_string()]
}

fn default_homepage_labels() -> Vec<String> {
    vec![
        "org.label-schema.url".to_string(),
        "org.opencontainers.image.url".to_string(),
        "org.opencontainers.image.source".to_string(),
    ]
}

fn default_image_version_labels() -> Vec<String> {
    vec![
        "org.label-schema.version".to_string(),
        "org.opencontainers.image.version".to_string(),
    ]
}

fn default_ignored_image_prefixes() -> Vec<String> {
    vec!["docker.io/".to_string(), "docker.io/library/".to_string()]
}

fn default_time_until_mature() -> String {
    "1w".to_string()
}

/// Load settings from a YAML document. A missing file is not an error: the
/// defaults apply. Empty or non-positive values fall back to their defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings: Settings = match std::fs::read_to_string(path) {
        Ok(data) => serde_yaml::from_str(&data)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => return Err(err.into()),
    };
    apply_defaults(&mut settings);
    Ok(settings)
}

fn apply_defaults(settings: &mut Settings) {
    let server = &mut settings.server;
    if server.enabled_label_field_name.is_empty() {
        server.enabled_label_field_name = default_enabled_label();
    }
    if server.cache_control_max_age_raw.is_empty() {
        server.cache_control_max_age_raw = default_cache_max_age();
    }
    if server.time_until_mature_raw.is_empty() {
        server.time_until_mature_raw = default_time_until_mature();
    }
    if server.dry_run_update_count == 0 {
        server.dry_run_update_count = default_dry_run_update_count();
    }
    if server.message_history_size == 0 {
        server.message_history_size = default_message_history_size();
    }
    let updater = &mut settings.auto_updater;
    if updater.interval_raw.is_empty() {
        updater.interval_raw = default_updater_interval();
    }
    if updater.max_concurrent == 0 {
        updater.max_concurrent = 1;
    }

    server.cache_control_max_age_seconds = interval_seconds(&server.cache_control_max_age_raw);
    server.time_until_mature_seconds = interval_seconds(&server.time_until_mature_raw);
    updater.interval_seconds = interval_seconds(&updater.interval_raw);
}

/// Parse a human-friendly duration: suffixes `s`, `m`, `h`, `d`, `w`; a bare
/// number means seconds. Fractional values are accepted (`1.5h`).
pub fn parse_interval(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Duration::ZERO);
    }
    let last = raw.chars().next_back().unwrap();
    let (value, unit_secs) = if last.is_ascii_digit() {
        (raw, 1.0)
    } else {
        let unit = match last {
            's' => 1.0,
            'm' => 60.0,
            'h' => 3600.0,
            'd' => 86400.0,
            'w' => 604800.0,
            _ => {
                return Err(ObserverError::Config(format!(
                    "invalid interval suffix in {raw:?}"
                )))
            }
        };
        (&raw[..raw.len() - last.len_utf8()], unit)
    };
    let parsed: f64 = value
        .parse()
        .map_err(|_| ObserverError::Config(format!("invalid interval {raw:?}")))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(ObserverError::Config(format!("invalid interval {raw:?}")));
    }
    Ok(Duration::from_secs_f64(parsed * unit_secs))
}

/// `parse_interval` collapsed to whole seconds; malformed input yields zero.
pub fn interval_seconds(raw: &str) -> u64 {
    parse_interval(raw).map(|d| d.as_secs()).unwrap_or(0)
}
