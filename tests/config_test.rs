//! Unit tests for settings loading and duration parsing
//!
//! Covers the interval grammar, defaults for missing files and keys, and the
//! camelCase wire shape of effective settings.

use dockobserver::config::{interval_seconds, load_settings, parse_interval, DiscoveryStrategy};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_parse_interval_suffixes() {
    assert_eq!(parse_interval("1d").unwrap(), Duration::from_secs(86_400));
    assert_eq!(parse_interval("1w").unwrap(), Duration::from_secs(604_800));
    assert_eq!(parse_interval("60s").unwrap(), Duration::from_secs(60));
    assert_eq!(parse_interval("60").unwrap(), Duration::from_secs(60));
    assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_interval("3h").unwrap(), Duration::from_secs(10_800));
}

#[test]
fn test_parse_interval_fractional() {
    assert_eq!(parse_interval("1.5h").unwrap(), Duration::from_secs(5_400));
    assert_eq!(parse_interval("0.5m").unwrap(), Duration::from_secs(30));
}

#[test]
fn test_parse_interval_rejects_garbage() {
    assert!(parse_interval("1x").is_err());
    assert!(parse_interval("abc").is_err());
    assert!(parse_interval("-5s").is_err());
    assert_eq!(parse_interval("").unwrap(), Duration::ZERO);
}

#[test]
fn test_interval_seconds_swallows_errors() {
    assert_eq!(interval_seconds("nonsense"), 0);
    assert_eq!(interval_seconds("90"), 90);
}

#[test]
fn test_missing_file_yields_defaults() {
    let settings = load_settings(std::path::Path::new("/definitely/not/here.yml")).unwrap();
    assert!(!settings.auto_updater.enabled);
    assert_eq!(settings.auto_updater.max_concurrent, 4);
    assert_eq!(settings.auto_updater.interval_seconds, 86_400);
    assert_eq!(settings.server.discovery_strategy, DiscoveryStrategy::OptOut);
    assert_eq!(settings.server.enabled_label_field_name, "com.dockobserver.enabled");
    assert_eq!(settings.server.message_history_size, 8);
    assert_eq!(settings.server.dry_run_update_count, 3);
    assert_eq!(settings.server.cache_control_max_age_seconds, 86_400);
    assert_eq!(settings.server.time_until_mature_seconds, 604_800);
    assert_eq!(
        settings.server.ignore_stack_name_keywords,
        vec!["devcontainer".to_string()]
    );
    assert_eq!(
        settings.server.ignored_image_prefixes,
        vec!["docker.io/".to_string(), "docker.io/library/".to_string()]
    );
}

#[test]
fn test_load_settings_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
auto_updater:
  enabled: true
  interval: 12h
  max_concurrent: 2
server:
  cache_control_max_age: 5m
  discovery_strategy: opt-in
  dryrun: true
  stacks_paths:
    - /srv/stacks
"#
    )
    .unwrap();

    let settings = load_settings(file.path()).unwrap();
    assert!(settings.auto_updater.enabled);
    assert_eq!(settings.auto_updater.interval_seconds, 43_200);
    assert_eq!(settings.auto_updater.max_concurrent, 2);
    assert_eq!(settings.server.cache_control_max_age_seconds, 300);
    assert_eq!(settings.server.discovery_strategy, DiscoveryStrategy::OptIn);
    assert!(settings.server.dry_run);
    assert_eq!(settings.server.stacks_paths, vec!["/srv/stacks".to_string()]);
    // untouched keys keep their defaults
    assert_eq!(settings.server.message_history_size, 8);
    assert_eq!(settings.server.time_until_mature_seconds, 604_800);
}

#[test]
fn test_effective_settings_wire_shape() {
    let settings = load_settings(std::path::Path::new("/definitely/not/here.yml")).unwrap();
    let value = serde_json::to_value(&settings).unwrap();

    assert_eq!(value["autoUpdater"]["maxConcurrent"], 4);
    assert_eq!(value["autoUpdater"]["interval"], 86_400);
    assert_eq!(value["server"]["cacheControlMaxAge"], 86_400);
    assert_eq!(value["server"]["timeUntilUpdateIsMature"], 604_800);
    assert_eq!(value["server"]["discoveryStrategy"], "opt-out");
    assert_eq!(value["server"]["ignoreLabelFieldName"], "com.dockobserver.enabled");
    assert_eq!(value["server"]["dryrunUpdateCount"], 3);
    // raw duration strings never leak into the wire document
    assert!(value["server"].get("cache_control_max_age").is_none());
    assert!(value["autoUpdater"].get("interval_raw").is_none());
}
