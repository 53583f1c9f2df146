//! Unit tests for image reference normalization and matching
//!
//! Covers the parse/lookup round trip, the hub-prefix matching chain, label
//! fallbacks, and homepage derivation.

use dockobserver::docker::image_ref::{
    first_label, homepage_url_for_image, match_image_for_ref, normalize_image_ref,
};
use dockobserver::docker::models::{DockerImage, ServiceStatus};
use std::collections::HashMap;

fn prefixes() -> Vec<String> {
    vec!["docker.io/".to_string(), "docker.io/library/".to_string()]
}

#[test]
fn test_normalize_splits_repo_tag_digest() {
    let parsed = normalize_image_ref("nginx:1.25@sha256:abcd", &prefixes());
    assert_eq!(parsed.repo, "nginx");
    assert_eq!(parsed.tag, "1.25");
    assert_eq!(parsed.digest, "sha256:abcd");
    assert_eq!(parsed.lookup, "nginx@sha256:abcd");
}

#[test]
fn test_normalize_strips_configured_prefixes() {
    let parsed = normalize_image_ref("docker.io/library/nginx:1.25", &prefixes());
    assert_eq!(parsed.repo, "library/nginx");
    assert_eq!(parsed.lookup, "library/nginx:1.25");

    let parsed = normalize_image_ref("docker.io/grafana/grafana:10.0.0", &prefixes());
    assert_eq!(parsed.repo, "grafana/grafana");
    assert_eq!(parsed.tag, "10.0.0");
}

#[test]
fn test_normalize_is_idempotent_on_lookup() {
    for reference in [
        "nginx",
        "nginx:1.25",
        "nginx@sha256:abcd",
        "nginx:1.25@sha256:abcd",
        "ghcr.io/owner/app:v2",
        "docker.io/library/redis:7",
    ] {
        let once = normalize_image_ref(reference, &prefixes());
        let twice = normalize_image_ref(&once.lookup, &prefixes());
        assert_eq!(once, twice, "normalize not idempotent for {reference}");
    }
}

#[test]
fn test_normalize_empty_input_keeps_original() {
    let parsed = normalize_image_ref("", &prefixes());
    assert_eq!(parsed.lookup, "");
    let parsed = normalize_image_ref("docker.io/", &prefixes());
    assert_eq!(parsed.lookup, "docker.io/");
}

fn image(repo_tag: &str) -> DockerImage {
    DockerImage {
        repo_tag: repo_tag.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_match_prefers_exact_key() {
    let mut map = HashMap::new();
    map.insert("nginx:1.25".to_string(), image("nginx:1.25"));
    map.insert("nginx:1.24".to_string(), image("nginx:1.24"));
    let found = match_image_for_ref(&map, "nginx:1.25", &prefixes()).unwrap();
    assert_eq!(found.repo_tag, "nginx:1.25");
}

#[test]
fn test_match_is_prefix_insensitive() {
    let mut map = HashMap::new();
    map.insert("nginx:1.25".to_string(), image("nginx:1.25"));
    for reference in ["nginx:1.25", "docker.io/nginx:1.25", "docker.io/library/nginx:1.25"] {
        let found = match_image_for_ref(&map, reference, &prefixes());
        assert!(found.is_some(), "no match for {reference}");
        assert_eq!(found.unwrap().repo_tag, "nginx:1.25");
    }
}

#[test]
fn test_match_falls_back_to_repo_scan() {
    let mut map = HashMap::new();
    map.insert(
        "grafana/grafana:10.0.0@sha256:beef".to_string(),
        image("grafana/grafana:10.0.0@sha256:beef"),
    );
    let found = match_image_for_ref(&map, "grafana/grafana", &prefixes());
    assert!(found.is_some());
}

#[test]
fn test_match_miss_returns_none() {
    let mut map = HashMap::new();
    map.insert("nginx:1.25".to_string(), image("nginx:1.25"));
    assert!(match_image_for_ref(&map, "postgres:16", &prefixes()).is_none());
}

#[test]
fn test_first_label_picks_first_candidate() {
    let mut labels = HashMap::new();
    labels.insert("org.opencontainers.image.version".to_string(), "2.0".to_string());
    labels.insert("org.label-schema.version".to_string(), "1.0".to_string());
    let candidates = vec![
        "org.label-schema.version".to_string(),
        "org.opencontainers.image.version".to_string(),
    ];
    assert_eq!(first_label(Some(&labels), &candidates), "1.0");
    assert_eq!(first_label(None, &candidates), "");
}

#[test]
fn test_homepage_url_from_label() {
    let mut labels = HashMap::new();
    labels.insert(
        "org.opencontainers.image.url".to_string(),
        "https://example.org".to_string(),
    );
    let homepage_labels = vec!["org.opencontainers.image.url".to_string()];
    assert_eq!(
        homepage_url_for_image("nginx:1.25", Some(&labels), &homepage_labels),
        "https://example.org"
    );
}

#[test]
fn test_homepage_url_defaults_to_hub() {
    assert_eq!(
        homepage_url_for_image("nginx:1.25", None, &[]),
        "http://hub.docker.com/r/nginx"
    );
    assert_eq!(
        homepage_url_for_image("docker.io/library/redis:7", None, &[]),
        "http://hub.docker.com/r/redis"
    );
}

#[test]
fn test_homepage_url_ghcr_points_at_github() {
    assert_eq!(
        homepage_url_for_image("ghcr.io/owner/app:v2", None, &[]),
        "http://github.com/owner/app"
    );
}

#[test]
fn test_status_normalization_closed_set() {
    assert_eq!(ServiceStatus::from_engine("running"), ServiceStatus::Running);
    assert_eq!(ServiceStatus::from_engine("RUNNING"), ServiceStatus::Running);
    for engine_status in ["exited", "dead", "created", "paused", "restarting", "stopped", "weird"] {
        assert_eq!(
            ServiceStatus::from_engine(engine_status),
            ServiceStatus::Stopped,
            "{engine_status} should normalize to stopped"
        );
    }
}
