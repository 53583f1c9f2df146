//! Unit tests for the compose scanner
//!
//! Covers stack naming, env interpolation, implicit tags, multi-file merging,
//! and the not-loaded placeholder.

use dockobserver::config::ServerSettings;
use dockobserver::docker::compose::{load_env_file, resolve_env_vars, scan_compose_stacks};
use dockobserver::docker::models::ServiceStatus;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn settings_for(root: &Path) -> ServerSettings {
    ServerSettings {
        stacks_paths: vec![root.to_string_lossy().to_string()],
        ..Default::default()
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_scan_single_stack() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("demo/docker-compose.yml"),
        r#"
services:
  web:
    image: nginx:1.25
"#,
    );

    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    assert_eq!(stacks.len(), 1);
    let stack = &stacks[0];
    assert_eq!(stack.name, "demo");
    assert_eq!(stack.folder_name, "demo");
    assert_eq!(stack.config_files.len(), 1);
    assert!(!stack.has_updates);

    assert_eq!(stack.services.len(), 1);
    let web = &stack.services[0];
    assert_eq!(web.service_name, "web");
    assert_eq!(web.status, ServiceStatus::NotLoaded);
    assert_eq!(web.uptime, "Not loaded");
    assert_eq!(web.image.as_ref().unwrap().repo_tag, "nginx:1.25");
    assert_eq!(web.homepage_url, "http://hub.docker.com/r/nginx");
}

#[test]
fn test_scan_honors_explicit_stack_name() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("somewhere/compose.yaml"),
        r#"
name: media
services:
  jellyfin:
    image: jellyfin/jellyfin
"#,
    );

    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    assert_eq!(stacks[0].name, "media");
    assert_eq!(stacks[0].folder_name, "somewhere");
    // image without tag or digest gets the implicit :latest
    assert_eq!(
        stacks[0].services[0].image.as_ref().unwrap().repo_tag,
        "jellyfin/jellyfin:latest"
    );
}

#[test]
fn test_scan_interpolates_env_file() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("app/.env"), "TAG=1.2.3\nNAME=\"my-app\"\n# comment\n");
    write(
        &dir.path().join("app/docker-compose.yaml"),
        r#"
services:
  app:
    image: vendor/app:${TAG}
    container_name: ${NAME}
  helper:
    image: vendor/helper:${MISSING:-stable}
"#,
    );

    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    let services = &stacks[0].services;
    assert_eq!(services[0].image.as_ref().unwrap().repo_tag, "vendor/app:1.2.3");
    assert_eq!(services[0].container_name, "my-app");
    assert_eq!(
        services[1].image.as_ref().unwrap().repo_tag,
        "vendor/helper:stable"
    );
}

#[test]
fn test_scan_merges_stacks_with_same_name() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("a/docker-compose.yml"),
        r#"
name: shared
services:
  one:
    image: busybox:1
  two:
    image: busybox:2
"#,
    );
    write(
        &dir.path().join("b/docker-compose.yml"),
        r#"
name: shared
services:
  two:
    image: busybox:2-override
  three:
    image: busybox:3
"#,
    );

    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    assert_eq!(stacks.len(), 1);
    let stack = &stacks[0];
    assert_eq!(stack.config_files.len(), 2);
    let names: Vec<&str> = stack.services.iter().map(|s| s.service_name.as_str()).collect();
    assert_eq!(names, vec!["one", "three", "two"]);
    let two = stack.services.iter().find(|s| s.service_name == "two").unwrap();
    assert_eq!(two.image.as_ref().unwrap().repo_tag, "busybox:2-override");
}

#[test]
fn test_scan_emits_placeholder_for_empty_stack() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("empty/compose.yml"), "services: {}\n");

    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    assert_eq!(stacks.len(), 1);
    let placeholder = &stacks[0].services[0];
    assert_eq!(placeholder.service_name, "not-loaded");
    assert_eq!(placeholder.status, ServiceStatus::NotLoaded);
    assert_eq!(placeholder.name, "empty (not loaded)");
}

#[test]
fn test_scan_skips_non_compose_files() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("x/other.yml"), "services:\n  a:\n    image: b\n");
    let stacks = scan_compose_stacks(&settings_for(dir.path())).unwrap();
    assert!(stacks.is_empty());
}

#[test]
fn test_scan_without_roots_is_empty() {
    let stacks = scan_compose_stacks(&ServerSettings::default()).unwrap();
    assert!(stacks.is_empty());
}

#[test]
fn test_load_env_file_parsing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "A=1\n\n# comment\nB = two \nC=\"quoted\"\nbroken-line\n",
    )
    .unwrap();
    let env = load_env_file(dir.path());
    assert_eq!(env.get("A").unwrap(), "1");
    assert_eq!(env.get("B").unwrap(), "two");
    assert_eq!(env.get("C").unwrap(), "quoted");
    assert!(!env.contains_key("broken-line"));
}

#[test]
fn test_resolve_env_vars_precedence() {
    let mut env = HashMap::new();
    env.insert("FROM_FILE".to_string(), "file".to_string());

    assert_eq!(resolve_env_vars("${FROM_FILE}", &env), "file");
    // env-file beats the default
    assert_eq!(resolve_env_vars("${FROM_FILE:-fallback}", &env), "file");
    // unknown name with a default
    assert_eq!(resolve_env_vars("${NOPE:-fallback}", &env), "fallback");
    // unknown name without a default collapses to empty
    assert_eq!(resolve_env_vars("pre-${NOPE}-post", &env), "pre--post");
    // untouched text passes through
    assert_eq!(resolve_env_vars("plain:latest", &env), "plain:latest");
}
