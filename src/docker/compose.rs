use crate::config::ServerSettings;
use crate::docker::image_ref::homepage_url_for_image;
use crate::docker::models::{DockerContainer, DockerImage, DockerStack, ServiceStatus};
use crate::error::Result;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

const NOT_LOADED_ID: &str = "not-loaded";
const NOT_LOADED_UPTIME: &str = "Not loaded";

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    services: HashMap<String, Option<ComposeService>>,
}

#[derive(Debug, Deserialize, Default)]
struct ComposeService {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    container_name: Option<String>,
}

fn is_compose_file(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "docker-compose.yml" | "docker-compose.yaml" | "compose.yml" | "compose.yaml"
    )
}

/// Walk the configured roots and assemble stacks from compose files on disk.
///
/// Stacks that share a name across several files merge their services by
/// service name (last file wins) and union their config file lists. A stack
/// without any usable service still shows up, carrying a single `not-loaded`
/// placeholder.
pub fn scan_compose_stacks(server: &ServerSettings) -> Result<Vec<DockerStack>> {
    if server.stacks_paths.is_empty() {
        return Ok(Vec::new());
    }

    let mut stacks: HashMap<String, DockerStack> = HashMap::new();
    let mut services: HashMap<String, HashMap<String, DockerContainer>> = HashMap::new();

    for root in &server.stacks_paths {
        if root.is_empty() {
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|err| crate::error::ObserverError::Io(err.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !is_compose_file(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let parsed = parse_compose_file(entry.path(), server)?;
            let path = entry.path().to_string_lossy().to_string();

            let stack = stacks.entry(parsed.stack_name.clone()).or_default();
            stack.name = parsed.stack_name.clone();
            stack.folder_name = parsed.folder_name;
            if !stack.config_files.contains(&path) {
                stack.config_files.push(path);
            }
            let by_name = services.entry(parsed.stack_name).or_default();
            for service in parsed.services {
                by_name.insert(service.service_name.clone(), service);
            }
        }
    }

    let mut result: Vec<DockerStack> = stacks
        .into_values()
        .map(|mut stack| {
            let mut list: Vec<DockerContainer> = services
                .remove(&stack.name)
                .map(|by_name| by_name.into_values().collect())
                .unwrap_or_default();
            if list.is_empty() {
                list.push(placeholder_service(&stack.name));
            }
            list.sort_by(|a, b| a.service_name.cmp(&b.service_name));
            stack.services = list;
            stack.compute_has_updates();
            stack
        })
        .collect();
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

struct ParsedCompose {
    stack_name: String,
    folder_name: String,
    services: Vec<DockerContainer>,
}

fn parse_compose_file(path: &Path, server: &ServerSettings) -> Result<ParsedCompose> {
    let data = std::fs::read_to_string(path)?;
    let compose: ComposeFile = serde_yaml::from_str(&data)?;

    let folder_name = path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let stack_name = match compose.name {
        Some(name) if !name.is_empty() => name,
        _ => folder_name.clone(),
    };

    let env = load_env_file(path.parent().unwrap_or(Path::new(".")));

    let mut services = Vec::with_capacity(compose.services.len());
    for (service_name, service) in compose.services {
        let service = service.unwrap_or_default();
        let mut image_ref = resolve_env_vars(service.image.as_deref().unwrap_or(""), &env);
        if !image_ref.is_empty() && !image_ref.contains(':') && !image_ref.contains('@') {
            image_ref.push_str(":latest");
        }
        let container_name = resolve_env_vars(service.container_name.as_deref().unwrap_or(""), &env);

        let mut container = DockerContainer {
            id: NOT_LOADED_ID.to_string(),
            uptime: NOT_LOADED_UPTIME.to_string(),
            name: container_name.clone(),
            container_name,
            status: ServiceStatus::NotLoaded,
            stack_name: stack_name.clone(),
            service_name: service_name.clone(),
            ..Default::default()
        };
        if container.name.is_empty() {
            container.name = service_name;
        }
        if !image_ref.is_empty() {
            container.homepage_url =
                homepage_url_for_image(&image_ref, None, &server.possible_homepage_labels);
            container.image = Some(DockerImage {
                repo_tag: image_ref,
                ..Default::default()
            });
        }
        services.push(container);
    }
    services.sort_by(|a, b| a.service_name.cmp(&b.service_name));

    Ok(ParsedCompose {
        stack_name,
        folder_name,
        services,
    })
}

pub fn placeholder_service(stack_name: &str) -> DockerContainer {
    DockerContainer {
        id: NOT_LOADED_ID.to_string(),
        uptime: NOT_LOADED_UPTIME.to_string(),
        name: format!("{stack_name} (not loaded)"),
        status: ServiceStatus::NotLoaded,
        stack_name: stack_name.to_string(),
        service_name: NOT_LOADED_ID.to_string(),
        ..Default::default()
    }
}

/// Parse a sidecar `.env` file: `KEY=VALUE` lines, `#` comments and blank
/// lines ignored, surrounding double quotes stripped from values.
pub fn load_env_file(dir: &Path) -> HashMap<String, String> {
    let mut env = HashMap::new();
    let Ok(data) = std::fs::read_to_string(dir.join(".env")) else {
        return env;
    };
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        env.insert(
            key.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        );
    }
    env
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").unwrap())
}

/// Substitute `${NAME}` / `${NAME:-default}` placeholders: the `.env` map
/// wins, then the process environment, then the literal default.
pub fn resolve_env_vars(value: &str, env: &HashMap<String, String>) -> String {
    if value.is_empty() {
        return String::new();
    }
    env_pattern()
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            if let Some(found) = env.get(key) {
                return found.clone();
            }
            if let Ok(found) = std::env::var(key) {
                if !found.is_empty() {
                    return found;
                }
            }
            caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default()
        })
        .into_owned()
}
