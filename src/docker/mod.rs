pub mod compose;
pub mod image_ref;
pub mod inspect;
pub mod models;

use crate::cache::TtlCache;
use crate::command::{collect_lines, run_command, stream_command};
use crate::config::{DiscoveryStrategy, Settings};
use crate::error::{ObserverError, Result};
use crate::registry::RegctlClient;
use crate::tasks::{Message, Task, UpdateRequest};
use chrono::{DateTime, Utc};
use self::image_ref::{
    first_label, homepage_url_for_image, match_image_for_ref, normalize_image_ref, repo_candidates,
};
use self::inspect::{ComposeLsEntry, ContainerInspect, ImageInspect};
use self::models::{
    ComposeProject, ContainerPort, DockerContainer, DockerImage, DockerStack, ImageEntry,
    ServiceStatus,
};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";
const DRY_RUN_LINE_COUNT: usize = 30;
const DRY_RUN_LINE_DELAY: Duration = Duration::from_millis(100);

/// Client for the container engine CLI. Everything goes through subprocess
/// calls and their structured output; the daemon API is never used.
pub struct DockerClient {
    settings: Settings,
    regctl: Arc<RegctlClient>,
    cache: Arc<TtlCache>,
    ignore_pattern: Option<Regex>,
}

impl DockerClient {
    pub fn new(settings: Settings, regctl: Arc<RegctlClient>, cache: Arc<TtlCache>) -> Self {
        let ignore_pattern = build_ignore_pattern(&settings.server.ignore_stack_name_keywords);
        Self {
            settings,
            regctl,
            cache,
            ignore_pattern,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Drop all memoized discovery results.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    /// Compose projects known to the engine, ignore-filtered.
    pub async fn list_compose_projects(&self, include_stopped: bool) -> Result<Vec<ComposeProject>> {
        let mut args = vec!["compose", "ls", "--format", "json"];
        if include_stopped {
            args.push("--all");
        }
        let out = run_command("docker", &args).await?;
        let entries: Vec<ComposeLsEntry> = serde_json::from_slice(&out)?;

        let mut projects = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.name.is_empty() || self.is_ignored_stack(&entry.name) {
                continue;
            }
            projects.push(ComposeProject {
                name: entry.name,
                config_files: entry.config_files.normalize(),
            });
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn find_project(&self, name: &str) -> Result<ComposeProject> {
        let projects = self.list_compose_projects(true).await?;
        projects
            .into_iter()
            .find(|project| project.name == name)
            .ok_or_else(|| ObserverError::StackNotFound(name.to_string()))
    }

    async fn list_all_containers(&self, include_stopped: bool) -> Result<Vec<ContainerInspect>> {
        let mut args = vec!["ps", "--format", "{{.ID}}"];
        if include_stopped {
            args.insert(1, "-a");
        }
        let out = run_command("docker", &args).await?;
        let text = String::from_utf8_lossy(&out);
        let ids: Vec<&str> = text.split_whitespace().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut inspect_args = vec!["inspect"];
        inspect_args.extend(ids.iter().copied());
        let inspect_out = run_command("docker", &inspect_args).await?;
        Ok(serde_json::from_slice(&inspect_out)?)
    }

    /// Local images with remote enrichment, plus an index by canonical repoTag.
    pub async fn list_local_images(
        &self,
        no_cache: bool,
        include_remote: bool,
    ) -> Result<(Vec<DockerImage>, HashMap<String, DockerImage>)> {
        let out = run_command(
            "docker",
            &[
                "image",
                "ls",
                "--digests",
                "--format",
                "{{.Repository}}|{{.Tag}}|{{.Digest}}|{{.ID}}",
            ],
        )
        .await?;
        let text = String::from_utf8_lossy(&out);

        let mut images = Vec::new();
        let mut by_tag = HashMap::new();
        for line in text.lines() {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 4 {
                continue;
            }
            let (repo, tag, digest, image_id) = (parts[0], parts[1], parts[2], parts[3]);
            if repo.is_empty() || repo == "<none>" {
                continue;
            }
            let has_tag = !tag.is_empty() && tag != "<none>";
            let has_digest = !digest.is_empty() && digest != "<none>";
            let repo_tag = if has_digest && has_tag {
                format!("{repo}:{tag}@{digest}")
            } else if has_digest {
                format!("{repo}@{digest}")
            } else if has_tag {
                format!("{repo}:{tag}")
            } else {
                continue;
            };

            let mut image = match self.image_with_remote(&repo_tag, no_cache, include_remote).await {
                Ok(Some(image)) => image,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(repo_tag = %repo_tag, error = %err, "skipping image");
                    continue;
                }
            };
            if image.id.is_empty() {
                image.id = image_id.to_string();
            }
            images.push(image.clone());
            by_tag.insert(repo_tag, image);
        }
        Ok((images, by_tag))
    }

    /// Inspect one local image, optionally enriched with the remote manifest
    /// creation time and version labels. On `RateLimited` the persisted
    /// registry entry fills in, so freshness degrades instead of failing.
    pub async fn image_with_remote(
        &self,
        reference: &str,
        no_cache: bool,
        include_remote: bool,
    ) -> Result<Option<DockerImage>> {
        if !include_remote {
            let Some(mut image) = self.local_image(reference).await? else {
                return Ok(None);
            };
            self.overlay_cached(&mut image);
            return Ok(Some(image));
        }

        let prefixes = &self.settings.server.ignored_image_prefixes;
        let parsed = normalize_image_ref(reference, prefixes);
        let out = run_command("docker", &["image", "inspect", &parsed.lookup]).await?;
        let inspected: Vec<ImageInspect> = serde_json::from_slice(&out)?;
        let Some(inspected) = inspected.into_iter().next() else {
            return Ok(None);
        };

        let repo_tag = resolve_repo_tag(&inspected, &parsed);
        let local_digest = inspected.repo_digests.first().cloned().unwrap_or_default();
        let version = first_label(
            inspected.config.labels.as_ref(),
            &self.settings.server.possible_image_labels,
        );
        let homepage_url = homepage_url_for_image(
            &repo_tag,
            inspected.config.labels.as_ref(),
            &self.settings.server.possible_homepage_labels,
        );

        let mut latest_update = inspected.created;
        let mut latest_version = String::new();
        if !local_digest.is_empty() && !repo_tag.is_empty() && !repo_tag.contains("@sha256:") {
            match self.fetch_remote(&repo_tag, inspected.created, no_cache).await {
                Ok(Some((update, version))) => {
                    latest_update = update;
                    latest_version = version;
                }
                Ok(None) => {}
                Err(ObserverError::RateLimited) => {
                    // fall through: the cached overlay below keeps the last
                    // known remote state for this tag
                }
                Err(err) => {
                    tracing::debug!(repo_tag = %repo_tag, error = %err, "remote lookup failed");
                }
            }
        }

        let mut image = DockerImage {
            id: inspected.id,
            created_at: inspected.created,
            latest_update,
            latest_version,
            repo_local_digest: local_digest,
            repo_tag,
            version,
            homepage_url,
        };
        self.overlay_cached(&mut image);
        clamp_latest_update(&mut image);
        Ok(Some(image))
    }

    /// Remote digest + inspect round trip; returns the manifest creation time
    /// (clamped to the local build time) and version label.
    async fn fetch_remote(
        &self,
        repo_tag: &str,
        local_created: Option<DateTime<Utc>>,
        no_cache: bool,
    ) -> Result<Option<(Option<DateTime<Utc>>, String)>> {
        let Some(digest_ref) = self.regctl.remote_digest(repo_tag, no_cache).await? else {
            return Ok(None);
        };
        let inspect = self.regctl.inspect(&digest_ref, no_cache).await?;
        let mut latest_update = inspect.created;
        if let (Some(local), Some(remote)) = (local_created, inspect.created) {
            if remote < local {
                latest_update = Some(local);
            }
        }
        let latest_version = first_label(
            inspect.config.labels.as_ref(),
            &self.settings.server.possible_image_labels,
        );
        self.regctl
            .update_cached(repo_tag, latest_update, &latest_version);
        Ok(Some((latest_update, latest_version)))
    }

    async fn local_image(&self, reference: &str) -> Result<Option<DockerImage>> {
        let prefixes = &self.settings.server.ignored_image_prefixes;
        let parsed = normalize_image_ref(reference, prefixes);
        let out = run_command("docker", &["image", "inspect", &parsed.lookup]).await?;
        let inspected: Vec<ImageInspect> = serde_json::from_slice(&out)?;
        let Some(inspected) = inspected.into_iter().next() else {
            return Ok(None);
        };
        let repo_tag = resolve_repo_tag(&inspected, &parsed);
        Ok(Some(DockerImage {
            id: inspected.id,
            created_at: inspected.created,
            latest_update: inspected.created,
            latest_version: String::new(),
            repo_local_digest: inspected.repo_digests.first().cloned().unwrap_or_default(),
            version: first_label(
                inspected.config.labels.as_ref(),
                &self.settings.server.possible_image_labels,
            ),
            homepage_url: homepage_url_for_image(
                &repo_tag,
                inspected.config.labels.as_ref(),
                &self.settings.server.possible_homepage_labels,
            ),
            repo_tag,
        }))
    }

    fn overlay_cached(&self, image: &mut DockerImage) {
        let Some(cached) = self.regctl.cached(&image.repo_tag) else {
            return;
        };
        if cached.latest_update.is_some() {
            image.latest_update = cached.latest_update;
        }
        if !cached.latest_version.is_empty() {
            image.latest_version = cached.latest_version;
        }
    }

    /// Join engine state, the local image store, and compose files on disk
    /// into the authoritative stack list.
    pub async fn reconcile_stacks(
        &self,
        no_cache: bool,
        include_stopped: bool,
        include_remote: bool,
    ) -> Result<Vec<DockerStack>> {
        let cache_key = format!("stacks:{include_stopped}");
        if !no_cache {
            if let Some(stacks) = self.cache.get::<Vec<DockerStack>>(&cache_key) {
                return Ok(stacks);
            }
        }

        let (_, image_map) = self.list_local_images(no_cache, include_remote).await?;
        let containers = self.list_all_containers(include_stopped).await?;

        let mut containers_by_service: HashMap<(String, String), ContainerInspect> = HashMap::new();
        for container in containers {
            let stack = container.label(COMPOSE_PROJECT_LABEL).unwrap_or_default();
            let service = container.label(COMPOSE_SERVICE_LABEL).unwrap_or_default();
            if stack.is_empty() || service.is_empty() {
                continue;
            }
            if !self.is_container_enabled(&container.labels()) {
                continue;
            }
            containers_by_service.insert((stack.to_string(), service.to_string()), container);
        }

        let mut stack_map: HashMap<String, DockerStack> = HashMap::new();
        for mut stack in compose::scan_compose_stacks(&self.settings.server)? {
            for service in &mut stack.services {
                let Some(repo_tag) = service
                    .image
                    .as_ref()
                    .map(|image| image.repo_tag.clone())
                    .filter(|tag| !tag.is_empty())
                else {
                    continue;
                };
                match match_image_for_ref(
                    &image_map,
                    &repo_tag,
                    &self.settings.server.ignored_image_prefixes,
                ) {
                    Some(found) => {
                        let found = found.clone();
                        service.has_updates = found.has_updates();
                        service.image = Some(found);
                        service.status = ServiceStatus::Stopped;
                    }
                    None => {
                        service.status = ServiceStatus::NotLoaded;
                    }
                }
            }
            stack_map.insert(stack.name.clone(), stack);
        }

        for (stack_name, _) in containers_by_service.keys() {
            if !stack_map.contains_key(stack_name) {
                stack_map.insert(
                    stack_name.clone(),
                    DockerStack {
                        name: stack_name.clone(),
                        ..Default::default()
                    },
                );
            }
        }
        stack_map.retain(|name, _| !self.is_ignored_stack(name));

        let mut merged = Vec::with_capacity(stack_map.len());
        for (stack_name, mut stack) in stack_map {
            let mut services: HashMap<String, DockerContainer> = stack
                .services
                .drain(..)
                .map(|service| (service.service_name.clone(), service))
                .collect();

            for ((container_stack, service_name), container) in &containers_by_service {
                if *container_stack != stack_name {
                    continue;
                }
                let mut built = self
                    .build_container(container, &image_map, no_cache, include_remote)
                    .await?;
                if let Some(declared) = services.get(service_name) {
                    if !declared.container_name.is_empty() {
                        built.container_name = declared.container_name.clone();
                    }
                    if let (Some(declared_image), Some(built_image)) =
                        (declared.image.as_ref(), built.image.as_mut())
                    {
                        if !declared_image.repo_tag.is_empty() {
                            built_image.repo_tag = declared_image.repo_tag.clone();
                        }
                    }
                }
                services.insert(service_name.clone(), built);
            }

            let mut list: Vec<DockerContainer> = services.into_values().collect();
            list.sort_by(|a, b| a.service_name.cmp(&b.service_name));
            stack.services = list;
            stack.compute_has_updates();
            merged.push(stack);
        }
        merged.sort_by(|a, b| a.name.cmp(&b.name));

        if !no_cache {
            self.cache.set(
                &cache_key,
                merged.clone(),
                Duration::from_secs(self.settings.server.cache_control_max_age_seconds),
            );
        }
        Ok(merged)
    }

    pub async fn get_stack(&self, name: &str, no_cache: bool) -> Result<DockerStack> {
        let stacks = self.reconcile_stacks(no_cache, false, true).await?;
        stacks
            .into_iter()
            .find(|stack| stack.name == name)
            .ok_or_else(|| ObserverError::StackNotFound(name.to_string()))
    }

    pub async fn get_service(
        &self,
        stack_name: &str,
        service_name: &str,
        no_cache: bool,
    ) -> Result<DockerContainer> {
        let stack = self.get_stack(stack_name, no_cache).await?;
        stack
            .services
            .into_iter()
            .find(|service| service.service_name == service_name)
            .ok_or_else(|| ObserverError::ServiceNotFound {
                stack: stack_name.to_string(),
                service: service_name.to_string(),
            })
    }

    async fn build_container(
        &self,
        item: &ContainerInspect,
        image_map: &HashMap<String, DockerImage>,
        no_cache: bool,
        include_remote: bool,
    ) -> Result<DockerContainer> {
        let labels = item.labels();
        let image_ref = &item.config.image;
        let image = match match_image_for_ref(
            image_map,
            image_ref,
            &self.settings.server.ignored_image_prefixes,
        ) {
            Some(found) => Some(found.clone()),
            None if !image_ref.is_empty() => {
                self.image_with_remote(image_ref, no_cache, include_remote)
                    .await?
            }
            None => None,
        };

        let container_name = item.name.strip_prefix('/').unwrap_or(&item.name).to_string();
        let has_updates = image.as_ref().is_some_and(DockerImage::has_updates);
        Ok(DockerContainer {
            id: item.id.clone(),
            created_at: item.created,
            uptime: format_uptime(item.state.started_at),
            image,
            homepage_url: homepage_url_for_image(
                image_ref,
                Some(&labels),
                &self.settings.server.possible_homepage_labels,
            ),
            name: container_name.clone(),
            container_name,
            ports: map_ports(item.network_settings.ports.as_ref()),
            status: ServiceStatus::from_engine(&item.state.status),
            stack_name: labels.get(COMPOSE_PROJECT_LABEL).cloned().unwrap_or_default(),
            service_name: labels.get(COMPOSE_SERVICE_LABEL).cloned().unwrap_or_default(),
            labels,
            has_updates,
        })
    }

    /// Image list entries with per-image container status counts.
    pub async fn image_entries(
        &self,
        no_cache: bool,
        include_remote: bool,
    ) -> Result<Vec<ImageEntry>> {
        let (images, _) = self.list_local_images(no_cache, include_remote).await?;
        let containers = self.list_all_containers(true).await?;

        let mut status_map: HashMap<String, (usize, usize)> = HashMap::new();
        for container in &containers {
            let image_key = if !container.config.image.is_empty() {
                container.config.image.as_str()
            } else {
                container.image.as_str()
            };
            if image_key.is_empty() {
                continue;
            }
            let running = ServiceStatus::from_engine(&container.state.status) == ServiceStatus::Running;
            for key in repo_candidates(image_key, &self.settings.server.ignored_image_prefixes) {
                let counts = status_map.entry(key).or_default();
                if running {
                    counts.0 += 1;
                } else {
                    counts.1 += 1;
                }
            }
        }

        let mut entries = Vec::with_capacity(images.len());
        for image in images {
            let counts = lookup_status(
                &status_map,
                &image.repo_tag,
                &self.settings.server.ignored_image_prefixes,
            );
            let homepage_url = if image.homepage_url.is_empty() {
                homepage_url_for_image(
                    &image.repo_tag,
                    None,
                    &self.settings.server.possible_homepage_labels,
                )
            } else {
                image.homepage_url.clone()
            };
            let (running, stopped) = counts.unwrap_or((0, 0));
            entries.push(ImageEntry {
                repo_tag: image.repo_tag.clone(),
                status: if running > 0 {
                    ServiceStatus::Running
                } else {
                    ServiceStatus::Stopped
                },
                containers_running: running,
                containers_stopped: stopped,
                has_updates: image.has_updates(),
                homepage_url,
                image,
            });
        }
        entries.sort_by(|a, b| a.repo_tag.cmp(&b.repo_tag));
        Ok(entries)
    }

    /// Pull an image, returning the streamed transcript alongside the outcome.
    pub async fn pull_image(&self, repo_tag: &str) -> (Vec<String>, Result<()>) {
        collect_lines("docker", &["pull", repo_tag]).await
    }

    /// Run the staged update for one stack, streaming all command output to
    /// `task`. In dry-run mode each stage emits synthetic lines instead.
    pub async fn update_compose_stack(
        &self,
        task: &Task,
        stack_name: &str,
        services: &[String],
        request: &UpdateRequest,
    ) -> Result<()> {
        let project = self.find_project(stack_name).await?;

        let env_file = if request.infer_env_file {
            infer_env_file(&project.config_files)
        } else {
            None
        };

        if request.restart_containers {
            task.append(Message::stage("docker compose up --pull always"));
            if self.settings.server.dry_run {
                simulate_output(task, "docker compose up --pull always").await;
            } else {
                let args = compose_args(&project.config_files, env_file.as_deref(), services, ComposeAction::UpPullAlways);
                stream_docker(task, &args).await?;
            }
        } else {
            task.append(Message::stage("docker compose pull"));
            if self.settings.server.dry_run {
                simulate_output(task, "docker compose pull").await;
            } else {
                let args = compose_args(&project.config_files, env_file.as_deref(), services, ComposeAction::Pull);
                stream_docker(task, &args).await?;
            }
        }

        if request.prune_images {
            task.append(Message::stage("docker image prune"));
            if self.settings.server.dry_run {
                simulate_output(task, "docker image prune").await;
            } else {
                stream_docker(task, &["image".to_string(), "prune".to_string(), "-f".to_string()]).await?;
            }
        }

        Ok(())
    }

    fn is_ignored_stack(&self, name: &str) -> bool {
        self.ignore_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(name))
    }

    /// Opt-out discovery treats unlabeled containers as enabled; opt-in
    /// requires an explicit `"true"` (any case).
    fn is_container_enabled(&self, labels: &HashMap<String, String>) -> bool {
        let default_value = match self.settings.server.discovery_strategy {
            DiscoveryStrategy::OptOut => "true",
            DiscoveryStrategy::OptIn => "false",
        };
        let value = labels
            .get(&self.settings.server.enabled_label_field_name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .unwrap_or(default_value);
        value.eq_ignore_ascii_case("true")
    }
}

fn build_ignore_pattern(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }
    let joined = keywords
        .iter()
        .map(|keyword| format!("({keyword})"))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&joined) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            tracing::warn!(error = %err, "invalid ignore keyword pattern, not filtering");
            None
        }
    }
}

fn resolve_repo_tag(inspected: &ImageInspect, parsed: &image_ref::ImageRef) -> String {
    if let Some(tag) = inspected.repo_tags.first() {
        return tag.clone();
    }
    if let Some(digest) = inspected.repo_digests.first() {
        return digest.split('@').next().unwrap_or_default().to_string();
    }
    parsed.lookup.clone()
}

// The persisted entry is defined to be at least as new as the local build.
fn clamp_latest_update(image: &mut DockerImage) {
    if let (Some(created), Some(latest)) = (image.created_at, image.latest_update) {
        if latest < created {
            image.latest_update = Some(created);
        }
    }
}

fn lookup_status(
    status_map: &HashMap<String, (usize, usize)>,
    repo_tag: &str,
    ignored_prefixes: &[String],
) -> Option<(usize, usize)> {
    if let Some(counts) = status_map.get(repo_tag) {
        return Some(*counts);
    }
    for key in repo_candidates(repo_tag, ignored_prefixes) {
        if let Some(counts) = status_map.get(&key) {
            return Some(*counts);
        }
    }
    None
}

fn map_ports(
    ports: Option<&HashMap<String, Option<Vec<inspect::PortBinding>>>>,
) -> HashMap<String, Vec<ContainerPort>> {
    let Some(ports) = ports else {
        return HashMap::new();
    };
    let mut mapped = HashMap::with_capacity(ports.len());
    for (exposed, bindings) in ports {
        let bindings = bindings
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|binding| !binding.host_port.is_empty())
            .map(|binding| ContainerPort {
                host_ip: binding.host_ip.clone(),
                host_port: binding.host_port.parse().unwrap_or(0),
            })
            .collect();
        mapped.insert(exposed.clone(), bindings);
    }
    mapped
}

/// `Up 3 days` style uptime from the container start time; unknown or
/// never-started yields an empty string.
pub fn format_uptime(started_at: Option<DateTime<Utc>>) -> String {
    let Some(started_at) = started_at else {
        return String::new();
    };
    if started_at.timestamp() <= 0 {
        return String::new();
    }
    let seconds = (Utc::now() - started_at).num_seconds().max(0);
    let (value, unit) = if seconds >= 86_400 {
        (seconds / 86_400, "day")
    } else if seconds >= 3_600 {
        (seconds / 3_600, "hour")
    } else if seconds >= 60 {
        (seconds / 60, "minute")
    } else {
        (seconds, "second")
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("Up {value} {unit}{plural}")
}

/// Probe `<config file with .env extension>` then the config file's sibling
/// `.env`; first hit wins.
fn infer_env_file(config_files: &[String]) -> Option<String> {
    for file in config_files {
        let path = Path::new(file);
        let with_env_ext: PathBuf = path.with_extension("env");
        if with_env_ext.is_file() {
            return Some(with_env_ext.to_string_lossy().to_string());
        }
        if let Some(dir) = path.parent() {
            let sibling = dir.join(".env");
            if sibling.is_file() {
                return Some(sibling.to_string_lossy().to_string());
            }
        }
    }
    None
}

enum ComposeAction {
    UpPullAlways,
    Pull,
}

fn compose_args(
    config_files: &[String],
    env_file: Option<&str>,
    services: &[String],
    action: ComposeAction,
) -> Vec<String> {
    let mut args = vec!["compose".to_string()];
    for file in config_files {
        args.push("-f".to_string());
        args.push(file.clone());
    }
    if let Some(env_file) = env_file {
        args.push("--env-file".to_string());
        args.push(env_file.to_string());
    }
    match action {
        ComposeAction::UpPullAlways => {
            args.extend(["up", "-d", "--pull", "always"].map(String::from));
        }
        ComposeAction::Pull => args.push("pull".to_string()),
    }
    args.extend(services.iter().cloned());
    args
}

async fn stream_docker(task: &Task, args: &[String]) -> Result<()> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    stream_command(task, "docker", &arg_refs).await
}

async fn simulate_output(task: &Task, stage: &str) {
    for i in 1..=DRY_RUN_LINE_COUNT {
        task.append(Message {
            stage: stage.to_string(),
            message: Some(format!("test line {i}/{DRY_RUN_LINE_COUNT}")),
        });
        tokio::time::sleep(DRY_RUN_LINE_DELAY).await;
    }
}
