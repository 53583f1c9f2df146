use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized service state; serializes to the wire values clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServiceStatus {
    #[serde(rename = "running")]
    Running,
    #[default]
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "not-loaded")]
    NotLoaded,
}

impl ServiceStatus {
    /// Collapse an engine state string (`exited`, `paused`, ...) onto the
    /// closed running/stopped set.
    pub fn from_engine(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "running" => ServiceStatus::Running,
            _ => ServiceStatus::Stopped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub host_ip: String,
    pub host_port: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DockerImage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub latest_version: String,
    #[serde(default)]
    pub repo_local_digest: String,
    #[serde(default)]
    pub repo_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage_url: String,
}

impl DockerImage {
    /// A newer manifest exists remotely than the locally built image.
    pub fn has_updates(&self) -> bool {
        matches!(
            (self.created_at, self.latest_update),
            (Some(created), Some(latest)) if latest > created
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DockerContainer {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub image: Option<DockerImage>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub container_name: String,
    #[serde(default)]
    pub ports: HashMap<String, Vec<ContainerPort>>,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub stack_name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub homepage_url: String,
    #[serde(default)]
    pub has_updates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DockerStack {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub folder_name: String,
    #[serde(default)]
    pub config_files: Vec<String>,
    #[serde(default)]
    pub services: Vec<DockerContainer>,
    #[serde(default)]
    pub has_updates: bool,
}

impl DockerStack {
    pub fn compute_has_updates(&mut self) {
        self.has_updates = self.services.iter().any(|svc| svc.has_updates);
    }
}

/// A compose project as reported by `docker compose ls`.
#[derive(Debug, Clone)]
pub struct ComposeProject {
    pub name: String,
    pub config_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub image: DockerImage,
    pub repo_tag: String,
    pub status: ServiceStatus,
    pub containers_running: usize,
    pub containers_stopped: usize,
    pub has_updates: bool,
    pub homepage_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub num_of_services_with_updates: usize,
    pub num_of_services: usize,
    pub num_of_stacks_with_updates: usize,
    pub num_of_stacks: usize,
}
