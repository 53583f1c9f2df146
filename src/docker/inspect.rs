//! Serde models for the structured output of the container engine CLI.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    pub id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: ContainerConfig,
    #[serde(default)]
    pub state: ContainerState,
    #[serde(default)]
    pub network_settings: NetworkSettings,
}

impl ContainerInspect {
    pub fn labels(&self) -> HashMap<String, String> {
        self.config.labels.clone().unwrap_or_default()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.config
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    #[serde(default)]
    pub ports: Option<HashMap<String, Option<Vec<PortBinding>>>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    #[serde(default)]
    pub host_ip: String,
    #[serde(default)]
    pub host_port: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspect {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repo_tags: Vec<String>,
    #[serde(default)]
    pub repo_digests: Vec<String>,
    #[serde(default)]
    pub config: ImageInspectConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspectConfig {
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComposeLsEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config_files: ConfigFilesField,
}

/// `ConfigFiles` arrives either comma-joined or as a proper array depending
/// on the engine version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigFilesField {
    Joined(String),
    List(Vec<String>),
}

impl Default for ConfigFilesField {
    fn default() -> Self {
        ConfigFilesField::Joined(String::new())
    }
}

impl ConfigFilesField {
    /// Ordered, deduplicated list of config file paths.
    pub fn normalize(&self) -> Vec<String> {
        let mut files = Vec::new();
        let mut push = |raw: &str| {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !files.iter().any(|f| f == trimmed) {
                files.push(trimmed.to_string());
            }
        };
        match self {
            ConfigFilesField::Joined(joined) => {
                for part in joined.split(',') {
                    push(part);
                }
            }
            ConfigFilesField::List(items) => {
                for item in items {
                    push(item);
                }
            }
        }
        files
    }
}
