use crate::docker::DockerClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub const STAGE_STARTING: &str = "Starting";
pub const STAGE_ERROR: &str = "Error";
pub const STAGE_FINISHED: &str = "Finished";

/// One line of a task's output stream. A bare stage transition carries no
/// message text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub stage: String,
    pub message: Option<String>,
}

impl Message {
    pub fn stage(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: None,
        }
    }
}

#[derive(Default)]
struct TaskInner {
    messages: Vec<Message>,
    stage: String,
    done: bool,
    error: Option<String>,
}

/// Append-only message stream for one update run. Indices are stable, so
/// clients tail it by offset.
#[derive(Default)]
pub struct Task {
    inner: Mutex<TaskInner>,
}

impl Task {
    pub fn append(&self, message: Message) {
        let mut inner = self.inner.lock().unwrap();
        if !message.stage.is_empty() {
            inner.stage = message.stage.clone();
        }
        inner.messages.push(message);
    }

    pub fn current_stage(&self) -> String {
        self.inner.lock().unwrap().stage.clone()
    }

    pub fn finish(&self, error: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.done = true;
        inner.error = error;
    }

    pub fn is_done(&self) -> bool {
        self.inner.lock().unwrap().done
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().unwrap().error.clone()
    }

    /// Messages at indices >= `offset`; empty when the offset is past the end.
    pub fn messages_from(&self, offset: usize) -> Vec<Message> {
        let inner = self.inner.lock().unwrap();
        if offset >= inner.messages.len() {
            return Vec::new();
        }
        inner.messages[offset..].to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub stack: String,
    pub service: String,
}

/// Live tasks keyed by (stack, service). Entries are never evicted; a
/// finished task keeps its key claimed so re-runs stay rejected.
#[derive(Default)]
pub struct TaskStore {
    tasks: Mutex<HashMap<TaskKey, Arc<Task>>>,
}

impl TaskStore {
    pub fn get(&self, key: &TaskKey) -> Option<Arc<Task>> {
        self.tasks.lock().unwrap().get(key).cloned()
    }

    pub fn exists(&self, key: &TaskKey) -> bool {
        self.tasks.lock().unwrap().contains_key(key)
    }

    fn claim(&self, keys: &[TaskKey], task: &Arc<Task>) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        if keys.iter().any(|key| tasks.contains_key(key)) {
            return false;
        }
        for key in keys {
            tasks.insert(key.clone(), task.clone());
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRequest {
    #[serde(rename = "inferEnvfile", default)]
    pub infer_env_file: bool,
    #[serde(rename = "pruneImages", default)]
    pub prune_images: bool,
    #[serde(rename = "restartContainers", default)]
    pub restart_containers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchUpdateRequest {
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(rename = "inferEnvfile", default)]
    pub infer_env_file: bool,
    #[serde(rename = "pruneImages", default)]
    pub prune_images: bool,
    #[serde(rename = "restartContainers", default)]
    pub restart_containers: bool,
}

/// Creates and runs update tasks against the engine, one worker per stack.
pub struct TaskEngine {
    docker: Arc<DockerClient>,
    store: TaskStore,
}

impl TaskEngine {
    pub fn new(docker: Arc<DockerClient>) -> Self {
        Self {
            docker,
            store: TaskStore::default(),
        }
    }

    /// Start update workers for a batch of `"stack/service"` entries.
    ///
    /// Entries are grouped per stack; a stack with any service already
    /// claimed is skipped entirely, so a concurrent duplicate submission is a
    /// no-op. The returned handles complete when the workers do; HTTP callers
    /// drop them, the auto-updater awaits them.
    pub fn start_batch_update(&self, request: &BatchUpdateRequest) -> Vec<JoinHandle<()>> {
        let mut services_by_stack: HashMap<String, Vec<String>> = HashMap::new();
        for entry in &request.services {
            let Some((stack, service)) = entry.split_once('/') else {
                tracing::debug!(entry = %entry, "skipping malformed batch entry");
                continue;
            };
            if stack.is_empty() || service.is_empty() {
                tracing::debug!(entry = %entry, "skipping malformed batch entry");
                continue;
            }
            services_by_stack
                .entry(stack.to_string())
                .or_default()
                .push(service.to_string());
        }

        let opts = UpdateRequest {
            infer_env_file: request.infer_env_file,
            prune_images: request.prune_images,
            restart_containers: request.restart_containers,
        };

        let mut handles = Vec::new();
        for (stack, services) in services_by_stack {
            let keys: Vec<TaskKey> = services
                .iter()
                .map(|service| TaskKey {
                    stack: stack.clone(),
                    service: service.clone(),
                })
                .collect();
            let task = Arc::new(Task::default());
            if !self.store.claim(&keys, &task) {
                tracing::info!(stack = %stack, "update already running, skipping stack");
                continue;
            }
            let docker = self.docker.clone();
            let opts = opts.clone();
            handles.push(tokio::spawn(async move {
                run_update(docker, task, stack, services, opts).await;
            }));
        }
        handles
    }

    /// Messages at indices >= `offset`, or `None` for an unknown key.
    /// Observing a finished task invalidates the discovery cache so the next
    /// listing reflects the update.
    pub fn read_task(&self, key: &TaskKey, offset: usize) -> Option<Vec<Message>> {
        let task = self.store.get(key)?;
        if task.is_done() {
            self.docker.invalidate_cache();
        }
        Some(task.messages_from(offset))
    }

    pub fn task_exists(&self, key: &TaskKey) -> bool {
        self.store.exists(key)
    }
}

async fn run_update(
    docker: Arc<DockerClient>,
    task: Arc<Task>,
    stack: String,
    services: Vec<String>,
    opts: UpdateRequest,
) {
    task.append(Message::stage(STAGE_STARTING));
    let result = docker
        .update_compose_stack(&task, &stack, &services, &opts)
        .await;
    let error = match result {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(stack = %stack, error = %err, "stack update failed");
            task.append(Message {
                stage: STAGE_ERROR.to_string(),
                message: Some(err.to_string()),
            });
            Some(err.to_string())
        }
    };
    task.append(Message::stage(STAGE_FINISHED));
    task.finish(error);
}
