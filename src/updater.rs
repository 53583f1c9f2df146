use crate::config::Settings;
use crate::docker::DockerClient;
use crate::registry::RegctlClient;
use crate::tasks::{BatchUpdateRequest, TaskEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Spawn the periodic auto-update loop. Does nothing unless enabled.
///
/// Each cycle reconciles with caching disabled, fans out one update task per
/// service with a pending update (bounded by `max_concurrent`, permits held
/// until the update's workers finish), then sleeps out the remainder of the
/// configured interval.
pub fn start_auto_updater(
    settings: Settings,
    docker: Arc<DockerClient>,
    regctl: Arc<RegctlClient>,
    engine: Arc<TaskEngine>,
) {
    if !settings.auto_updater.enabled {
        return;
    }
    tokio::spawn(async move {
        let interval = Duration::from_secs(settings.auto_updater.interval_seconds.max(1));
        let semaphore = Arc::new(Semaphore::new(settings.auto_updater.max_concurrent));
        loop {
            let started = Instant::now();
            match docker.reconcile_stacks(true, false, true).await {
                Ok(stacks) => {
                    let mut cycle_handles = Vec::new();
                    let mut submitted = 0usize;
                    for stack in &stacks {
                        for service in &stack.services {
                            if !service.has_updates {
                                continue;
                            }
                            submitted += 1;
                            let permit = semaphore.clone().acquire_owned().await.unwrap();
                            let request = BatchUpdateRequest {
                                services: vec![format!("{}/{}", stack.name, service.service_name)],
                                infer_env_file: true,
                                prune_images: false,
                                restart_containers: true,
                            };
                            let workers = engine.start_batch_update(&request);
                            cycle_handles.push(tokio::spawn(async move {
                                let _permit = permit;
                                for worker in workers {
                                    let _ = worker.await;
                                }
                            }));
                        }
                    }
                    futures::future::join_all(cycle_handles).await;
                    regctl.touch_last_auto_check();
                    regctl.append_message(&format!(
                        "auto-update cycle finished, {submitted} update(s) submitted"
                    ));
                }
                Err(err) => {
                    tracing::error!(error = %err, "auto-updater: listing stacks failed");
                }
            }
            let elapsed = started.elapsed();
            tracing::info!(elapsed_secs = elapsed.as_secs(), "auto-updater cycle completed");
            let sleep_for = interval
                .saturating_sub(elapsed)
                .max(Duration::from_secs(1));
            tokio::time::sleep(sleep_for).await;
        }
    });
}
