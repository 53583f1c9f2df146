pub mod cache;
pub mod command;
pub mod config;
pub mod docker;
pub mod error;
pub mod registry;
pub mod server;
pub mod tasks;
pub mod updater;

pub use cache::TtlCache;
pub use config::{load_settings, parse_interval, Settings};
pub use docker::DockerClient;
pub use error::{ObserverError, Result};
pub use registry::RegctlClient;
pub use server::AppState;
pub use tasks::TaskEngine;

use std::path::PathBuf;
use std::sync::Arc;

/// Wire up the core components and run the HTTP server until it stops.
pub async fn start_server(
    settings: Settings,
    registry_store_path: PathBuf,
    static_dir: PathBuf,
) -> Result<()> {
    let cache = Arc::new(TtlCache::new());
    let regctl = Arc::new(RegctlClient::new(
        settings.clone(),
        cache.clone(),
        registry_store_path,
    ));
    let docker = Arc::new(DockerClient::new(
        settings.clone(),
        regctl.clone(),
        cache.clone(),
    ));
    let engine = Arc::new(TaskEngine::new(docker.clone()));

    updater::start_auto_updater(
        settings.clone(),
        docker.clone(),
        regctl.clone(),
        engine.clone(),
    );

    let port = settings.web_port;
    let state = AppState {
        settings,
        docker,
        regctl,
        engine,
    };
    server::serve(state, port, static_dir).await
}
