use dockobserver::config::{DEFAULT_REGISTRY_STORE_PATH, DEFAULT_SETTINGS_PATH};
use std::path::{Path, PathBuf};

fn env_or(key: &str, fallback: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => fallback.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings_path = env_or("SETTINGS_PATH", DEFAULT_SETTINGS_PATH);
    let mut settings = dockobserver::load_settings(Path::new(&settings_path))?;
    settings.node_env = env_or("NODE_ENV", "production");
    settings.server_port = env_or("SERVER_PORT", "3001").parse().unwrap_or(3001);
    settings.web_port = env_or("WEB_PORT", "3000").parse().unwrap_or(3000);

    let static_dir = PathBuf::from(env_or("STATIC_DIR", "public"));

    tracing::info!(
        settings_path = %settings_path,
        port = settings.web_port,
        auto_updater = settings.auto_updater.enabled,
        "starting dockobserver"
    );

    dockobserver::start_server(
        settings,
        PathBuf::from(DEFAULT_REGISTRY_STORE_PATH),
        static_dir,
    )
    .await?;
    Ok(())
}
