use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObserverError>;

#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("registry rate limit")]
    RateLimited,

    #[error("compose stack {0:?} not found")]
    StackNotFound(String),

    #[error("compose stack service '{stack}/{service}' not found")]
    ServiceNotFound { stack: String, service: String },

    #[error("compose stack service task '{stack}/{service}' not found")]
    TaskNotFound { stack: String, service: String },

    #[error("{0}")]
    BadRequest(String),
}

impl ObserverError {
    /// True when the error text looks like a registry throttle response.
    pub fn looks_rate_limited(&self) -> bool {
        let msg = self.to_string().to_lowercase();
        msg.contains("toomanyrequests") || msg.contains("rate limit") || msg.contains("429")
    }
}
