use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrofitError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process error: {0}")]
    Process(String),

    #[error("'{command}' exited with code {code}")]
    InstallFailed { command: String, code: i32 },

    #[error("still unresolved after {attempts} attempt(s): {}", packages.join(", "))]
    Exhausted { attempts: u32, packages: Vec<String> },

    #[error("'{module}' is still missing after {setups} setup run(s)")]
    FeatureSetupExhausted { module: String, setups: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("git error: {0}")]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RetrofitError>;
