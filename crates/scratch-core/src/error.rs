use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("not initialized: run 'scratch init'")]
    NotInitialized,

    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("step text must not be empty")]
    EmptyStep,

    #[error("lesson text must not be empty")]
    EmptyLesson,

    #[error("unknown provider '{0}': expected one of openai, anthropic, deepseek, gemini, azure, local")]
    UnknownProvider(String),

    #[error("missing credential for provider '{provider}': set {key}")]
    MissingCredential { provider: String, key: String },

    #[error("provider '{provider}' does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: String,
    },

    #[error("invalid image '{path}': {reason}")]
    InvalidImage { path: String, reason: String },

    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScratchError>;
