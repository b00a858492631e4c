use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConstructError {
    #[error("Adding '{node}' under '{target}' would create a cycle")]
    Cycle { node: String, target: String },

    #[error("Variable name already in use: {0}")]
    DuplicateName(String),

    #[error("Invalid variable name: {0:?}")]
    InvalidName(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Child index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Tree depth {depth} exceeds the configured limit of {limit}")]
    TreeTooDeep { depth: usize, limit: usize },

    #[error("Metadata key not found: {0}")]
    KeyNotFound(String),

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConstructError>;
