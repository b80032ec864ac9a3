use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("value {value} outside allowed range [{min}, {max}]")]
    Range { value: f64, min: f64, max: f64 },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("failed to load recording: {0}")]
    Load(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;
