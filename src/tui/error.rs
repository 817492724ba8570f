use thiserror::Error;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("IO/Terminal error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Render error: {0}")]
    RenderError(String),
}
