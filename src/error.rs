use thiserror::Error;

use crate::types::asset::AssetError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Project is missing a valid numeric id")]
    InvalidProjectId,
    #[error("Project timeline is not an object")]
    InvalidTimeline,
    #[error("Unsupported timeline version: {0}")]
    UnsupportedVersion(String),
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
