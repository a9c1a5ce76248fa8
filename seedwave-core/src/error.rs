use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Catalogue service errors
    #[error("Catalogue request to {endpoint} failed with status {status}")]
    CatalogueStatus { endpoint: String, status: u16 },

    #[error("Song generation failed for seed {seed}: {reason}")]
    GenerationFailed { seed: String, reason: String },

    #[error("Catalogue {seed} has no row {row}")]
    RowNotFound { seed: String, row: u64 },

    #[error("Song {seed} has no playable audio source")]
    NoAudioSource { seed: String },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
