use thiserror::Error;

use crate::types::WallId;

#[derive(Error, Debug)]
pub enum WallMaskError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("No segmentation map loaded")]
    NoSegmentationLoaded,

    #[error("Invalid segmentation map: {0}")]
    InvalidSegmentation(String),

    #[error("Wall detection failed ({0}), please mask the wall manually")]
    DetectionFailed(String),

    #[error("Feature disabled by configuration: {0}")]
    FeatureDisabled(&'static str),

    #[error("No wall selected")]
    NoWallSelected,

    #[error("Unknown wall: {0}")]
    UnknownWall(WallId),

    #[error("Quote submission failed: {message}")]
    Submission { message: String, retryable: bool },

    #[error("Invalid quote request: {0}")]
    InvalidQuote(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid GeoJSON document: {0}")]
    InvalidGeoJson(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl WallMaskError {
    /// Whether the user can retry the operation without redoing any work.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission { retryable, .. } => *retryable,
            Self::DetectionFailed(_) | Self::Catalog(_) | Self::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WallMaskError>;
