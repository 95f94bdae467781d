use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No image loaded")]
    NoImageLoaded,

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Detection backend failed: {0}")]
    Backend(String),

    #[error("Detection client disposed")]
    Disposed,

    #[error("A detection request is already in flight")]
    Busy,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, RedactError>;
