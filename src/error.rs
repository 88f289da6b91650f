use thiserror::Error;

use crate::types::Pt;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("dimensions must not be negative: width={width} height={height}")]
    NegativeDimension { width: Pt, height: Pt },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for LayoutError {
    fn from(value: image::ImageError) -> Self {
        LayoutError::Image(value.to_string())
    }
}

impl From<ttf_parser::FaceParsingError> for LayoutError {
    fn from(value: ttf_parser::FaceParsingError) -> Self {
        LayoutError::Font(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
