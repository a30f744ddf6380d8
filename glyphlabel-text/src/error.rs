//! Error type shared by every fallible operation in the text core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to load font: {0}")]
    FontLoad(String),
    #[error("No system font matches family '{0}'")]
    FontNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pixel size: {0}")]
    InvalidPixelSize(u32),
    #[error("Failed to rasterize codepoint {codepoint:#04x}: {reason}")]
    Rasterize { codepoint: u8, reason: String },
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(f32),
    #[error("Invalid label config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LabelError>;
