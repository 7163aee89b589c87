use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Config file error: {0}")]
    Json(#[from] json5::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Video not found: {}", .0.display())]
    VideoNotFound(PathBuf),
    #[error("Failed to open video {}: {reason}", .path.display())]
    VideoOpen { path: PathBuf, reason: String },
    #[error("Could not read the first frame")]
    NoFirstFrame,
    #[error("ROI {roi} does not fit a {width}x{height} frame")]
    InvalidRoi {
        roi: String,
        width: u32,
        height: u32,
    },
    #[error("Frame {frame_number} is truncated: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        frame_number: u64,
        expected: usize,
        actual: usize,
    },
    #[error("{0} not found, make sure it is installed and on PATH")]
    ToolNotFound(String),
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Recognition failed: {0}")]
    Recognition(String),
}

impl ExtractError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn recognition<S: Into<String>>(msg: S) -> Self {
        Self::Recognition(msg.into())
    }

    /// Maps a spawn failure of an external tool, turning `NotFound` into `ToolNotFound`.
    pub fn from_spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound(tool.to_string())
        } else {
            Self::Io(err)
        }
    }
}
