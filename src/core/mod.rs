pub mod config;
pub mod error;
pub mod ocr;
pub mod readings;
pub mod video;

pub use config::{ExtractionConfig, ToolPaths};
pub use error::{ExtractError, Result};
