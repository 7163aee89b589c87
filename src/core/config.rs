use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::error::{ExtractError, Result};
use crate::core::video::frame::Roi;
use crate::core::video::transcoder::TranscodeParams;

/// External executables. Bare names are resolved through PATH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub tesseract: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            tesseract: PathBuf::from("tesseract"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub roi: Option<Roi>,
    /// Process every `step`-th frame.
    pub step: u32,
    pub tools: ToolPaths,
    pub transcode: TranscodeParams,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::new(),
            output_path: PathBuf::from("valid_xyz.txt"),
            roi: None,
            step: 5,
            tools: ToolPaths::default(),
            transcode: TranscodeParams::default(),
        }
    }
}

impl ExtractionConfig {
    /// Loads a JSON5 config file; missing keys fall back to defaults.
    pub fn from_json5_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("⚙️ Loading config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json5_str(&text)
    }

    pub fn from_json5_str(text: &str) -> Result<Self> {
        Ok(json5::from_str(text)?)
    }

    pub fn require_roi(&self) -> Result<Roi> {
        self.roi
            .ok_or_else(|| ExtractError::config("no ROI configured (expected x,y,width,height)"))
    }

    /// Checks everything a live extraction run needs.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(ExtractError::config("step must be at least 1"));
        }
        if self.video_path.as_os_str().is_empty() {
            return Err(ExtractError::config("no video path configured"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ExtractError::config("no output path configured"));
        }
        self.require_roi()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.step, 5);
        assert_eq!(config.output_path, PathBuf::from("valid_xyz.txt"));
        assert_eq!(config.tools.tesseract, PathBuf::from("tesseract"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json5_partial_override() {
        let config = ExtractionConfig::from_json5_str(
            r#"{
                // comments are fine in json5
                video_path: "clip.mp4",
                roi: { x: 10, y: 20, width: 300, height: 40 },
                step: 1,
                tools: { tesseract: "/opt/tesseract/bin/tesseract" },
            }"#,
        )
        .unwrap();

        assert_eq!(config.video_path, PathBuf::from("clip.mp4"));
        assert_eq!(config.roi, Some(Roi::new(10, 20, 300, 40)));
        assert_eq!(config.step, 1);
        assert_eq!(
            config.tools.tesseract,
            PathBuf::from("/opt/tesseract/bin/tesseract")
        );
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.transcode, TranscodeParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_step_rejected() {
        let config = ExtractionConfig {
            video_path: PathBuf::from("clip.mp4"),
            roi: Some(Roi::new(0, 0, 10, 10)),
            step: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExtractError::Config(_))));
    }

    #[test]
    fn test_bad_json5_is_error() {
        assert!(matches!(
            ExtractionConfig::from_json5_str("{ step: "),
            Err(ExtractError::Json(_))
        ));
    }
}
