//! 视频压缩转码 - 统一分辨率 / 帧率 / 编码，缩短后续抽帧时间

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::core::error::{ExtractError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeParams {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Constant rate factor, 0-51.
    pub crf: u32,
    pub preset: String,
    /// Leading section to drop, as an ffmpeg timestamp.
    pub skip: Option<String>,
    pub audio_bitrate: String,
}

impl Default for TranscodeParams {
    fn default() -> Self {
        // 3200x2000 source scaled to 480p keeping 16:10
        Self {
            width: 768,
            height: 480,
            fps: 20,
            crf: 28,
            preset: "ultrafast".to_string(),
            skip: Some("00:00:05".to_string()),
            audio_bitrate: "32k".to_string(),
        }
    }
}

/// Media → media capability.
pub trait Transcoder {
    fn transcode(&self, input: &Path, output: &Path, params: &TranscodeParams) -> Result<()>;
}

pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn build_args(input: &Path, output: &Path, params: &TranscodeParams) -> Vec<String> {
        let mut args = vec!["-i".to_string(), input.to_string_lossy().into_owned()];
        if let Some(skip) = &params.skip {
            args.extend(["-ss".to_string(), skip.clone()]);
        }
        args.extend([
            "-vf".to_string(),
            format!("scale={}:{}", params.width, params.height),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            params.crf.to_string(),
            "-preset".to_string(),
            params.preset.clone(),
            "-r".to_string(),
            params.fps.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            params.audio_bitrate.clone(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path, params: &TranscodeParams) -> Result<()> {
        let args = Self::build_args(input, output, params);
        info!("🎬 Transcoding {}", input.display());
        info!("{} {}", self.program.display(), args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ExtractError::from_spawn("ffmpeg", e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!("❌ ffmpeg failed: {}", stderr);
            return Err(ExtractError::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: result.status,
                stderr,
            });
        }

        info!("✅ Transcoded to {}", output.display());
        Ok(())
    }
}

/// File-size change produced by a transcode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionSummary {
    pub original_mb: f64,
    pub compressed_mb: f64,
    pub reduction_pct: f64,
}

impl CompressionSummary {
    pub fn measure(input: &Path, output: &Path) -> Result<Self> {
        let original = fs::metadata(input)?.len();
        let compressed = fs::metadata(output)?.len();
        Ok(Self::from_sizes(original, compressed))
    }

    pub fn from_sizes(original_bytes: u64, compressed_bytes: u64) -> Self {
        const MB: f64 = 1024.0 * 1024.0;
        let reduction_pct = if original_bytes == 0 {
            0.0
        } else {
            (1.0 - compressed_bytes as f64 / original_bytes as f64) * 100.0
        };
        Self {
            original_mb: original_bytes as f64 / MB,
            compressed_mb: compressed_bytes as f64 / MB,
            reduction_pct,
        }
    }
}
