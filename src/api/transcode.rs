//! Pre-processing driver: shrink the recording before extraction.

use std::path::Path;

use log::info;

use crate::core::error::Result;
use crate::core::video::transcoder::{CompressionSummary, TranscodeParams, Transcoder};

/// Transcodes `input` to `output` and reports the size change.
pub fn compress_video(
    transcoder: &dyn Transcoder,
    input: &Path,
    output: &Path,
    params: &TranscodeParams,
) -> Result<CompressionSummary> {
    transcoder.transcode(input, output, params)?;

    let summary = CompressionSummary::measure(input, output)?;
    info!(
        "📦 {:.2} MB -> {:.2} MB ({:.2}% smaller)",
        summary.original_mb, summary.compressed_mb, summary.reduction_pct
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ExtractError;
    use std::fs;

    /// Writes a fixed-size output instead of running ffmpeg.
    struct StubTranscoder {
        output_len: usize,
    }

    impl Transcoder for StubTranscoder {
        fn transcode(&self, _input: &Path, output: &Path, _params: &TranscodeParams) -> Result<()> {
            fs::write(output, vec![0u8; self.output_len])?;
            Ok(())
        }
    }

    struct FailingTranscoder;

    impl Transcoder for FailingTranscoder {
        fn transcode(&self, _input: &Path, _output: &Path, _params: &TranscodeParams) -> Result<()> {
            Err(ExtractError::ToolNotFound("ffmpeg".to_string()))
        }
    }

    #[test]
    fn test_compress_reports_reduction() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("overlay_metrology_in_{}.mp4", std::process::id()));
        let output = dir.join(format!("overlay_metrology_out_{}.mp4", std::process::id()));
        fs::write(&input, vec![0u8; 1000]).unwrap();

        let summary = compress_video(
            &StubTranscoder { output_len: 250 },
            &input,
            &output,
            &TranscodeParams::default(),
        )
        .unwrap();
        assert!((summary.reduction_pct - 75.0).abs() < 1e-9);

        fs::remove_file(&input).ok();
        fs::remove_file(&output).ok();
    }

    #[test]
    fn test_transcoder_failure_propagates() {
        let result = compress_video(
            &FailingTranscoder,
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            &TranscodeParams::default(),
        );
        assert!(matches!(result, Err(ExtractError::ToolNotFound(_))));
    }
}
