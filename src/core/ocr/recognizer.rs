use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{GrayImage, ImageOutputFormat};
use log::{debug, info};

use crate::core::error::{ExtractError, Result};

/// Characters the overlay can contain.
pub const CHAR_WHITELIST: &str = "0123456789.+-";

/// Image → text capability. The returned text is untrusted.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Runs the `tesseract` CLI in single-line mode, piping a PNG through stdin.
pub struct TesseractCli {
    program: PathBuf,
    whitelist: String,
}

impl TesseractCli {
    /// Fails with `ToolNotFound` when the binary cannot be started.
    pub fn new(program: impl AsRef<Path>) -> Result<Self> {
        let program = program.as_ref().to_path_buf();
        let output = Command::new(&program)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ExtractError::from_spawn("tesseract", e))?;

        let banner = String::from_utf8_lossy(&output.stdout);
        let version = banner.lines().next().unwrap_or("unknown version");
        info!("🔤 Using {} ({})", program.display(), version.trim());

        Ok(Self {
            program,
            whitelist: CHAR_WHITELIST.to_string(),
        })
    }

    fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageOutputFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let png = Self::encode_png(image)?;

        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "--psm", "7", "-c"])
            .arg(format!("tessedit_char_whitelist={}", self.whitelist))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::from_spawn("tesseract", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ExtractError::recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract raw text: {:?}", text);
        Ok(text)
    }
}

/// Scripted recognizer for tests: returns text based on the call index.
pub struct MockTextRecognizer {
    pattern: Box<dyn Fn(u64) -> String + Send + Sync>,
    calls: AtomicU64,
}

impl MockTextRecognizer {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> String + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
            calls: AtomicU64::new(0),
        }
    }

    /// Returns each entry once, then empty text.
    pub fn with_script(script: Vec<&str>) -> Self {
        let script: Vec<String> = script.into_iter().map(String::from).collect();
        Self::with_pattern(move |n| script.get(n as usize).cloned().unwrap_or_default())
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for MockTextRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.pattern)(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_script() {
        let recognizer = MockTextRecognizer::with_script(vec!["1.0 2.0 3.0", "****"]);
        let img = GrayImage::new(4, 4);

        assert_eq!(recognizer.recognize(&img).unwrap(), "1.0 2.0 3.0");
        assert_eq!(recognizer.recognize(&img).unwrap(), "****");
        assert_eq!(recognizer.recognize(&img).unwrap(), "");
        assert_eq!(recognizer.call_count(), 3);
    }

    #[test]
    fn test_mock_pattern() {
        let recognizer = MockTextRecognizer::with_pattern(|n| format!("{}.0", n));
        let img = GrayImage::new(1, 1);

        assert_eq!(recognizer.recognize(&img).unwrap(), "0.0");
        assert_eq!(recognizer.recognize(&img).unwrap(), "1.0");
    }

    #[test]
    fn test_png_encoding() {
        let img = GrayImage::from_pixel(8, 3, image::Luma([255]));
        let png = TesseractCli::encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_missing_binary_is_tool_not_found() {
        let result = TesseractCli::new("/nonexistent/bin/tesseract-xyz");
        assert!(matches!(result, Err(ExtractError::ToolNotFound(_))));
    }
}
